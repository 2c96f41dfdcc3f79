//! Parameter store: the id→value table every topology cooks from.
//!
//! The store is split in two halves that share one pending-value table:
//!
//! ```text
//!  control thread                         audio thread
//!  ──────────────                         ────────────
//!  ParamHandle::update_parameter ──┐
//!                                  ├──▶ pending: [AtomicU32] (f32 bits)
//!  ParameterStore::update_parameter┘            │
//!                                               │ sync_bound_variables()   once per block
//!                                               ▼
//!                                     bound: [LinearRamp]  ──▶ value(id) / gain(id) / choice(id)
//!                                               │
//!                                               └─ advance_smoothing(n)    once per sample
//! ```
//!
//! Writes from any thread land in `pending` with a `Release` store and are
//! invisible to processing until the next [`ParameterStore::sync_bound_variables`],
//! which loads every slot with `Acquire`. A block therefore always sees one
//! consistent snapshot taken at its start. Smoothed controls then ramp toward
//! the snapshot sample by sample.
//!
//! Nothing in the audio-thread half allocates, locks or logs. Unknown ids are
//! reported back to the caller as [`ParamError::InvalidParameterId`]; logging
//! them is the caller's job.
//!
//! # Example
//!
//! ```rust
//! use echoform_core::{ParamDescriptor, ParamId, ParameterStore, UpdateContext};
//!
//! static PARAMS: [ParamDescriptor; 1] =
//!     [ParamDescriptor::gain_db("Output Gain", "Out", -24.0, 12.0, 0.0).with_id(ParamId(2), "outgain")];
//!
//! let mut store = ParameterStore::new(&PARAMS);
//! store.reset(48000.0);
//!
//! let handle = store.handle();
//! let commit = handle.update_parameter(ParamId(2), 40.0, UpdateContext::Automation).unwrap();
//! assert!(commit.clamped);
//!
//! // Not visible until the block boundary.
//! assert_eq!(store.value(ParamId(2)), 0.0);
//! store.sync_bound_variables();
//! assert_eq!(store.value(ParamId(2)), 12.0);
//! ```

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::{ParamError, PresetError};
use crate::math::{db_to_linear, percent_to_fraction};
use crate::param::LinearRamp;
use crate::param_info::{ParamDescriptor, ParamEnum, ParamId};

/// Origin of a parameter update.
///
/// The context never changes the stored value. It only decides whether the
/// commit asks for follow-up callbacks (see [`Commit::fires_callbacks`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateContext {
    /// Host automation or a user gesture.
    #[default]
    Automation,
    /// Bulk write from a preset.
    PresetLoad,
    /// Write issued by the processor itself; never fires callbacks.
    Internal,
}

/// Acknowledgement returned by every successful update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Commit {
    /// Parameter that was written.
    pub id: ParamId,
    /// Value actually stored, after clamping.
    pub value: f32,
    /// Whether the requested value was outside the declared range.
    pub clamped: bool,
    /// Where the update came from.
    pub context: UpdateContext,
}

impl Commit {
    /// Whether this commit should trigger post-update callbacks.
    pub fn fires_callbacks(&self) -> bool {
        self.context != UpdateContext::Internal
    }
}

/// A named, ordered list of `(id, value)` pairs covering a whole parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetSnapshot {
    /// Display name.
    pub name: &'static str,
    /// One entry per parameter id.
    pub values: &'static [(ParamId, f32)],
}

/// Pending-value table shared between [`ParamHandle`]s and the store.
#[derive(Debug)]
struct ParamTable {
    descriptors: &'static [ParamDescriptor],
    /// `(id, slot)` sorted by id for allocation-free lookup.
    index: Vec<(ParamId, usize)>,
    pending: Vec<AtomicU32>,
}

impl ParamTable {
    fn new(descriptors: &'static [ParamDescriptor]) -> Self {
        let mut index: Vec<(ParamId, usize)> = descriptors
            .iter()
            .enumerate()
            .map(|(slot, desc)| (desc.id, slot))
            .collect();
        index.sort_unstable_by_key(|&(id, _)| id);
        debug_assert!(
            index.windows(2).all(|w| w[0].0 != w[1].0),
            "duplicate parameter id in declaration list"
        );

        let pending = descriptors
            .iter()
            .map(|desc| AtomicU32::new(desc.clamp(desc.default).to_bits()))
            .collect();

        Self {
            descriptors,
            index,
            pending,
        }
    }

    #[inline]
    fn slot(&self, id: ParamId) -> Option<usize> {
        self.index
            .binary_search_by_key(&id, |&(id, _)| id)
            .ok()
            .map(|pos| self.index[pos].1)
    }

    fn write(&self, id: ParamId, raw: f32, context: UpdateContext) -> Result<Commit, ParamError> {
        let slot = self.slot(id).ok_or(ParamError::InvalidParameterId(id))?;
        let desc = &self.descriptors[slot];
        let value = desc.clamp(raw);
        self.pending[slot].store(value.to_bits(), Ordering::Release);
        Ok(Commit {
            id,
            value,
            clamped: !(desc.min..=desc.max).contains(&raw),
            context,
        })
    }

    fn write_normalized(
        &self,
        id: ParamId,
        normalized: f32,
        apply_taper: bool,
        context: UpdateContext,
    ) -> Result<Commit, ParamError> {
        let slot = self.slot(id).ok_or(ParamError::InvalidParameterId(id))?;
        let desc = &self.descriptors[slot];
        let raw = if apply_taper {
            desc.denormalize(normalized)
        } else {
            let n = normalized.clamp(0.0, 1.0);
            desc.min + n * (desc.max - desc.min)
        };
        self.write(id, raw, context)
    }

    #[inline]
    fn pending(&self, slot: usize) -> f32 {
        f32::from_bits(self.pending[slot].load(Ordering::Acquire))
    }

    fn validate(&self, preset: &PresetSnapshot) -> Result<(), PresetError> {
        if let Some(&(id, _)) = preset.values.iter().find(|(id, _)| self.slot(*id).is_none()) {
            return Err(PresetError::UnknownParameter {
                preset: preset.name,
                id,
            });
        }
        if let Some(desc) = self
            .descriptors
            .iter()
            .find(|desc| !preset.values.iter().any(|(id, _)| *id == desc.id))
        {
            return Err(PresetError::MissingParameter {
                preset: preset.name,
                id: desc.id,
            });
        }
        Ok(())
    }

    fn apply_preset(&self, preset: &PresetSnapshot) -> Result<usize, PresetError> {
        self.validate(preset)?;
        for &(id, value) in preset.values {
            // Validated above, so every id resolves.
            let _ = self.write(id, value, UpdateContext::PresetLoad);
        }
        Ok(preset.values.len())
    }
}

/// Cloneable, thread-safe writer into a store's pending table.
///
/// Hand one to the control thread (GUI, host automation callback). Its writes
/// become visible to processing at the next block boundary.
#[derive(Debug, Clone)]
pub struct ParamHandle {
    table: Arc<ParamTable>,
}

impl ParamHandle {
    /// Clamp and commit a plain value.
    pub fn update_parameter(
        &self,
        id: ParamId,
        raw: f32,
        context: UpdateContext,
    ) -> Result<Commit, ParamError> {
        self.table.write(id, raw, context)
    }

    /// Map a normalized value through the taper (or linearly) and commit it.
    pub fn update_parameter_normalized(
        &self,
        id: ParamId,
        normalized: f32,
        apply_taper: bool,
        context: UpdateContext,
    ) -> Result<Commit, ParamError> {
        self.table
            .write_normalized(id, normalized, apply_taper, context)
    }

    /// Validate and bulk-write a preset.
    pub fn apply_preset(&self, preset: &PresetSnapshot) -> Result<usize, PresetError> {
        self.table.apply_preset(preset)
    }

    /// Most recently committed value, which may not be synced yet.
    pub fn pending_value(&self, id: ParamId) -> Option<f32> {
        self.table.slot(id).map(|slot| self.table.pending(slot))
    }

    /// Declaration list this handle writes into.
    pub fn descriptors(&self) -> &'static [ParamDescriptor] {
        self.table.descriptors
    }
}

/// Audio-side parameter snapshot with per-sample smoothing.
#[derive(Debug)]
pub struct ParameterStore {
    table: Arc<ParamTable>,
    bound: Vec<LinearRamp>,
    /// Cleared by `reset`; the first sync afterwards snaps instead of ramping.
    primed: bool,
    /// Set while any ramp is in flight, so idle samples skip the ramp loop.
    ramping: bool,
    last_advanced: Option<u64>,
}

impl ParameterStore {
    /// Build a store from a static declaration list, every slot at its default.
    ///
    /// Allocates; call from the control thread.
    pub fn new(descriptors: &'static [ParamDescriptor]) -> Self {
        let table = Arc::new(ParamTable::new(descriptors));
        let bound = (0..descriptors.len())
            .map(|slot| LinearRamp::new(table.pending(slot)))
            .collect();
        Self {
            table,
            bound,
            primed: false,
            ramping: false,
            last_advanced: None,
        }
    }

    /// A control-thread handle sharing this store's pending table.
    pub fn handle(&self) -> ParamHandle {
        ParamHandle {
            table: Arc::clone(&self.table),
        }
    }

    /// Declaration list.
    pub fn descriptors(&self) -> &'static [ParamDescriptor] {
        self.table.descriptors
    }

    /// Descriptor for `id`.
    pub fn descriptor(&self, id: ParamId) -> Option<&'static ParamDescriptor> {
        let descriptors = self.table.descriptors;
        self.table.slot(id).map(|slot| &descriptors[slot])
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    /// Whether the declaration list is empty.
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Clamp and commit a plain value. Visible after the next sync.
    pub fn update_parameter(
        &self,
        id: ParamId,
        raw: f32,
        context: UpdateContext,
    ) -> Result<Commit, ParamError> {
        self.table.write(id, raw, context)
    }

    /// Map a normalized value through the taper (or linearly) and commit it.
    pub fn update_parameter_normalized(
        &self,
        id: ParamId,
        normalized: f32,
        apply_taper: bool,
        context: UpdateContext,
    ) -> Result<Commit, ParamError> {
        self.table
            .write_normalized(id, normalized, apply_taper, context)
    }

    /// Validate a preset against the active set, then bulk-write it.
    ///
    /// Returns the number of values written. Nothing is written if the preset
    /// is partial or names an unknown id.
    pub fn apply_preset(&self, preset: &PresetSnapshot) -> Result<usize, PresetError> {
        self.table.apply_preset(preset)
    }

    /// Re-time every ramp for `sample_rate` and arm snap-on-next-sync.
    ///
    /// Allocation-free; safe to call again on a sample-rate change.
    pub fn reset(&mut self, sample_rate: f32) {
        for (ramp, desc) in self.bound.iter_mut().zip(self.table.descriptors) {
            ramp.set_duration(sample_rate, desc.smoothing_ms);
        }
        self.primed = false;
        self.ramping = false;
        self.last_advanced = None;
        #[cfg(feature = "tracing")]
        tracing::debug!(sample_rate, params = self.bound.len(), "parameter store reset");
    }

    /// Take the block snapshot: copy every pending value into the bound table.
    ///
    /// Call exactly once per block, before any per-sample work. Smoothed
    /// controls start a ramp toward the new value; everything else switches
    /// immediately. Returns `true` if any bound target changed.
    pub fn sync_bound_variables(&mut self) -> bool {
        let mut changed = false;
        for (slot, ramp) in self.bound.iter_mut().enumerate() {
            let pending = self.table.pending(slot);
            if !self.primed {
                changed |= ramp.value() != pending;
                ramp.snap(pending);
            } else if pending != ramp.target() {
                ramp.retarget(pending);
                self.ramping |= ramp.is_active();
                changed = true;
            }
        }
        self.primed = true;
        changed
    }

    /// Advance every in-flight ramp by one sample.
    ///
    /// `sample_index` identifies the frame; a repeated index is ignored so a
    /// double call can never stretch or shorten a ramp. Returns `true` if any
    /// bound value moved on this call.
    pub fn advance_smoothing(&mut self, sample_index: u64) -> bool {
        if self.last_advanced == Some(sample_index) || !self.ramping {
            self.last_advanced = Some(sample_index);
            return false;
        }
        self.last_advanced = Some(sample_index);

        let mut still_ramping = false;
        for ramp in &mut self.bound {
            if ramp.is_active() {
                ramp.advance();
                still_ramping |= ramp.is_active();
            }
        }
        self.ramping = still_ramping;
        true
    }

    /// Whether any smoothing ramp is in flight.
    pub fn is_smoothing(&self) -> bool {
        self.ramping
    }

    /// Bound value of `id` as of the last sync or smoothing step.
    ///
    /// Unknown ids read as `0.0` (and assert in debug builds).
    #[inline]
    pub fn value(&self, id: ParamId) -> f32 {
        match self.table.slot(id) {
            Some(slot) => self.bound[slot].value(),
            None => {
                debug_assert!(false, "read of unknown parameter id {id}");
                0.0
            }
        }
    }

    /// Bound value by declaration-order slot.
    #[inline]
    pub fn value_at(&self, slot: usize) -> f32 {
        self.bound.get(slot).map_or(0.0, LinearRamp::value)
    }

    /// Bound value read as decibels and cooked to linear gain.
    #[inline]
    pub fn gain(&self, id: ParamId) -> f32 {
        db_to_linear(self.value(id))
    }

    /// Bound value read as a percentage and cooked to a fraction.
    #[inline]
    pub fn fraction(&self, id: ParamId) -> f32 {
        percent_to_fraction(self.value(id))
    }

    /// Bound value decoded into a closed enumeration.
    #[inline]
    pub fn choice<E: ParamEnum>(&self, id: ParamId) -> E {
        E::from_value(self.value(id))
    }

    /// Bound value of an on/off switch.
    #[inline]
    pub fn is_on(&self, id: ParamId) -> bool {
        self.choice::<bool>(id)
    }

    /// Target of `id`'s ramp, i.e. the synced value before smoothing.
    pub fn target(&self, id: ParamId) -> Option<f32> {
        self.table.slot(id).map(|slot| self.bound[slot].target())
    }

    /// Most recently committed value, which may not be synced yet.
    pub fn pending_value(&self, id: ParamId) -> Option<f32> {
        self.table.slot(id).map(|slot| self.table.pending(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lfo::OscillatorWaveform;

    const GAIN: ParamId = ParamId(2);
    const DEPTH: ParamId = ParamId(3);
    const WAVE: ParamId = ParamId(7);
    const FREQ: ParamId = ParamId(4);

    static PARAMS: [ParamDescriptor; 4] = [
        ParamDescriptor::gain_db("Output Gain", "Out", -24.0, 12.0, 0.0)
            .with_id(GAIN, "outgain")
            .with_smoothing(10.0),
        ParamDescriptor::percent("Depth", "Depth", 0.0).with_id(DEPTH, "pandepth"),
        ParamDescriptor::choice("Waveform", "Wave", OscillatorWaveform::LABELS, 0)
            .with_id(WAVE, "panwave"),
        ParamDescriptor::frequency_hz("Frequency", "Freq", 0.02, 5.0, 1.0).with_id(FREQ, "panfreq"),
    ];

    static FULL: PresetSnapshot = PresetSnapshot {
        name: "Full",
        values: &[(GAIN, -6.0), (DEPTH, 50.0), (WAVE, 2.0), (FREQ, 2.0)],
    };

    static PARTIAL: PresetSnapshot = PresetSnapshot {
        name: "Partial",
        values: &[(GAIN, -6.0), (DEPTH, 50.0)],
    };

    fn store() -> ParameterStore {
        let mut store = ParameterStore::new(&PARAMS);
        store.reset(48000.0);
        store.sync_bound_variables();
        store
    }

    #[test]
    fn defaults_are_bound_at_construction() {
        let store = store();
        assert_eq!(store.value(GAIN), 0.0);
        assert_eq!(store.value(FREQ), 1.0);
        assert_eq!(store.choice::<OscillatorWaveform>(WAVE), OscillatorWaveform::Sine);
    }

    #[test]
    fn unknown_id_is_rejected_without_side_effects() {
        let mut store = store();
        let err = store
            .update_parameter(ParamId(99), 1.0, UpdateContext::Automation)
            .unwrap_err();
        assert_eq!(err, ParamError::InvalidParameterId(ParamId(99)));
        assert!(!store.sync_bound_variables());
    }

    #[test]
    fn out_of_range_is_clamped_silently() {
        let mut store = store();
        let commit = store
            .update_parameter(DEPTH, 250.0, UpdateContext::Automation)
            .unwrap();
        assert!(commit.clamped);
        assert_eq!(commit.value, 100.0);
        store.sync_bound_variables();
        assert_eq!(store.value(DEPTH), 100.0);
    }

    #[test]
    fn updates_invisible_until_sync() {
        let mut store = store();
        store
            .update_parameter(DEPTH, 40.0, UpdateContext::Automation)
            .unwrap();
        assert_eq!(store.value(DEPTH), 0.0);
        assert_eq!(store.pending_value(DEPTH), Some(40.0));
        assert!(store.sync_bound_variables());
        assert_eq!(store.value(DEPTH), 40.0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn handle_writes_reach_the_store() {
        let mut store = store();
        let handle = store.handle();
        let writer = std::thread::spawn(move || {
            handle
                .update_parameter(DEPTH, 75.0, UpdateContext::Automation)
                .unwrap()
        });
        let commit = writer.join().unwrap();
        assert_eq!(commit.value, 75.0);
        store.sync_bound_variables();
        assert_eq!(store.fraction(DEPTH), 0.75);
    }

    #[test]
    fn smoothed_parameter_ramps_over_declared_time() {
        let mut store = store();
        store
            .update_parameter(GAIN, -12.0, UpdateContext::Automation)
            .unwrap();
        store.sync_bound_variables();
        assert!(store.is_smoothing());
        assert_eq!(store.value(GAIN), 0.0);

        // 10 ms at 48 kHz
        for n in 0..480 {
            assert!(store.advance_smoothing(n));
        }
        assert_eq!(store.value(GAIN), -12.0);
        assert!(!store.is_smoothing());
        assert!(!store.advance_smoothing(480));
    }

    #[test]
    fn repeated_sample_index_does_not_advance() {
        let mut store = store();
        store
            .update_parameter(GAIN, -12.0, UpdateContext::Automation)
            .unwrap();
        store.sync_bound_variables();

        store.advance_smoothing(0);
        let after_one = store.value(GAIN);
        assert!(!store.advance_smoothing(0));
        assert_eq!(store.value(GAIN), after_one);
    }

    #[test]
    fn first_sync_after_reset_snaps() {
        let mut store = store();
        store
            .update_parameter(GAIN, 6.0, UpdateContext::Automation)
            .unwrap();
        store.reset(44100.0);
        store.sync_bound_variables();
        assert_eq!(store.value(GAIN), 6.0);
        assert!(!store.is_smoothing());
    }

    #[test]
    fn normalized_update_applies_taper() {
        let mut store = store();
        let commit = store
            .update_parameter_normalized(FREQ, 0.5, true, UpdateContext::Automation)
            .unwrap();
        let expected = libm::sqrtf(0.02 * 5.0);
        assert!((commit.value - expected).abs() < 1e-4);

        let linear = store
            .update_parameter_normalized(FREQ, 0.5, false, UpdateContext::Automation)
            .unwrap();
        assert!((linear.value - (0.02 + 0.5 * 4.98)).abs() < 1e-4);

        store.sync_bound_variables();
        assert_eq!(store.value(FREQ), linear.value);
    }

    #[test]
    fn reapplying_same_value_is_a_no_op() {
        let mut store = store();
        store
            .update_parameter(DEPTH, 30.0, UpdateContext::Automation)
            .unwrap();
        assert!(store.sync_bound_variables());
        store
            .update_parameter(DEPTH, 30.0, UpdateContext::Automation)
            .unwrap();
        assert!(!store.sync_bound_variables());
    }

    #[test]
    fn internal_commits_do_not_fire_callbacks() {
        let store = store();
        let internal = store
            .update_parameter(DEPTH, 10.0, UpdateContext::Internal)
            .unwrap();
        let preset = store
            .update_parameter(DEPTH, 10.0, UpdateContext::PresetLoad)
            .unwrap();
        assert!(!internal.fires_callbacks());
        assert!(preset.fires_callbacks());
    }

    #[test]
    fn full_preset_applies_every_value() {
        let mut store = store();
        assert_eq!(store.apply_preset(&FULL), Ok(4));
        store.reset(48000.0);
        store.sync_bound_variables();
        assert_eq!(store.value(GAIN), -6.0);
        assert_eq!(store.choice::<OscillatorWaveform>(WAVE), OscillatorWaveform::Saw);
    }

    #[test]
    fn partial_preset_is_rejected_before_writing() {
        let mut store = store();
        let err = store.apply_preset(&PARTIAL).unwrap_err();
        assert_eq!(
            err,
            PresetError::MissingParameter {
                preset: "Partial",
                id: WAVE
            }
        );
        assert!(!store.sync_bound_variables());
        assert_eq!(store.value(GAIN), 0.0);
    }

    #[test]
    fn gain_is_cooked_from_decibels() {
        let mut store = store();
        store.reset(48000.0);
        store
            .update_parameter(GAIN, -6.0, UpdateContext::Automation)
            .unwrap();
        store.sync_bound_variables();
        assert!((store.gain(GAIN) - libm::powf(10.0, -6.0 / 20.0)).abs() < 1e-6);
    }
}
