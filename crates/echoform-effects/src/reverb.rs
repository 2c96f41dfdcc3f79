//! Reverb tank: pre-delay, parallel damped combs, series allpasses.
//!
//! A Freeverb-style structure. The longest comb loop is set by the tank size
//! and the others keep Freeverb's mutually prime proportions, so one control
//! stretches the whole tank. The right channel runs its own combs, each a
//! few samples longer, for decorrelation.
//!
//! # Signal Flow
//!
//! ```text
//!           ┌─ comb ×N (Thin: 4, Thick: 8) ─┐
//! x → pre ──┤                               ├─ Σ/N → allpass ×4 → wet
//!           └───────────────────────────────┘
//! y = x·dry + wet·wet_gain
//! ```

use echoform_core::{
    AllpassFilter, CombFilter, DelayLine, EffectStage, Frame, SmoothedParam, StageLifecycle,
    StageState, StereoStage, db_to_linear, ms_to_samples,
};

/// Freeverb comb lengths at 44.1 kHz, used here as proportions.
const COMB_TUNINGS_44K: [f32; 8] = [1116.0, 1188.0, 1277.0, 1356.0, 1422.0, 1491.0, 1557.0, 1617.0];

/// Freeverb allpass lengths at 44.1 kHz.
const ALLPASS_TUNINGS_44K: [usize; 4] = [556, 441, 341, 225];

/// Freeverb's right-channel offset at 44.1 kHz.
const STEREO_SPREAD_44K: f32 = 23.0;

const REFERENCE_RATE: f32 = 44100.0;

/// Longest pre-delay.
pub const MAX_PRE_DELAY_MS: f32 = 500.0;

/// Longest comb loop the tank is allocated for.
pub const MAX_TANK_MS: f32 = 250.0;

/// Shortest comb loop.
const MIN_TANK_MS: f32 = 1.0;

/// How many combs run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReverbDensity {
    /// Four combs: sparser, more audible echoes.
    Thin,
    /// All eight combs.
    #[default]
    Thick,
}

impl ReverbDensity {
    /// Number of active combs per channel.
    pub const fn comb_count(self) -> usize {
        match self {
            ReverbDensity::Thin => 4,
            ReverbDensity::Thick => 8,
        }
    }
}

/// Cooked reverb settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbTankConfig {
    /// Gap before the tank, in ms.
    pub pre_delay_ms: f32,
    /// Longest comb loop in ms; the rest scale with it.
    pub tank_size_ms: f32,
    /// Comb loop gain, 0 to 1. Higher is a longer tail.
    pub rt: f32,
    /// High-frequency damping inside the loops, 0 to 1.
    pub damping: f32,
    /// Comb count.
    pub density: ReverbDensity,
    /// Dry level in dB.
    pub dry_db: f32,
    /// Wet level in dB.
    pub wet_db: f32,
}

impl Default for ReverbTankConfig {
    fn default() -> Self {
        Self {
            pre_delay_ms: 0.0,
            tank_size_ms: 50.0,
            rt: 0.5,
            damping: 0.3,
            density: ReverbDensity::Thick,
            dry_db: 0.0,
            wet_db: -6.0,
        }
    }
}

/// One channel of the tank.
#[derive(Debug, Clone, Default)]
struct TankChannel {
    combs: [CombFilter; 8],
    allpasses: [AllpassFilter; 4],
}

impl TankChannel {
    fn allocate(&mut self, sample_rate: f32, spread: f32) {
        let max = ms_to_samples(MAX_TANK_MS, sample_rate) + spread;
        for comb in &mut self.combs {
            comb.allocate(libm::ceilf(max) as usize, sample_rate);
        }
        for (allpass, &tuning) in self.allpasses.iter_mut().zip(&ALLPASS_TUNINGS_44K) {
            let len = libm::roundf(tuning as f32 * sample_rate / REFERENCE_RATE) as usize;
            allpass.allocate(len.max(1), sample_rate);
            allpass.set_feedback(0.5);
        }
    }

    fn tune(&mut self, config: &ReverbTankConfig, sample_rate: f32, spread: f32) {
        let longest = ms_to_samples(
            config.tank_size_ms.clamp(MIN_TANK_MS, MAX_TANK_MS),
            sample_rate,
        );
        let feedback = config.rt.clamp(0.0, 0.98);
        for (comb, &tuning) in self.combs.iter_mut().zip(&COMB_TUNINGS_44K) {
            let len = longest * tuning / COMB_TUNINGS_44K[7] + spread;
            comb.set_delay_samples(libm::roundf(len) as usize);
            comb.set_feedback(feedback);
            comb.set_damp(config.damping);
        }
    }

    fn clear(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::clear);
        self.allpasses.iter_mut().for_each(AllpassFilter::clear);
    }

    #[inline]
    fn process(&mut self, input: f32, active: usize) -> f32 {
        let mut sum = 0.0;
        // Thin runs the longest four; the rest keep their state frozen
        for comb in &mut self.combs[8 - active..] {
            sum += comb.process(input);
        }
        let mut diffused = sum / active as f32;
        for allpass in &mut self.allpasses {
            diffused = allpass.process(diffused);
        }
        diffused
    }
}

/// Stereo reverb tank.
///
/// # Example
///
/// ```rust
/// use echoform_core::{EffectStage, Frame, StereoStage};
/// use echoform_effects::{ReverbTank, ReverbTankConfig};
///
/// let mut verb = ReverbTank::new(ReverbTankConfig {
///     dry_db: -120.0,
///     wet_db: 0.0,
///     ..ReverbTankConfig::default()
/// });
/// verb.reset(48000.0);
///
/// verb.process_frame(Frame::mono(1.0));
/// let tail: f32 = (0..48000).map(|_| verb.process_frame(Frame::SILENCE).left.abs()).sum();
/// assert!(tail > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct ReverbTank {
    config: ReverbTankConfig,
    pre_delay: [DelayLine; 2],
    pre_delay_samples: SmoothedParam,
    left: TankChannel,
    right: TankChannel,
    dry: f32,
    wet: f32,
    lifecycle: StageLifecycle,
}

impl ReverbTank {
    /// Tank with `config`. Buffers are allocated in `reset`.
    pub fn new(config: ReverbTankConfig) -> Self {
        Self {
            config,
            pre_delay: [DelayLine::new(), DelayLine::new()],
            pre_delay_samples: SmoothedParam::new(0.0),
            left: TankChannel::default(),
            right: TankChannel::default(),
            dry: db_to_linear(config.dry_db),
            wet: db_to_linear(config.wet_db),
            lifecycle: StageLifecycle::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ReverbTankConfig {
        &self.config
    }

    fn spread(&self) -> f32 {
        STEREO_SPREAD_44K * self.lifecycle.sample_rate() / REFERENCE_RATE
    }

    fn retune(&mut self) {
        if !self.lifecycle.is_ready() {
            return;
        }
        let sr = self.lifecycle.sample_rate();
        let spread = self.spread();
        self.left.tune(&self.config, sr, 0.0);
        self.right.tune(&self.config, sr, spread);
        let pre = ms_to_samples(self.config.pre_delay_ms.clamp(0.0, MAX_PRE_DELAY_MS), sr);
        self.pre_delay_samples.set_target(pre);
    }

    #[inline]
    fn advance_pre_delay(&mut self) -> f32 {
        self.lifecycle.enter_streaming();
        self.pre_delay_samples.advance()
    }
}

impl Default for ReverbTank {
    fn default() -> Self {
        Self::new(ReverbTankConfig::default())
    }
}

impl EffectStage for ReverbTank {
    type Config = ReverbTankConfig;

    fn configure(&mut self, config: &ReverbTankConfig) {
        if *config == self.config {
            return;
        }
        self.dry = db_to_linear(config.dry_db);
        self.wet = db_to_linear(config.wet_db);
        self.config = *config;
        self.retune();
    }

    fn reset(&mut self, sample_rate: f32) {
        self.lifecycle.reset(sample_rate);
        for line in &mut self.pre_delay {
            line.allocate(MAX_PRE_DELAY_MS, sample_rate);
        }
        let spread = self.spread();
        self.left.allocate(sample_rate, 0.0);
        self.right.allocate(sample_rate, spread);
        self.left.clear();
        self.right.clear();
        self.pre_delay_samples = SmoothedParam::with_config(0.0, sample_rate, 50.0);
        self.retune();
        self.pre_delay_samples.snap_to_target();
        #[cfg(feature = "tracing")]
        tracing::debug!(sample_rate, density = ?self.config.density, "reverb tank reset");
    }

    /// Left channel of a mono frame.
    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        let pre = self.advance_pre_delay();
        let delayed = self.pre_delay[0].write_then_read(input, pre);
        let wet = self.left.process(delayed, self.config.density.comb_count());
        input * self.dry + wet * self.wet
    }

    fn state(&self) -> StageState {
        self.lifecycle.state()
    }
}

impl StereoStage for ReverbTank {
    #[inline]
    fn process_frame(&mut self, frame: Frame) -> Frame {
        let pre = self.advance_pre_delay();
        let active = self.config.density.comb_count();
        let left = self.pre_delay[0].write_then_read(frame.left, pre);
        let right = self.pre_delay[1].write_then_read(frame.right, pre);
        Frame::new(
            frame.left * self.dry + self.left.process(left, active) * self.wet,
            frame.right * self.dry + self.right.process(right, active) * self.wet,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn wet_only(config: ReverbTankConfig) -> ReverbTank {
        let mut verb = ReverbTank::new(ReverbTankConfig {
            dry_db: -200.0,
            wet_db: 0.0,
            ..config
        });
        verb.reset(SR);
        verb
    }

    fn first_arrival(verb: &mut ReverbTank) -> Option<usize> {
        (0..SR as usize).find(|&n| {
            let x = if n == 0 { 1.0 } else { 0.0 };
            verb.process_sample(x).abs() > 1e-6
        })
    }

    #[test]
    fn tail_is_finite_and_persists() {
        let mut verb = wet_only(ReverbTankConfig {
            rt: 0.9,
            tank_size_ms: 60.0,
            ..ReverbTankConfig::default()
        });
        verb.process_sample(1.0);
        let mut late = 0.0f32;
        for n in 0..SR as usize {
            let y = verb.process_sample(0.0);
            assert!(y.is_finite());
            if n > 40000 {
                late = late.max(y.abs());
            }
        }
        assert!(late > 1e-6, "tail died: {late}");
    }

    #[test]
    fn pre_delay_shifts_first_arrival() {
        let mut direct = wet_only(ReverbTankConfig::default());
        let mut delayed = wet_only(ReverbTankConfig {
            pre_delay_ms: 100.0,
            ..ReverbTankConfig::default()
        });
        let a = first_arrival(&mut direct).unwrap_or(usize::MAX);
        let b = first_arrival(&mut delayed).unwrap_or(usize::MAX);
        assert_eq!(b - a, 4800);
    }

    #[test]
    fn tank_size_scales_loops() {
        let mut small = wet_only(ReverbTankConfig {
            tank_size_ms: 20.0,
            ..ReverbTankConfig::default()
        });
        let mut large = wet_only(ReverbTankConfig {
            tank_size_ms: 200.0,
            ..ReverbTankConfig::default()
        });
        let a = first_arrival(&mut small).unwrap_or(usize::MAX);
        let b = first_arrival(&mut large).unwrap_or(usize::MAX);
        assert!(b > a * 5, "small {a} large {b}");
    }

    #[test]
    fn dry_only_passes_input() {
        let mut verb = ReverbTank::new(ReverbTankConfig {
            dry_db: 0.0,
            wet_db: -200.0,
            ..ReverbTankConfig::default()
        });
        verb.reset(SR);
        for x in [0.5, -0.25, 1.0] {
            assert!((verb.process_sample(x) - x).abs() < 1e-6);
        }
    }

    #[test]
    fn reset_clears_tail() {
        let mut verb = wet_only(ReverbTankConfig::default());
        for _ in 0..2000 {
            verb.process_frame(Frame::mono(1.0));
        }
        verb.reset(SR);
        for _ in 0..2000 {
            let out = verb.process_frame(Frame::SILENCE);
            assert_eq!(out, Frame::SILENCE);
        }
    }

    #[test]
    fn stereo_channels_decorrelate() {
        let mut verb = wet_only(ReverbTankConfig::default());
        verb.process_frame(Frame::mono(1.0));
        let mut differs = false;
        for _ in 0..10000 {
            let out = verb.process_frame(Frame::SILENCE);
            differs |= (out.left - out.right).abs() > 1e-6;
        }
        assert!(differs);
    }

    #[test]
    fn thin_density_runs_fewer_combs() {
        assert_eq!(ReverbDensity::Thin.comb_count(), 4);
        let mut thin = wet_only(ReverbTankConfig {
            density: ReverbDensity::Thin,
            ..ReverbTankConfig::default()
        });
        let mut thick = wet_only(ReverbTankConfig::default());
        // Thin skips the shortest combs, so its first echo is later
        let a = first_arrival(&mut thin).unwrap_or(usize::MAX);
        let b = first_arrival(&mut thick).unwrap_or(usize::MAX);
        assert!(a > b);
    }
}
