//! Phase-accumulating oscillator used for every modulation source.
//!
//! The oscillator keeps its phase in turns (0.0 to 1.0). Each call to
//! [`Oscillator::render`] looks up the waveform at the current phase and then
//! advances it by `f / sample_rate`, so the very first value after
//! [`Oscillator::reset`] is the waveform at phase zero.
//!
//! Both polarities are computed on every sample and handed back together in
//! a [`ModulationOutput`]. Flipping [`Polarity`] mid-stream is a plain
//! selection and never disturbs the phase.

use core::f32::consts::TAU;
use libm::sinf;

use crate::param_info::ParamEnum;
use crate::tempo::{NoteDivision, TempoClock};

/// Oscillator waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OscillatorWaveform {
    /// `sin(2π·phase)`, starts at 0.
    #[default]
    Sine,
    /// Piecewise-linear, starts at -1 and peaks at +1 halfway.
    Triangle,
    /// Rising ramp from -1 to +1, drops back at the wrap.
    Saw,
}

impl ParamEnum for OscillatorWaveform {
    const LABELS: &'static [&'static str] = &["Sine", "Triangle", "Saw"];

    fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Sine),
            1 => Some(Self::Triangle),
            2 => Some(Self::Saw),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Which side of a [`ModulationOutput`] a consumer reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Polarity {
    /// The raw waveform.
    #[default]
    Normal,
    /// The negated waveform.
    Inverted,
}

impl Polarity {
    /// Decode an "invert" switch.
    #[inline]
    pub fn from_inverted(inverted: bool) -> Self {
        if inverted {
            Self::Inverted
        } else {
            Self::Normal
        }
    }
}

/// One oscillator sample in both polarities.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModulationOutput {
    /// Waveform value in `[-1, 1]`.
    pub normal: f32,
    /// `-normal`.
    pub inverted: f32,
}

impl ModulationOutput {
    /// Wrap a raw waveform value.
    #[inline]
    pub fn new(normal: f32) -> Self {
        Self {
            normal,
            inverted: -normal,
        }
    }

    /// Pick one polarity.
    #[inline]
    pub fn select(self, polarity: Polarity) -> f32 {
        match polarity {
            Polarity::Normal => self.normal,
            Polarity::Inverted => self.inverted,
        }
    }
}

/// Where an oscillator takes its rate from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrequencySource {
    /// Fixed rate in Hz.
    Free(f32),
    /// One cycle per note division at the clock's tempo.
    Synced(NoteDivision),
}

impl FrequencySource {
    /// Choose between a free rate and a synced division from a sync switch.
    #[inline]
    pub fn from_sync(sync: bool, free_hz: f32, division: NoteDivision) -> Self {
        if sync {
            Self::Synced(division)
        } else {
            Self::Free(free_hz)
        }
    }

    /// Rate in Hz, resolved against `clock` when synced.
    #[inline]
    pub fn resolve(self, clock: &TempoClock) -> f32 {
        match self {
            Self::Free(hz) => hz,
            Self::Synced(division) => clock.rate_hz(division),
        }
    }
}

impl Default for FrequencySource {
    fn default() -> Self {
        Self::Free(1.0)
    }
}

/// Phase-accumulating oscillator.
///
/// # Example
///
/// ```rust
/// use echoform_core::{Oscillator, OscillatorWaveform, Polarity};
///
/// let mut osc = Oscillator::new(48000.0, 375.0); // period of 128 samples
/// osc.set_waveform(OscillatorWaveform::Triangle);
///
/// let first = osc.render();
/// assert_eq!(first.normal, -1.0);
/// assert_eq!(first.select(Polarity::Inverted), 1.0);
///
/// for _ in 1..128 {
///     osc.render();
/// }
/// assert_eq!(osc.render().normal, -1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    phase: f32,
    phase_inc: f32,
    frequency: f32,
    sample_rate: f32,
    waveform: OscillatorWaveform,
}

impl Oscillator {
    /// Sine oscillator at `frequency` Hz, phase zero.
    pub fn new(sample_rate: f32, frequency: f32) -> Self {
        let mut osc = Self {
            phase: 0.0,
            phase_inc: 0.0,
            frequency,
            sample_rate,
            waveform: OscillatorWaveform::Sine,
        };
        osc.update_increment();
        osc
    }

    fn update_increment(&mut self) {
        self.phase_inc = if self.sample_rate > 0.0 {
            (self.frequency / self.sample_rate).clamp(0.0, 0.5)
        } else {
            0.0
        };
    }

    /// Set the rate in Hz. Negative rates are treated as zero, rates past
    /// Nyquist as Nyquist.
    #[inline]
    pub fn set_frequency(&mut self, frequency: f32) {
        if frequency != self.frequency {
            self.frequency = frequency;
            self.update_increment();
        }
    }

    /// Current rate in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Set the waveform. Takes effect on the next sample; phase is kept.
    #[inline]
    pub fn set_waveform(&mut self, waveform: OscillatorWaveform) {
        self.waveform = waveform;
    }

    /// Current waveform.
    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    /// Rewind to phase zero at a new sample rate.
    pub fn reset(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.phase = 0.0;
        self.update_increment();
    }

    /// Jump to `phase` (in turns, wrapped into `[0, 1)`).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase - libm::floorf(phase);
    }

    /// Current phase in turns.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Waveform value at the current phase, without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        let p = self.phase;
        match self.waveform {
            OscillatorWaveform::Sine => sinf(p * TAU),
            OscillatorWaveform::Triangle => {
                if p < 0.5 {
                    4.0 * p - 1.0
                } else {
                    3.0 - 4.0 * p
                }
            }
            OscillatorWaveform::Saw => 2.0 * p - 1.0,
        }
    }

    /// Look up the current sample, then advance the phase.
    #[inline]
    pub fn render(&mut self) -> ModulationOutput {
        let out = ModulationOutput::new(self.value());
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(48000.0, 1.0)
    }
}
