//! Deterministic noise for tape hiss and random delay drift.

use crate::one_pole::OnePole;

const SEED: u32 = 0x1234_5678;

/// Uniform white noise in `[-1, 1)` from a 32-bit LCG.
///
/// Numerical Recipes constants (`a = 1664525`, `c = 1013904223`); only the
/// upper 16 bits of the state are used. Fully deterministic after
/// [`reset`](Self::reset), so renders are repeatable.
#[derive(Debug, Clone)]
pub struct WhiteNoise {
    state: u32,
}

impl WhiteNoise {
    /// Generator at the fixed seed.
    pub const fn new() -> Self {
        Self { state: SEED }
    }

    /// Return to the fixed seed.
    pub fn reset(&mut self) {
        self.state = SEED;
    }

    /// Next sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        let upper = (self.state >> 16) as u16;
        f32::from(upper) / 32_768.0 - 1.0
    }
}

impl Default for WhiteNoise {
    fn default() -> Self {
        Self::new()
    }
}

/// White noise through a one-pole lowpass, then scaled.
#[derive(Debug, Clone)]
pub struct FilteredNoise {
    noise: WhiteNoise,
    filter: OnePole,
    gain: f32,
}

impl FilteredNoise {
    /// Noise coloured at `cutoff` Hz with unity gain.
    pub fn new(sample_rate: f32, cutoff: f32) -> Self {
        Self {
            noise: WhiteNoise::new(),
            filter: OnePole::new(sample_rate, cutoff),
            gain: 1.0,
        }
    }

    /// Move the lowpass cutoff.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.filter.set_cutoff(cutoff);
    }

    /// Set the linear output gain.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    /// Reseed and clear the filter.
    pub fn reset(&mut self, sample_rate: f32) {
        self.noise.reset();
        self.filter.reset(sample_rate);
    }

    /// Next sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.filter.process(self.noise.next_sample()) * self.gain
    }
}
