//! One-pole smoothing filter.
//!
//! ```text
//! y[n] = x[n] + a · (y[n-1] - x[n]),    a = exp(-2π · fc / fs)
//! ```
//!
//! 6 dB/octave. The lowpass output colours noise sources and damps reverb
//! feedback; `x - lowpass` gives the matching first-order highpass.

use crate::math::flush_denormal;
use libm::expf;

/// One-pole lowpass with a complementary highpass tap.
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    cutoff: f32,
}

impl OnePole {
    /// Filter at `cutoff` Hz. A cutoff of zero holds the output at its last value.
    pub fn new(sample_rate: f32, cutoff: f32) -> Self {
        let mut filter = Self {
            state: 0.0,
            coeff: 0.0,
            sample_rate,
            cutoff,
        };
        filter.update_coeff();
        filter
    }

    fn update_coeff(&mut self) {
        self.coeff = if self.sample_rate > 0.0 {
            let fc = self.cutoff.clamp(0.0, self.sample_rate * 0.5);
            expf(-core::f32::consts::TAU * fc / self.sample_rate)
        } else {
            1.0
        };
    }

    /// Move the cutoff. State is kept.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        if cutoff != self.cutoff {
            self.cutoff = cutoff;
            self.update_coeff();
        }
    }

    /// Cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Clear state and re-derive the coefficient for `sample_rate`.
    pub fn reset(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.state = 0.0;
        self.update_coeff();
    }

    /// Lowpass one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal(input + self.coeff * (self.state - input));
        self.state
    }

    /// Highpass one sample (`input - lowpass`).
    #[inline]
    pub fn process_highpass(&mut self, input: f32) -> f32 {
        input - self.process(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_settles_on_dc() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        let mut out = 0.0;
        for _ in 0..4800 {
            out = lp.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-4, "got {out}");
    }

    #[test]
    fn highpass_removes_dc() {
        let mut hp = OnePole::new(48000.0, 20.0);
        let mut out = 1.0;
        for _ in 0..48000 {
            out = hp.process_highpass(1.0);
        }
        assert!(out.abs() < 1e-3, "got {out}");
    }

    #[test]
    fn nyquist_is_attenuated() {
        let mut lp = OnePole::new(48000.0, 100.0);
        let mut sum = 0.0f32;
        for i in 0..4800 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            sum += lp.process(x).abs();
        }
        assert!(sum / 4800.0 < 0.05);
    }

    #[test]
    fn zero_cutoff_holds_silence() {
        let mut lp = OnePole::new(48000.0, 0.0);
        assert_eq!(lp.process(1.0), 0.0);
    }

    #[test]
    fn reset_clears_state() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        lp.process(1.0);
        lp.reset(44100.0);
        assert_eq!(lp.process(0.0), 0.0);
    }
}
