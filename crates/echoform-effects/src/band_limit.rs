//! Band-limit filter: a highpass and a lowpass in series.
//!
//! Narrows the tape record path to the band a worn head actually passes.

use echoform_core::{Biquad, Coefficients, EffectStage, StageLifecycle, StageState};

/// Cooked corner frequencies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLimitConfig {
    /// Highpass corner in Hz.
    pub highpass_hz: f32,
    /// Lowpass corner in Hz.
    pub lowpass_hz: f32,
}

impl Default for BandLimitConfig {
    fn default() -> Self {
        Self {
            highpass_hz: 20.0,
            lowpass_hz: 20000.0,
        }
    }
}

/// Second-order Butterworth highpass followed by a second-order Butterworth
/// lowpass.
#[derive(Debug, Clone, Default)]
pub struct BandLimit {
    highpass: Biquad,
    lowpass: Biquad,
    config: BandLimitConfig,
    lifecycle: StageLifecycle,
}

const BUTTERWORTH_Q: f32 = core::f32::consts::FRAC_1_SQRT_2;

impl BandLimit {
    /// Band-limit with `config`, awaiting `reset`.
    pub fn new(config: BandLimitConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    fn update_coefficients(&mut self) {
        if !self.lifecycle.is_ready() {
            return;
        }
        let sr = self.lifecycle.sample_rate();
        self.highpass.set_coefficients(Coefficients::highpass(
            self.config.highpass_hz,
            BUTTERWORTH_Q,
            sr,
        ));
        self.lowpass.set_coefficients(Coefficients::lowpass(
            self.config.lowpass_hz,
            BUTTERWORTH_Q,
            sr,
        ));
    }
}

impl EffectStage for BandLimit {
    type Config = BandLimitConfig;

    fn configure(&mut self, config: &BandLimitConfig) {
        if *config != self.config {
            self.config = *config;
            self.update_coefficients();
        }
    }

    fn reset(&mut self, sample_rate: f32) {
        self.lifecycle.reset(sample_rate);
        self.highpass.clear();
        self.lowpass.clear();
        self.update_coefficients();
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        self.lifecycle.enter_streaming();
        self.lowpass.process(self.highpass.process(input))
    }

    fn state(&self) -> StageState {
        self.lifecycle.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady_peak(stage: &mut BandLimit, freq: f32) -> f32 {
        let sr = 48000.0;
        let mut peak = 0.0f32;
        for n in 0..19200 {
            let x = libm::sinf(core::f32::consts::TAU * freq * n as f32 / sr);
            let y = stage.process_sample(x);
            if n > 9600 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn passes_midband_rejects_edges() {
        let mut stage = BandLimit::new(BandLimitConfig {
            highpass_hz: 300.0,
            lowpass_hz: 8000.0,
        });
        stage.reset(48000.0);
        assert!(steady_peak(&mut stage, 1500.0) > 0.95);
        stage.reset(48000.0);
        assert!(steady_peak(&mut stage, 30.0) < 0.02);
        stage.reset(48000.0);
        assert!(steady_peak(&mut stage, 20000.0) < 0.3);
    }
}
