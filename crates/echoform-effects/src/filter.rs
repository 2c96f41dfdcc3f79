//! Single-band biquad filter stage.
//!
//! One [`AudioFilter`] covers every EQ block in the channel strip: the fixed
//! 200 Hz first-order highpass, the two peaking bands and the air shelf. The
//! algorithm is a closed enum so a bad value cannot reach the coefficient
//! design.

use echoform_core::{Biquad, Coefficients, EffectStage, StageLifecycle, StageState};

/// Smallest Q handed to a design; a Q of zero has no bandwidth.
const MIN_Q: f32 = 0.1;

/// Filter response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterAlgorithm {
    /// First-order lowpass, 6 dB/octave.
    Lpf1,
    /// First-order highpass, 6 dB/octave.
    Hpf1,
    /// Second-order lowpass.
    #[default]
    Lpf2,
    /// Second-order highpass.
    Hpf2,
    /// Peaking bell around `frequency`.
    PeakingEq,
    /// Shelf below `frequency`.
    LowShelf,
    /// Shelf above `frequency`.
    HighShelf,
}

/// Cooked settings for an [`AudioFilter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    /// Response type.
    pub algorithm: FilterAlgorithm,
    /// Corner or centre frequency in Hz.
    pub frequency: f32,
    /// Resonance / bandwidth. Ignored by first-order and shelf designs.
    pub q: f32,
    /// Boost or cut in dB. Used by the peaking and shelf designs only.
    pub gain_db: f32,
}

impl FilterConfig {
    /// `algorithm` at `frequency` with Butterworth Q and no gain.
    pub const fn new(algorithm: FilterAlgorithm, frequency: f32) -> Self {
        Self {
            algorithm,
            frequency,
            q: core::f32::consts::FRAC_1_SQRT_2,
            gain_db: 0.0,
        }
    }

    /// Sets the Q.
    pub const fn with_q(mut self, q: f32) -> Self {
        self.q = q;
        self
    }

    /// Sets the boost/cut.
    pub const fn with_gain_db(mut self, gain_db: f32) -> Self {
        self.gain_db = gain_db;
        self
    }

    /// Coefficients for this configuration at `sample_rate`.
    pub fn coefficients(&self, sample_rate: f32) -> Coefficients {
        let q = self.q.max(MIN_Q);
        match self.algorithm {
            FilterAlgorithm::Lpf1 => Coefficients::first_order_lowpass(self.frequency, sample_rate),
            FilterAlgorithm::Hpf1 => {
                Coefficients::first_order_highpass(self.frequency, sample_rate)
            }
            FilterAlgorithm::Lpf2 => Coefficients::lowpass(self.frequency, q, sample_rate),
            FilterAlgorithm::Hpf2 => Coefficients::highpass(self.frequency, q, sample_rate),
            FilterAlgorithm::PeakingEq => {
                Coefficients::peaking(self.frequency, q, self.gain_db, sample_rate)
            }
            FilterAlgorithm::LowShelf => {
                Coefficients::low_shelf(self.frequency, self.gain_db, sample_rate)
            }
            FilterAlgorithm::HighShelf => {
                Coefficients::high_shelf(self.frequency, self.gain_db, sample_rate)
            }
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new(FilterAlgorithm::Lpf2, 1000.0)
    }
}

/// Biquad filter stage.
///
/// Coefficients are recomputed only when the config actually changes, so
/// cooking the same values every block costs a comparison.
///
/// # Example
///
/// ```rust
/// use echoform_core::EffectStage;
/// use echoform_effects::{AudioFilter, FilterAlgorithm, FilterConfig};
///
/// let mut hpf = AudioFilter::new(FilterConfig::new(FilterAlgorithm::Hpf1, 200.0));
/// hpf.reset(48000.0);
///
/// let mut out = 1.0;
/// for _ in 0..48000 {
///     out = hpf.process_sample(1.0);
/// }
/// assert!(out.abs() < 1e-3); // DC is blocked
/// ```
#[derive(Debug, Clone)]
pub struct AudioFilter {
    biquad: Biquad,
    config: FilterConfig,
    lifecycle: StageLifecycle,
}

impl AudioFilter {
    /// Filter with `config`, awaiting `reset`.
    pub fn new(config: FilterConfig) -> Self {
        Self {
            biquad: Biquad::new(),
            config,
            lifecycle: StageLifecycle::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    fn update_coefficients(&mut self) {
        if self.lifecycle.is_ready() {
            self.biquad
                .set_coefficients(self.config.coefficients(self.lifecycle.sample_rate()));
        }
    }
}

impl Default for AudioFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

impl EffectStage for AudioFilter {
    type Config = FilterConfig;

    fn configure(&mut self, config: &FilterConfig) {
        if *config != self.config {
            self.config = *config;
            self.update_coefficients();
        }
    }

    fn reset(&mut self, sample_rate: f32) {
        self.lifecycle.reset(sample_rate);
        self.biquad.clear();
        self.update_coefficients();
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        self.lifecycle.enter_streaming();
        self.biquad.process(input)
    }

    fn state(&self) -> StageState {
        self.lifecycle.state()
    }
}
