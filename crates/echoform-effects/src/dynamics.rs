//! Feed-forward dynamics processor: compressor, limiter and downward
//! expander / gate.
//!
//! # Signal Flow
//!
//! ```text
//! Input → Envelope Detector → dB → Gain Computer → Gain → × Input × Output Gain
//! ```
//!
//! # Gain Computer
//!
//! With threshold `T`, ratio `R` and envelope `E` (all dB):
//!
//! | Mode | Region | Gain |
//! |------|--------|------|
//! | Compressor | `E > T` | `(T - E)(1 - 1/R)` |
//! | Compressor, hard limit | `E > T` | `T - E` |
//! | Expander | `E < T` | `(E - T)(R - 1)` |
//! | Expander, hard limit (gate) | `E < T` | silence |
//!
//! A soft knee of width `K` dB blends quadratically across `T ± K/2`.
//!
//! The ratio is used literally as `R:1`, so a control labelled in percent
//! still maps 50 to 50:1.

use echoform_core::{
    EffectStage, EnvelopeDetector, StageLifecycle, StageState, db_to_linear, linear_to_db,
};

/// Which side of the threshold is acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DynamicsMode {
    /// Reduce gain above the threshold.
    #[default]
    Compressor,
    /// Reduce gain below the threshold.
    DownwardExpander,
}

/// Cooked dynamics settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsConfig {
    /// Compressor or expander.
    pub mode: DynamicsMode,
    /// Threshold in dB.
    pub threshold_db: f32,
    /// Ratio `R:1`, at least 1.
    pub ratio: f32,
    /// Soft-knee width in dB; 0 is a hard knee.
    pub knee_db: f32,
    /// Envelope attack in ms.
    pub attack_ms: f32,
    /// Envelope release in ms.
    pub release_ms: f32,
    /// Make-up / output gain in dB.
    pub output_gain_db: f32,
    /// Infinite ratio: a limiter in compressor mode, a gate in expander mode.
    pub hard_limit: bool,
}

impl DynamicsConfig {
    /// Hard-knee compressor.
    pub const fn compressor(threshold_db: f32, ratio: f32) -> Self {
        Self {
            mode: DynamicsMode::Compressor,
            threshold_db,
            ratio,
            knee_db: 0.0,
            attack_ms: 20.0,
            release_ms: 500.0,
            output_gain_db: 0.0,
            hard_limit: false,
        }
    }

    /// Brickwall-ratio limiter with a fast attack.
    pub const fn limiter(threshold_db: f32) -> Self {
        Self {
            attack_ms: 0.0,
            release_ms: 50.0,
            hard_limit: true,
            ..Self::compressor(threshold_db, 1.0)
        }
    }

    /// Downward expander that mutes entirely below the threshold.
    pub const fn gate(threshold_db: f32) -> Self {
        Self {
            mode: DynamicsMode::DownwardExpander,
            hard_limit: true,
            ..Self::compressor(threshold_db, 1.0)
        }
    }

    /// Sets attack and release.
    pub const fn with_times(mut self, attack_ms: f32, release_ms: f32) -> Self {
        self.attack_ms = attack_ms;
        self.release_ms = release_ms;
        self
    }

    /// Sets the output gain.
    pub const fn with_output_gain_db(mut self, db: f32) -> Self {
        self.output_gain_db = db;
        self
    }

    /// Sets the knee width.
    pub const fn with_knee_db(mut self, db: f32) -> Self {
        self.knee_db = db;
        self
    }

    /// Gain change in dB for an envelope of `level_db`. `None` means mute.
    pub fn gain_db(&self, level_db: f32) -> Option<f32> {
        let over = level_db - self.threshold_db;
        let half_knee = self.knee_db.max(0.0) * 0.5;
        match self.mode {
            DynamicsMode::Compressor => {
                let slope = if self.hard_limit {
                    1.0
                } else {
                    1.0 - 1.0 / self.ratio.max(1.0)
                };
                if half_knee > 0.0 && over.abs() <= half_knee {
                    let x = over + half_knee;
                    Some(-slope * x * x / (4.0 * half_knee))
                } else if over > 0.0 {
                    Some(-slope * over)
                } else {
                    Some(0.0)
                }
            }
            DynamicsMode::DownwardExpander => {
                if over >= 0.0 {
                    Some(0.0)
                } else if self.hard_limit {
                    None
                } else {
                    Some(over * (self.ratio.max(1.0) - 1.0))
                }
            }
        }
    }
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self::compressor(0.0, 1.0)
    }
}

/// Compressor / limiter / gate stage.
///
/// # Example
///
/// ```rust
/// use echoform_core::EffectStage;
/// use echoform_effects::{Dynamics, DynamicsConfig};
///
/// let mut comp = Dynamics::new(
///     DynamicsConfig::compressor(0.0, 100.0).with_output_gain_db(6.0),
/// );
/// comp.reset(48000.0);
/// // at or below 0 dBFS nothing is reduced, only made up
/// let y = comp.process_sample(0.5);
/// assert!((y - 0.5 * 1.9953).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct Dynamics {
    detector: EnvelopeDetector,
    config: DynamicsConfig,
    output_gain: f32,
    gain_reduction_db: f32,
    lifecycle: StageLifecycle,
}

impl Dynamics {
    /// Stage with `config`, awaiting `reset`.
    pub fn new(config: DynamicsConfig) -> Self {
        let mut detector = EnvelopeDetector::default();
        detector.set_times(config.attack_ms, config.release_ms);
        Self {
            detector,
            config,
            output_gain: db_to_linear(config.output_gain_db),
            gain_reduction_db: 0.0,
            lifecycle: StageLifecycle::new(),
        }
    }

    /// Gain change applied on the last sample, in dB (non-positive).
    /// A muted gate reports `f32::NEG_INFINITY`.
    pub fn gain_reduction_db(&self) -> f32 {
        self.gain_reduction_db
    }

    /// Active configuration.
    pub fn config(&self) -> &DynamicsConfig {
        &self.config
    }
}

impl Default for Dynamics {
    fn default() -> Self {
        Self::new(DynamicsConfig::default())
    }
}

impl EffectStage for Dynamics {
    type Config = DynamicsConfig;

    fn configure(&mut self, config: &DynamicsConfig) {
        self.detector.set_times(config.attack_ms, config.release_ms);
        if config.output_gain_db != self.config.output_gain_db {
            self.output_gain = db_to_linear(config.output_gain_db);
        }
        self.config = *config;
    }

    fn reset(&mut self, sample_rate: f32) {
        self.lifecycle.reset(sample_rate);
        self.detector.reset(sample_rate);
        self.gain_reduction_db = 0.0;
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        self.lifecycle.enter_streaming();
        let level_db = linear_to_db(self.detector.process(input));
        match self.config.gain_db(level_db) {
            Some(db) => {
                self.gain_reduction_db = db;
                let gain = if db == 0.0 { 1.0 } else { db_to_linear(db) };
                input * gain * self.output_gain
            }
            None => {
                self.gain_reduction_db = f32::NEG_INFINITY;
                0.0
            }
        }
    }

    fn state(&self) -> StageState {
        self.lifecycle.state()
    }
}
