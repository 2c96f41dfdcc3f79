//! Class-A tube preamp stage.
//!
//! ```text
//! Input Gain → Asymmetric Saturation → DC Block (HPF1) → High Shelf → Output Gain
//! ```
//!
//! Saturation is the normalized `tanh` curve from
//! [`saturate`](echoform_core::saturate). Asymmetry drives the negative half
//! harder than the positive one, which adds even harmonics and a DC offset;
//! the first-order highpass removes the offset. The channel strip fixes the
//! shelf at 15 kHz, +2.5 dB.

use echoform_core::{
    Biquad, Coefficients, EffectStage, StageLifecycle, StageState, db_to_linear, saturate,
};

/// Highpass corner that strips the DC introduced by asymmetric clipping.
const DC_BLOCK_HZ: f32 = 10.0;

/// Extra drive per unit of asymmetry on the negative half-wave.
const ASYMMETRY_DRIVE: f32 = 0.1;

/// Cooked preamp settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TubePreampConfig {
    /// Gain into the tube in dB.
    pub input_db: f32,
    /// Saturation drive, 1 (gentle) upward.
    pub saturation: f32,
    /// Asymmetry, 0 (symmetric) upward.
    pub asymmetry: f32,
    /// Output level in dB.
    pub output_db: f32,
    /// High-shelf corner in Hz.
    pub shelf_hz: f32,
    /// High-shelf boost in dB.
    pub shelf_db: f32,
}

impl Default for TubePreampConfig {
    fn default() -> Self {
        Self {
            input_db: -3.0,
            saturation: 1.0,
            asymmetry: 0.0,
            output_db: -3.0,
            shelf_hz: 15000.0,
            shelf_db: 2.5,
        }
    }
}

/// Tube preamp stage.
///
/// # Example
///
/// ```rust
/// use echoform_core::EffectStage;
/// use echoform_effects::{TubePreamp, TubePreampConfig};
///
/// let mut pre = TubePreamp::new(TubePreampConfig::default());
/// pre.reset(48000.0);
/// let y = pre.process_sample(0.5);
/// assert!(y.is_finite() && y.abs() < 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct TubePreamp {
    config: TubePreampConfig,
    input_gain: f32,
    output_gain: f32,
    dc_block: Biquad,
    shelf: Biquad,
    lifecycle: StageLifecycle,
}

impl TubePreamp {
    /// Preamp with `config`, awaiting `reset`.
    pub fn new(config: TubePreampConfig) -> Self {
        Self {
            config,
            input_gain: db_to_linear(config.input_db),
            output_gain: db_to_linear(config.output_db),
            dc_block: Biquad::new(),
            shelf: Biquad::new(),
            lifecycle: StageLifecycle::new(),
        }
    }

    fn update_filters(&mut self) {
        if !self.lifecycle.is_ready() {
            return;
        }
        let sr = self.lifecycle.sample_rate();
        self.dc_block
            .set_coefficients(Coefficients::first_order_highpass(DC_BLOCK_HZ, sr));
        self.shelf.set_coefficients(Coefficients::high_shelf(
            self.config.shelf_hz,
            self.config.shelf_db,
            sr,
        ));
    }

    #[inline]
    fn shape(&self, x: f32) -> f32 {
        let drive = self.config.saturation.max(0.0);
        if x >= 0.0 {
            saturate(x, drive)
        } else {
            saturate(x, drive * (1.0 + self.config.asymmetry.max(0.0) * ASYMMETRY_DRIVE))
        }
    }
}

impl Default for TubePreamp {
    fn default() -> Self {
        Self::new(TubePreampConfig::default())
    }
}

impl EffectStage for TubePreamp {
    type Config = TubePreampConfig;

    fn configure(&mut self, config: &TubePreampConfig) {
        let shelf_changed =
            config.shelf_hz != self.config.shelf_hz || config.shelf_db != self.config.shelf_db;
        self.input_gain = db_to_linear(config.input_db);
        self.output_gain = db_to_linear(config.output_db);
        self.config = *config;
        if shelf_changed {
            self.update_filters();
        }
    }

    fn reset(&mut self, sample_rate: f32) {
        self.lifecycle.reset(sample_rate);
        self.dc_block.clear();
        self.shelf.clear();
        self.update_filters();
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        self.lifecycle.enter_streaming();
        let shaped = self.shape(input * self.input_gain);
        let blocked = self.dc_block.process(shaped);
        self.shelf.process(blocked) * self.output_gain
    }

    fn state(&self) -> StageState {
        self.lifecycle.state()
    }
}
