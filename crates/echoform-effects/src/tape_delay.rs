//! Tape echo: a record/playback loop with band-limiting, limiting,
//! saturation and the noise a worn machine adds.
//!
//! # Signal Flow
//!
//! ```text
//! x ─┬─ ·rec → band-limit → limiter ─(+)─ saturate ─(+ hiss + hum)─ write ┐
//!    │                               ▲                                  │
//!    │                               └──── feedback · tape ◀── read ◀───┘
//!    │                                                   │
//!    └─ ·dry ─────────────────────────────(+)◀── ·play ──┘ → ·out → y
//! ```
//!
//! The loop writes first and then reads, so the tap is the number of frames
//! since the sample was written. The tap normally comes from a
//! [`DelayModulator`](echoform_core::DelayModulator) once per frame via
//! [`TapeDelay::set_tap_ms`]; anything outside the tape is held at its end.

use echoform_core::{
    DelayLine, EffectStage, FilteredNoise, Frame, Oscillator, StageLifecycle, StageState,
    StereoPair, StereoStage, db_to_linear, flush_denormal, ms_to_samples, saturate,
};

use crate::band_limit::{BandLimit, BandLimitConfig};
use crate::dynamics::{Dynamics, DynamicsConfig};

/// Length of the tape loop.
pub const TAPE_LOOP_MS: f32 = 750.0;

/// Scale from the hum and hiss controls to signal level (-60 dB at 1.0).
const NOISE_LEVEL: f32 = 0.001;

/// Mains hum frequency.
const HUM_HZ: f32 = 60.0;

const MAX_FEEDBACK: f32 = 0.99;

/// Cooked tape echo settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapeDelayConfig {
    /// Gain into the record head, dB.
    pub record_db: f32,
    /// Gain out of the playback head, dB.
    pub playback_db: f32,
    /// Record-path band limits.
    pub band: BandLimitConfig,
    /// Record limiter threshold, dB.
    pub limiter_threshold_db: f32,
    /// Limiter make-up gain, dB.
    pub makeup_db: f32,
    /// Playback fed back to the record head, fraction.
    pub feedback: f32,
    /// Tape saturation amount, `k` in `tanh(k·x) / tanh(k)`.
    pub saturation: f32,
    /// 60 Hz hum level.
    pub hum: f32,
    /// Hiss lowpass cutoff, Hz.
    pub hiss_cutoff: f32,
    /// Hiss level.
    pub hiss: f32,
    /// Nominal tap in ms, used until [`TapeDelay::set_tap_ms`] overrides it.
    pub delay_ms: f32,
    /// Dry level, dB.
    pub dry_db: f32,
    /// Output level, dB.
    pub output_db: f32,
}

impl Default for TapeDelayConfig {
    fn default() -> Self {
        Self {
            record_db: 0.0,
            playback_db: 0.0,
            band: BandLimitConfig {
                highpass_hz: 20.0,
                lowpass_hz: 8000.0,
            },
            limiter_threshold_db: -3.0,
            makeup_db: 0.0,
            feedback: 0.0,
            saturation: 1.0,
            hum: 0.0,
            hiss_cutoff: 10000.0,
            hiss: 0.0,
            delay_ms: 300.0,
            dry_db: 0.0,
            output_db: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Gains {
    record: f32,
    playback: f32,
    feedback: f32,
    dry: f32,
    output: f32,
}

impl Gains {
    fn cook(config: &TapeDelayConfig) -> Self {
        Self {
            record: db_to_linear(config.record_db),
            playback: db_to_linear(config.playback_db),
            feedback: config.feedback.clamp(0.0, MAX_FEEDBACK),
            dry: db_to_linear(config.dry_db),
            output: db_to_linear(config.output_db),
        }
    }
}

fn limiter_config(config: &TapeDelayConfig) -> DynamicsConfig {
    DynamicsConfig::limiter(config.limiter_threshold_db).with_output_gain_db(config.makeup_db)
}

/// Stereo tape echo.
///
/// # Example
///
/// ```rust
/// use echoform_core::{EffectStage, Frame, StereoStage};
/// use echoform_effects::{TapeDelay, TapeDelayConfig};
///
/// let mut tape = TapeDelay::new(TapeDelayConfig {
///     delay_ms: 100.0,
///     dry_db: f32::NEG_INFINITY,
///     ..TapeDelayConfig::default()
/// });
/// tape.reset(48000.0);
///
/// let mut echo = 0.0f32;
/// for n in 0..4801 {
///     let x = if n < 48 { 0.5 } else { 0.0 };
///     echo = echo.max(tape.process_frame(Frame::mono(x)).left.abs());
/// }
/// assert!(echo > 0.1);
/// ```
#[derive(Debug, Clone)]
pub struct TapeDelay {
    config: TapeDelayConfig,
    gains: Gains,
    band: StereoPair<BandLimit>,
    limiter: StereoPair<Dynamics>,
    tape: [DelayLine; 2],
    tap_samples: f32,
    previous: Frame,
    hiss: FilteredNoise,
    hum: Oscillator,
    lifecycle: StageLifecycle,
}

impl TapeDelay {
    /// Tape echo with `config`, awaiting `reset`.
    pub fn new(config: TapeDelayConfig) -> Self {
        let mut hiss = FilteredNoise::new(48000.0, config.hiss_cutoff);
        hiss.set_gain(config.hiss * NOISE_LEVEL);
        Self {
            config,
            gains: Gains::cook(&config),
            band: StereoPair::new(BandLimit::new(config.band)),
            limiter: StereoPair::new(Dynamics::new(limiter_config(&config))),
            tape: [DelayLine::new(), DelayLine::new()],
            tap_samples: 0.0,
            previous: Frame::SILENCE,
            hiss,
            hum: Oscillator::new(48000.0, HUM_HZ),
            lifecycle: StageLifecycle::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &TapeDelayConfig {
        &self.config
    }

    /// Move the playback head for the coming frames. Clamped to the tape.
    #[inline]
    pub fn set_tap_ms(&mut self, ms: f32) {
        let samples = ms_to_samples(ms, self.lifecycle.sample_rate());
        self.tap_samples = if samples.is_nan() {
            0.0
        } else {
            samples.clamp(0.0, self.tape[0].max_tap())
        };
    }

    /// Current tap in samples.
    pub fn tap_samples(&self) -> f32 {
        self.tap_samples
    }

    #[inline]
    fn record(&self, conditioned: f32, returned: f32, noise: f32) -> f32 {
        let driven = saturate(conditioned + self.gains.feedback * returned, self.config.saturation);
        driven + noise
    }
}

impl Default for TapeDelay {
    fn default() -> Self {
        Self::new(TapeDelayConfig::default())
    }
}

impl EffectStage for TapeDelay {
    type Config = TapeDelayConfig;

    fn configure(&mut self, config: &TapeDelayConfig) {
        if *config == self.config {
            return;
        }
        self.gains = Gains::cook(config);
        self.band.configure(&config.band);
        self.limiter.configure(&limiter_config(config));
        self.hiss.set_cutoff(config.hiss_cutoff);
        self.hiss.set_gain(config.hiss * NOISE_LEVEL);
        let moved = config.delay_ms != self.config.delay_ms;
        self.config = *config;
        if moved && self.lifecycle.is_ready() {
            self.set_tap_ms(config.delay_ms);
        }
    }

    fn reset(&mut self, sample_rate: f32) {
        self.lifecycle.reset(sample_rate);
        for line in &mut self.tape {
            line.allocate(TAPE_LOOP_MS, sample_rate);
        }
        self.band.reset(sample_rate);
        self.limiter.reset(sample_rate);
        self.hiss.reset(sample_rate);
        self.hum.reset(sample_rate);
        self.previous = Frame::SILENCE;
        self.set_tap_ms(self.config.delay_ms);
        #[cfg(feature = "tracing")]
        tracing::debug!(sample_rate, tape_ms = TAPE_LOOP_MS, "tape delay reset");
    }

    /// Left channel of a mono frame.
    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        self.process_frame(Frame::mono(input)).left
    }

    fn state(&self) -> StageState {
        self.lifecycle.state()
    }
}

impl StereoStage for TapeDelay {
    #[inline]
    fn process_frame(&mut self, frame: Frame) -> Frame {
        self.lifecycle.enter_streaming();
        let noise = self.hiss.next_sample() + self.hum.render().normal * self.config.hum * NOISE_LEVEL;

        let conditioned = self
            .limiter
            .process_frame(self.band.process_frame(frame.scale(self.gains.record)));
        let written = Frame::new(
            self.record(conditioned.left, self.previous.left, noise),
            self.record(conditioned.right, self.previous.right, noise),
        );

        let tap = self.tap_samples;
        let played = Frame::new(
            self.tape[0].write_then_read(written.left, tap),
            self.tape[1].write_then_read(written.right, tap),
        );
        self.previous = played.map(flush_denormal);

        (frame.scale(self.gains.dry) + played.scale(self.gains.playback)).scale(self.gains.output)
    }
}
