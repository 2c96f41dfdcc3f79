//! Stereo feedback delay with normal and ping-pong routing.
//!
//! Each sample follows the write-then-read contract of
//! [`DelayLine`](echoform_core::DelayLine): the line is written with
//! `input + feedback · previous_output` and then tapped, so a tap of `d`
//! samples returns what was written `d` frames ago. In ping-pong mode the
//! feedback of each channel comes from the other one.
//!
//! Tap times glide over 50 ms when changed mid-stream. Before the first
//! processed sample they land immediately, so a freshly reset delay is
//! sample-exact from the start.

use echoform_core::{
    DelayLine, EffectStage, Frame, SmoothedParam, StageLifecycle, StageState, StereoStage,
    db_to_linear, flush_denormal, ms_to_samples,
};

/// Buffer length when none is given.
pub const DEFAULT_MAX_DELAY_MS: f32 = 2000.0;

/// Highest feedback accepted.
const MAX_FEEDBACK: f32 = 0.99;

/// Tap glide time.
const TAP_SMOOTHING_MS: f32 = 50.0;

/// Feedback routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayMode {
    /// Each channel feeds itself.
    Normal,
    /// Each channel feeds the other.
    #[default]
    PingPong,
}

/// Cooked delay settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoDelayConfig {
    /// Left tap in ms.
    pub left_ms: f32,
    /// Right tap in ms.
    pub right_ms: f32,
    /// Feedback as a fraction, clamped to `[0, 0.99]`.
    pub feedback: f32,
    /// Dry level in dB.
    pub dry_db: f32,
    /// Wet level in dB.
    pub wet_db: f32,
    /// Feedback routing.
    pub mode: DelayMode,
}

impl StereoDelayConfig {
    /// Both taps at `ms`, no feedback, wet only.
    pub const fn synced(ms: f32) -> Self {
        Self {
            left_ms: ms,
            right_ms: ms,
            feedback: 0.0,
            dry_db: f32::NEG_INFINITY,
            wet_db: 0.0,
            mode: DelayMode::Normal,
        }
    }
}

impl Default for StereoDelayConfig {
    fn default() -> Self {
        Self {
            left_ms: 500.0,
            right_ms: 500.0,
            feedback: 0.3,
            dry_db: 0.0,
            wet_db: -6.0,
            mode: DelayMode::PingPong,
        }
    }
}

/// Two-channel delay.
///
/// # Example
///
/// ```rust
/// use echoform_core::{EffectStage, Frame, StereoStage};
/// use echoform_effects::{StereoDelay, StereoDelayConfig};
///
/// let mut delay = StereoDelay::new(StereoDelayConfig::synced(500.0));
/// delay.reset(48000.0);
///
/// let mut arrival = None;
/// for n in 0..30000 {
///     let x = if n == 0 { 1.0 } else { 0.0 };
///     if delay.process_frame(Frame::mono(x)).left == 1.0 {
///         arrival = Some(n);
///     }
/// }
/// assert_eq!(arrival, Some(24000));
/// ```
#[derive(Debug, Clone)]
pub struct StereoDelay {
    config: StereoDelayConfig,
    max_delay_ms: f32,
    lines: [DelayLine; 2],
    taps: [SmoothedParam; 2],
    previous: Frame,
    feedback: f32,
    dry: f32,
    wet: f32,
    lifecycle: StageLifecycle,
}

impl StereoDelay {
    /// Delay with a [`DEFAULT_MAX_DELAY_MS`] buffer.
    pub fn new(config: StereoDelayConfig) -> Self {
        Self::with_max_delay_ms(config, DEFAULT_MAX_DELAY_MS)
    }

    /// Delay whose buffers hold `max_delay_ms`.
    pub fn with_max_delay_ms(config: StereoDelayConfig, max_delay_ms: f32) -> Self {
        Self {
            config,
            max_delay_ms,
            lines: [DelayLine::new(), DelayLine::new()],
            taps: [SmoothedParam::new(0.0), SmoothedParam::new(0.0)],
            previous: Frame::SILENCE,
            feedback: config.feedback.clamp(0.0, MAX_FEEDBACK),
            dry: db_to_linear(config.dry_db),
            wet: db_to_linear(config.wet_db),
            lifecycle: StageLifecycle::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &StereoDelayConfig {
        &self.config
    }

    /// Buffer capacity in ms.
    pub fn max_delay_ms(&self) -> f32 {
        self.max_delay_ms
    }

    /// Current left and right taps in samples.
    pub fn tap_samples(&self) -> (f32, f32) {
        (self.taps[0].get(), self.taps[1].get())
    }

    fn retarget_taps(&mut self) {
        if !self.lifecycle.is_ready() {
            return;
        }
        let sr = self.lifecycle.sample_rate();
        for (tap, (ms, line)) in self
            .taps
            .iter_mut()
            .zip([self.config.left_ms, self.config.right_ms].into_iter().zip(&self.lines))
        {
            tap.set_target(ms_to_samples(ms, sr).clamp(0.0, line.max_tap()));
        }
        if self.lifecycle.state() == StageState::Configured {
            self.taps.iter_mut().for_each(SmoothedParam::snap_to_target);
        }
    }
}

impl Default for StereoDelay {
    fn default() -> Self {
        Self::new(StereoDelayConfig::default())
    }
}

impl EffectStage for StereoDelay {
    type Config = StereoDelayConfig;

    fn configure(&mut self, config: &StereoDelayConfig) {
        if *config == self.config {
            return;
        }
        self.feedback = config.feedback.clamp(0.0, MAX_FEEDBACK);
        self.dry = db_to_linear(config.dry_db);
        self.wet = db_to_linear(config.wet_db);
        let taps_moved = config.left_ms != self.config.left_ms
            || config.right_ms != self.config.right_ms;
        self.config = *config;
        if taps_moved {
            self.retarget_taps();
        }
    }

    fn reset(&mut self, sample_rate: f32) {
        self.lifecycle.reset(sample_rate);
        for line in &mut self.lines {
            line.allocate(self.max_delay_ms, sample_rate);
        }
        self.taps = [
            SmoothedParam::with_config(0.0, sample_rate, TAP_SMOOTHING_MS),
            SmoothedParam::with_config(0.0, sample_rate, TAP_SMOOTHING_MS),
        ];
        self.previous = Frame::SILENCE;
        self.retarget_taps();
        #[cfg(feature = "tracing")]
        tracing::debug!(sample_rate, max_delay_ms = self.max_delay_ms, "stereo delay reset");
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

impl StereoStage for StereoDelay {
    #[inline]
    fn process_frame(&mut self, frame: Frame) -> Frame {
        self.lifecycle.enter_streaming();
        let returns = match self.config.mode {
            DelayMode::Normal => self.previous,
            DelayMode::PingPong => Frame::new(self.previous.right, self.previous.left),
        };
        let left_tap = self.taps[0].advance();
        let right_tap = self.taps[1].advance();
        let wet = Frame::new(
            self.lines[0].write_then_read(frame.left + self.feedback * returns.left, left_tap),
            self.lines[1].write_then_read(frame.right + self.feedback * returns.right, right_tap),
        );
        self.previous = wet.map(flush_denormal);
        Frame::new(
            frame.left * self.dry + wet.left * self.wet,
            frame.right * self.dry + wet.right * self.wet,
        )
    }
}
