//! The stage trait every DSP block in a topology implements.
//!
//! A stage is configured once per block from an immutable config struct of
//! cooked values, reset whenever the stream format changes, and advanced
//! exactly once per sample.
//!
//! ## Lifecycle
//!
//! ```text
//!   Uninitialized ──reset──▶ Configured ──process_sample──▶ Streaming
//!                                ▲                              │
//!                                └────────────reset─────────────┘
//! ```
//!
//! Every stage embeds a [`StageLifecycle`] and calls
//! [`enter_streaming`](StageLifecycle::enter_streaming) from its
//! `process_sample`. Processing before the first `reset` trips a debug
//! assertion: the buffers it would read have never been sized.
//!
//! ## Composition
//!
//! Topologies are fixed at compile time. Serial chains are either explicit
//! field-by-field calls or a [`Chain`] built with [`EffectStageExt::chain`].
//! [`StereoPair`] turns a mono stage into two independent channels.

use crate::frame::Frame;

/// Where a stage is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageState {
    /// Never reset; buffers are unsized.
    #[default]
    Uninitialized,
    /// Reset for a sample rate, no sample processed yet.
    Configured,
    /// At least one sample processed since the last reset.
    Streaming,
}

/// Lifecycle tracker embedded in every stage.
#[derive(Debug, Clone, Default)]
pub struct StageLifecycle {
    state: StageState,
    sample_rate: f32,
}

impl StageLifecycle {
    /// A tracker in [`StageState::Uninitialized`].
    pub const fn new() -> Self {
        Self {
            state: StageState::Uninitialized,
            sample_rate: 0.0,
        }
    }

    /// Record a reset. Any state moves to [`StageState::Configured`].
    pub fn reset(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.state = StageState::Configured;
    }

    /// Mark the stage as processing. Asserts in debug builds that a reset
    /// has happened.
    #[inline]
    pub fn enter_streaming(&mut self) {
        debug_assert!(
            self.state != StageState::Uninitialized,
            "stage processed before reset(sample_rate)"
        );
        self.state = StageState::Streaming;
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> StageState {
        self.state
    }

    /// Sample rate from the last reset, 0.0 before that.
    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Whether a reset has happened.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state != StageState::Uninitialized
    }
}

/// A single DSP block inside a topology.
///
/// # Example
///
/// ```rust
/// use echoform_core::{EffectStage, StageLifecycle, StageState};
///
/// struct Trim {
///     gain: f32,
///     lifecycle: StageLifecycle,
/// }
///
/// impl EffectStage for Trim {
///     type Config = f32;
///
///     fn configure(&mut self, gain: &f32) {
///         self.gain = *gain;
///     }
///
///     fn reset(&mut self, sample_rate: f32) {
///         self.lifecycle.reset(sample_rate);
///     }
///
///     fn process_sample(&mut self, input: f32) -> f32 {
///         self.lifecycle.enter_streaming();
///         input * self.gain
///     }
///
///     fn state(&self) -> StageState {
///         self.lifecycle.state()
///     }
/// }
///
/// let mut trim = Trim { gain: 1.0, lifecycle: StageLifecycle::new() };
/// trim.reset(48000.0);
/// trim.configure(&0.5);
/// assert_eq!(trim.process_sample(1.0), 0.5);
/// assert_eq!(trim.state(), StageState::Streaming);
/// ```
pub trait EffectStage {
    /// Cooked settings, applied once per block.
    type Config: Clone;

    /// Apply new settings. State (delay contents, filter memory) is kept.
    fn configure(&mut self, config: &Self::Config);

    /// Size buffers for `sample_rate`, zero all state, and move to
    /// [`StageState::Configured`]. May allocate; never called on the audio
    /// thread while streaming.
    fn reset(&mut self, sample_rate: f32);

    /// Advance one sample.
    fn process_sample(&mut self, input: f32) -> f32;

    /// Lifecycle state.
    fn state(&self) -> StageState;

    /// Process a buffer in place, one sample at a time.
    fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}

/// A stage whose channels interact (cross-feed, shared modulation).
///
/// `process_sample` on such a stage runs the left channel of a mono frame.
pub trait StereoStage: EffectStage {
    /// Advance one stereo frame.
    fn process_frame(&mut self, frame: Frame) -> Frame;
}

/// Fluent serial composition.
pub trait EffectStageExt: EffectStage + Sized {
    /// Feed this stage's output into `next`.
    ///
    /// ```rust,ignore
    /// let eq = highpass.chain(box_eq).chain(air_shelf);
    /// ```
    fn chain<S: EffectStage>(self, next: S) -> Chain<Self, S> {
        Chain {
            first: self,
            second: next,
        }
    }
}

impl<T: EffectStage> EffectStageExt for T {}

/// Two stages in series. Configured with a `(first, second)` tuple.
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A: EffectStage, B: EffectStage> EffectStage for Chain<A, B> {
    type Config = (A::Config, B::Config);

    fn configure(&mut self, config: &Self::Config) {
        self.first.configure(&config.0);
        self.second.configure(&config.1);
    }

    fn reset(&mut self, sample_rate: f32) {
        self.first.reset(sample_rate);
        self.second.reset(sample_rate);
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        let mid = self.first.process_sample(input);
        self.second.process_sample(mid)
    }

    fn state(&self) -> StageState {
        // The chain is only as far along as its least advanced member.
        match (self.first.state(), self.second.state()) {
            (StageState::Uninitialized, _) | (_, StageState::Uninitialized) => {
                StageState::Uninitialized
            }
            (StageState::Streaming, StageState::Streaming) => StageState::Streaming,
            _ => StageState::Configured,
        }
    }
}

impl<A, B> Chain<A, B> {
    /// First stage.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// First stage, mutably.
    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    /// Second stage.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// Second stage, mutably.
    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }
}

/// Two independent instances of a mono stage, one per channel.
#[derive(Debug, Clone)]
pub struct StereoPair<S> {
    left: S,
    right: S,
}

impl<S: EffectStage + Clone> StereoPair<S> {
    /// Clone `stage` for the right channel.
    pub fn new(stage: S) -> Self {
        Self {
            right: stage.clone(),
            left: stage,
        }
    }
}

impl<S> StereoPair<S> {
    /// Left instance.
    pub fn left(&self) -> &S {
        &self.left
    }

    /// Right instance.
    pub fn right(&self) -> &S {
        &self.right
    }
}

impl<S: EffectStage> EffectStage for StereoPair<S> {
    type Config = S::Config;

    fn configure(&mut self, config: &Self::Config) {
        self.left.configure(config);
        self.right.configure(config);
    }

    fn reset(&mut self, sample_rate: f32) {
        self.left.reset(sample_rate);
        self.right.reset(sample_rate);
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        self.left.process_sample(input)
    }

    fn state(&self) -> StageState {
        self.left.state()
    }
}

impl<S: EffectStage> StereoStage for StereoPair<S> {
    #[inline]
    fn process_frame(&mut self, frame: Frame) -> Frame {
        Frame::new(
            self.left.process_sample(frame.left),
            self.right.process_sample(frame.right),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Gain {
        gain: f32,
        lifecycle: StageLifecycle,
    }

    impl Gain {
        fn new(gain: f32) -> Self {
            Self {
                gain,
                lifecycle: StageLifecycle::new(),
            }
        }
    }

    impl EffectStage for Gain {
        type Config = f32;

        fn configure(&mut self, config: &f32) {
            self.gain = *config;
        }

        fn reset(&mut self, sample_rate: f32) {
            self.lifecycle.reset(sample_rate);
        }

        fn process_sample(&mut self, input: f32) -> f32 {
            self.lifecycle.enter_streaming();
            input * self.gain
        }

        fn state(&self) -> StageState {
            self.lifecycle.state()
        }
    }

    #[test]
    fn lifecycle_transitions() {
        let mut stage = Gain::new(1.0);
        assert_eq!(stage.state(), StageState::Uninitialized);
        stage.reset(48000.0);
        assert_eq!(stage.state(), StageState::Configured);
        stage.process_sample(0.0);
        assert_eq!(stage.state(), StageState::Streaming);
        stage.reset(96000.0);
        assert_eq!(stage.state(), StageState::Configured);
        assert_eq!(stage.lifecycle.sample_rate(), 96000.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "processed before reset")]
    fn processing_before_reset_fails_fast() {
        let mut stage = Gain::new(1.0);
        stage.process_sample(1.0);
    }

    #[test]
    fn chain_runs_in_order() {
        let mut chain = Gain::new(2.0).chain(Gain::new(3.0));
        chain.reset(48000.0);
        assert_eq!(chain.process_sample(1.0), 6.0);
        chain.configure(&(0.5, 4.0));
        assert_eq!(chain.process_sample(1.0), 2.0);
        assert_eq!(chain.state(), StageState::Streaming);
    }

    #[test]
    fn chain_state_is_least_advanced_member() {
        let mut chain = Gain::new(1.0).chain(Gain::new(1.0));
        assert_eq!(chain.state(), StageState::Uninitialized);
        chain.reset(48000.0);
        chain.first_mut().process_sample(0.0);
        assert_eq!(chain.state(), StageState::Configured);
    }

    #[test]
    fn block_processing_matches_per_sample() {
        let mut stage = Gain::new(0.5);
        stage.reset(48000.0);
        let mut buffer = [1.0, -2.0, 4.0];
        stage.process_block(&mut buffer);
        assert_eq!(buffer, [0.5, -1.0, 2.0]);
    }

    #[test]
    fn stereo_pair_channels_are_independent() {
        let mut pair = StereoPair::new(Gain::new(2.0));
        pair.reset(48000.0);
        let out = pair.process_frame(Frame::new(1.0, -0.5));
        assert_eq!(out, Frame::new(2.0, -1.0));
        assert_eq!(pair.left().state(), StageState::Streaming);
        assert_eq!(pair.right().state(), StageState::Streaming);
    }
}
