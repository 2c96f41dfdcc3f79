//! Stream lifecycle and the processor interface hosts drive.
//!
//! ```text
//!   Created ──initialize──▶ Initialized ──reset──▶ Prepared ──process_frame──▶ Streaming
//!                                                     ▲                            │
//!                                                     └───────────reset────────────┘
//! ```
//!
//! A block is always `pre_process → process_frame × N → post_process`.
//! `pre_process` takes the parameter snapshot, each `process_frame` fires
//! due MIDI events, refreshes the tempo, advances smoothing and runs the
//! signal chain, and `post_process` hands back [`BlockStats`] for the caller
//! to log once the block is done.

use echoform_core::{
    ChannelConfig, ChannelFormat, Commit, Frame, ParamDescriptor, ParamError, ParamHandle,
    ParamId, PresetError, PresetSnapshot, TransportInfo, UpdateContext,
};

use crate::error::ProcessError;

/// Where a processor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ProcessorState {
    /// Constructed, not yet initialized.
    #[default]
    Created,
    /// One-time setup done; buffers are not sized.
    Initialized,
    /// Reset for a stream format; no frame processed yet.
    Prepared,
    /// At least one frame processed since the last reset.
    Streaming,
}

impl ProcessorState {
    /// Whether frames may be processed.
    pub fn is_prepared(self) -> bool {
        self >= ProcessorState::Prepared
    }
}

/// Whether a topology consumes audio or makes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    /// Processes an input signal.
    Effect,
    /// Produces a signal from nothing.
    Generator,
}

impl PluginKind {
    /// Channel pairings this kind of processor accepts.
    pub const fn channel_configs(self) -> &'static [ChannelConfig] {
        match self {
            PluginKind::Effect => &[
                ChannelConfig::MONO,
                ChannelConfig::MONO_TO_STEREO,
                ChannelConfig::STEREO,
            ],
            PluginKind::Generator => {
                &[ChannelConfig::GENERATOR_MONO, ChannelConfig::GENERATOR_STEREO]
            }
        }
    }

    /// Whether `config` is one of [`channel_configs`](Self::channel_configs).
    pub fn supports(self, config: ChannelConfig) -> bool {
        self.channel_configs().contains(&config)
    }

    /// Lowercase display name.
    pub const fn name(self) -> &'static str {
        match self {
            PluginKind::Effect => "effect",
            PluginKind::Generator => "generator",
        }
    }
}

/// Stream format fixed at `reset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamFormat {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Host bit depth. Informational; processing is always `f32`.
    pub bit_depth: u32,
}

/// Block boundaries handed to `pre_process` and `post_process`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockInfo {
    /// Index of the block's first frame in the stream.
    pub start_frame: u64,
    /// Frames in the block.
    pub frames: usize,
}

impl BlockInfo {
    /// Block of `frames` starting at `start_frame`.
    pub const fn new(start_frame: u64, frames: usize) -> Self {
        Self { start_frame, frames }
    }
}

/// Counters gathered during a block.
///
/// Nothing on the audio path logs; callers inspect these after the block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlockStats {
    /// Frames processed.
    pub frames: usize,
    /// Frames whose transport carried an unusable BPM. The last valid tempo
    /// stayed in effect for them.
    pub invalid_tempo_frames: usize,
    /// Most recent rejected BPM, if any.
    pub last_invalid_bpm: Option<f32>,
    /// Frames on which stage settings were re-cooked.
    pub recooked_frames: usize,
}

/// Per-frame hook for MIDI events scheduled by the host.
pub trait MidiEventQueue {
    /// Deliver every event due at or before `frame_index`.
    fn fire_due_events(&mut self, frame_index: u64);
}

/// A queue that never holds events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMidiEvents;

impl MidiEventQueue for NoMidiEvents {
    fn fire_due_events(&mut self, _frame_index: u64) {}
}

/// One frame of host I/O.
///
/// `input` holds 0, 1 or 2 samples and `output` 1 or 2; the lengths decide
/// the channel configuration.
pub struct FrameIo<'a> {
    /// Input samples, one per channel.
    pub input: &'a [f32],
    /// Output samples, one per channel.
    pub output: &'a mut [f32],
    /// Host tempo and position for this frame.
    pub transport: TransportInfo,
    /// Position of the frame in the stream.
    pub frame_index: u64,
    /// Events to fire before the frame is processed.
    pub midi: &'a mut dyn MidiEventQueue,
}

impl<'a> FrameIo<'a> {
    /// Bundle one frame's buffers.
    pub fn new(
        input: &'a [f32],
        output: &'a mut [f32],
        transport: TransportInfo,
        frame_index: u64,
        midi: &'a mut dyn MidiEventQueue,
    ) -> Self {
        Self {
            input,
            output,
            transport,
            frame_index,
            midi,
        }
    }

    /// Channel configuration implied by the buffer lengths.
    pub fn channel_config(&self) -> Result<ChannelConfig, ProcessError> {
        match (
            ChannelFormat::from_channels(self.input.len()),
            ChannelFormat::from_channels(self.output.len()),
        ) {
            (Some(input), Some(output)) => Ok(ChannelConfig::new(input, output)),
            _ => Err(ProcessError::UnsupportedChannelCount {
                input: self.input.len(),
                output: self.output.len(),
            }),
        }
    }

    /// Input as a frame. Silence for generators, duplicated for mono.
    pub fn input_frame(&self) -> Frame {
        match *self.input {
            [] => Frame::SILENCE,
            [mono] => Frame::mono(mono),
            [left, right, ..] => Frame::new(left, right),
        }
    }

    /// Write `frame` to the output. A mono output takes the left channel.
    pub fn write_output(&mut self, frame: Frame) {
        match &mut *self.output {
            [mono] => *mono = frame.left,
            [left, right, ..] => {
                *left = frame.left;
                *right = frame.right;
            }
            [] => {}
        }
    }
}

/// A complete processor as seen by a host.
///
/// Built by [`create_processor`](crate::create_processor) and used through
/// `Box<dyn Processor + Send>`. Automation entry points take `&self` and
/// may be called from a control thread through a shared handle; everything
/// else belongs to the audio thread.
pub trait Processor {
    /// Topology name, e.g. `"tape_echo"`.
    fn name(&self) -> &'static str;

    /// Effect or generator.
    fn kind(&self) -> PluginKind;

    /// Lifecycle state.
    fn state(&self) -> ProcessorState;

    /// Format from the last `reset`.
    fn stream_format(&self) -> Option<StreamFormat>;

    /// One-time setup. Fails if called twice.
    fn initialize(&mut self) -> Result<(), ProcessError>;

    /// Size every rate-dependent buffer for `sample_rate`, zero all state and
    /// move to [`ProcessorState::Prepared`]. Safe to repeat mid-stream.
    fn reset(&mut self, sample_rate: f32, bit_depth: u32) -> Result<(), ProcessError>;

    /// Whether `config` can be processed.
    fn supports(&self, config: ChannelConfig) -> bool {
        self.kind().supports(config)
    }

    /// Take the block's parameter snapshot.
    fn pre_process(&mut self, block: &BlockInfo) -> Result<(), ProcessError>;

    /// Process one frame. On error the output is left untouched.
    fn process_frame(&mut self, io: &mut FrameIo<'_>) -> Result<(), ProcessError>;

    /// Close the block and return its counters.
    fn post_process(&mut self, block: &BlockInfo) -> BlockStats;

    /// Set a parameter from its plain value.
    fn update_plugin_parameter(
        &self,
        id: ParamId,
        value: f32,
        context: UpdateContext,
    ) -> Result<Commit, ParamError>;

    /// Set a parameter from a normalized `[0, 1]` value through its taper.
    fn update_plugin_parameter_normalized(
        &self,
        id: ParamId,
        normalized: f32,
        context: UpdateContext,
    ) -> Result<Commit, ParamError>;

    /// Write a complete preset. Partial presets are refused whole.
    fn apply_preset(&self, preset: &PresetSnapshot) -> Result<usize, PresetError>;

    /// Declared parameters in slot order.
    fn descriptors(&self) -> &'static [ParamDescriptor];

    /// Factory presets.
    fn presets(&self) -> &'static [PresetSnapshot];

    /// Cross-thread writer for the parameter set.
    fn param_handle(&self) -> ParamHandle;

    /// Bound value of `id` as of the last sync or smoothing step.
    fn parameter_value(&self, id: ParamId) -> Option<f32>;

    /// Factory preset by name, ignoring ASCII case.
    fn find_preset(&self, name: &str) -> Option<&'static PresetSnapshot> {
        self.presets()
            .iter()
            .find(|preset| preset.name.eq_ignore_ascii_case(name))
    }
}
