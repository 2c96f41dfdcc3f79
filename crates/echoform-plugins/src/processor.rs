//! The generic processor every topology runs inside.

use echoform_core::{
    Commit, Frame, ParamDescriptor, ParamError, ParamHandle, ParamId, ParameterStore,
    PresetError, PresetSnapshot, TempoClock, TempoError, UpdateContext,
};

use crate::error::ProcessError;
use crate::lifecycle::{
    BlockInfo, BlockStats, FrameIo, PluginKind, Processor, ProcessorState, StreamFormat,
};

/// A fixed signal chain plus its parameter declarations.
///
/// Implementors own their stages as concrete fields. The processor calls
/// [`cook`](Self::cook) whenever a bound value or the tempo moved, then
/// [`process`](Self::process) once per frame.
pub trait Topology: Send {
    /// Registry name, lowercase with underscores.
    const NAME: &'static str;
    /// One-line description.
    const DESCRIPTION: &'static str;
    /// Effect or generator.
    const KIND: PluginKind;

    /// Parameter declarations, in slot order.
    fn descriptors() -> &'static [ParamDescriptor];

    /// Factory presets. Each one covers every declared id.
    fn presets() -> &'static [PresetSnapshot];

    /// A topology at default settings, awaiting `reset`.
    fn new() -> Self;

    /// Reset oscillators, then stages in signal order. May allocate.
    fn reset(&mut self, sample_rate: f32);

    /// Turn bound parameter values into stage configs.
    fn cook(&mut self, params: &ParameterStore, clock: &TempoClock);

    /// Run one frame through the chain.
    fn process(&mut self, input: Frame) -> Frame;
}

/// [`Processor`] implementation for any [`Topology`].
pub struct TopologyProcessor<T: Topology> {
    topology: T,
    params: ParameterStore,
    clock: TempoClock,
    state: ProcessorState,
    format: Option<StreamFormat>,
    needs_cook: bool,
    stats: BlockStats,
}

impl<T: Topology> TopologyProcessor<T> {
    /// A processor in [`ProcessorState::Created`].
    pub fn new() -> Self {
        Self {
            topology: T::new(),
            params: ParameterStore::new(T::descriptors()),
            clock: TempoClock::default(),
            state: ProcessorState::Created,
            format: None,
            needs_cook: true,
            stats: BlockStats::default(),
        }
    }

    /// The signal chain.
    pub fn topology(&self) -> &T {
        &self.topology
    }

    /// The parameter store.
    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    /// Tempo as of the last frame.
    pub fn clock(&self) -> &TempoClock {
        &self.clock
    }

    fn ensure_prepared(&self) -> Result<(), ProcessError> {
        if self.state.is_prepared() {
            Ok(())
        } else {
            Err(ProcessError::NotPrepared)
        }
    }

    fn log_commit(result: Result<Commit, ParamError>) -> Result<Commit, ParamError> {
        result
            .inspect(|commit| {
                if commit.fires_callbacks() {
                    tracing::debug!(
                        topology = T::NAME,
                        id = %commit.id,
                        value = commit.value,
                        clamped = commit.clamped,
                        "parameter committed"
                    );
                }
            })
            .inspect_err(|err| tracing::warn!(topology = T::NAME, %err, "parameter update rejected"))
    }
}

impl<T: Topology> Default for TopologyProcessor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Topology> Processor for TopologyProcessor<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn kind(&self) -> PluginKind {
        T::KIND
    }

    fn state(&self) -> ProcessorState {
        self.state
    }

    fn stream_format(&self) -> Option<StreamFormat> {
        self.format
    }

    fn initialize(&mut self) -> Result<(), ProcessError> {
        if self.state != ProcessorState::Created {
            return Err(ProcessError::AlreadyInitialized);
        }
        self.state = ProcessorState::Initialized;
        tracing::info!(topology = T::NAME, params = self.params.len(), "processor initialized");
        Ok(())
    }

    fn reset(&mut self, sample_rate: f32, bit_depth: u32) -> Result<(), ProcessError> {
        if self.state == ProcessorState::Created {
            return Err(ProcessError::NotInitialized);
        }
        self.format = Some(StreamFormat {
            sample_rate,
            bit_depth,
        });
        self.params.reset(sample_rate);
        self.clock.reset(sample_rate);
        self.topology.reset(sample_rate);
        self.topology.cook(&self.params, &self.clock);
        self.needs_cook = true;
        self.stats = BlockStats::default();
        self.state = ProcessorState::Prepared;
        tracing::info!(topology = T::NAME, sample_rate, bit_depth, "processor reset");
        Ok(())
    }

    fn pre_process(&mut self, _block: &BlockInfo) -> Result<(), ProcessError> {
        self.ensure_prepared()?;
        self.stats = BlockStats::default();
        self.needs_cook |= self.params.sync_bound_variables();
        Ok(())
    }

    fn process_frame(&mut self, io: &mut FrameIo<'_>) -> Result<(), ProcessError> {
        self.ensure_prepared()?;
        let config = io.channel_config()?;
        if !T::KIND.supports(config) {
            return Err(ProcessError::UnsupportedChannelTopology(config));
        }

        io.midi.fire_due_events(io.frame_index);

        match self.clock.update(&io.transport) {
            Ok(changed) => self.needs_cook |= changed,
            Err(TempoError::InvalidTempo(bpm)) => {
                self.stats.invalid_tempo_frames += 1;
                self.stats.last_invalid_bpm = Some(bpm);
            }
        }
        self.needs_cook |= self.params.advance_smoothing(io.frame_index);

        if self.needs_cook {
            self.topology.cook(&self.params, &self.clock);
            self.needs_cook = false;
            self.stats.recooked_frames += 1;
        }

        let output = self.topology.process(io.input_frame());
        io.write_output(output);
        self.stats.frames += 1;
        self.state = ProcessorState::Streaming;
        Ok(())
    }

    fn post_process(&mut self, _block: &BlockInfo) -> BlockStats {
        self.stats
    }

    fn update_plugin_parameter(
        &self,
        id: ParamId,
        value: f32,
        context: UpdateContext,
    ) -> Result<Commit, ParamError> {
        Self::log_commit(self.params.update_parameter(id, value, context))
    }

    fn update_plugin_parameter_normalized(
        &self,
        id: ParamId,
        normalized: f32,
        context: UpdateContext,
    ) -> Result<Commit, ParamError> {
        Self::log_commit(
            self.params
                .update_parameter_normalized(id, normalized, true, context),
        )
    }

    fn apply_preset(&self, preset: &PresetSnapshot) -> Result<usize, PresetError> {
        self.params
            .apply_preset(preset)
            .inspect(|written| {
                tracing::debug!(topology = T::NAME, preset = preset.name, written, "preset applied");
            })
            .inspect_err(|err| tracing::warn!(topology = T::NAME, %err, "preset rejected"))
    }

    fn descriptors(&self) -> &'static [ParamDescriptor] {
        T::descriptors()
    }

    fn presets(&self) -> &'static [PresetSnapshot] {
        T::presets()
    }

    fn param_handle(&self) -> ParamHandle {
        self.params.handle()
    }

    fn parameter_value(&self, id: ParamId) -> Option<f32> {
        self.params.descriptor(id).map(|_| self.params.value(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::NoMidiEvents;
    use echoform_core::{ChannelConfig, TransportInfo};

    /// Passes input through a smoothed gain and counts cooks.
    struct Trim {
        gain: f32,
        cooks: usize,
        resets: usize,
    }

    const GAIN: ParamId = ParamId(7);

    static TRIM_PARAMS: [ParamDescriptor; 1] =
        [ParamDescriptor::gain_db("Gain", "Gain", -24.0, 12.0, 0.0)
            .with_id(GAIN, "gain")
            .with_smoothing(1.0)];

    static TRIM_PRESETS: [PresetSnapshot; 1] = [PresetSnapshot {
        name: "Loud",
        values: &[(GAIN, 6.0)],
    }];

    impl Topology for Trim {
        const NAME: &'static str = "trim";
        const DESCRIPTION: &'static str = "Gain";
        const KIND: PluginKind = PluginKind::Effect;

        fn descriptors() -> &'static [ParamDescriptor] {
            &TRIM_PARAMS
        }

        fn presets() -> &'static [PresetSnapshot] {
            &TRIM_PRESETS
        }

        fn new() -> Self {
            Self {
                gain: 1.0,
                cooks: 0,
                resets: 0,
            }
        }

        fn reset(&mut self, _sample_rate: f32) {
            self.resets += 1;
        }

        fn cook(&mut self, params: &ParameterStore, _clock: &TempoClock) {
            self.gain = params.gain(GAIN);
            self.cooks += 1;
        }

        fn process(&mut self, input: Frame) -> Frame {
            input.scale(self.gain)
        }
    }

    /// Counts the frames it was asked about.
    #[derive(Default)]
    struct CountingMidi(Vec<u64>);

    impl crate::lifecycle::MidiEventQueue for CountingMidi {
        fn fire_due_events(&mut self, frame_index: u64) {
            self.0.push(frame_index);
        }
    }

    fn prepared() -> TopologyProcessor<Trim> {
        let mut processor = TopologyProcessor::<Trim>::new();
        processor.initialize().unwrap();
        processor.reset(1000.0, 24).unwrap();
        processor
    }

    fn run(processor: &mut TopologyProcessor<Trim>, start: u64, input: &[f32]) -> Vec<f32> {
        let block = BlockInfo::new(start, input.len());
        processor.pre_process(&block).unwrap();
        let mut midi = NoMidiEvents;
        let mut out = Vec::with_capacity(input.len());
        for (i, &x) in input.iter().enumerate() {
            let mut y = [0.0];
            let mut io = FrameIo::new(
                core::slice::from_ref(&x),
                &mut y,
                TransportInfo::default(),
                start + i as u64,
                &mut midi,
            );
            processor.process_frame(&mut io).unwrap();
            out.push(y[0]);
        }
        processor.post_process(&block);
        out
    }

    #[test]
    fn lifecycle_order_is_enforced() {
        let mut processor = TopologyProcessor::<Trim>::new();
        assert_eq!(processor.reset(48000.0, 24), Err(ProcessError::NotInitialized));
        assert_eq!(processor.pre_process(&BlockInfo::new(0, 1)), Err(ProcessError::NotPrepared));

        processor.initialize().unwrap();
        assert_eq!(processor.initialize(), Err(ProcessError::AlreadyInitialized));

        let mut midi = NoMidiEvents;
        let mut out = [9.0];
        let mut io = FrameIo::new(&[1.0], &mut out, TransportInfo::default(), 0, &mut midi);
        assert_eq!(processor.process_frame(&mut io), Err(ProcessError::NotPrepared));
        assert_eq!(out, [9.0]);

        processor.reset(48000.0, 16).unwrap();
        assert_eq!(processor.state(), ProcessorState::Prepared);
        assert_eq!(
            processor.stream_format(),
            Some(StreamFormat {
                sample_rate: 48000.0,
                bit_depth: 16
            })
        );
        assert_eq!(processor.topology().resets, 1);
    }

    #[test]
    fn unsupported_topology_leaves_output_untouched() {
        let mut processor = prepared();
        let mut midi = NoMidiEvents;
        let mut out = [9.0, 9.0];
        let mut io = FrameIo::new(&[], &mut out, TransportInfo::default(), 0, &mut midi);
        assert_eq!(
            processor.process_frame(&mut io),
            Err(ProcessError::UnsupportedChannelTopology(ChannelConfig::GENERATOR_STEREO))
        );
        assert_eq!(out, [9.0, 9.0]);
        assert!(processor.supports(ChannelConfig::STEREO));
        assert!(!processor.supports(ChannelConfig::GENERATOR_MONO));
    }

    #[test]
    fn midi_fires_once_per_frame_before_processing() {
        let mut processor = prepared();
        processor.pre_process(&BlockInfo::new(10, 3)).unwrap();
        let mut midi = CountingMidi::default();
        for n in 10..13 {
            let mut out = [0.0];
            let mut io = FrameIo::new(&[0.0], &mut out, TransportInfo::default(), n, &mut midi);
            processor.process_frame(&mut io).unwrap();
        }
        assert_eq!(midi.0, vec![10, 11, 12]);
    }

    #[test]
    fn updates_land_at_the_next_block() {
        let mut processor = prepared();
        assert_eq!(run(&mut processor, 0, &[1.0]), vec![1.0]);

        let commit = processor
            .update_plugin_parameter(GAIN, 40.0, UpdateContext::Automation)
            .unwrap();
        assert!(commit.clamped);
        assert_eq!(commit.value, 12.0);
        // pending until pre_process
        assert_eq!(processor.parameter_value(GAIN), Some(0.0));

        // 1 ms smoothing at 1 kHz: one step
        let out = run(&mut processor, 1, &[1.0, 1.0]);
        let expected = echoform_core::db_to_linear(12.0);
        assert!((out[1] - expected).abs() < 1e-4, "got {:?}", out);
    }

    #[test]
    fn cooking_is_skipped_when_nothing_moves() {
        let mut processor = prepared();
        let cooks_after_reset = processor.topology().cooks;
        run(&mut processor, 0, &[0.0; 64]);
        // first frame after reset only
        assert_eq!(processor.topology().cooks, cooks_after_reset + 1);

        let stats = processor.post_process(&BlockInfo::new(0, 64));
        assert_eq!(stats.frames, 64);
        assert_eq!(stats.recooked_frames, 1);
    }

    #[test]
    fn invalid_tempo_is_counted_not_applied() {
        let mut processor = prepared();
        processor.pre_process(&BlockInfo::new(0, 2)).unwrap();
        let mut midi = NoMidiEvents;
        for (n, bpm) in [(0, 0.0), (1, -5.0)] {
            let mut out = [0.0];
            let mut io = FrameIo::new(&[0.0], &mut out, TransportInfo::at_bpm(bpm), n, &mut midi);
            processor.process_frame(&mut io).unwrap();
        }
        let stats = processor.post_process(&BlockInfo::new(0, 2));
        assert_eq!(stats.invalid_tempo_frames, 2);
        assert_eq!(stats.last_invalid_bpm, Some(-5.0));
        assert_eq!(processor.clock().bpm(), TempoClock::DEFAULT_BPM);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let processor = prepared();
        assert_eq!(
            processor.update_plugin_parameter(ParamId(99), 1.0, UpdateContext::Automation),
            Err(ParamError::InvalidParameterId(ParamId(99)))
        );
        assert_eq!(processor.parameter_value(ParamId(99)), None);
    }

    #[test]
    fn presets_resolve_by_name() {
        let mut processor = prepared();
        let preset = processor.find_preset("loud").unwrap();
        assert_eq!(processor.apply_preset(preset), Ok(1));
        run(&mut processor, 0, &[0.0]);
        assert_eq!(processor.parameter_value(GAIN), Some(6.0));
        assert!(processor.find_preset("quiet").is_none());
    }
}
