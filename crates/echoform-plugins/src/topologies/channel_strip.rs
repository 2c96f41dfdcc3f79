//! Vocal channel strip.
//!
//! ```text
//! x · in ─▶ tube preamp ─┬─▶ gate ─▶ compressor ─┬─▶ HPF 200 ─▶ box ─▶ sharp ─▶ air ─┬─▶ eq
//!          (preamp mute) ┘                       └──────────── (EQ mute) ───────────┘
//!
//! eq ─┬────────────────────── ·0.6 ─┐
//!     ├─▶ ping-pong delay ─── ·0.6 ─┼─(+)─▶ · out
//!     └─▶ reverb tank ─────── ·0.6 ─┘
//! ```
//!
//! Both mutes pick between branches that were both computed, so a muted
//! stage keeps its state current. The three 0.6 gains are applied as they
//! are; their sum is not normalized.

use echoform_core::{
    Chain, EffectStage, EffectStageExt, Frame, NoteDivision, ParallelMix, ParamDescriptor,
    ParamEnum, ParamId, ParameterStore, PresetSnapshot, StereoPair, StereoStage, TempoClock,
    select_frame,
};
use echoform_effects::{
    AudioFilter, DelayMode, Dynamics, DynamicsConfig, FilterAlgorithm, FilterConfig,
    ReverbDensity, ReverbTank, ReverbTankConfig, StereoDelay, StereoDelayConfig, TubePreamp,
    TubePreampConfig,
};

use crate::lifecycle::PluginKind;
use crate::processor::Topology;

/// Parameter ids.
pub mod ids {
    use echoform_core::ParamId;

    /// Input level, dB.
    pub const IN_LEVEL: ParamId = ParamId(40);
    /// Output level, dB.
    pub const OUT_LEVEL: ParamId = ParamId(42);

    /// Preamp input level, dB.
    pub const PREAMP_IN: ParamId = ParamId(50);
    /// Preamp saturation.
    pub const PREAMP_SATURATION: ParamId = ParamId(51);
    /// Preamp asymmetry.
    pub const PREAMP_ASYMMETRY: ParamId = ParamId(52);
    /// Preamp output level, dB.
    pub const PREAMP_OUT: ParamId = ParamId(53);
    /// Skip the preamp.
    pub const PREAMP_MUTE: ParamId = ParamId(54);

    /// Gate threshold, dB.
    pub const GATE_THRESHOLD: ParamId = ParamId(4);
    /// Gate attack, ms.
    pub const GATE_ATTACK: ParamId = ParamId(24);
    /// Gate release, ms.
    pub const GATE_RELEASE: ParamId = ParamId(34);
    /// Gate output gain, dB.
    pub const GATE_GAIN: ParamId = ParamId(44);

    /// Compressor threshold, dB.
    pub const COMP_THRESHOLD: ParamId = ParamId(5);
    /// Compressor ratio, `r:1`.
    pub const COMP_RATIO: ParamId = ParamId(15);
    /// Compressor attack, ms.
    pub const COMP_ATTACK: ParamId = ParamId(25);
    /// Compressor release, ms.
    pub const COMP_RELEASE: ParamId = ParamId(35);
    /// Compressor make-up gain, dB.
    pub const COMP_GAIN: ParamId = ParamId(45);

    /// Box (low-mid) band gain, dB.
    pub const BOX_GAIN: ParamId = ParamId(0);
    /// Box band centre, Hz.
    pub const BOX_FREQ: ParamId = ParamId(10);
    /// Box band Q.
    pub const BOX_Q: ParamId = ParamId(20);
    /// Sharp (presence) band gain, dB.
    pub const SHARP_GAIN: ParamId = ParamId(1);
    /// Sharp band centre, Hz.
    pub const SHARP_FREQ: ParamId = ParamId(11);
    /// Sharp band Q.
    pub const SHARP_Q: ParamId = ParamId(21);
    /// Air shelf gain, dB.
    pub const AIR_GAIN: ParamId = ParamId(2);
    /// Air shelf corner, Hz.
    pub const AIR_FREQ: ParamId = ParamId(12);
    /// Skip the EQ.
    pub const EQ_MUTE: ParamId = ParamId(22);

    /// Reverb dry level, dB.
    pub const VERB_DRY: ParamId = ParamId(17);
    /// Reverb wet level, dB.
    pub const VERB_WET: ParamId = ParamId(7);
    /// Reverb tank size, ms.
    pub const VERB_SIZE: ParamId = ParamId(27);
    /// Reverb pre-delay, ms.
    pub const PRE_DELAY: ParamId = ParamId(37);
    /// Reverb time, 0 to 1.
    pub const REVERB_TIME: ParamId = ParamId(47);

    /// Delay dry level, dB.
    pub const DELAY_DRY: ParamId = ParamId(9);
    /// Delay wet level, dB.
    pub const DELAY_WET: ParamId = ParamId(19);
    /// Delay feedback, percent.
    pub const DELAY_FEEDBACK: ParamId = ParamId(8);
    /// Free delay time, ms. Accepted but not routed; the taps follow
    /// [`DELAY_DIVISION`].
    pub const DELAY_TIME: ParamId = ParamId(18);
    /// Tempo-synced delay length.
    pub const DELAY_DIVISION: ParamId = ParamId(28);
}

/// Synced delay lengths offered by the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayDivision {
    /// One beat.
    #[default]
    Quarter,
    /// One and a half beats.
    DottedQuarter,
    /// Half a beat.
    Eighth,
    /// Three quarters of a beat.
    DottedEighth,
}

impl DelayDivision {
    /// The note division this length stands for.
    pub const fn note_division(self) -> NoteDivision {
        match self {
            DelayDivision::Quarter => NoteDivision::Quarter,
            DelayDivision::DottedQuarter => NoteDivision::DottedQuarter,
            DelayDivision::Eighth => NoteDivision::Eighth,
            DelayDivision::DottedEighth => NoteDivision::DottedEighth,
        }
    }
}

impl ParamEnum for DelayDivision {
    const LABELS: &'static [&'static str] = &["Quarter", "Dotted4", "Eighth", "Dotted8"];

    fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Quarter),
            1 => Some(Self::DottedQuarter),
            2 => Some(Self::Eighth),
            3 => Some(Self::DottedEighth),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

const LEVEL_SMOOTHING_MS: f32 = 20.0;
const HIGHPASS_HZ: f32 = 200.0;
const PREAMP_SHELF_HZ: f32 = 15000.0;
const PREAMP_SHELF_DB: f32 = 2.5;
const DELAY_BUFFER_MS: f32 = 2000.0;
const REVERB_DAMPING: f32 = 0.3;

/// Branch gain for dry, delay and reverb alike.
const BRANCH_GAIN: f32 = 0.6;

static PARAMS: [ParamDescriptor; 35] = [
    ParamDescriptor::gain_db("Input Level", "In", -12.0, 12.0, 0.0)
        .with_id(ids::IN_LEVEL, "inlvl")
        .with_smoothing(LEVEL_SMOOTHING_MS),
    ParamDescriptor::gain_db("Output Level", "Out", -12.0, 12.0, 0.0)
        .with_id(ids::OUT_LEVEL, "outlvl")
        .with_smoothing(LEVEL_SMOOTHING_MS),
    ParamDescriptor::gain_db("Preamp Input", "PreIn", -60.0, 12.0, -3.0)
        .with_id(ids::PREAMP_IN, "prein"),
    ParamDescriptor::plain("Preamp Saturation", "PreSat", 1.0, 3.0, 1.0)
        .with_id(ids::PREAMP_SATURATION, "presat"),
    ParamDescriptor::plain("Preamp Asymmetry", "PreAsym", 0.0, 10.0, 0.0)
        .with_id(ids::PREAMP_ASYMMETRY, "preass"),
    ParamDescriptor::gain_db("Preamp Output", "PreOut", -30.0, 6.0, -3.0)
        .with_id(ids::PREAMP_OUT, "preout"),
    ParamDescriptor::switch("Preamp Mute", "PreMute", false)
        .with_id(ids::PREAMP_MUTE, "preampmute"),
    ParamDescriptor::gain_db("Gate Threshold", "GateTh", -60.0, 0.0, -60.0)
        .with_id(ids::GATE_THRESHOLD, "gatethresh"),
    ParamDescriptor::time_ms("Gate Attack", "GateAtk", 300.0, 1000.0, 300.0)
        .with_id(ids::GATE_ATTACK, "gateattack"),
    ParamDescriptor::time_ms("Gate Release", "GateRel", 300.0, 1000.0, 300.0)
        .with_id(ids::GATE_RELEASE, "gaterelease"),
    ParamDescriptor::gain_db("Gate Gain", "GateGn", -12.0, 12.0, 0.0)
        .with_id(ids::GATE_GAIN, "gategain"),
    ParamDescriptor::gain_db("Comp Threshold", "CompTh", -36.0, 0.0, 0.0)
        .with_id(ids::COMP_THRESHOLD, "compthresh"),
    ParamDescriptor::ratio("Comp Ratio", "Ratio", 1.0, 100.0, 50.0)
        .with_id(ids::COMP_RATIO, "compratio"),
    ParamDescriptor::time_ms("Comp Attack", "CompAtk", 300.0, 1000.0, 300.0)
        .with_id(ids::COMP_ATTACK, "compattack"),
    ParamDescriptor::time_ms("Comp Release", "CompRel", 300.0, 1000.0, 300.0)
        .with_id(ids::COMP_RELEASE, "comprelease"),
    ParamDescriptor::gain_db("Comp Gain", "CompGn", -12.0, 12.0, 0.0)
        .with_id(ids::COMP_GAIN, "compgain"),
    ParamDescriptor::gain_db("Box Gain", "BoxGn", -12.0, 12.0, 0.0)
        .with_id(ids::BOX_GAIN, "boxgain"),
    ParamDescriptor::frequency_hz("Box Freq", "BoxHz", 300.0, 650.0, 450.0)
        .with_id(ids::BOX_FREQ, "boxfc"),
    ParamDescriptor::plain("Box Q", "BoxQ", 0.0, 12.0, 6.0).with_id(ids::BOX_Q, "boxq"),
    ParamDescriptor::gain_db("Sharp Gain", "ShrpGn", -12.0, 12.0, 0.0)
        .with_id(ids::SHARP_GAIN, "sharpgain"),
    ParamDescriptor::frequency_hz("Sharp Freq", "ShrpHz", 1000.0, 4000.0, 2500.0)
        .with_id(ids::SHARP_FREQ, "sharpfc"),
    ParamDescriptor::plain("Sharp Q", "ShrpQ", 0.0, 12.0, 6.0).with_id(ids::SHARP_Q, "sharpq"),
    ParamDescriptor::gain_db("Air Gain", "AirGn", -12.0, 12.0, 0.0)
        .with_id(ids::AIR_GAIN, "airgain"),
    ParamDescriptor::frequency_hz("Air Freq", "AirHz", 10000.0, 20000.0, 15000.0)
        .with_id(ids::AIR_FREQ, "airfc"),
    ParamDescriptor::switch("EQ Mute", "EQMute", false).with_id(ids::EQ_MUTE, "eqmute"),
    ParamDescriptor::gain_db("Verb Dry", "VrbDry", -60.0, 0.0, -60.0)
        .with_id(ids::VERB_DRY, "drygain"),
    ParamDescriptor::gain_db("Verb Wet", "VrbWet", -60.0, 0.0, -60.0)
        .with_id(ids::VERB_WET, "verbgain"),
    ParamDescriptor::time_ms("Verb Time", "VrbSize", 0.0, 5000.0, 10.0)
        .with_id(ids::VERB_SIZE, "verbtime"),
    ParamDescriptor::time_ms("Predelay", "PreDly", 0.0, 500.0, 0.0)
        .with_id(ids::PRE_DELAY, "preverbtime"),
    ParamDescriptor::plain("Reverb Time", "RT", 0.0, 1.0, 0.5)
        .with_id(ids::REVERB_TIME, "verbtime2"),
    ParamDescriptor::gain_db("Delay Dry", "DlyDry", -60.0, 0.0, -60.0)
        .with_id(ids::DELAY_DRY, "delaydry"),
    ParamDescriptor::gain_db("Delay Wet", "DlyWet", -60.0, 0.0, -60.0)
        .with_id(ids::DELAY_WET, "delaywet"),
    ParamDescriptor::percent("Delay Feedback", "DlyFb", 20.0)
        .with_id(ids::DELAY_FEEDBACK, "delayfb"),
    ParamDescriptor::time_ms("Delay Time", "DlyTime", 0.0, 500.0, 50.0)
        .with_id(ids::DELAY_TIME, "delaytime"),
    ParamDescriptor::choice("BPM Delay", "BPMDly", DelayDivision::LABELS, 0)
        .with_id(ids::DELAY_DIVISION, "bpmdelay"),
];

static PRESETS: [PresetSnapshot; 2] = [
    PresetSnapshot {
        name: "Factory Preset",
        values: &[
            (ids::IN_LEVEL, 0.0),
            (ids::OUT_LEVEL, 0.0),
            (ids::PREAMP_IN, -3.0),
            (ids::PREAMP_SATURATION, 1.0),
            (ids::PREAMP_ASYMMETRY, 0.0),
            (ids::PREAMP_OUT, -3.0),
            (ids::PREAMP_MUTE, 0.0),
            (ids::GATE_THRESHOLD, -60.0),
            (ids::GATE_ATTACK, 300.0),
            (ids::GATE_RELEASE, 300.0),
            (ids::GATE_GAIN, 0.0),
            (ids::COMP_THRESHOLD, 0.0),
            (ids::COMP_RATIO, 50.0),
            (ids::COMP_ATTACK, 300.0),
            (ids::COMP_RELEASE, 300.0),
            (ids::COMP_GAIN, 0.0),
            (ids::BOX_GAIN, 0.0),
            (ids::BOX_FREQ, 450.0),
            (ids::BOX_Q, 6.0),
            (ids::SHARP_GAIN, 0.0),
            (ids::SHARP_FREQ, 2500.0),
            (ids::SHARP_Q, 6.0),
            (ids::AIR_GAIN, 0.0),
            (ids::AIR_FREQ, 15000.0),
            (ids::EQ_MUTE, 0.0),
            (ids::VERB_DRY, -60.0),
            (ids::VERB_WET, -60.0),
            (ids::VERB_SIZE, 10.0),
            (ids::PRE_DELAY, 0.0),
            (ids::REVERB_TIME, 0.5),
            (ids::DELAY_DRY, -60.0),
            (ids::DELAY_WET, -60.0),
            (ids::DELAY_FEEDBACK, 20.0),
            (ids::DELAY_TIME, 50.0),
            (ids::DELAY_DIVISION, 0.0),
        ],
    },
    PresetSnapshot {
        name: "Main Vocal",
        values: &[
            (ids::IN_LEVEL, 5.64),
            (ids::OUT_LEVEL, 0.0),
            (ids::PREAMP_IN, -3.0),
            (ids::PREAMP_SATURATION, 1.19),
            (ids::PREAMP_ASYMMETRY, 0.0),
            (ids::PREAMP_OUT, -3.0),
            (ids::PREAMP_MUTE, 0.0),
            (ids::GATE_THRESHOLD, -46.8),
            (ids::GATE_ATTACK, 1000.0),
            (ids::GATE_RELEASE, 671.0),
            (ids::GATE_GAIN, 0.0),
            (ids::COMP_THRESHOLD, -23.04),
            (ids::COMP_RATIO, 56.435),
            (ids::COMP_ATTACK, 617.5),
            (ids::COMP_RELEASE, 487.0),
            (ids::COMP_GAIN, 0.0),
            (ids::BOX_GAIN, 2.88),
            (ids::BOX_FREQ, 549.75),
            (ids::BOX_Q, 5.82),
            (ids::SHARP_GAIN, 3.12),
            (ids::SHARP_FREQ, 2005.0),
            (ids::SHARP_Q, 6.0),
            (ids::AIR_GAIN, 3.48),
            (ids::AIR_FREQ, 13850.0),
            (ids::EQ_MUTE, 0.0),
            (ids::VERB_DRY, -60.0),
            (ids::VERB_WET, -36.3),
            (ids::VERB_SIZE, 2260.0),
            (ids::PRE_DELAY, 122.5),
            (ids::REVERB_TIME, 0.735),
            (ids::DELAY_DRY, -60.0),
            (ids::DELAY_WET, -24.6),
            (ids::DELAY_FEEDBACK, 40.0),
            (ids::DELAY_TIME, 185.0),
            (ids::DELAY_DIVISION, 0.0),
        ],
    },
];

/// HPF → box → sharp → air.
type EqChain = Chain<Chain<Chain<AudioFilter, AudioFilter>, AudioFilter>, AudioFilter>;

fn eq_chain() -> EqChain {
    AudioFilter::new(FilterConfig::new(FilterAlgorithm::Hpf1, HIGHPASS_HZ))
        .chain(AudioFilter::new(FilterConfig::new(FilterAlgorithm::PeakingEq, 450.0)))
        .chain(AudioFilter::new(FilterConfig::new(FilterAlgorithm::PeakingEq, 2500.0)))
        .chain(AudioFilter::new(FilterConfig::new(FilterAlgorithm::HighShelf, 15000.0)))
}

/// Preamp, gate, compressor, EQ, then parallel delay and reverb.
#[derive(Debug, Clone)]
pub struct ChannelStrip {
    in_gain: f32,
    out_gain: f32,
    preamp_muted: bool,
    eq_muted: bool,
    preamp: StereoPair<TubePreamp>,
    gate: StereoPair<Dynamics>,
    compressor: StereoPair<Dynamics>,
    eq: StereoPair<EqChain>,
    reverb: ReverbTank,
    delay: StereoDelay,
    mix: ParallelMix<2>,
}

impl ChannelStrip {
    /// The ping-pong delay.
    pub fn delay(&self) -> &StereoDelay {
        &self.delay
    }

    /// The reverb tank.
    pub fn reverb(&self) -> &ReverbTank {
        &self.reverb
    }

    fn cook_dynamics(&mut self, params: &ParameterStore) {
        let gate = DynamicsConfig::gate(params.value(ids::GATE_THRESHOLD))
            .with_times(params.value(ids::GATE_ATTACK), params.value(ids::GATE_RELEASE))
            .with_output_gain_db(params.value(ids::GATE_GAIN));
        self.gate.configure(&gate);

        let compressor = DynamicsConfig::compressor(
            params.value(ids::COMP_THRESHOLD),
            params.value(ids::COMP_RATIO),
        )
        .with_times(params.value(ids::COMP_ATTACK), params.value(ids::COMP_RELEASE))
        .with_output_gain_db(params.value(ids::COMP_GAIN));
        self.compressor.configure(&compressor);
    }

    fn cook_eq(&mut self, params: &ParameterStore) {
        let highpass = FilterConfig::new(FilterAlgorithm::Hpf1, HIGHPASS_HZ);
        let box_band = FilterConfig::new(FilterAlgorithm::PeakingEq, params.value(ids::BOX_FREQ))
            .with_q(params.value(ids::BOX_Q))
            .with_gain_db(params.value(ids::BOX_GAIN));
        let sharp = FilterConfig::new(FilterAlgorithm::PeakingEq, params.value(ids::SHARP_FREQ))
            .with_q(params.value(ids::SHARP_Q))
            .with_gain_db(params.value(ids::SHARP_GAIN));
        let air = FilterConfig::new(FilterAlgorithm::HighShelf, params.value(ids::AIR_FREQ))
            .with_gain_db(params.value(ids::AIR_GAIN));
        self.eq.configure(&(((highpass, box_band), sharp), air));
        self.eq_muted = params.is_on(ids::EQ_MUTE);
    }

    fn cook_sends(&mut self, params: &ParameterStore, clock: &TempoClock) {
        self.reverb.configure(&ReverbTankConfig {
            pre_delay_ms: params.value(ids::PRE_DELAY),
            tank_size_ms: params.value(ids::VERB_SIZE),
            rt: params.value(ids::REVERB_TIME),
            damping: REVERB_DAMPING,
            density: ReverbDensity::Thick,
            dry_db: params.value(ids::VERB_DRY),
            wet_db: params.value(ids::VERB_WET),
        });

        let division = params.choice::<DelayDivision>(ids::DELAY_DIVISION);
        let tap_ms = clock.duration_ms(division.note_division());
        self.delay.configure(&StereoDelayConfig {
            left_ms: tap_ms,
            right_ms: tap_ms,
            feedback: params.fraction(ids::DELAY_FEEDBACK),
            dry_db: params.value(ids::DELAY_DRY),
            wet_db: params.value(ids::DELAY_WET),
            mode: DelayMode::PingPong,
        });
    }
}

impl Topology for ChannelStrip {
    const NAME: &'static str = "channel_strip";
    const DESCRIPTION: &'static str =
        "Tube preamp, gate, compressor and EQ with synced ping-pong delay and reverb";
    const KIND: PluginKind = PluginKind::Effect;

    fn descriptors() -> &'static [ParamDescriptor] {
        &PARAMS
    }

    fn presets() -> &'static [PresetSnapshot] {
        &PRESETS
    }

    fn new() -> Self {
        Self {
            in_gain: 1.0,
            out_gain: 1.0,
            preamp_muted: false,
            eq_muted: false,
            preamp: StereoPair::new(TubePreamp::default()),
            gate: StereoPair::new(Dynamics::new(DynamicsConfig::gate(-60.0))),
            compressor: StereoPair::new(Dynamics::default()),
            eq: StereoPair::new(eq_chain()),
            reverb: ReverbTank::default(),
            delay: StereoDelay::with_max_delay_ms(StereoDelayConfig::default(), DELAY_BUFFER_MS),
            mix: ParallelMix {
                dry: BRANCH_GAIN,
                wet: [BRANCH_GAIN; 2],
            },
        }
    }

    fn reset(&mut self, sample_rate: f32) {
        self.preamp.reset(sample_rate);
        self.gate.reset(sample_rate);
        self.compressor.reset(sample_rate);
        self.eq.reset(sample_rate);
        self.reverb.reset(sample_rate);
        self.delay.reset(sample_rate);
    }

    fn cook(&mut self, params: &ParameterStore, clock: &TempoClock) {
        self.in_gain = params.gain(ids::IN_LEVEL);
        self.out_gain = params.gain(ids::OUT_LEVEL);

        self.preamp.configure(&TubePreampConfig {
            input_db: params.value(ids::PREAMP_IN),
            saturation: params.value(ids::PREAMP_SATURATION),
            asymmetry: params.value(ids::PREAMP_ASYMMETRY),
            output_db: params.value(ids::PREAMP_OUT),
            shelf_hz: PREAMP_SHELF_HZ,
            shelf_db: PREAMP_SHELF_DB,
        });
        self.preamp_muted = params.is_on(ids::PREAMP_MUTE);

        self.cook_dynamics(params);
        self.cook_eq(params);
        self.cook_sends(params, clock);
    }

    fn process(&mut self, input: Frame) -> Frame {
        let x = input.scale(self.in_gain);
        let preamped = self.preamp.process_frame(x);
        let pre = select_frame(preamped, x, self.preamp_muted);

        let compressed = self.compressor.process_frame(self.gate.process_frame(pre));
        let equalized = self.eq.process_frame(compressed);
        let eq = select_frame(equalized, compressed, self.eq_muted);

        let reverb = self.reverb.process_frame(eq);
        let delay = self.delay.process_frame(eq);
        self.mix.mix_frame(eq, [delay, reverb]).scale(self.out_gain)
    }
}
