//! LFO auto-panner.
//!
//! ```text
//! p = clamp(pan + depth · lfo, -1, 1)
//! p > 0:  L -= p·L      (image moves right)
//! p < 0:  R += p·R      (image moves left)
//! ```
//!
//! The LFO runs free in Hz or locks to the host tempo. Input and output
//! gains ramp over 20 ms.

use echoform_core::{
    Frame, FrequencySource, NoteDivision, Oscillator, OscillatorWaveform, ParamDescriptor,
    ParamEnum, ParamId, ParameterStore, Polarity, PresetSnapshot, TempoClock,
};

use crate::lifecycle::PluginKind;
use crate::processor::Topology;

/// Parameter ids.
pub mod ids {
    use echoform_core::ParamId;

    /// Static pan position, -1 (left) to 1 (right).
    pub const PAN: ParamId = ParamId(0);
    /// Input gain, dB.
    pub const IN_GAIN: ParamId = ParamId(1);
    /// Output gain, dB.
    pub const OUT_GAIN: ParamId = ParamId(2);
    /// LFO depth, percent.
    pub const DEPTH: ParamId = ParamId(3);
    /// Free-running LFO rate, Hz.
    pub const FREQUENCY: ParamId = ParamId(4);
    /// Lock the LFO to the host tempo.
    pub const BPM_SYNC: ParamId = ParamId(5);
    /// Synced LFO period.
    pub const DIVISION: ParamId = ParamId(6);
    /// LFO waveform.
    pub const WAVEFORM: ParamId = ParamId(7);
    /// Read the inverted LFO output.
    pub const INVERT: ParamId = ParamId(8);
}

/// Synced periods offered by the panner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanDivision {
    /// One beat.
    #[default]
    Quarter,
    /// Triplet quarter.
    Sixth,
    /// Half a beat.
    Eighth,
    /// Quarter of a beat.
    Sixteenth,
}

impl PanDivision {
    /// The note division this period stands for.
    pub const fn note_division(self) -> NoteDivision {
        match self {
            PanDivision::Quarter => NoteDivision::Quarter,
            PanDivision::Sixth => NoteDivision::TripletQuarter,
            PanDivision::Eighth => NoteDivision::Eighth,
            PanDivision::Sixteenth => NoteDivision::Sixteenth,
        }
    }
}

impl ParamEnum for PanDivision {
    const LABELS: &'static [&'static str] = &["Quarter", "Sixth", "Eighth", "Sixteenth"];

    fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Quarter),
            1 => Some(Self::Sixth),
            2 => Some(Self::Eighth),
            3 => Some(Self::Sixteenth),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

const GAIN_SMOOTHING_MS: f32 = 20.0;

static PARAMS: [ParamDescriptor; 9] = [
    ParamDescriptor::plain("Pan", "Pan", -1.0, 1.0, 0.0).with_id(ids::PAN, "pan"),
    ParamDescriptor::gain_db("Input Gain", "In", -24.0, 12.0, 0.0)
        .with_id(ids::IN_GAIN, "ingain")
        .with_smoothing(GAIN_SMOOTHING_MS),
    ParamDescriptor::gain_db("Output Gain", "Out", -24.0, 12.0, 0.0)
        .with_id(ids::OUT_GAIN, "outgain")
        .with_smoothing(GAIN_SMOOTHING_MS),
    ParamDescriptor::percent("Depth", "Depth", 0.0).with_id(ids::DEPTH, "depth"),
    ParamDescriptor::frequency_hz("Frequency", "Freq", 0.02, 5.0, 1.0)
        .with_id(ids::FREQUENCY, "frequency"),
    ParamDescriptor::switch("BPM Sync", "Sync", false).with_id(ids::BPM_SYNC, "bpmsync"),
    ParamDescriptor::choice("BPM Division", "Div", PanDivision::LABELS, 0)
        .with_id(ids::DIVISION, "bpmdivision"),
    ParamDescriptor::choice("Waveform", "Wave", OscillatorWaveform::LABELS, 0)
        .with_id(ids::WAVEFORM, "waveform"),
    ParamDescriptor::switch("Invert", "Inv", false).with_id(ids::INVERT, "invert"),
];

static PRESETS: [PresetSnapshot; 2] = [
    PresetSnapshot {
        name: "Factory Preset",
        values: &[
            (ids::PAN, 0.0),
            (ids::IN_GAIN, 0.0),
            (ids::OUT_GAIN, 0.0),
            (ids::DEPTH, 0.0),
            (ids::FREQUENCY, 1.0),
            (ids::BPM_SYNC, 0.0),
            (ids::DIVISION, 0.0),
            (ids::WAVEFORM, 0.0),
            (ids::INVERT, 0.0),
        ],
    },
    PresetSnapshot {
        name: "Eighth Sweep",
        values: &[
            (ids::PAN, 0.0),
            (ids::IN_GAIN, 0.0),
            (ids::OUT_GAIN, 0.0),
            (ids::DEPTH, 80.0),
            (ids::FREQUENCY, 1.0),
            (ids::BPM_SYNC, 1.0),
            (ids::DIVISION, 2.0),
            (ids::WAVEFORM, 1.0),
            (ids::INVERT, 0.0),
        ],
    },
];

/// Stereo auto-panner.
#[derive(Debug, Clone)]
pub struct AutoPan {
    lfo: Oscillator,
    polarity: Polarity,
    pan: f32,
    depth: f32,
    in_gain: f32,
    out_gain: f32,
}

impl AutoPan {
    /// Pan position for one LFO value.
    #[inline]
    fn position(&self, lfo: f32) -> f32 {
        (self.pan + self.depth * lfo).clamp(-1.0, 1.0)
    }
}

/// Attenuate the side away from `position`.
#[inline]
fn pan_frame(frame: Frame, position: f32) -> Frame {
    let Frame { mut left, mut right } = frame;
    if position > 0.0 {
        left -= position * left;
    } else if position < 0.0 {
        right += position * right;
    }
    Frame::new(left, right)
}

impl Topology for AutoPan {
    const NAME: &'static str = "auto_pan";
    const DESCRIPTION: &'static str = "LFO auto-panner with tempo sync";
    const KIND: PluginKind = PluginKind::Effect;

    fn descriptors() -> &'static [ParamDescriptor] {
        &PARAMS
    }

    fn presets() -> &'static [PresetSnapshot] {
        &PRESETS
    }

    fn new() -> Self {
        Self {
            lfo: Oscillator::new(48000.0, 1.0),
            polarity: Polarity::Normal,
            pan: 0.0,
            depth: 0.0,
            in_gain: 1.0,
            out_gain: 1.0,
        }
    }

    fn reset(&mut self, sample_rate: f32) {
        self.lfo.reset(sample_rate);
    }

    fn cook(&mut self, params: &ParameterStore, clock: &TempoClock) {
        self.pan = params.value(ids::PAN);
        self.in_gain = params.gain(ids::IN_GAIN);
        self.out_gain = params.gain(ids::OUT_GAIN);
        self.depth = params.fraction(ids::DEPTH);
        self.polarity = Polarity::from_inverted(params.is_on(ids::INVERT));
        self.lfo.set_waveform(params.choice(ids::WAVEFORM));

        let division = params.choice::<PanDivision>(ids::DIVISION).note_division();
        let source = FrequencySource::from_sync(
            params.is_on(ids::BPM_SYNC),
            params.value(ids::FREQUENCY),
            division,
        );
        self.lfo.set_frequency(source.resolve(clock));
    }

    #[inline]
    fn process(&mut self, input: Frame) -> Frame {
        let lfo = self.lfo.render().select(self.polarity);
        let position = self.position(lfo);
        pan_frame(input.scale(self.in_gain), position).scale(self.out_gain)
    }
}
