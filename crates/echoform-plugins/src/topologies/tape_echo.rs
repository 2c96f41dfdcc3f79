//! Tape echo with wow and flutter.
//!
//! Each frame the [`DelayModulator`] renders a tap time from three summed
//! oscillators and low-passed drift noise around the Delay Time control,
//! and the [`TapeDelay`] reads both channels at that tap:
//!
//! ```text
//! x ─▶ record → band-limit → limiter → (+ fb) → saturate (+ hiss + hum) → tape ─▶ playback ─┐
//! └────────────────────────────────── dry ─────────────────────────────────────────────(+)─▶ · out
//!                                                   tap_ms ◀── DelayModulator
//! ```

use echoform_core::{
    DelayModulator, DelayModulatorConfig, EffectStage, Frame, FrequencySource, ParamDescriptor,
    ParamId, ParamUnit, ParameterStore, PresetSnapshot, StereoStage, TempoClock, VoiceConfig,
};
use echoform_effects::{BandLimitConfig, TapeDelay, TapeDelayConfig};

use crate::lifecycle::PluginKind;
use crate::processor::Topology;

/// Parameter ids.
pub mod ids {
    use echoform_core::ParamId;

    /// Record-path highpass, Hz.
    pub const HP_CUTOFF: ParamId = ParamId(0);
    /// Record-path lowpass, Hz.
    pub const LP_CUTOFF: ParamId = ParamId(1);
    /// Limiter threshold, dB.
    pub const LIMITER_THRESHOLD: ParamId = ParamId(2);
    /// Limiter make-up gain, dB.
    pub const MAKEUP: ParamId = ParamId(3);
    /// Record level, dB.
    pub const RECORD: ParamId = ParamId(4);
    /// Playback level, dB.
    pub const PLAYBACK: ParamId = ParamId(5);
    /// Dry level, dB.
    pub const DRY: ParamId = ParamId(14);
    /// Feedback, percent.
    pub const FEEDBACK: ParamId = ParamId(15);
    /// Wow/flutter oscillator rates, Hz.
    pub const LFO_FREQ: [ParamId; 3] = [ParamId(20), ParamId(21), ParamId(22)];
    /// Wow/flutter oscillator gains.
    pub const LFO_GAIN: [ParamId; 3] = [ParamId(30), ParamId(31), ParamId(32)];
    /// Modulation depth, percent.
    pub const LFO_DEPTH: ParamId = ParamId(23);
    /// Drift noise cutoff, Hz.
    pub const NOISE_CUTOFF: ParamId = ParamId(25);
    /// Drift noise gain.
    pub const NOISE_GAIN: ParamId = ParamId(35);
    /// Centre delay time, ms.
    pub const DELAY_TIME: ParamId = ParamId(27);
    /// Tape saturation.
    pub const SATURATION: ParamId = ParamId(50);
    /// 60 Hz hum level.
    pub const HUM: ParamId = ParamId(51);
    /// Tape hiss cutoff, Hz.
    pub const HISS_CUTOFF: ParamId = ParamId(52);
    /// Tape hiss level.
    pub const HISS: ParamId = ParamId(53);
    /// Output level, dB.
    pub const OUTPUT: ParamId = ParamId(54);
}

static PARAMS: [ParamDescriptor; 23] = [
    ParamDescriptor::frequency_hz("HP Cutoff", "HP", 20.0, 1000.0, 20.0)
        .with_id(ids::HP_CUTOFF, "hpcutoff"),
    ParamDescriptor::frequency_hz("LP Cutoff", "LP", 8000.0, 20000.0, 8000.0)
        .with_id(ids::LP_CUTOFF, "lpcutoff"),
    ParamDescriptor::gain_db("Threshold", "Thresh", -24.0, -3.0, -24.0)
        .with_id(ids::LIMITER_THRESHOLD, "threshold"),
    ParamDescriptor::gain_db("Make Up Gain", "MakeUp", 0.0, 10.0, 0.0)
        .with_id(ids::MAKEUP, "makeup"),
    ParamDescriptor::gain_db("Record Level", "Rec", 0.0, 10.0, 0.0)
        .with_id(ids::RECORD, "record"),
    ParamDescriptor::gain_db("Playback Level", "Play", 0.0, 10.0, 0.0)
        .with_id(ids::PLAYBACK, "playback"),
    ParamDescriptor::gain_db("Dry Gain", "Dry", 0.0, 10.0, 0.0).with_id(ids::DRY, "drygain"),
    ParamDescriptor::percent("Feedback", "Fdbk", 0.0).with_id(ids::FEEDBACK, "feedback"),
    ParamDescriptor::frequency_hz("LFO 1 Freq", "LFO1 Hz", 2.5, 500.0, 2.5)
        .with_id(ids::LFO_FREQ[0], "lfo1freq"),
    ParamDescriptor::frequency_hz("LFO 2 Freq", "LFO2 Hz", 5.0, 500.0, 5.0)
        .with_id(ids::LFO_FREQ[1], "lfo2freq"),
    ParamDescriptor::frequency_hz("LFO 3 Freq", "LFO3 Hz", 26.0, 500.0, 26.0)
        .with_id(ids::LFO_FREQ[2], "lfo3freq"),
    ParamDescriptor::plain("LFO 1 Gain", "LFO1", 0.0, 10.0, 0.0)
        .with_id(ids::LFO_GAIN[0], "lfo1gain"),
    ParamDescriptor::plain("LFO 2 Gain", "LFO2", 0.0, 10.0, 0.0)
        .with_id(ids::LFO_GAIN[1], "lfo2gain"),
    ParamDescriptor::plain("LFO 3 Gain", "LFO3", 0.0, 10.0, 0.0)
        .with_id(ids::LFO_GAIN[2], "lfo3gain"),
    ParamDescriptor::percent("LFO Depth", "Depth", 50.0).with_id(ids::LFO_DEPTH, "lfodepth"),
    ParamDescriptor {
        unit: ParamUnit::Hertz,
        ..ParamDescriptor::plain("Noise Cutoff", "NoiseHz", 0.0, 100.0, 50.0)
    }
    .with_id(ids::NOISE_CUTOFF, "noisefc"),
    ParamDescriptor::plain("Noise Gain", "Noise", 0.0, 10.0, 1.0)
        .with_id(ids::NOISE_GAIN, "noisegain"),
    ParamDescriptor::time_ms("Delay Time", "Time", 90.0, 680.0, 90.0)
        .with_id(ids::DELAY_TIME, "delaytime"),
    ParamDescriptor::plain("Saturation", "Sat", 0.0, 20.0, 1.0)
        .with_id(ids::SATURATION, "saturation"),
    ParamDescriptor::plain("System Noise Gain", "Hum", 0.0, 10.0, 1.0).with_id(ids::HUM, "hum"),
    ParamDescriptor::frequency_hz("Tape Cutoff", "HissHz", 20.0, 20000.0, 10000.0)
        .with_id(ids::HISS_CUTOFF, "tapenoisefc"),
    ParamDescriptor::plain("Tape Gain", "Hiss", 0.0, 2.5, 1.0).with_id(ids::HISS, "tapenoise"),
    ParamDescriptor::gain_db("Output Gain", "Out", -40.0, 12.0, -40.0)
        .with_id(ids::OUTPUT, "outputgain"),
];

/// Preset values in [`PARAMS`] order.
const fn preset(name: &'static str, values: &'static [(ParamId, f32); 23]) -> PresetSnapshot {
    PresetSnapshot { name, values }
}

static PRESETS: [PresetSnapshot; 3] = [
    preset(
        "Factory Preset",
        &[
            (ids::HP_CUTOFF, 20.0),
            (ids::LP_CUTOFF, 8000.0),
            (ids::LIMITER_THRESHOLD, -24.0),
            (ids::MAKEUP, 0.0),
            (ids::RECORD, 0.0),
            (ids::PLAYBACK, 0.0),
            (ids::DRY, 0.0),
            (ids::FEEDBACK, 0.0),
            (ids::LFO_FREQ[0], 2.5),
            (ids::LFO_FREQ[1], 5.0),
            (ids::LFO_FREQ[2], 26.0),
            (ids::LFO_GAIN[0], 0.0),
            (ids::LFO_GAIN[1], 0.0),
            (ids::LFO_GAIN[2], 0.0),
            (ids::LFO_DEPTH, 50.0),
            (ids::NOISE_CUTOFF, 50.0),
            (ids::NOISE_GAIN, 1.0),
            (ids::DELAY_TIME, 90.0),
            (ids::SATURATION, 1.0),
            (ids::HUM, 1.0),
            (ids::HISS_CUTOFF, 10000.0),
            (ids::HISS, 1.0),
            (ids::OUTPUT, -40.0),
        ],
    ),
    preset(
        "Preset 1",
        &[
            (ids::HP_CUTOFF, 402.2),
            (ids::LP_CUTOFF, 8000.0),
            (ids::LIMITER_THRESHOLD, -24.0),
            (ids::MAKEUP, 0.0),
            (ids::RECORD, 3.65),
            (ids::PLAYBACK, 2.75),
            (ids::DRY, 5.1),
            (ids::FEEDBACK, 26.5),
            (ids::LFO_FREQ[0], 2.5),
            (ids::LFO_FREQ[1], 5.0),
            (ids::LFO_FREQ[2], 26.0),
            (ids::LFO_GAIN[0], 1.0),
            (ids::LFO_GAIN[1], 1.1),
            (ids::LFO_GAIN[2], 0.65),
            (ids::LFO_DEPTH, 14.0),
            (ids::NOISE_CUTOFF, 50.0),
            (ids::NOISE_GAIN, 1.0),
            (ids::DELAY_TIME, 317.15),
            (ids::SATURATION, 20.0),
            (ids::HUM, 4.25),
            (ids::HISS_CUTOFF, 10000.0),
            (ids::HISS, 1.05),
            (ids::OUTPUT, -40.0),
        ],
    ),
    preset(
        "START",
        &[
            (ids::HP_CUTOFF, 299.3),
            (ids::LP_CUTOFF, 8000.0),
            (ids::LIMITER_THRESHOLD, -20.43),
            (ids::MAKEUP, 0.7),
            (ids::RECORD, 2.1),
            (ids::PLAYBACK, 2.1),
            (ids::DRY, 4.95),
            (ids::FEEDBACK, 23.5),
            (ids::LFO_FREQ[0], 2.5),
            (ids::LFO_FREQ[1], 5.0),
            (ids::LFO_FREQ[2], 26.0),
            (ids::LFO_GAIN[0], 1.45),
            (ids::LFO_GAIN[1], 2.05),
            (ids::LFO_GAIN[2], 2.25),
            (ids::LFO_DEPTH, 8.5),
            (ids::NOISE_CUTOFF, 19.5),
            (ids::NOISE_GAIN, 2.7),
            (ids::DELAY_TIME, 90.0),
            (ids::SATURATION, 0.0),
            (ids::HUM, 4.5),
            (ids::HISS_CUTOFF, 12897.1),
            (ids::HISS, 0.0),
            (ids::OUTPUT, -40.0),
        ],
    ),
];

/// Modulated tape echo.
#[derive(Debug, Clone)]
pub struct TapeEcho {
    modulator: DelayModulator,
    tape: TapeDelay,
}

impl TapeEcho {
    /// The tape stage.
    pub fn tape(&self) -> &TapeDelay {
        &self.tape
    }
}

fn modulator_config(params: &ParameterStore) -> DelayModulatorConfig {
    let voices = core::array::from_fn(|i| VoiceConfig {
        frequency: FrequencySource::Free(params.value(ids::LFO_FREQ[i])),
        gain: params.value(ids::LFO_GAIN[i]),
        ..VoiceConfig::default()
    });
    DelayModulatorConfig {
        base_ms: params.value(ids::DELAY_TIME),
        depth: params.fraction(ids::LFO_DEPTH),
        voices,
        noise_cutoff: params.value(ids::NOISE_CUTOFF),
        noise_gain: params.value(ids::NOISE_GAIN),
    }
}

fn tape_config(params: &ParameterStore) -> TapeDelayConfig {
    TapeDelayConfig {
        record_db: params.value(ids::RECORD),
        playback_db: params.value(ids::PLAYBACK),
        band: BandLimitConfig {
            highpass_hz: params.value(ids::HP_CUTOFF),
            lowpass_hz: params.value(ids::LP_CUTOFF),
        },
        limiter_threshold_db: params.value(ids::LIMITER_THRESHOLD),
        makeup_db: params.value(ids::MAKEUP),
        feedback: params.fraction(ids::FEEDBACK),
        saturation: params.value(ids::SATURATION),
        hum: params.value(ids::HUM),
        hiss_cutoff: params.value(ids::HISS_CUTOFF),
        hiss: params.value(ids::HISS),
        delay_ms: params.value(ids::DELAY_TIME),
        dry_db: params.value(ids::DRY),
        output_db: params.value(ids::OUTPUT),
    }
}

impl Topology for TapeEcho {
    const NAME: &'static str = "tape_echo";
    const DESCRIPTION: &'static str = "Tape echo with wow, flutter, hiss and hum";
    const KIND: PluginKind = PluginKind::Effect;

    fn descriptors() -> &'static [ParamDescriptor] {
        &PARAMS
    }

    fn presets() -> &'static [PresetSnapshot] {
        &PRESETS
    }

    fn new() -> Self {
        Self {
            modulator: DelayModulator::new(48000.0),
            tape: TapeDelay::default(),
        }
    }

    fn reset(&mut self, sample_rate: f32) {
        self.modulator.reset(sample_rate);
        self.tape.reset(sample_rate);
    }

    fn cook(&mut self, params: &ParameterStore, clock: &TempoClock) {
        self.modulator.configure(&modulator_config(params), clock);
        self.tape.configure(&tape_config(params));
    }

    #[inline]
    fn process(&mut self, input: Frame) -> Frame {
        let tap_ms = self.modulator.render();
        self.tape.set_tap_ms(tap_ms);
        self.tape.process_frame(input)
    }
}
