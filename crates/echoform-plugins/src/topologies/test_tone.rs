//! Test-tone generator: the modulation engine rendered as audio.
//!
//! Takes no input. The same sample goes to every output channel.

use echoform_core::{
    Frame, FrequencySource, ModulationEngine, NoteDivision, OscillatorWaveform, ParamDescriptor,
    ParamEnum, ParamId, ParameterStore, Polarity, PresetSnapshot, TempoClock, VoiceConfig,
};

use crate::lifecycle::PluginKind;
use crate::processor::Topology;

/// Parameter ids.
pub mod ids {
    use echoform_core::ParamId;

    /// Waveform.
    pub const WAVEFORM: ParamId = ParamId(0);
    /// Free-running pitch, Hz.
    pub const FREQUENCY: ParamId = ParamId(1);
    /// Lock the period to the host tempo.
    pub const BPM_SYNC: ParamId = ParamId(2);
    /// Synced period.
    pub const DIVISION: ParamId = ParamId(3);
    /// Output level, dB.
    pub const LEVEL: ParamId = ParamId(4);
    /// Read the inverted waveform.
    pub const INVERT: ParamId = ParamId(5);
}

static PARAMS: [ParamDescriptor; 6] = [
    ParamDescriptor::choice("Waveform", "Wave", OscillatorWaveform::LABELS, 0)
        .with_id(ids::WAVEFORM, "waveform"),
    ParamDescriptor::frequency_hz("Frequency", "Freq", 0.1, 20000.0, 440.0)
        .with_id(ids::FREQUENCY, "frequency"),
    ParamDescriptor::switch("BPM Sync", "Sync", false).with_id(ids::BPM_SYNC, "bpmsync"),
    ParamDescriptor::choice("BPM Division", "Div", NoteDivision::LABELS, 2)
        .with_id(ids::DIVISION, "bpmdivision"),
    ParamDescriptor::gain_db("Level", "Level", -60.0, 0.0, -12.0)
        .with_id(ids::LEVEL, "level")
        .with_smoothing(20.0),
    ParamDescriptor::switch("Invert", "Inv", false).with_id(ids::INVERT, "invert"),
];

static PRESETS: [PresetSnapshot; 2] = [
    PresetSnapshot {
        name: "Factory Preset",
        values: &[
            (ids::WAVEFORM, 0.0),
            (ids::FREQUENCY, 440.0),
            (ids::BPM_SYNC, 0.0),
            (ids::DIVISION, 2.0),
            (ids::LEVEL, -12.0),
            (ids::INVERT, 0.0),
        ],
    },
    PresetSnapshot {
        name: "Click Saw",
        values: &[
            (ids::WAVEFORM, 2.0),
            (ids::FREQUENCY, 440.0),
            (ids::BPM_SYNC, 1.0),
            (ids::DIVISION, 2.0),
            (ids::LEVEL, -18.0),
            (ids::INVERT, 0.0),
        ],
    },
];

/// Single-voice tone generator.
#[derive(Debug, Clone)]
pub struct TestTone {
    engine: ModulationEngine<1>,
}

impl TestTone {
    /// The voice's current pitch in Hz.
    pub fn frequency(&self) -> f32 {
        self.engine.voices()[0].oscillator().frequency()
    }
}

impl Topology for TestTone {
    const NAME: &'static str = "test_tone";
    const DESCRIPTION: &'static str = "Sine, triangle or saw test tone, free or tempo-synced";
    const KIND: PluginKind = PluginKind::Generator;

    fn descriptors() -> &'static [ParamDescriptor] {
        &PARAMS
    }

    fn presets() -> &'static [PresetSnapshot] {
        &PRESETS
    }

    fn new() -> Self {
        Self {
            engine: ModulationEngine::new(48000.0),
        }
    }

    fn reset(&mut self, sample_rate: f32) {
        self.engine.reset(sample_rate);
    }

    fn cook(&mut self, params: &ParameterStore, clock: &TempoClock) {
        let voice = VoiceConfig {
            waveform: params.choice(ids::WAVEFORM),
            frequency: FrequencySource::from_sync(
                params.is_on(ids::BPM_SYNC),
                params.value(ids::FREQUENCY),
                params.choice(ids::DIVISION),
            ),
            gain: params.gain(ids::LEVEL),
            polarity: Polarity::from_inverted(params.is_on(ids::INVERT)),
        };
        self.engine.configure(&[voice], clock);
    }

    #[inline]
    fn process(&mut self, _input: Frame) -> Frame {
        Frame::mono(self.engine.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echoform_core::{TransportInfo, UpdateContext, db_to_linear};

    fn tone(values: &[(ParamId, f32)], clock: &TempoClock) -> TestTone {
        let mut params = ParameterStore::new(&PARAMS);
        params.reset(48000.0);
        for &(id, value) in values {
            params
                .update_parameter(id, value, UpdateContext::Automation)
                .unwrap();
        }
        params.sync_bound_variables();
        let mut tone = TestTone::new();
        tone.reset(48000.0);
        tone.cook(&params, clock);
        tone
    }

    #[test]
    fn default_is_a_440_sine_at_minus_12() {
        let mut tone = tone(&[], &TempoClock::new(48000.0));
        assert_eq!(tone.frequency(), 440.0);
        let peak = (0..4800)
            .map(|_| tone.process(Frame::SILENCE).left.abs())
            .fold(0.0_f32, f32::max);
        assert!((peak - db_to_linear(-12.0)).abs() < 1e-3, "peak {peak}");
    }

    #[test]
    fn input_is_ignored() {
        let clock = TempoClock::new(48000.0);
        let mut a = tone(&[], &clock);
        let mut b = tone(&[], &clock);
        for _ in 0..480 {
            assert_eq!(a.process(Frame::SILENCE), b.process(Frame::mono(1.0)));
        }
    }

    #[test]
    fn invert_flips_the_sign() {
        let clock = TempoClock::new(48000.0);
        let saw = OscillatorWaveform::Saw.to_value();
        let mut normal = tone(&[(ids::WAVEFORM, saw)], &clock);
        let mut inverted = tone(&[(ids::WAVEFORM, saw), (ids::INVERT, 1.0)], &clock);
        for _ in 0..480 {
            let x = normal.process(Frame::SILENCE);
            let y = inverted.process(Frame::SILENCE);
            assert_eq!(x.left, -y.left);
        }
    }

    #[test]
    fn synced_period_follows_the_tempo() {
        let mut clock = TempoClock::new(48000.0);
        let synced = [(ids::BPM_SYNC, 1.0)];
        // default division is a quarter: 2 Hz at 120 BPM
        assert!((tone(&synced, &clock).frequency() - 2.0).abs() < 1e-4);
        clock.update(&TransportInfo::at_bpm(60.0)).unwrap();
        assert!((tone(&synced, &clock).frequency() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn presets_cover_every_parameter() {
        for preset in &PRESETS {
            let params = ParameterStore::new(&PARAMS);
            assert_eq!(params.apply_preset(preset), Ok(PARAMS.len()));
        }
    }
}
