//! Multi-voice modulation: summed oscillators and the tape delay modulator.
//!
//! A [`ModulationEngine`] owns `N` oscillator voices. Each voice carries its
//! own gain and polarity; [`ModulationEngine::render`] returns
//! `Σ gain_i · select(polarity_i)`. Every voice is advanced on every sample
//! whether or not its gain is zero, so bringing a voice back in later never
//! jumps its phase relative to the others.
//!
//! [`DelayModulator`] builds tape wow and flutter on top of a three-voice
//! engine plus low-passed noise, and turns the sum into a delay tap time.

use crate::lfo::{FrequencySource, Oscillator, OscillatorWaveform, Polarity};
use crate::noise::FilteredNoise;
use crate::tempo::TempoClock;

/// Cooked settings for one voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceConfig {
    /// Waveform.
    pub waveform: OscillatorWaveform,
    /// Rate, free or tempo-synced.
    pub frequency: FrequencySource,
    /// Linear output scale. Not limited to `[0, 1]`.
    pub gain: f32,
    /// Which side of the oscillator output to read.
    pub polarity: Polarity,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            waveform: OscillatorWaveform::Sine,
            frequency: FrequencySource::default(),
            gain: 1.0,
            polarity: Polarity::Normal,
        }
    }
}

/// One oscillator with its gain and polarity.
#[derive(Debug, Clone)]
pub struct ModulationVoice {
    oscillator: Oscillator,
    source: FrequencySource,
    gain: f32,
    polarity: Polarity,
}

impl ModulationVoice {
    fn new(sample_rate: f32) -> Self {
        Self {
            oscillator: Oscillator::new(sample_rate, 1.0),
            source: FrequencySource::default(),
            gain: 1.0,
            polarity: Polarity::Normal,
        }
    }

    fn configure(&mut self, config: &VoiceConfig, clock: &TempoClock) {
        self.oscillator.set_waveform(config.waveform);
        self.source = config.frequency;
        self.oscillator.set_frequency(config.frequency.resolve(clock));
        self.gain = config.gain;
        self.polarity = config.polarity;
    }

    #[inline]
    fn render(&mut self) -> f32 {
        self.gain * self.oscillator.render().select(self.polarity)
    }

    /// The voice's oscillator.
    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    /// Linear gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }
}

/// `N` summed oscillator voices.
///
/// # Example
///
/// ```rust
/// use echoform_core::{
///     FrequencySource, ModulationEngine, OscillatorWaveform, Polarity, TempoClock, VoiceConfig,
/// };
///
/// let clock = TempoClock::new(48000.0);
/// let mut engine = ModulationEngine::<2>::new(48000.0);
/// let voice = VoiceConfig {
///     waveform: OscillatorWaveform::Saw,
///     frequency: FrequencySource::Free(1.0),
///     gain: 0.5,
///     polarity: Polarity::Normal,
/// };
/// engine.configure(&[voice, VoiceConfig { polarity: Polarity::Inverted, ..voice }], &clock);
///
/// // Equal and opposite voices cancel.
/// for _ in 0..100 {
///     assert_eq!(engine.render(), 0.0);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ModulationEngine<const N: usize> {
    voices: [ModulationVoice; N],
}

impl<const N: usize> ModulationEngine<N> {
    /// Engine with every voice a 1 Hz sine at unity gain.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: core::array::from_fn(|_| ModulationVoice::new(sample_rate)),
        }
    }

    /// Apply one config per voice. Phases are kept.
    pub fn configure(&mut self, configs: &[VoiceConfig; N], clock: &TempoClock) {
        for (voice, config) in self.voices.iter_mut().zip(configs) {
            voice.configure(config, clock);
        }
    }

    /// Re-resolve tempo-synced voices after a tempo change.
    pub fn retune(&mut self, clock: &TempoClock) {
        for voice in &mut self.voices {
            if matches!(voice.source, FrequencySource::Synced(_)) {
                voice.oscillator.set_frequency(voice.source.resolve(clock));
            }
        }
    }

    /// Rewind every voice at a new sample rate.
    pub fn reset(&mut self, sample_rate: f32) {
        for voice in &mut self.voices {
            voice.oscillator.reset(sample_rate);
        }
    }

    /// Weighted sum of all voices for this sample; advances every voice.
    #[inline]
    pub fn render(&mut self) -> f32 {
        self.voices.iter_mut().map(ModulationVoice::render).sum()
    }

    /// Voices in declaration order.
    pub fn voices(&self) -> &[ModulationVoice; N] {
        &self.voices
    }
}

/// Delay-time excursion, in ms, per unit of summed modulation at full depth.
pub const EXCURSION_MS_PER_UNIT: f32 = 0.5;

/// Cooked settings for a [`DelayModulator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayModulatorConfig {
    /// Centre tap time in ms.
    pub base_ms: f32,
    /// Modulation depth as a fraction, 0.0 to 1.0.
    pub depth: f32,
    /// The three wow/flutter voices.
    pub voices: [VoiceConfig; 3],
    /// Drift noise lowpass cutoff in Hz.
    pub noise_cutoff: f32,
    /// Drift noise gain.
    pub noise_gain: f32,
}

impl Default for DelayModulatorConfig {
    fn default() -> Self {
        Self {
            base_ms: 300.0,
            depth: 0.5,
            voices: [VoiceConfig {
                gain: 0.0,
                ..VoiceConfig::default()
            }; 3],
            noise_cutoff: 10.0,
            noise_gain: 0.0,
        }
    }
}

/// Wow/flutter generator producing a modulated delay tap time.
///
/// ```text
/// tap_ms = base_ms + depth · (Σ voices + noise) · EXCURSION_MS_PER_UNIT
/// ```
///
/// The result can land outside any particular delay buffer; the consuming
/// stage clamps it.
#[derive(Debug, Clone)]
pub struct DelayModulator {
    engine: ModulationEngine<3>,
    noise: FilteredNoise,
    base_ms: f32,
    depth: f32,
}

impl DelayModulator {
    /// Modulator with default settings.
    pub fn new(sample_rate: f32) -> Self {
        let config = DelayModulatorConfig::default();
        Self {
            engine: ModulationEngine::new(sample_rate),
            noise: FilteredNoise::new(sample_rate, config.noise_cutoff),
            base_ms: config.base_ms,
            depth: config.depth,
        }
    }

    /// Apply cooked settings.
    pub fn configure(&mut self, config: &DelayModulatorConfig, clock: &TempoClock) {
        self.engine.configure(&config.voices, clock);
        self.noise.set_cutoff(config.noise_cutoff);
        self.noise.set_gain(config.noise_gain);
        self.base_ms = config.base_ms;
        self.depth = config.depth;
    }

    /// Rewind oscillators and reseed the noise.
    pub fn reset(&mut self, sample_rate: f32) {
        self.engine.reset(sample_rate);
        self.noise.reset(sample_rate);
    }

    /// Tap time in ms for this sample.
    #[inline]
    pub fn render(&mut self) -> f32 {
        let wobble = self.engine.render() + self.noise.next_sample();
        self.base_ms + self.depth * wobble * EXCURSION_MS_PER_UNIT
    }
}
