//! Integration tests for echoform-core.
//!
//! Exercises the pieces together the way a topology drives them: parameter
//! sync feeding oscillators and delay lines, tempo conversion landing on
//! exact sample taps, and reset leaving every stateful block silent.

use echoform_core::{
    AllpassFilter, Biquad, Coefficients, CombFilter, DelayLine, DelayModulator,
    DelayModulatorConfig, EnvelopeDetector, FrequencySource, NoteDivision, Oscillator,
    OscillatorWaveform, ParamDescriptor, ParamEnum, ParamId, ParameterStore, Polarity, PresetError,
    PresetSnapshot, TempoClock, TransportInfo, UpdateContext, VoiceConfig, milliseconds_for,
};

const SAMPLE_RATE: f32 = 48000.0;
const TAU: f32 = core::f32::consts::TAU;

/// Generate a sine wave buffer at the given frequency and sample rate.
fn generate_sine(freq_hz: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| libm::sinf(TAU * freq_hz * n as f32 / sample_rate))
        .collect()
}

/// Measure RMS amplitude of a signal buffer.
fn rms(signal: &[f32]) -> f32 {
    let sum_sq: f32 = signal.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / signal.len() as f32)
}

const DEPTH: ParamId = ParamId(3);
const RATE: ParamId = ParamId(4);
const SYNC: ParamId = ParamId(5);
const DIVISION: ParamId = ParamId(6);
const WAVE: ParamId = ParamId(7);
const OUT: ParamId = ParamId(2);

static PARAMS: [ParamDescriptor; 6] = [
    ParamDescriptor::gain_db("Output Gain", "Out", -24.0, 12.0, 0.0)
        .with_id(OUT, "outgain")
        .with_smoothing(20.0),
    ParamDescriptor::percent("Depth", "Depth", 0.0).with_id(DEPTH, "depth"),
    ParamDescriptor::frequency_hz("Frequency", "Freq", 0.02, 5.0, 1.0).with_id(RATE, "freq"),
    ParamDescriptor::switch("BPM Sync", "Sync", false).with_id(SYNC, "sync"),
    ParamDescriptor::choice("BPM Division", "Div", NoteDivision::LABELS, 2)
        .with_id(DIVISION, "division"),
    ParamDescriptor::choice("Waveform", "Wave", OscillatorWaveform::LABELS, 0)
        .with_id(WAVE, "wave"),
];

// ============================================================================
// 1. Parameters driving modulation
// ============================================================================

#[test]
fn synced_rate_follows_division_parameter() {
    let mut store = ParameterStore::new(&PARAMS);
    store.reset(SAMPLE_RATE);
    store.update_parameter(SYNC, 1.0, UpdateContext::Automation).unwrap();
    store
        .update_parameter(DIVISION, NoteDivision::Eighth.index() as f32, UpdateContext::Automation)
        .unwrap();
    store.sync_bound_variables();

    let mut clock = TempoClock::new(SAMPLE_RATE);
    clock.update(&TransportInfo::at_bpm(120.0)).unwrap();

    let source = FrequencySource::from_sync(
        store.is_on(SYNC),
        store.value(RATE),
        store.choice::<NoteDivision>(DIVISION),
    );
    assert!((source.resolve(&clock) - 4.0).abs() < 1e-4);

    let free = FrequencySource::from_sync(false, store.value(RATE), NoteDivision::Quarter);
    assert_eq!(free.resolve(&clock), 1.0);
}

#[test]
fn preset_load_lands_on_next_sync() {
    static PRESET: PresetSnapshot = PresetSnapshot {
        name: "Slow Saw",
        values: &[
            (OUT, -6.0),
            (DEPTH, 50.0),
            (RATE, 0.5),
            (SYNC, 0.0),
            (DIVISION, 2.0),
            (WAVE, 2.0),
        ],
    };
    let mut store = ParameterStore::new(&PARAMS);
    store.reset(SAMPLE_RATE);
    assert_eq!(store.apply_preset(&PRESET), Ok(6));
    // nothing visible before the block boundary
    assert_eq!(store.value(DEPTH), 0.0);

    store.sync_bound_variables();
    assert_eq!(store.value(DEPTH), 50.0);
    assert_eq!(store.choice::<OscillatorWaveform>(WAVE), OscillatorWaveform::Saw);
    // first sync after reset snaps smoothed values too
    assert_eq!(store.value(OUT), -6.0);
}

#[test]
fn partial_preset_is_rejected_without_side_effects() {
    static PARTIAL: PresetSnapshot = PresetSnapshot {
        name: "Broken",
        values: &[(OUT, -12.0)],
    };
    let mut store = ParameterStore::new(&PARAMS);
    store.reset(SAMPLE_RATE);
    assert!(matches!(
        store.apply_preset(&PARTIAL),
        Err(PresetError::MissingParameter { .. })
    ));
    store.sync_bound_variables();
    assert_eq!(store.value(OUT), 0.0);
}

#[test]
fn smoothed_gain_ramps_over_declared_time() {
    let mut store = ParameterStore::new(&PARAMS);
    store.reset(SAMPLE_RATE);
    store.sync_bound_variables();

    store.update_parameter(OUT, -12.0, UpdateContext::Automation).unwrap();
    store.sync_bound_variables();
    assert_eq!(store.value(OUT), 0.0);

    let ramp_samples = (0.020 * SAMPLE_RATE) as u64;
    let mut index = 0u64;
    for _ in 0..ramp_samples / 2 {
        store.advance_smoothing(index);
        index += 1;
    }
    let halfway = store.value(OUT);
    assert!((halfway + 6.0).abs() < 0.1, "halfway at {halfway}");

    for _ in 0..ramp_samples {
        store.advance_smoothing(index);
        index += 1;
    }
    assert_eq!(store.value(OUT), -12.0);
    assert!(!store.is_smoothing());
}

// ============================================================================
// 2. Tempo onto delay taps
// ============================================================================

#[test]
fn quarter_at_120_bpm_is_24000_samples() {
    let ms = milliseconds_for(NoteDivision::Quarter, 120.0).unwrap();
    let mut line = DelayLine::new();
    line.allocate(2000.0, SAMPLE_RATE);

    let mut arrival = None;
    for n in 0..30000 {
        let x = if n == 0 { 1.0 } else { 0.0 };
        line.write(x);
        if line.read_ms(ms) == 1.0 {
            arrival = Some(n);
        }
    }
    assert_eq!(arrival, Some(24000));
}

#[test]
fn clock_keeps_last_valid_tempo() {
    let mut clock = TempoClock::new(SAMPLE_RATE);
    assert_eq!(clock.update(&TransportInfo::at_bpm(90.0)), Ok(true));
    assert!(clock.update(&TransportInfo::at_bpm(0.0)).is_err());
    assert!(clock.update(&TransportInfo::at_bpm(f32::NAN)).is_err());
    assert_eq!(clock.bpm(), 90.0);
    let ms = clock.duration_ms(NoteDivision::Quarter);
    assert!((ms - 666.6667).abs() < 1e-3);
}

// ============================================================================
// 3. Oscillators
// ============================================================================

#[test]
fn sine_oscillator_rms() {
    let mut osc = Oscillator::new(SAMPLE_RATE, 100.0);
    let out: Vec<f32> = (0..48000).map(|_| osc.render().normal).collect();
    let expected = 1.0 / core::f32::consts::SQRT_2;
    assert!((rms(&out) - expected).abs() < 1e-3, "rms {}", rms(&out));
}

#[test]
fn triangle_and_saw_span_full_range() {
    for wave in [OscillatorWaveform::Triangle, OscillatorWaveform::Saw] {
        let mut osc = Oscillator::new(SAMPLE_RATE, 375.0); // 128-sample period
        osc.set_waveform(wave);
        let out: Vec<f32> = (0..128).map(|_| osc.render().normal).collect();
        let max = out.iter().copied().fold(f32::MIN, f32::max);
        let min = out.iter().copied().fold(f32::MAX, f32::min);
        assert_eq!(min, -1.0, "{wave:?}");
        assert!(max > 0.95, "{wave:?} max {max}");
    }
}

#[test]
fn inverted_output_is_exact_negation() {
    let mut osc = Oscillator::new(SAMPLE_RATE, 3.3);
    osc.set_waveform(OscillatorWaveform::Triangle);
    for _ in 0..1000 {
        let out = osc.render();
        assert_eq!(out.select(Polarity::Inverted), -out.select(Polarity::Normal));
    }
}

// ============================================================================
// 4. Delay modulation
// ============================================================================

#[test]
fn delay_modulator_stays_near_base() {
    let clock = TempoClock::new(SAMPLE_RATE);
    let mut modulator = DelayModulator::new(SAMPLE_RATE);
    let voice = |hz: f32| VoiceConfig {
        frequency: FrequencySource::Free(hz),
        gain: 1.0,
        ..VoiceConfig::default()
    };
    let config = DelayModulatorConfig {
        base_ms: 300.0,
        depth: 1.0,
        voices: [voice(2.5), voice(5.0), voice(26.0)],
        noise_cutoff: 20.0,
        noise_gain: 1.0,
    };
    modulator.configure(&config, &clock);
    modulator.reset(SAMPLE_RATE);

    let mut moved = false;
    for _ in 0..48000 {
        let tap = modulator.render();
        // three unit voices plus unit noise, half a ms per unit
        assert!((tap - 300.0).abs() <= 2.0 + 1e-3, "tap {tap}");
        moved |= tap != 300.0;
    }
    assert!(moved);
}

// ============================================================================
// 5. Reset leaves silence
// ============================================================================

#[test]
fn zero_input_after_reset_is_silent() {
    let input = generate_sine(440.0, SAMPLE_RATE, 4800);

    let mut line = DelayLine::new();
    line.allocate(100.0, SAMPLE_RATE);
    let mut comb = CombFilter::new();
    comb.allocate(1116, SAMPLE_RATE);
    comb.set_feedback(0.84);
    let mut allpass = AllpassFilter::new();
    allpass.allocate(556, SAMPLE_RATE);
    let mut biquad = Biquad::new();
    biquad.set_coefficients(Coefficients::peaking(450.0, 6.0, 12.0, SAMPLE_RATE));
    let mut env = EnvelopeDetector::new(SAMPLE_RATE);

    for &x in &input {
        line.write_then_read(x, 1000.0);
        allpass.process(comb.process(biquad.process(x)));
        env.process(x);
    }

    line.allocate(100.0, SAMPLE_RATE);
    comb.clear();
    allpass.clear();
    biquad.clear();
    env.reset(SAMPLE_RATE);

    let mut peak = 0.0f32;
    for _ in 0..4800 {
        peak = peak.max(line.write_then_read(0.0, 1000.0).abs());
        peak = peak.max(allpass.process(comb.process(biquad.process(0.0))).abs());
        peak = peak.max(env.process(0.0));
    }
    assert!(peak < 1e-9, "residual {peak}");
}
