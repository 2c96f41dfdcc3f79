//! Property-based tests for echoform-core.
//!
//! Taper round trips, tempo ratios, oscillator periodicity, polarity,
//! parallel mixing and delay-line timing, using proptest for randomized
//! input generation.

use echoform_core::{
    DelayLine, NoteDivision, Oscillator, OscillatorWaveform, ParallelMix, ParamDescriptor,
    ParamEnum, ParamId, ParamScale, ParameterStore, Polarity, UpdateContext, milliseconds_for,
};
use proptest::prelude::*;

const LIN: ParamId = ParamId(0);
const LOG: ParamId = ParamId(1);
const POW: ParamId = ParamId(2);
const STEP: ParamId = ParamId(3);

static PARAMS: [ParamDescriptor; 4] = [
    ParamDescriptor::gain_db("Level", "Level", -60.0, 12.0, 0.0).with_id(LIN, "level"),
    ParamDescriptor::frequency_hz("Cutoff", "Cutoff", 20.0, 20000.0, 1000.0).with_id(LOG, "cutoff"),
    ParamDescriptor::time_ms("Time", "Time", 0.0, 5000.0, 10.0)
        .with_id(POW, "time")
        .with_scale(ParamScale::Power(2.0)),
    ParamDescriptor::choice("Division", "Div", NoteDivision::LABELS, 2).with_id(STEP, "div"),
];

fn division(index: usize) -> NoteDivision {
    NoteDivision::from_index(index % NoteDivision::LABELS.len()).unwrap_or_default()
}

fn waveform(index: usize) -> OscillatorWaveform {
    OscillatorWaveform::from_index(index % 3).unwrap_or_default()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Writing back the cooked value of a normalized update leaves it
    /// unchanged, for every taper.
    #[test]
    fn taper_round_trip(norm in -0.5f32..1.5f32, slot in 0usize..4) {
        let id = PARAMS[slot].id;
        let mut store = ParameterStore::new(&PARAMS);
        store.reset(48000.0);

        store.update_parameter_normalized(id, norm, true, UpdateContext::Automation).unwrap();
        store.sync_bound_variables();
        let cooked = store.value(id);

        store.update_parameter(id, cooked, UpdateContext::Automation).unwrap();
        store.sync_bound_variables();
        let again = store.value(id);

        let tolerance = 1e-5 * cooked.abs().max(1.0);
        prop_assert!((again - cooked).abs() <= tolerance, "{cooked} -> {again}");
    }

    /// Bound values stay inside the declared range whatever is written.
    #[test]
    fn bound_value_always_in_range(raw in -1.0e6f32..1.0e6f32, slot in 0usize..4) {
        let desc = &PARAMS[slot];
        let mut store = ParameterStore::new(&PARAMS);
        store.reset(48000.0);
        let commit = store.update_parameter(desc.id, raw, UpdateContext::Automation).unwrap();
        store.sync_bound_variables();
        let value = store.value(desc.id);
        prop_assert!(value >= desc.min && value <= desc.max);
        prop_assert_eq!(commit.clamped, raw < desc.min || raw > desc.max);
    }

    /// Eighth = quarter/2, sixteenth = eighth/2, dotted = x1.5, triplet = x2/3.
    #[test]
    fn tempo_ratios(bpm in 1.0f32..400.0f32) {
        let ms = |d| milliseconds_for(d, bpm).unwrap();
        let quarter = ms(NoteDivision::Quarter);
        prop_assert_eq!(quarter, 60000.0 / bpm);
        prop_assert_eq!(ms(NoteDivision::Eighth), quarter / 2.0);
        prop_assert_eq!(ms(NoteDivision::Sixteenth), ms(NoteDivision::Eighth) / 2.0);
        prop_assert_eq!(ms(NoteDivision::DottedQuarter), quarter * 1.5);
        prop_assert_eq!(ms(NoteDivision::DottedEighth), ms(NoteDivision::Eighth) * 1.5);

        let triplet = ms(NoteDivision::TripletQuarter);
        prop_assert!((triplet - quarter * 2.0 / 3.0).abs() <= quarter * 1e-6);
        let triplet_eighth = ms(NoteDivision::TripletEighth);
        prop_assert!((triplet_eighth - ms(NoteDivision::Eighth) * 2.0 / 3.0).abs() <= quarter * 1e-6);
    }

    /// Non-positive tempi are always rejected.
    #[test]
    fn invalid_tempo_rejected(bpm in -1000.0f32..=0.0f32, index in 0usize..12) {
        prop_assert!(milliseconds_for(division(index), bpm).is_err());
    }

    /// Every waveform repeats after `sr / f` samples. Periods are powers of
    /// two so the phase increment is exact.
    #[test]
    fn oscillator_returns_after_one_period(log2_period in 2u32..12, wave in 0usize..3, skip in 0usize..64) {
        let period = 1usize << log2_period;
        let sample_rate = 48000.0;
        let mut osc = Oscillator::new(sample_rate, sample_rate / period as f32);
        osc.set_waveform(waveform(wave));
        for _ in 0..skip {
            osc.render();
        }
        let start = osc.render().normal;
        for _ in 1..period {
            osc.render();
        }
        let again = osc.render().normal;
        prop_assert!((again - start).abs() < 1e-5, "{start} vs {again}");
    }

    /// Flipping polarity only flips the sign.
    #[test]
    fn polarity_flip_is_negation(freq in 0.01f32..2000.0f32, wave in 0usize..3, steps in 1usize..500) {
        let mut osc = Oscillator::new(48000.0, freq);
        osc.set_waveform(waveform(wave));
        for _ in 0..steps {
            let out = osc.render();
            prop_assert_eq!(out.select(Polarity::Inverted), -out.select(Polarity::Normal));
            prop_assert!(out.normal.abs() <= 1.0);
        }
    }

    /// The parallel sum is exact and never normalized.
    #[test]
    fn parallel_mix_is_unnormalized(
        dry_gain in 0.0f32..4.0f32,
        wet_gains in prop::array::uniform3(0.0f32..4.0f32),
        dry in -1.0f32..1.0f32,
        wet in prop::array::uniform3(-1.0f32..1.0f32),
    ) {
        let mix = ParallelMix { dry: dry_gain, wet: wet_gains };
        let mut expected = dry * dry_gain;
        for i in 0..3 {
            expected += wet[i] * wet_gains[i];
        }
        prop_assert_eq!(mix.mix(dry, wet), expected);
    }

    /// An impulse written now is read back exactly `d` samples later.
    #[test]
    fn delay_tap_is_sample_exact(max_ms in 1.0f32..200.0f32, tap_fraction in 0.0f32..1.0f32) {
        let mut line = DelayLine::new();
        line.allocate(max_ms, 48000.0);
        let tap = ((line.len() - 1) as f32 * tap_fraction) as usize;

        let mut arrival = None;
        for n in 0..line.len() {
            let x = if n == 0 { 1.0 } else { 0.0 };
            if line.write_then_read(x, tap as f32) == 1.0 && arrival.is_none() {
                arrival = Some(n);
            }
        }
        prop_assert_eq!(arrival, Some(tap));
    }
}
