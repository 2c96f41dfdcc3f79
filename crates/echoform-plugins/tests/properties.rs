//! Property-based tests for echoform processors.
//!
//! Automation round-trips through the taper, repeated writes of the same
//! value, and stability of every topology under random settings.

use echoform_core::{TransportInfo, UpdateContext};
use echoform_plugins::{
    BlockInfo, FrameIo, NoMidiEvents, Processor, TopologyKind, create_processor,
};
use proptest::prelude::*;

const SAMPLE_RATE: f32 = 48000.0;

fn prepared(kind: TopologyKind) -> Box<dyn Processor + Send> {
    let mut processor = create_processor(kind);
    processor.initialize().unwrap();
    processor.reset(SAMPLE_RATE, 24).unwrap();
    processor
}

/// Run a block of `input` (mono in, stereo out; generators take no input).
fn run(processor: &mut (dyn Processor + Send), input: &[f32], start: u64) -> Vec<f32> {
    let block = BlockInfo::new(start, input.len());
    let mut midi = NoMidiEvents;
    let mut output = vec![0.0; input.len() * 2];
    let takes_input = processor.kind() == echoform_plugins::PluginKind::Effect;
    processor.pre_process(&block).unwrap();
    for (n, (x, out)) in input.iter().zip(output.chunks_mut(2)).enumerate() {
        let frame_in: &[f32] = if takes_input { core::slice::from_ref(x) } else { &[] };
        let mut io = FrameIo::new(frame_in, out, TransportInfo::default(), start + n as u64, &mut midi);
        processor.process_frame(&mut io).unwrap();
    }
    processor.post_process(&block);
    output
}

fn any_kind() -> impl Strategy<Value = TopologyKind> {
    prop::sample::select(TopologyKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A normalized write followed by writing back the resulting plain value
    /// leaves the bound value where it was.
    #[test]
    fn taper_round_trip(kind in any_kind(), slot in 0usize..64, normalized in -0.5f32..1.5f32) {
        let mut processor = prepared(kind);
        let descriptors = processor.descriptors();
        let descriptor = &descriptors[slot % descriptors.len()];

        processor
            .update_plugin_parameter_normalized(descriptor.id, normalized.clamp(0.0, 1.0), UpdateContext::Automation)
            .unwrap();
        run(processor.as_mut(), &[0.0], 0);
        let first = processor.parameter_value(descriptor.id).unwrap();
        prop_assert!(first >= descriptor.min && first <= descriptor.max);

        processor
            .update_plugin_parameter(descriptor.id, first, UpdateContext::Automation)
            .unwrap();
        run(processor.as_mut(), &[0.0], 1);
        let second = processor.parameter_value(descriptor.id).unwrap();
        let tolerance = 1e-4 * (descriptor.max - descriptor.min).abs().max(1.0);
        prop_assert!(
            (first - second).abs() <= tolerance,
            "{}/{}: {} then {}", kind, descriptor.string_id, first, second
        );
    }

    /// Writing the value a control already holds never changes the output.
    #[test]
    fn same_value_is_transparent(
        kind in any_kind(),
        slot in 0usize..64,
        input in prop::collection::vec(-1.0f32..=1.0f32, 64..256),
    ) {
        let mut plain = prepared(kind);
        let mut touched = prepared(kind);
        let descriptors = touched.descriptors();
        let id = descriptors[slot % descriptors.len()].id;

        let a = run(plain.as_mut(), &input, 0);
        let b = run(touched.as_mut(), &input, 0);
        prop_assert_eq!(&a, &b);

        let current = touched.parameter_value(id).unwrap();
        touched.update_plugin_parameter(id, current, UpdateContext::Automation).unwrap();
        let start = input.len() as u64;
        let a = run(plain.as_mut(), &input, start);
        let b = run(touched.as_mut(), &input, start);
        prop_assert_eq!(a, b);
    }

    /// Random in-range settings keep every topology finite.
    #[test]
    fn random_settings_stay_finite(
        kind in any_kind(),
        settings in prop::collection::vec(0.0f32..=1.0f32, 35),
        input in prop::collection::vec(-1.0f32..=1.0f32, 512),
    ) {
        let mut processor = prepared(kind);
        for (descriptor, &normalized) in processor.descriptors().iter().zip(&settings) {
            processor
                .update_plugin_parameter_normalized(descriptor.id, normalized, UpdateContext::Automation)
                .unwrap();
        }
        let output = run(processor.as_mut(), &input, 0);
        for (n, y) in output.iter().enumerate() {
            prop_assert!(y.is_finite(), "{} produced {} at {}", kind, y, n);
        }
    }
}
