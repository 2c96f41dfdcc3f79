//! Criterion benchmarks for echoform topologies
//!
//! Run with: cargo bench -p echoform-plugins
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use echoform_core::TransportInfo;
use echoform_plugins::{
    BlockInfo, FrameIo, NoMidiEvents, PluginKind, Processor, TopologyKind, create_processor,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn process_block(
    processor: &mut (dyn Processor + Send),
    input: &[f32],
    output: &mut [f32],
    start: u64,
) {
    let block = BlockInfo::new(start, input.len());
    let mut midi = NoMidiEvents;
    let takes_input = processor.kind() == PluginKind::Effect;
    let _ = processor.pre_process(&block);
    for (n, (x, out)) in input.iter().zip(output.chunks_mut(2)).enumerate() {
        let frame_in: &[f32] = if takes_input {
            std::slice::from_ref(x)
        } else {
            &[]
        };
        let mut io = FrameIo::new(
            frame_in,
            out,
            TransportInfo::default(),
            start + n as u64,
            &mut midi,
        );
        let _ = processor.process_frame(&mut io);
    }
    black_box(processor.post_process(&block));
}

fn bench_topology(c: &mut Criterion, kind: TopologyKind) {
    let mut group = c.benchmark_group(kind.name());

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        let mut processor = create_processor(kind);
        let _ = processor.initialize();
        let _ = processor.reset(SAMPLE_RATE, 24);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let mut output = vec![0.0; block_size * 2];
                let mut start = 0;
                b.iter(|| {
                    process_block(processor.as_mut(), black_box(&input), &mut output, start);
                    start += block_size as u64;
                    black_box(output[0])
                })
            },
        );
    }

    group.finish();
}

fn bench_topologies(c: &mut Criterion) {
    for kind in TopologyKind::ALL {
        bench_topology(c, kind);
    }
}

criterion_group!(benches, bench_topologies);
criterion_main!(benches);
