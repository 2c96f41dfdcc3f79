//! Offline rendering through a topology.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Args;
use echoform_core::{ChannelConfig, ChannelFormat, TransportInfo, UpdateContext, linear_to_db};
use echoform_plugins::{
    BlockInfo, FrameIo, NoMidiEvents, PluginKind, Processor, create_processor,
};

use super::common::{find_param, find_topology, format_value, parse_key_val, parse_value};
use crate::wav::{Audio, BitDepth, read_wav, write_wav};

#[derive(Args)]
pub struct RenderArgs {
    /// Topology name (see `echoform topologies`)
    #[arg(value_name = "TOPOLOGY")]
    topology: String,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Input WAV file (effects only)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Factory preset applied before any --param
    #[arg(short, long)]
    preset: Option<String>,

    /// Parameter override by id or string id (e.g. "outgain=-6" or "2=-6")
    #[arg(long, value_parser = parse_key_val, number_of_values = 1)]
    param: Vec<(String, String)>,

    /// Host tempo in BPM
    #[arg(long, default_value = "120")]
    bpm: f32,

    /// Output channels (1 or 2)
    #[arg(long, default_value = "2")]
    channels: usize,

    /// Render length in seconds (generators only)
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// Sample rate in Hz (generators only; effects use the input's rate)
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "32f")]
    bit_depth: BitDepth,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let kind = find_topology(&args.topology)?;
    if !(args.bpm.is_finite() && args.bpm > 0.0) {
        bail!("Invalid tempo {} BPM", args.bpm);
    }
    if args.block_size == 0 {
        bail!("Block size must be at least 1");
    }

    let mut processor = create_processor(kind);
    let input = match (processor.kind(), &args.input) {
        (PluginKind::Effect, Some(path)) => Some(read_wav(path)?),
        (PluginKind::Effect, None) => bail!("'{}' is an effect and needs --input", kind),
        (PluginKind::Generator, Some(_)) => bail!("'{}' is a generator and takes no input", kind),
        (PluginKind::Generator, None) => None,
    };

    let in_channels = input.as_ref().map_or(0, |audio| audio.channels);
    let config = match (
        ChannelFormat::from_channels(in_channels),
        ChannelFormat::from_channels(args.channels),
    ) {
        (Some(input), Some(output)) if args.channels > 0 => ChannelConfig::new(input, output),
        _ => bail!("Unsupported channel count: {} in, {} out", in_channels, args.channels),
    };
    if !processor.supports(config) {
        bail!("'{}' does not support {}", kind, config);
    }

    let sample_rate = input.as_ref().map_or(args.sample_rate, |audio| audio.sample_rate);
    let frames = match &input {
        Some(audio) => audio.frames(),
        None => (args.duration.max(0.0) * sample_rate as f32) as usize,
    };

    processor.initialize()?;
    processor.reset(sample_rate as f32, u32::from(args.bit_depth.bits()))?;
    configure(processor.as_ref(), &args)?;

    println!(
        "Rendering {} ({}), {} frames at {} Hz, {}...",
        kind,
        config,
        frames,
        sample_rate,
        args.output.display()
    );

    let empty = Vec::new();
    let samples = input.as_ref().map_or(&empty, |audio| &audio.samples);
    let output = render(
        processor.as_mut(),
        samples,
        in_channels,
        args.channels,
        frames,
        args.block_size,
        args.bpm,
    )?;

    let rendered = Audio {
        samples: output,
        channels: args.channels,
        sample_rate,
    };
    println!(
        "  Output peak {:.1} dB",
        linear_to_db(peak(&rendered.samples).max(1e-6))
    );
    write_wav(&args.output, &rendered, args.bit_depth)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!("Done!");
    Ok(())
}

/// Apply the preset, then each `--param` in order.
fn configure(processor: &(dyn Processor + Send), args: &RenderArgs) -> anyhow::Result<()> {
    if let Some(name) = &args.preset {
        let Some(preset) = processor.find_preset(name) else {
            let known: Vec<_> = processor.presets().iter().map(|p| p.name).collect();
            bail!(
                "Preset '{}' not found for {}. Available: {}",
                name,
                processor.name(),
                known.join(", ")
            );
        };
        processor.apply_preset(preset)?;
        println!("Loaded preset: {}", preset.name);
    }

    for (key, value) in &args.param {
        let descriptor = find_param(processor.descriptors(), key)?;
        let value = parse_value(descriptor, value)?;
        let commit =
            processor.update_plugin_parameter(descriptor.id, value, UpdateContext::Automation)?;
        if commit.clamped {
            tracing::warn!(
                param = descriptor.string_id,
                requested = value,
                applied = commit.value,
                "parameter clamped to range"
            );
        }
        println!(
            "  {} = {}",
            descriptor.name,
            format_value(descriptor, commit.value)
        );
    }
    Ok(())
}

/// Drive `processor` over interleaved `input` one block at a time.
fn render(
    processor: &mut (dyn Processor + Send),
    input: &[f32],
    in_channels: usize,
    out_channels: usize,
    frames: usize,
    block_size: usize,
    bpm: f32,
) -> anyhow::Result<Vec<f32>> {
    let mut output = vec![0.0; frames * out_channels];
    let mut midi = NoMidiEvents;
    let mut start = 0;

    while start < frames {
        let len = block_size.min(frames - start);
        let block = BlockInfo::new(start as u64, len);
        processor.pre_process(&block)?;
        for n in start..start + len {
            let transport = TransportInfo {
                position_samples: n as u64,
                playing: true,
                ..TransportInfo::at_bpm(bpm)
            };
            let frame_in = &input[n * in_channels..(n + 1) * in_channels];
            let frame_out = &mut output[n * out_channels..(n + 1) * out_channels];
            let mut io = FrameIo::new(frame_in, frame_out, transport, n as u64, &mut midi);
            processor.process_frame(&mut io)?;
        }
        let stats = processor.post_process(&block);
        if stats.invalid_tempo_frames > 0 {
            tracing::warn!(
                start_frame = start,
                frames = stats.invalid_tempo_frames,
                bpm = ?stats.last_invalid_bpm,
                "invalid host tempo; kept the last valid one"
            );
        }
        tracing::trace!(
            start_frame = start,
            frames = stats.frames,
            recooked = stats.recooked_frames,
            "block processed"
        );
        start += len;
    }

    Ok(output)
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0, f32::max)
}
