//! WAV file I/O through `hound`.
//!
//! Samples are interleaved `f32` in `[-1, 1]`. Integer files are scaled by
//! `2^(bits-1)` on the way in and clamped on the way out.

use std::path::Path;

use anyhow::{Context, bail};
use clap::ValueEnum;
use hound::{SampleFormat, WavReader, WavWriter};

/// Output sample format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BitDepth {
    /// 16-bit integer PCM.
    #[value(name = "16")]
    Int16,
    /// 24-bit integer PCM.
    #[value(name = "24")]
    Int24,
    /// 32-bit IEEE float.
    #[value(name = "32f")]
    Float32,
}

impl BitDepth {
    /// Bits per sample.
    pub const fn bits(self) -> u16 {
        match self {
            BitDepth::Int16 => 16,
            BitDepth::Int24 => 24,
            BitDepth::Float32 => 32,
        }
    }
}

/// Interleaved audio with its layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    /// Interleaved samples.
    pub samples: Vec<f32>,
    /// 1 or 2.
    pub channels: usize,
    /// Frames per second.
    pub sample_rate: u32,
}

impl Audio {
    /// Number of frames.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }
}

/// Read a mono or stereo WAV file.
pub fn read_wav(path: &Path) -> anyhow::Result<Audio> {
    let reader =
        WavReader::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels);
    if !(1..=2).contains(&channels) {
        bail!(
            "{} has {} channels; only mono and stereo are supported",
            path.display(),
            channels
        );
    }

    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(Audio {
        samples,
        channels,
        sample_rate: spec.sample_rate,
    })
}

/// Write interleaved audio at `depth`.
pub fn write_wav(path: &Path, audio: &Audio, depth: BitDepth) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: audio.channels as u16,
        sample_rate: audio.sample_rate,
        bits_per_sample: depth.bits(),
        sample_format: match depth {
            BitDepth::Float32 => SampleFormat::Float,
            BitDepth::Int16 | BitDepth::Int24 => SampleFormat::Int,
        },
    };
    let mut writer =
        WavWriter::create(path, spec).with_context(|| format!("cannot create {}", path.display()))?;

    match depth {
        BitDepth::Float32 => {
            for &sample in &audio.samples {
                writer.write_sample(sample)?;
            }
        }
        BitDepth::Int16 | BitDepth::Int24 => {
            let max_val = (1i32 << (depth.bits() - 1)) as f32;
            for &sample in &audio.samples {
                let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
                writer.write_sample(int_sample)?;
            }
        }
    }

    writer.finalize()?;
    Ok(())
}
