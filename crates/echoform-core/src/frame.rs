//! Signal frames and channel formats.

use core::fmt;

/// One sample instant for a stereo pair, passed by value through the chain.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frame {
    /// Left (or only) channel.
    pub left: f32,
    /// Right channel.
    pub right: f32,
}

impl Frame {
    /// Silent frame.
    pub const SILENCE: Self = Self::new(0.0, 0.0);

    /// Frame from two channel values.
    #[inline]
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Duplicate a mono sample to both sides.
    #[inline]
    pub const fn mono(sample: f32) -> Self {
        Self::new(sample, sample)
    }

    /// Multiply both sides by `gain`.
    #[inline]
    #[must_use]
    pub fn scale(self, gain: f32) -> Self {
        Self::new(self.left * gain, self.right * gain)
    }

    /// Apply `f` to each side.
    #[inline]
    #[must_use]
    pub fn map(self, mut f: impl FnMut(f32) -> f32) -> Self {
        Self::new(f(self.left), f(self.right))
    }

    /// Mean of both sides.
    #[inline]
    pub fn to_mono(self) -> f32 {
        0.5 * (self.left + self.right)
    }
}

impl core::ops::Add for Frame {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.left + rhs.left, self.right + rhs.right)
    }
}

/// Channel layout on one side of a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelFormat {
    /// No audio (generator input).
    None,
    /// One channel.
    Mono,
    /// Two channels.
    Stereo,
}

impl ChannelFormat {
    /// Number of channels.
    pub const fn channels(self) -> usize {
        match self {
            Self::None => 0,
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }

    /// Format for a channel count, if one exists.
    pub const fn from_channels(channels: usize) -> Option<Self> {
        match channels {
            0 => Some(Self::None),
            1 => Some(Self::Mono),
            2 => Some(Self::Stereo),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Mono => "mono",
            Self::Stereo => "stereo",
        })
    }
}

/// Input/output channel pairing negotiated with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelConfig {
    /// Input layout.
    pub input: ChannelFormat,
    /// Output layout.
    pub output: ChannelFormat,
}

impl ChannelConfig {
    /// No input, mono output.
    pub const GENERATOR_MONO: Self = Self::new(ChannelFormat::None, ChannelFormat::Mono);
    /// No input, stereo output.
    pub const GENERATOR_STEREO: Self = Self::new(ChannelFormat::None, ChannelFormat::Stereo);
    /// Mono in, mono out.
    pub const MONO: Self = Self::new(ChannelFormat::Mono, ChannelFormat::Mono);
    /// Mono in, stereo out.
    pub const MONO_TO_STEREO: Self = Self::new(ChannelFormat::Mono, ChannelFormat::Stereo);
    /// Stereo in, stereo out.
    pub const STEREO: Self = Self::new(ChannelFormat::Stereo, ChannelFormat::Stereo);

    /// Pair two formats.
    pub const fn new(input: ChannelFormat, output: ChannelFormat) -> Self {
        Self { input, output }
    }
}

impl fmt::Display for ChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.input, self.output)
    }
}
