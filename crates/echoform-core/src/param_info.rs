//! Static parameter declarations.
//!
//! Every topology declares its automatable controls once, as a
//! `&'static [ParamDescriptor]`. The [`ParameterStore`](crate::ParameterStore)
//! is built from that list at startup and never changes shape afterwards.
//!
//! A descriptor carries everything the control path needs:
//!
//! - [`ParamId`]: stable numeric id used by automation and presets
//! - range, default and [`ParamUnit`] for display
//! - [`ParamScale`]: the taper between normalized \[0, 1\] and plain values
//! - an optional smoothing time for sample-accurate ramps
//! - for discrete controls, [`ParamFlags::STEPPED`] plus a label list decoded
//!   through [`ParamEnum`]
//!
//! # Example
//!
//! ```rust
//! use echoform_core::{ParamDescriptor, ParamId};
//!
//! const OUT_GAIN: ParamDescriptor =
//!     ParamDescriptor::gain_db("Output Gain", "Out", -24.0, 12.0, 0.0)
//!         .with_id(ParamId(2), "outgain")
//!         .with_smoothing(20.0);
//!
//! assert_eq!(OUT_GAIN.clamp(40.0), 12.0);
//! assert_eq!(OUT_GAIN.denormalize(OUT_GAIN.normalize(-6.0)), -6.0);
//! ```

use core::fmt;

/// Taper between a parameter's plain value and normalized \[0.0, 1.0\] space.
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`
/// - **Power(exp)**: `normalized = ((value - min) / (max - min)).powf(1.0 / exp)`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamScale {
    /// Equal resolution across the range.
    #[default]
    Linear,
    /// More resolution at low values. Requires `min > 0.0`.
    Logarithmic,
    /// Power curve. exponent < 1.0 favours the low end, > 1.0 the high end.
    Power(f32),
}

/// Stable parameter identifier.
///
/// Once assigned, a `ParamId` never changes for a given control: automation
/// lanes and presets refer to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub u32);

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameter capability flags. Combine with [`union`](Self::union).
///
/// ```rust
/// use echoform_core::ParamFlags;
///
/// let flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
/// assert!(flags.contains(ParamFlags::STEPPED));
/// assert!(!ParamFlags::AUTOMATABLE.contains(ParamFlags::STEPPED));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Host can automate this parameter.
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Discrete steps; the value is always an integer index.
    pub const STEPPED: Self = Self(1 << 1);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::AUTOMATABLE
    }
}

/// Unit label for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Decibels.
    Decibels,
    /// Hertz.
    Hertz,
    /// Milliseconds.
    Milliseconds,
    /// Percent (0–100).
    Percent,
    /// Ratio (n:1).
    Ratio,
    /// Dimensionless, or a discrete choice.
    None,
}

impl ParamUnit {
    /// Unit suffix for display.
    ///
    /// ```rust
    /// use echoform_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Decibels.suffix(), " dB");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Percent => "%",
            ParamUnit::Ratio => ":1",
            ParamUnit::None => "",
        }
    }
}

/// Static description of one automatable control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full name for display (e.g. "Delay Time").
    pub name: &'static str,
    /// Short name for narrow displays, 8 characters or less.
    pub short_name: &'static str,
    /// Display unit.
    pub unit: ParamUnit,
    /// Lowest legal value.
    pub min: f32,
    /// Highest legal value.
    pub max: f32,
    /// Value at startup.
    pub default: f32,
    /// Suggested increment for encoders.
    pub step: f32,
    /// Stable id.
    pub id: ParamId,
    /// Human-readable stable id (e.g. `"outgain"`).
    pub string_id: &'static str,
    /// Normalization taper.
    pub scale: ParamScale,
    /// Capability flags.
    pub flags: ParamFlags,
    /// Linear ramp time applied when the value changes. `0.0` disables smoothing.
    pub smoothing_ms: f32,
    /// Labels for stepped controls, indexed by value. Empty for continuous ones.
    pub labels: &'static [&'static str],
}

impl ParamDescriptor {
    /// Continuous, dimensionless control.
    pub const fn plain(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::None,
            min,
            max,
            default,
            step: 0.01,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
            flags: ParamFlags::AUTOMATABLE,
            smoothing_ms: 0.0,
            labels: &[],
        }
    }

    /// Gain in decibels.
    pub const fn gain_db(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            unit: ParamUnit::Decibels,
            step: 0.5,
            ..Self::plain(name, short_name, min, max, default)
        }
    }

    /// Time in milliseconds.
    pub const fn time_ms(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            unit: ParamUnit::Milliseconds,
            step: 1.0,
            ..Self::plain(name, short_name, min, max, default)
        }
    }

    /// 0–100 % control.
    pub const fn percent(name: &'static str, short_name: &'static str, default: f32) -> Self {
        Self {
            unit: ParamUnit::Percent,
            step: 1.0,
            ..Self::plain(name, short_name, 0.0, 100.0, default)
        }
    }

    /// Frequency in Hz with a logarithmic taper. `min` must be positive.
    pub const fn frequency_hz(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            unit: ParamUnit::Hertz,
            scale: ParamScale::Logarithmic,
            ..Self::plain(name, short_name, min, max, default)
        }
    }

    /// Compression ratio `n:1`.
    pub const fn ratio(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            unit: ParamUnit::Ratio,
            step: 0.1,
            ..Self::plain(name, short_name, min, max, default)
        }
    }

    /// Discrete choice among `labels`; the value is the label index.
    pub const fn choice(
        name: &'static str,
        short_name: &'static str,
        labels: &'static [&'static str],
        default_index: usize,
    ) -> Self {
        let max = if labels.is_empty() {
            0.0
        } else {
            (labels.len() - 1) as f32
        };
        Self {
            step: 1.0,
            flags: ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED),
            labels,
            ..Self::plain(name, short_name, 0.0, max, default_index as f32)
        }
    }

    /// Off/on switch.
    pub const fn switch(name: &'static str, short_name: &'static str, default_on: bool) -> Self {
        Self::choice(name, short_name, bool::LABELS, default_on as usize)
    }

    /// Sets the stable id and string id.
    pub const fn with_id(mut self, id: ParamId, string_id: &'static str) -> Self {
        self.id = id;
        self.string_id = string_id;
        self
    }

    /// Sets the normalization taper.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Enables a linear smoothing ramp of `ms` milliseconds.
    pub const fn with_smoothing(mut self, ms: f32) -> Self {
        self.smoothing_ms = ms;
        self
    }

    /// Whether this control takes discrete integer values.
    #[inline]
    pub const fn is_stepped(&self) -> bool {
        self.flags.contains(ParamFlags::STEPPED)
    }

    /// Clamps to `[min, max]`; stepped controls are also rounded to an index.
    /// NaN maps to the default.
    ///
    /// ```rust
    /// use echoform_core::ParamDescriptor;
    ///
    /// let desc = ParamDescriptor::gain_db("Gain", "Gain", -60.0, 12.0, 0.0);
    /// assert_eq!(desc.clamp(-100.0), -60.0);
    /// assert_eq!(desc.clamp(100.0), 12.0);
    /// ```
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        let clamped = value.clamp(self.min, self.max);
        if self.is_stepped() {
            libm::roundf(clamped)
        } else {
            clamped
        }
    }

    /// Converts a plain value to normalized range (0.0 to 1.0), respecting
    /// [`ParamScale`].
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        let value = value.clamp(self.min, self.max);
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return (value - self.min) / range;
                }
                libm::logf(value / self.min) / libm::logf(self.max / self.min)
            }
            ParamScale::Power(exp) => {
                let linear = (value - self.min) / range;
                libm::powf(linear, 1.0 / exp)
            }
        }
    }

    /// Converts a normalized value (clamped to 0.0–1.0) to the plain range.
    ///
    /// Inverse of [`normalize`](Self::normalize).
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let n = if normalized.is_nan() {
            0.0
        } else {
            normalized.clamp(0.0, 1.0)
        };
        let plain = match self.scale {
            ParamScale::Linear => self.min + n * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    self.min + n * (self.max - self.min)
                } else {
                    self.min * libm::powf(self.max / self.min, n)
                }
            }
            ParamScale::Power(exp) => self.min + libm::powf(n, exp) * (self.max - self.min),
        };
        self.clamp(plain)
    }

    /// Label for a stepped value, if this control has labels.
    pub fn label_for(&self, value: f32) -> Option<&'static str> {
        if self.labels.is_empty() {
            return None;
        }
        let index = self.clamp(value) as usize;
        self.labels.get(index).copied()
    }
}

/// Closed enumeration bound to a stepped parameter.
///
/// The parameter value is the variant index; [`from_value`](Self::from_value)
/// rounds and clamps so there is no invalid-integer state to handle.
pub trait ParamEnum: Copy + Default {
    /// Display labels, one per variant, in index order.
    const LABELS: &'static [&'static str];

    /// Variant at `index`, if any.
    fn from_index(index: usize) -> Option<Self>;

    /// Index of this variant.
    fn index(self) -> usize;

    /// Decode a raw parameter value.
    fn from_value(value: f32) -> Self {
        let index = libm::roundf(value.max(0.0)) as usize;
        Self::from_index(index.min(Self::LABELS.len().saturating_sub(1))).unwrap_or_default()
    }

    /// Encode as a raw parameter value.
    fn to_value(self) -> f32 {
        self.index() as f32
    }
}

impl ParamEnum for bool {
    const LABELS: &'static [&'static str] = &["Off", "On"];

    fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    fn index(self) -> usize {
        usize::from(self)
    }
}
