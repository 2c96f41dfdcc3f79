//! Error types for the control path.
//!
//! Nothing here is raised on the audio thread. Per-sample edge cases (tap
//! positions out of range, denormals) are clamped inside the stages instead,
//! and out-of-range parameter values are clamped silently with the fact
//! recorded on the returned [`Commit`](crate::Commit).

use crate::param_info::ParamId;
use thiserror::Error;

/// Errors from parameter update entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParamError {
    /// The id is not part of the active parameter set. The update was ignored.
    #[error("unknown parameter id {0}")]
    InvalidParameterId(ParamId),
}

/// Errors from tempo conversion.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TempoError {
    /// BPM was zero, negative, or not finite.
    #[error("invalid tempo: {0} BPM")]
    InvalidTempo(f32),
}

/// Errors from applying a [`PresetSnapshot`](crate::PresetSnapshot).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    /// The preset does not provide a value for a parameter in the active set.
    #[error("preset '{preset}' is missing parameter {id}")]
    MissingParameter {
        /// Preset name.
        preset: &'static str,
        /// First missing id.
        id: ParamId,
    },
    /// The preset names a parameter that the active set does not contain.
    #[error("preset '{preset}' sets unknown parameter {id}")]
    UnknownParameter {
        /// Preset name.
        preset: &'static str,
        /// Offending id.
        id: ParamId,
    },
}
