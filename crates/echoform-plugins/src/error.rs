//! Errors from the processor lifecycle.

use echoform_core::ChannelConfig;
use thiserror::Error;

/// Reasons a lifecycle call or a frame was refused.
///
/// A refused frame leaves the output buffer untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// The topology does not handle this input/output pairing.
    #[error("unsupported channel topology {0}")]
    UnsupportedChannelTopology(ChannelConfig),
    /// The frame buffers have channel counts no format describes.
    #[error("unsupported channel counts: {input} in, {output} out")]
    UnsupportedChannelCount {
        /// Input channels supplied.
        input: usize,
        /// Output channels supplied.
        output: usize,
    },
    /// `reset` has not been called since `initialize`.
    #[error("processor has not been prepared with reset(sample_rate, bit_depth)")]
    NotPrepared,
    /// `initialize` was called a second time.
    #[error("processor is already initialized")]
    AlreadyInitialized,
    /// `reset` was called before `initialize`.
    #[error("processor has not been initialized")]
    NotInitialized,
}
