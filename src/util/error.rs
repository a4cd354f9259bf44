//! Error types for gridfit.

use thiserror::Error;

/// Result alias for gridfit operations.
pub type GridFitResult<T> = std::result::Result<T, GridFitError>;

/// Errors raised when buffers, views or configurations are malformed.
///
/// Algorithmic "no result" outcomes (too few points, no secondary lattice
/// direction, singular basis) are not errors; they surface as empty vectors
/// or `None`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GridFitError {
    /// Width or height is zero, or their product overflows.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer is shorter than the view requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// An owned buffer does not match `width * height` exactly.
    #[error("buffer length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    /// A mask buffer holds a value other than 0 or 1.
    #[error("mask value {value} at index {index} is not 0 or 1")]
    InvalidMaskValue { index: usize, value: u8 },
    /// Interleaved pixel data with a channel count other than 1, 3 or 4.
    #[error("unsupported channel count {channels}")]
    UnsupportedChannels { channels: usize },
    /// A configuration value is out of range.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// Image decoding or file access failed.
    #[error("image io: {reason}")]
    ImageIo { reason: String },
}
