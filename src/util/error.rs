//! Error types for boxsift.

use thiserror::Error;

/// Result alias for boxsift operations.
pub type SiftResult<T> = std::result::Result<T, SiftError>;

/// Errors that can occur while decoding, ranking or suppressing predictions.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SiftError {
    /// Two parallel sequences have different lengths.
    #[error("length mismatch for {context}: expected {expected}, got {got}")]
    LengthMismatch {
        expected: usize,
        got: usize,
        context: &'static str,
    },
    /// A tensor holds fewer elements than the detection count requires.
    #[error("tensor {tensor} too small: needed {needed}, got {got}")]
    BufferTooSmall {
        tensor: &'static str,
        needed: usize,
        got: usize,
    },
    /// The reported tensor shape does not describe the flattened data.
    ///
    /// `expected` saturates at `usize::MAX` when the shape product overflows.
    #[error("tensor shape {shape:?} describes {expected} elements, got {got}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },
    /// A box tensor whose rows are not four coordinates wide.
    #[error("box tensor rows must hold 4 coordinates, got {columns}")]
    InvalidBoxStride { columns: usize },
    /// A named output tensor is absent from the inference result.
    #[error("missing output tensor: {name}")]
    MissingOutput { name: String },
    /// The inference result contains no output tensors at all.
    #[error("inference result has no outputs")]
    NoOutputs,
    /// A detection carries a class index that is not a non-negative integer.
    #[error("invalid class index {value} for detection {detection}")]
    InvalidClassIndex { detection: usize, value: f32 },
    /// The valid-detection count is negative or not finite.
    #[error("invalid detection count: {value}")]
    InvalidCount { value: f32 },
    /// A configuration value is out of range.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
}
