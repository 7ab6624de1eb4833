use burn_extra_ops::ChannelMismatch;
use thiserror::Error;

/// The error type for `FusionNet-Burn` operations.
///
/// Construction problems are reported before any tensor is touched; shape
/// problems are reported by the first layer that sees the offending tensor.
#[derive(Error, Debug)]
pub enum FusionError {
    /// Error for when an invalid model configuration is provided.
    /// This can happen if configuration parameters are logically inconsistent.
    #[error("Invalid model configuration: {reason}")]
    InvalidConfiguration {
        /// The reason why the configuration is invalid.
        reason: String,
    },

    /// Error for when an input tensor has an invalid shape.
    #[error("Invalid input tensor shape at {layer}: expected {expected}, got {actual}")]
    InvalidTensorShape {
        /// The layer that rejected the tensor.
        layer: String,
        /// The expected tensor shape.
        expected: String,
        /// The actual tensor shape.
        actual: String,
    },

    /// Error for when loading model weights fails.
    #[error("Failed to load weights: {reason}")]
    WeightLoadingFailed {
        /// The reason for the weight loading failure.
        reason: String,
    },
}

/// A specialized `Result` type for `FusionNet-Burn` operations.
pub type FusionResult<T> = Result<T, FusionError>;

impl FusionError {
    pub(crate) fn channels(layer: &str, expected: usize, dims: [usize; 4]) -> Self {
        Self::InvalidTensorShape {
            layer: layer.to_string(),
            expected: format!("[B, {expected}, H, W]"),
            actual: format!("{dims:?}"),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

impl From<ChannelMismatch> for FusionError {
    fn from(err: ChannelMismatch) -> Self {
        Self::channels("Sobel", err.expected, err.actual)
    }
}
