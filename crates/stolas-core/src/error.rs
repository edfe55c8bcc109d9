//! Error types for stream encoding and decoding.

use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Codec error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Input does not hold enough bytes for the structure being read.
    #[error("truncated input: need {needed} bytes, got {got}")]
    TruncatedInput { needed: usize, got: usize },

    /// Stream does not start with the expected magic word.
    #[error("bad magic: expected 0x{expected:08x}, got 0x{actual:08x}")]
    BadMagic { expected: u32, actual: u32 },

    /// Quantization step is not a positive finite number.
    #[error("invalid epsilon {0}: must be finite and > 0")]
    InvalidEpsilon(f32),

    /// Compression was asked for zero floats.
    #[error("empty input: float count must be >= 1")]
    EmptyInput,

    /// Stream contents are internally inconsistent.
    #[error("corrupted stream: {message}")]
    CorruptedStream { message: String },

    /// Entropy coder failure (init, streaming, or flush).
    #[error("entropy coder {stage} failed: {message}")]
    Entropy {
        stage: &'static str,
        message: String,
    },

    /// Input outside what the format can describe.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create a corrupted stream error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Error::CorruptedStream {
            message: message.into(),
        }
    }

    /// Create an entropy coder error for the given stage.
    pub fn entropy(stage: &'static str, message: impl ToString) -> Self {
        Error::Entropy {
            stage,
            message: message.to_string(),
        }
    }

    /// Create a truncated input error.
    pub fn truncated(needed: usize, got: usize) -> Self {
        Error::TruncatedInput { needed, got }
    }

    /// Get error category for diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            Error::TruncatedInput { .. } => "truncated_input",
            Error::BadMagic { .. } => "bad_magic",
            Error::InvalidEpsilon(_) => "invalid_epsilon",
            Error::EmptyInput => "empty_input",
            Error::CorruptedStream { .. } => "corrupted_stream",
            Error::Entropy { .. } => "entropy",
            Error::Unsupported(_) => "unsupported",
        }
    }
}
