//! Error types for the compressor surface.

use thiserror::Error;

/// Result type for compressor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by compression and decompression.
#[derive(Debug, Error)]
pub enum Error {
    /// Format or entropy-coder failure from the codec core.
    #[error(transparent)]
    Format(#[from] stolas_core::Error),

    /// Accelerator runtime failure: allocation, copy, launch, or sync.
    #[error("device error: {0}")]
    Device(String),

    /// CUDA driver failure.
    #[cfg(feature = "cuda")]
    #[error("CUDA driver error: {0}")]
    Driver(#[from] cudarc::driver::DriverError),
}

impl Error {
    /// Create a device error.
    pub fn device(message: impl Into<String>) -> Self {
        Error::Device(message.into())
    }
}
