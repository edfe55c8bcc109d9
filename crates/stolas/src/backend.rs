//! Execution backend seam for the block codec kernels.
//!
//! The format code in `stolas-core` is execution-agnostic; a backend runs
//! it over whole blocks. The host backend is always available; the CUDA
//! backend is compiled in with the `cuda` feature. Runtime glue — device
//! memory, transfers, kernel dispatch, synchronization — stays behind this
//! trait so the framer never sees it.

use stolas_core::BlockEncoding;

use crate::error::Result;

/// Which backend a codec should run its kernels on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Rayon worker-pool on the host.
    #[default]
    Host,
    /// CUDA device, by ordinal.
    #[cfg(feature = "cuda")]
    Cuda { device_id: usize },
}

/// Runs the encode and decode kernels over a whole stream's blocks.
pub trait Backend: Send + Sync {
    /// Encode every block of `floats`, which must be zero-padded to a
    /// whole number of blocks. Blocks are independent; only the order of
    /// the returned encodings is observable.
    fn encode_blocks(&self, floats: &[f32], inv_epsilon: f32) -> Result<Vec<BlockEncoding>>;

    /// Decode every block payload and return exactly `float_count` floats,
    /// discarding the trailing pad.
    fn decode_blocks(
        &self,
        payloads: &[Vec<u8>],
        epsilon: f32,
        float_count: usize,
    ) -> Result<Vec<f32>>;
}
