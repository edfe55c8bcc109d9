//! # Stolas
//!
//! Lossy-then-lossless compressor for dense `f32` arrays. A caller-supplied
//! quantization step epsilon bounds the per-element reconstruction error;
//! the rest of the pipeline — delta prediction, zigzag, per-group exception
//! extraction, bit-interleaved packing, zstd entropy coding — is fully
//! reversible.
//!
//! The block codec is data-parallel: 256 workers cooperate on each block of
//! 32768 floats, and blocks are independent. It runs on a rayon worker-pool
//! by default and on a CUDA device with the `cuda` feature; both paths emit
//! bit-identical streams.
//!
//! ## Quick Start
//!
//! ```no_run
//! let weights: Vec<f32> = (0..100_000).map(|i| (i as f32 * 0.001).sin()).collect();
//!
//! let compressed = stolas::compress(&weights, 1e-4)?;
//! let restored = stolas::decompress(&compressed)?;
//!
//! assert_eq!(restored.len(), weights.len());
//! assert!(weights.iter().zip(&restored).all(|(a, b)| (a - b).abs() <= 1e-4));
//! # Ok::<(), stolas::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cuda` - CUDA backend via cudarc (off by default; the host backend is
//!   always available)
//!
//! ## Limits
//!
//! NaN and infinity are not handled specially; filter non-finite values
//! before compressing. Random access below block granularity is not
//! supported.

pub mod backend;
pub mod codec;
pub mod entropy;
pub mod error;
pub mod host;

#[cfg(feature = "cuda")]
pub mod cuda;

pub use backend::{Backend, BackendKind};
pub use codec::{compress, decompress, CodecConfig, FloatCodec};
pub use entropy::{ZstdEntropyDecoder, ZstdEntropyEncoder};
pub use error::{Error, Result};
pub use host::HostBackend;

#[cfg(feature = "cuda")]
pub use cuda::CudaBackend;

pub use stolas_core;
