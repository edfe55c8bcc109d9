//! # Stolas Core
//!
//! Bit-exact format code for the Stolas quantized float stream: a
//! lossy-then-lossless codec for dense `f32` arrays. A caller-supplied
//! quantization step epsilon bounds the per-element error; everything after
//! quantization is reversible.
//!
//! The pipeline per 32-value group:
//!
//! ```text
//! f32 ── round_half_to_even(f / eps) ──> q: i32
//!  q  ── delta vs worker q_prev ──────> signed delta
//!     ── zigzag ─────────────────────> residual: u32
//!     ── exception extraction ───────> (max_index, bits, high)
//!     ── bit interleave (bits words) ─> packed slices
//! ```
//!
//! Everything in this crate is a pure function over slices, shared verbatim
//! by the host worker-pool and mirrored by the device kernels; the
//! execution backends and the entropy coder live in the `stolas` crate.
//!
//! ## Modules
//!
//! - [`format`] - binary-format constants, stream header, block layout
//! - [`group`] - quantization, delta + zigzag, parameter extraction
//! - [`interleave`] - the 32 x bits bit transpose and its inverse
//! - [`block`] - per-block encode/decode with prefix-sum space allocation
//! - [`traits`] - the streaming entropy-coder seam
//! - [`stats`] - compression ratio metrics

pub mod block;
pub mod error;
pub mod format;
pub mod group;
pub mod interleave;
pub mod stats;
pub mod traits;

pub use block::{decode_block, encode_block, BlockEncoding};
pub use error::{Error, Result};
pub use format::{
    block_count, block_payload_bytes, StreamHeader, BITS_TABLE_OFFSET, ENTROPY_LEVEL,
    FLOATS_PER_BLOCK, FLOATS_PER_WORKER, GROUPS_PER_WORKER, HEADER_PREFIX_BYTES,
    HIGH_TABLE_OFFSET, MAGIC, MAX_BLOCK_WORDS, PACKED_OFFSET, PARAMS_PER_BLOCK, PARAM_BYTES,
    PARAM_TABLE_BYTES, QUANT_GROUP, WORKERS_PER_BLOCK,
};
pub use group::{decode_group, encode_group, GroupParams};
pub use interleave::{deinterleave, interleave, interleave_tiled};
pub use stats::CompressionRatio;
pub use traits::{EntropyDecoder, EntropyEncoder};
