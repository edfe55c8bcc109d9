//! Stream framer and the public compress / decompress surface.
//!
//! Compress: pad to whole blocks, run the encode kernels, then feed the
//! header and every block payload through one entropy frame. Decompress
//! inverts it incrementally: the fixed 12-byte prefix first, then the
//! per-block word counts, then each block's exact payload, then the decode
//! kernels.

use std::borrow::Cow;

use tracing::debug;

use stolas_core::{
    block_count, block_payload_bytes, CompressionRatio, EntropyDecoder, EntropyEncoder,
    Error as FormatError, StreamHeader, ENTROPY_LEVEL, FLOATS_PER_BLOCK, HEADER_PREFIX_BYTES,
    MAX_BLOCK_WORDS,
};

use crate::backend::{Backend, BackendKind};
use crate::entropy::{ZstdEntropyDecoder, ZstdEntropyEncoder};
use crate::error::Result;
use crate::host::HostBackend;

/// Codec configuration.
#[derive(Debug, Clone, Copy)]
pub struct CodecConfig {
    /// Level handed to the entropy coder.
    pub entropy_level: i32,
    /// Backend the block kernels run on.
    pub backend: BackendKind,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            entropy_level: ENTROPY_LEVEL,
            backend: BackendKind::Host,
        }
    }
}

/// A configured float-stream codec.
///
/// Every call is self-contained: device buffers, streams, and entropy-coder
/// state live only for the duration of one compress or decompress and are
/// released on every exit path by drop.
pub struct FloatCodec {
    backend: Box<dyn Backend>,
    entropy_level: i32,
}

impl FloatCodec {
    /// Create a codec on the host backend with the format's entropy level.
    pub fn new() -> Self {
        FloatCodec {
            backend: Box::new(HostBackend),
            entropy_level: ENTROPY_LEVEL,
        }
    }

    /// Create a codec from an explicit configuration.
    ///
    /// Fails when the configured device cannot be initialized.
    pub fn with_config(config: CodecConfig) -> Result<Self> {
        let backend: Box<dyn Backend> = match config.backend {
            BackendKind::Host => Box::new(HostBackend),
            #[cfg(feature = "cuda")]
            BackendKind::Cuda { device_id } => Box::new(crate::cuda::CudaBackend::new(device_id)?),
        };
        Ok(FloatCodec {
            backend,
            entropy_level: config.entropy_level,
        })
    }

    /// Compress `floats` with quantization step `epsilon`.
    ///
    /// Each reconstructed element differs from its original by at most
    /// `epsilon`. Non-finite inputs are not filtered; see the crate docs.
    pub fn compress(&self, floats: &[f32], epsilon: f32) -> Result<Vec<u8>> {
        if floats.is_empty() {
            return Err(FormatError::EmptyInput.into());
        }
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(FormatError::InvalidEpsilon(epsilon).into());
        }
        if floats.len() > u32::MAX as usize {
            return Err(FormatError::Unsupported(format!(
                "float count {} exceeds the u32 header field",
                floats.len()
            ))
            .into());
        }

        let blocks = block_count(floats.len());
        let padded = pad_to_blocks(floats, blocks);
        let encoded = self.backend.encode_blocks(&padded, 1.0 / epsilon)?;

        let header = StreamHeader {
            epsilon,
            float_count: floats.len() as u32,
            block_used_words: encoded.iter().map(|b| b.used_words).collect(),
        };

        let mut entropy = ZstdEntropyEncoder::new(self.entropy_level)?;
        entropy.write(&header.to_bytes())?;
        for block in &encoded {
            entropy.write(&block.payload)?;
        }
        let compressed = entropy.finish()?;

        let ratio = CompressionRatio::new(std::mem::size_of_val(floats), compressed.len());
        debug!(
            floats = floats.len(),
            blocks,
            compressed = compressed.len(),
            ratio = %ratio,
            "compressed float stream"
        );
        Ok(compressed)
    }

    /// Decompress a stream produced by [`FloatCodec::compress`].
    ///
    /// Never reads past the end of `compressed`; a truncated or corrupted
    /// stream is an error.
    pub fn decompress(&self, compressed: &[u8]) -> Result<Vec<f32>> {
        let mut entropy = ZstdEntropyDecoder::new(compressed)?;

        let mut prefix = [0u8; HEADER_PREFIX_BYTES];
        entropy.read_exact(&mut prefix)?;
        let (epsilon, float_count) = StreamHeader::parse_prefix(&prefix)?;

        let blocks = block_count(float_count as usize);
        let mut used_words = vec![0u32; blocks];
        for used in used_words.iter_mut() {
            let mut word = [0u8; 4];
            entropy.read_exact(&mut word)?;
            *used = u32::from_le_bytes(word);
        }

        let mut payloads = Vec::with_capacity(blocks);
        for (index, &used) in used_words.iter().enumerate() {
            if used as usize > MAX_BLOCK_WORDS {
                return Err(FormatError::corrupted(format!(
                    "block {index} claims {used} packed words, limit {MAX_BLOCK_WORDS}"
                ))
                .into());
            }
            let mut payload = vec![0u8; block_payload_bytes(used)];
            entropy.read_exact(&mut payload)?;
            payloads.push(payload);
        }

        let floats = self
            .backend
            .decode_blocks(&payloads, epsilon, float_count as usize)?;
        debug!(
            floats = floats.len(),
            blocks,
            compressed = compressed.len(),
            "decompressed float stream"
        );
        Ok(floats)
    }
}

impl Default for FloatCodec {
    fn default() -> Self {
        FloatCodec::new()
    }
}

/// Zero-pad to a whole number of blocks, borrowing when already aligned.
fn pad_to_blocks(floats: &[f32], blocks: usize) -> Cow<'_, [f32]> {
    let padded_len = blocks * FLOATS_PER_BLOCK;
    if floats.len() == padded_len {
        Cow::Borrowed(floats)
    } else {
        let mut padded = vec![0f32; padded_len];
        padded[..floats.len()].copy_from_slice(floats);
        Cow::Owned(padded)
    }
}

/// Compress with the default host codec.
pub fn compress(floats: &[f32], epsilon: f32) -> Result<Vec<u8>> {
    FloatCodec::new().compress(floats, epsilon)
}

/// Decompress with the default host codec.
pub fn decompress(compressed: &[u8]) -> Result<Vec<f32>> {
    FloatCodec::new().decompress(compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_input() {
        let err = compress(&[], 0.5).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Format(FormatError::EmptyInput)
        ));
    }

    #[test]
    fn rejects_bad_epsilon() {
        for epsilon in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = compress(&[1.0], epsilon).unwrap_err();
            assert!(matches!(
                err,
                crate::Error::Format(FormatError::InvalidEpsilon(_))
            ));
        }
    }

    #[test]
    fn pad_borrows_aligned_input() {
        let aligned = vec![0f32; FLOATS_PER_BLOCK];
        assert!(matches!(pad_to_blocks(&aligned, 1), Cow::Borrowed(_)));
        let short = vec![0f32; 3];
        let padded = pad_to_blocks(&short, 1);
        assert_eq!(padded.len(), FLOATS_PER_BLOCK);
    }
}
