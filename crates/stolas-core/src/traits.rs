//! Entropy-coder seam consumed by the stream framer.
//!
//! The framer never names a concrete coder. On encode it appends the
//! logical stream chunk by chunk and flushes once at the end; on decode it
//! pulls exact byte counts back out, failing when the frame ends early.

use crate::error::Result;

/// Streaming byte-stream compressor.
pub trait EntropyEncoder {
    /// Append a chunk of the logical stream.
    fn write(&mut self, chunk: &[u8]) -> Result<()>;

    /// Flush and return the complete compressed frame.
    ///
    /// The encoder is spent afterwards; further writes are an error.
    fn finish(&mut self) -> Result<Vec<u8>>;
}

/// Streaming byte-stream decompressor.
pub trait EntropyDecoder {
    /// Fill `out` exactly from the decompressed stream.
    ///
    /// Errors if the frame ends, or the compressed input runs out, before
    /// `out` is full.
    fn read_exact(&mut self, out: &mut [u8]) -> Result<()>;
}
