//! Zstd entropy coding behind the core streaming seam.
//!
//! The whole logical stream (header plus blocks) is one zstd frame. Encode
//! appends chunk by chunk and flushes once; decode pulls exact byte counts
//! back out of the frame, so a truncated input surfaces as an error instead
//! of a read past the end.

use std::io::{BufReader, Cursor, Read, Write};

use stolas_core::{EntropyDecoder, EntropyEncoder, Error, Result};

/// Streaming zstd compressor over an in-memory frame.
pub struct ZstdEntropyEncoder {
    encoder: Option<zstd::stream::write::Encoder<'static, Vec<u8>>>,
}

impl ZstdEntropyEncoder {
    /// Create an encoder at the given zstd level.
    pub fn new(level: i32) -> Result<Self> {
        let encoder = zstd::stream::write::Encoder::new(Vec::new(), level)
            .map_err(|e| Error::entropy("init", e))?;
        Ok(ZstdEntropyEncoder {
            encoder: Some(encoder),
        })
    }
}

impl EntropyEncoder for ZstdEntropyEncoder {
    fn write(&mut self, chunk: &[u8]) -> Result<()> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| Error::entropy("stream", "encoder already finished"))?;
        encoder
            .write_all(chunk)
            .map_err(|e| Error::entropy("stream", e))
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| Error::entropy("flush", "encoder already finished"))?;
        encoder.finish().map_err(|e| Error::entropy("flush", e))
    }
}

/// Incremental zstd decompressor over a borrowed compressed buffer.
pub struct ZstdEntropyDecoder<'a> {
    decoder: zstd::stream::read::Decoder<'static, BufReader<Cursor<&'a [u8]>>>,
}

impl<'a> ZstdEntropyDecoder<'a> {
    /// Create a decoder over a complete compressed stream.
    pub fn new(compressed: &'a [u8]) -> Result<Self> {
        let decoder = zstd::stream::read::Decoder::new(Cursor::new(compressed))
            .map_err(|e| Error::entropy("init", e))?;
        Ok(ZstdEntropyDecoder { decoder })
    }
}

impl EntropyDecoder for ZstdEntropyDecoder<'_> {
    fn read_exact(&mut self, out: &mut [u8]) -> Result<()> {
        self.decoder
            .read_exact(out)
            .map_err(|e| Error::entropy("decompress", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_roundtrip_in_chunks() {
        let mut encoder = ZstdEntropyEncoder::new(1).unwrap();
        encoder.write(b"hello ").unwrap();
        encoder.write(b"stream").unwrap();
        let frame = encoder.finish().unwrap();

        let mut decoder = ZstdEntropyDecoder::new(&frame).unwrap();
        let mut first = [0u8; 6];
        let mut second = [0u8; 6];
        decoder.read_exact(&mut first).unwrap();
        decoder.read_exact(&mut second).unwrap();
        assert_eq!(&first, b"hello ");
        assert_eq!(&second, b"stream");

        // The frame is spent; further reads fail.
        assert!(decoder.read_exact(&mut [0u8; 1]).is_err());
    }

    #[test]
    fn truncated_frame_fails() {
        let mut encoder = ZstdEntropyEncoder::new(1).unwrap();
        encoder.write(&[7u8; 4096]).unwrap();
        let frame = encoder.finish().unwrap();

        let cut = &frame[..frame.len() - 1];
        let mut out = vec![0u8; 4096];
        let result = ZstdEntropyDecoder::new(cut)
            .and_then(|mut decoder| decoder.read_exact(&mut out));
        assert!(result.is_err());
    }

    #[test]
    fn spent_encoder_rejects_writes() {
        let mut encoder = ZstdEntropyEncoder::new(1).unwrap();
        encoder.finish().unwrap();
        assert!(encoder.write(b"late").is_err());
        assert!(encoder.finish().is_err());
    }
}
