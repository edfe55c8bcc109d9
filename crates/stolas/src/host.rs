//! Host worker-pool backend.
//!
//! One rayon task per block; inside a block the 256 workers run
//! sequentially, so the device barriers collapse to program order and the
//! emitted bytes are identical to the kernel path.

use rayon::prelude::*;

use stolas_core::{decode_block, encode_block, BlockEncoding, FLOATS_PER_BLOCK};

use crate::backend::Backend;
use crate::error::Result;

/// CPU fallback backend; always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostBackend;

impl Backend for HostBackend {
    fn encode_blocks(&self, floats: &[f32], inv_epsilon: f32) -> Result<Vec<BlockEncoding>> {
        debug_assert_eq!(floats.len() % FLOATS_PER_BLOCK, 0);
        Ok(floats
            .par_chunks(FLOATS_PER_BLOCK)
            .map(|block| encode_block(block, inv_epsilon))
            .collect())
    }

    fn decode_blocks(
        &self,
        payloads: &[Vec<u8>],
        epsilon: f32,
        float_count: usize,
    ) -> Result<Vec<f32>> {
        let mut floats = vec![0f32; payloads.len() * FLOATS_PER_BLOCK];
        floats
            .par_chunks_mut(FLOATS_PER_BLOCK)
            .zip(payloads.par_iter())
            .try_for_each(|(out, payload)| decode_block(payload, epsilon, out))?;
        floats.truncate(float_count);
        Ok(floats)
    }
}
