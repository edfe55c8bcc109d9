//! Block encoding: parameter tables, packed-space allocation, and the
//! inverse walk.
//!
//! A block covers 32768 floats: 256 workers of 4 groups each. The encoder
//! runs in three ordered phases, mirroring the device kernel:
//!
//! 1. every worker quantizes its groups and records parameter triples plus
//!    its packed-word demand,
//! 2. an exclusive prefix sum over the per-worker demands assigns each
//!    worker its offset into the packed region,
//! 3. workers interleave their residuals into the assigned slots.
//!
//! On the device the phase boundaries are barriers; here they are plain
//! sequential program order, which yields the identical layout.

use crate::error::{Error, Result};
use crate::format::{
    BITS_TABLE_OFFSET, FLOATS_PER_BLOCK, GROUPS_PER_WORKER, HIGH_TABLE_OFFSET, PACKED_OFFSET,
    PARAMS_PER_BLOCK, PARAM_TABLE_BYTES, QUANT_GROUP, WORKERS_PER_BLOCK,
};
use crate::group::{decode_group, encode_group, GroupParams};
use crate::interleave::{deinterleave, interleave_tiled};

/// Tile width used by the packer. Any width gives identical bytes; 8 keeps
/// the inner loop over inputs to four passes at full 32-bit groups.
const PACK_TILE: usize = 8;

/// One encoded block: its serialized payload and packed-word count.
#[derive(Debug, Clone)]
pub struct BlockEncoding {
    /// Parameter tables followed by the packed residual words.
    pub payload: Vec<u8>,
    /// Words in the packed region; serialized into the stream header.
    pub used_words: u32,
}

/// Encode one zero-padded block of exactly [`FLOATS_PER_BLOCK`] floats.
pub fn encode_block(floats: &[f32], inv_epsilon: f32) -> BlockEncoding {
    debug_assert_eq!(floats.len(), FLOATS_PER_BLOCK);

    let mut params = [GroupParams::default(); PARAMS_PER_BLOCK];
    let mut residuals = vec![0u32; FLOATS_PER_BLOCK];
    let mut used_words = [0u32; WORKERS_PER_BLOCK];

    // Phase 1: quantize and extract parameters, worker by worker.
    for (worker, demand) in used_words.iter_mut().enumerate() {
        let mut q_prev = 0i32;
        for group in 0..GROUPS_PER_WORKER {
            let index = worker * GROUPS_PER_WORKER + group;
            let base = index * QUANT_GROUP;
            let triple = encode_group(
                &floats[base..base + QUANT_GROUP],
                inv_epsilon,
                &mut q_prev,
                &mut residuals[base..base + QUANT_GROUP],
            );
            params[index] = triple;
            *demand += triple.bits as u32;
        }
    }

    // Phase 2: exclusive prefix sum assigns packed offsets.
    let mut offsets = [0u32; WORKERS_PER_BLOCK];
    let mut total = 0u32;
    for (offset, &demand) in offsets.iter_mut().zip(used_words.iter()) {
        *offset = total;
        total += demand;
    }

    // Phase 3: emit tables and interleave residuals into assigned slots.
    let mut payload = vec![0u8; PARAM_TABLE_BYTES + total as usize * 4];
    for (index, triple) in params.iter().enumerate() {
        payload[index] = triple.max_index;
        payload[BITS_TABLE_OFFSET + index] = triple.bits;
        payload[HIGH_TABLE_OFFSET + index * 4..HIGH_TABLE_OFFSET + index * 4 + 4]
            .copy_from_slice(&triple.high.to_le_bytes());
    }

    let mut slices = [0u32; QUANT_GROUP];
    for worker in 0..WORKERS_PER_BLOCK {
        let mut cursor = offsets[worker] as usize;
        for group in 0..GROUPS_PER_WORKER {
            let index = worker * GROUPS_PER_WORKER + group;
            let base = index * QUANT_GROUP;
            let bits = params[index].bits;
            interleave_tiled(
                &residuals[base..base + QUANT_GROUP],
                bits,
                PACK_TILE,
                &mut slices,
            );
            for &word in &slices[..bits as usize] {
                let at = PACKED_OFFSET + cursor * 4;
                payload[at..at + 4].copy_from_slice(&word.to_le_bytes());
                cursor += 1;
            }
        }
        debug_assert_eq!(cursor as u32, offsets[worker] + used_words[worker]);
    }

    BlockEncoding {
        payload,
        used_words: total,
    }
}

/// Decode one block payload into exactly [`FLOATS_PER_BLOCK`] floats.
///
/// The payload must hold the full parameter tables and exactly as many
/// packed words as its bits table demands; anything else is a corrupted
/// stream, reported without reading out of bounds.
pub fn decode_block(payload: &[u8], epsilon: f32, out: &mut [f32]) -> Result<()> {
    debug_assert_eq!(out.len(), FLOATS_PER_BLOCK);

    if payload.len() < PARAM_TABLE_BYTES {
        return Err(Error::truncated(PARAM_TABLE_BYTES, payload.len()));
    }

    let bits_table = &payload[BITS_TABLE_OFFSET..BITS_TABLE_OFFSET + PARAMS_PER_BLOCK];
    let mut total = 0usize;
    for (index, &bits) in bits_table.iter().enumerate() {
        if bits > 32 {
            return Err(Error::corrupted(format!(
                "group {index} bit width {bits} exceeds 32"
            )));
        }
        if payload[index] as usize >= QUANT_GROUP {
            return Err(Error::corrupted(format!(
                "group {index} exception index {} out of range",
                payload[index]
            )));
        }
        total += bits as usize;
    }
    let expected = PARAM_TABLE_BYTES + total * 4;
    if payload.len() != expected {
        return Err(Error::corrupted(format!(
            "packed region holds {} bytes, bits tables demand {}",
            payload.len() - PARAM_TABLE_BYTES,
            total * 4
        )));
    }

    let packed = &payload[PACKED_OFFSET..];
    let mut slices = [0u32; QUANT_GROUP];
    let mut residuals = [0u32; QUANT_GROUP];
    let mut cursor = 0usize;

    for worker in 0..WORKERS_PER_BLOCK {
        let mut q_prev = 0i32;
        for group in 0..GROUPS_PER_WORKER {
            let index = worker * GROUPS_PER_WORKER + group;
            let params = GroupParams {
                max_index: payload[index],
                bits: bits_table[index],
                high: u32::from_le_bytes(
                    payload[HIGH_TABLE_OFFSET + index * 4..HIGH_TABLE_OFFSET + index * 4 + 4]
                        .try_into()
                        .unwrap(),
                ),
            };

            let words = params.bits as usize;
            for (slot, chunk) in slices[..words]
                .iter_mut()
                .zip(packed[cursor * 4..(cursor + words) * 4].chunks_exact(4))
            {
                *slot = u32::from_le_bytes(chunk.try_into().unwrap());
            }
            cursor += words;

            deinterleave(&slices[..words], params.bits, &mut residuals);
            let base = index * QUANT_GROUP;
            decode_group(
                params,
                &mut residuals,
                &mut q_prev,
                epsilon,
                &mut out[base..base + QUANT_GROUP],
            );
        }
    }

    Ok(())
}
