//! Per-group quantization, delta prediction, and parameter extraction.
//!
//! A group is 32 consecutive floats. Each float is quantized to
//! `round_half_to_even(f / epsilon)`, first-order delta coded against the
//! worker's running previous value, and zigzag mapped to an unsigned
//! residual. The largest residual in the group (the exception) is described
//! by the parameter triple; the remaining 31 share the tight bit width.

use crate::format::QUANT_GROUP;

/// Parameter triple for one quantization group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupParams {
    /// Position of the largest residual within the group.
    pub max_index: u8,
    /// Low bits sufficient for every residual except the exception.
    pub bits: u8,
    /// Upper portion of the exception: `max_residual >> bits`.
    pub high: u32,
}

/// Zigzag map: small signed magnitudes become small unsigned values.
#[inline]
pub fn zigzag(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Inverse zigzag map.
#[inline]
pub fn unzigzag(u: u32) -> i32 {
    ((u >> 1) as i32) ^ -((u & 1) as i32)
}

/// Quantize one float with a precomputed reciprocal step.
///
/// Round-to-nearest-even matches the `q * epsilon` inverse in expectation.
/// Non-finite inputs are the caller's responsibility; the cast saturates.
#[inline]
pub fn quantize(value: f32, inv_epsilon: f32) -> i32 {
    (value * inv_epsilon).round_ties_even() as i32
}

/// Residual mask with the low `bits` set, for `bits` in `[0, 32]`.
#[inline]
pub fn low_mask(bits: u8) -> u32 {
    if bits == 0 {
        0
    } else {
        u32::MAX >> (32 - bits as u32)
    }
}

/// Encode one group: quantize, delta, zigzag, and scan for parameters.
///
/// `q_prev` is the worker's running previous quantized value; it carries
/// across the worker's groups and starts at 0. Residuals are written in
/// full; truncation to `bits` happens at pack time.
///
/// The scan keeps the first occurrence on ties, so an equal-to-max residual
/// later in the group lands in `max2`. That ordering is observable through
/// `max_index` and is part of the format.
pub fn encode_group(
    values: &[f32],
    inv_epsilon: f32,
    q_prev: &mut i32,
    residuals: &mut [u32],
) -> GroupParams {
    debug_assert_eq!(values.len(), QUANT_GROUP);
    debug_assert_eq!(residuals.len(), QUANT_GROUP);

    let mut max1 = 0u32;
    let mut max2 = 0u32;
    let mut max_index = 0usize;

    for (i, &value) in values.iter().enumerate() {
        let q = quantize(value, inv_epsilon);
        let r = zigzag(q.wrapping_sub(*q_prev));
        *q_prev = q;
        residuals[i] = r;

        if r > max1 {
            max2 = max1;
            max1 = r;
            max_index = i;
        } else if r > max2 {
            max2 = r;
        }
    }

    let bits = if max2 == 0 {
        0
    } else {
        (32 - max2.leading_zeros()) as u8
    };

    GroupParams {
        max_index: max_index as u8,
        bits,
        // bits == 32 stores the exception fully in the packed region.
        high: max1.checked_shr(bits as u32).unwrap_or(0),
    }
}

/// Reconstruct the exception residual from its parameter triple.
///
/// The low `bits` are defined to be all-ones on decode; whatever the
/// encoder left in the packed slice at `max_index` is discarded. At
/// `bits == 32` the packed value already is the exception, so the
/// reconstruction is skipped by the caller.
#[inline]
pub fn reconstruct_exception(params: GroupParams) -> u32 {
    (params.high.checked_shl(params.bits as u32).unwrap_or(0)) | low_mask(params.bits)
}

/// Decode one group of residuals back to floats.
///
/// `residuals` holds the deinterleaved words (all zero when `bits == 0`);
/// the exception is overwritten in place before the inverse delta scan.
pub fn decode_group(
    params: GroupParams,
    residuals: &mut [u32],
    q_prev: &mut i32,
    epsilon: f32,
    out: &mut [f32],
) {
    debug_assert_eq!(residuals.len(), QUANT_GROUP);
    debug_assert_eq!(out.len(), QUANT_GROUP);

    if params.bits < 32 {
        residuals[params.max_index as usize] = reconstruct_exception(params);
    }

    for (r, out) in residuals.iter().zip(out.iter_mut()) {
        let q = q_prev.wrapping_add(unzigzag(*r));
        *q_prev = q;
        *out = q as f32 * epsilon;
    }
}
