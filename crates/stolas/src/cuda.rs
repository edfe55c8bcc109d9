//! CUDA backend: the block codec kernels on a device.
//!
//! One thread block of 256 workers per stream block, matching the format's
//! cooperation width. The kernels carry the same three-phase structure as
//! the host path — parameters, prefix sum, pack — with `__syncthreads`
//! barriers at the phase boundaries. Kernel source is compiled with nvrtc
//! at backend construction; device buffers release on drop along every
//! exit path.

use std::sync::Arc;

use cudarc::driver::{CudaDevice, CudaFunction, LaunchAsync, LaunchConfig};
use cudarc::nvrtc::compile_ptx;
use tracing::info;

use stolas_core::{
    BlockEncoding, Error as FormatError, BITS_TABLE_OFFSET, FLOATS_PER_BLOCK, HIGH_TABLE_OFFSET,
    MAX_BLOCK_WORDS, PACKED_OFFSET, PARAMS_PER_BLOCK, PARAM_TABLE_BYTES, QUANT_GROUP,
    WORKERS_PER_BLOCK,
};

use crate::backend::Backend;
use crate::error::{Error, Result};

/// Module name the kernels are registered under.
const MODULE: &str = "stolas";

/// Encode and decode kernels.
///
/// The per-worker loops mirror `stolas_core::group` exactly;
/// `__float2int_rn` is the device spelling of round-half-to-even. The
/// worker-0 serial scan is the prefix sum; a tree scan would change
/// nothing observable.
const KERNEL_SRC: &str = r#"
extern "C" __global__ void stolas_encode_block(
    const float* __restrict__ floats,
    unsigned char* __restrict__ max_index,
    unsigned char* __restrict__ bits_table,
    unsigned int* __restrict__ high_table,
    unsigned int* __restrict__ packed,
    unsigned int* __restrict__ used_words,
    float inv_epsilon)
{
    __shared__ unsigned int demand[256];
    __shared__ unsigned int offsets[256];

    const unsigned int worker = threadIdx.x;
    const unsigned long long block = blockIdx.x;
    const float* in = floats + block * 32768ull + worker * 128u;

    unsigned int res[128];
    unsigned char gbits[4];
    int q_prev = 0;
    unsigned int my_words = 0;

    for (int g = 0; g < 4; ++g) {
        unsigned int max1 = 0, max2 = 0;
        int idx = 0;
        for (int i = 0; i < 32; ++i) {
            int q = __float2int_rn(in[g * 32 + i] * inv_epsilon);
            int delta = q - q_prev;
            q_prev = q;
            unsigned int r = ((unsigned int)(delta << 1)) ^ ((unsigned int)(delta >> 31));
            res[g * 32 + i] = r;
            if (r > max1) { max2 = max1; max1 = r; idx = i; }
            else if (r > max2) { max2 = r; }
        }
        unsigned int b = (max2 == 0) ? 0u : (unsigned int)(32 - __clz((int)max2));
        const unsigned long long p = block * 1024ull + worker * 4u + g;
        max_index[p] = (unsigned char)idx;
        bits_table[p] = (unsigned char)b;
        high_table[p] = (b >= 32u) ? 0u : (max1 >> b);
        gbits[g] = (unsigned char)b;
        my_words += b;
    }

    demand[worker] = my_words;
    __syncthreads();

    if (worker == 0) {
        unsigned int run = 0;
        for (int w = 0; w < 256; ++w) { offsets[w] = run; run += demand[w]; }
        used_words[block] = run;
    }
    __syncthreads();

    unsigned int cursor = offsets[worker];
    unsigned int* out = packed + block * 32768ull;
    for (int g = 0; g < 4; ++g) {
        const unsigned int b = gbits[g];
        for (unsigned int s = 0; s < b; ++s) {
            unsigned int word = 0;
            for (int i = 0; i < 32; ++i) {
                word |= ((res[g * 32 + i] >> s) & 1u) << i;
            }
            out[cursor++] = word;
        }
    }
}

extern "C" __global__ void stolas_decode_block(
    const unsigned char* __restrict__ max_index,
    const unsigned char* __restrict__ bits_table,
    const unsigned int* __restrict__ high_table,
    const unsigned int* __restrict__ packed,
    float* __restrict__ floats,
    float epsilon)
{
    __shared__ unsigned int demand[256];
    __shared__ unsigned int offsets[256];

    const unsigned int worker = threadIdx.x;
    const unsigned long long block = blockIdx.x;
    const unsigned long long pbase = block * 1024ull + worker * 4u;

    unsigned int my_words = 0;
    for (int g = 0; g < 4; ++g) my_words += bits_table[pbase + g];
    demand[worker] = my_words;
    __syncthreads();

    if (worker == 0) {
        unsigned int run = 0;
        for (int w = 0; w < 256; ++w) { offsets[w] = run; run += demand[w]; }
    }
    __syncthreads();

    const unsigned int* in = packed + block * 32768ull;
    float* out = floats + block * 32768ull + worker * 128u;
    unsigned int cursor = offsets[worker];
    int q_prev = 0;

    for (int g = 0; g < 4; ++g) {
        const unsigned int b = bits_table[pbase + g];
        unsigned int res[32];
        for (int i = 0; i < 32; ++i) res[i] = 0;
        for (unsigned int s = 0; s < b; ++s) {
            unsigned int word = in[cursor++];
            for (int i = 0; i < 32; ++i) {
                res[i] |= ((word >> i) & 1u) << s;
            }
        }
        if (b < 32u) {
            unsigned int mask = (b == 0u) ? 0u : (0xffffffffu >> (32u - b));
            res[max_index[pbase + g]] = (high_table[pbase + g] << b) | mask;
        }
        for (int i = 0; i < 32; ++i) {
            unsigned int r = res[i];
            q_prev += (int)(r >> 1) ^ -((int)(r & 1u));
            out[g * 32 + i] = (float)q_prev * epsilon;
        }
    }
}
"#;

/// CUDA device backend.
pub struct CudaBackend {
    device: Arc<CudaDevice>,
    encode_kernel: CudaFunction,
    decode_kernel: CudaFunction,
}

impl CudaBackend {
    /// Create a backend on the given device ordinal, compiling and loading
    /// the codec kernels.
    pub fn new(device_id: usize) -> Result<Self> {
        let device = CudaDevice::new(device_id)?;
        let ptx = compile_ptx(KERNEL_SRC)
            .map_err(|e| Error::device(format!("kernel compilation failed: {e}")))?;
        device.load_ptx(ptx, MODULE, &["stolas_encode_block", "stolas_decode_block"])?;
        let encode_kernel = device
            .get_func(MODULE, "stolas_encode_block")
            .ok_or_else(|| Error::device("encode kernel missing after load"))?;
        let decode_kernel = device
            .get_func(MODULE, "stolas_decode_block")
            .ok_or_else(|| Error::device("decode kernel missing after load"))?;
        info!(device_id, "stolas CUDA kernels loaded");
        Ok(CudaBackend {
            device,
            encode_kernel,
            decode_kernel,
        })
    }

    /// Check whether any CUDA device can be initialized.
    pub fn is_available() -> bool {
        CudaDevice::new(0).is_ok()
    }

    fn launch_config(blocks: usize) -> LaunchConfig {
        LaunchConfig {
            grid_dim: (blocks as u32, 1, 1),
            block_dim: (WORKERS_PER_BLOCK as u32, 1, 1),
            shared_mem_bytes: 0,
        }
    }
}

impl Backend for CudaBackend {
    fn encode_blocks(&self, floats: &[f32], inv_epsilon: f32) -> Result<Vec<BlockEncoding>> {
        debug_assert_eq!(floats.len() % FLOATS_PER_BLOCK, 0);
        let blocks = floats.len() / FLOATS_PER_BLOCK;

        let d_floats = self.device.htod_sync_copy(floats)?;
        let d_index = self.device.alloc_zeros::<u8>(blocks * PARAMS_PER_BLOCK)?;
        let d_bits = self.device.alloc_zeros::<u8>(blocks * PARAMS_PER_BLOCK)?;
        let d_high = self.device.alloc_zeros::<u32>(blocks * PARAMS_PER_BLOCK)?;
        let d_packed = self.device.alloc_zeros::<u32>(blocks * MAX_BLOCK_WORDS)?;
        let d_used = self.device.alloc_zeros::<u32>(blocks)?;

        unsafe {
            self.encode_kernel.clone().launch(
                Self::launch_config(blocks),
                (
                    &d_floats,
                    &d_index,
                    &d_bits,
                    &d_high,
                    &d_packed,
                    &d_used,
                    inv_epsilon,
                ),
            )?;
        }
        self.device.synchronize()?;

        let index = self.device.dtoh_sync_copy(&d_index)?;
        let bits = self.device.dtoh_sync_copy(&d_bits)?;
        let high = self.device.dtoh_sync_copy(&d_high)?;
        let packed = self.device.dtoh_sync_copy(&d_packed)?;
        let used = self.device.dtoh_sync_copy(&d_used)?;

        let mut encoded = Vec::with_capacity(blocks);
        for b in 0..blocks {
            let used_words = used[b];
            let mut payload = vec![0u8; PARAM_TABLE_BYTES + used_words as usize * 4];
            let pbase = b * PARAMS_PER_BLOCK;
            payload[..PARAMS_PER_BLOCK].copy_from_slice(&index[pbase..pbase + PARAMS_PER_BLOCK]);
            payload[BITS_TABLE_OFFSET..BITS_TABLE_OFFSET + PARAMS_PER_BLOCK]
                .copy_from_slice(&bits[pbase..pbase + PARAMS_PER_BLOCK]);
            for (i, &h) in high[pbase..pbase + PARAMS_PER_BLOCK].iter().enumerate() {
                payload[HIGH_TABLE_OFFSET + i * 4..HIGH_TABLE_OFFSET + i * 4 + 4]
                    .copy_from_slice(&h.to_le_bytes());
            }
            let wbase = b * MAX_BLOCK_WORDS;
            for (i, &word) in packed[wbase..wbase + used_words as usize].iter().enumerate() {
                payload[PACKED_OFFSET + i * 4..PACKED_OFFSET + i * 4 + 4]
                    .copy_from_slice(&word.to_le_bytes());
            }
            encoded.push(BlockEncoding {
                payload,
                used_words,
            });
        }
        Ok(encoded)
    }

    fn decode_blocks(
        &self,
        payloads: &[Vec<u8>],
        epsilon: f32,
        float_count: usize,
    ) -> Result<Vec<f32>> {
        let blocks = payloads.len();
        let mut index = vec![0u8; blocks * PARAMS_PER_BLOCK];
        let mut bits = vec![0u8; blocks * PARAMS_PER_BLOCK];
        let mut high = vec![0u32; blocks * PARAMS_PER_BLOCK];
        let mut packed = vec![0u32; blocks * MAX_BLOCK_WORDS];

        for (b, payload) in payloads.iter().enumerate() {
            if payload.len() < PARAM_TABLE_BYTES {
                return Err(FormatError::truncated(PARAM_TABLE_BYTES, payload.len()).into());
            }
            let pbase = b * PARAMS_PER_BLOCK;
            let mut total = 0usize;
            for i in 0..PARAMS_PER_BLOCK {
                let width = payload[BITS_TABLE_OFFSET + i];
                if width > 32 {
                    return Err(FormatError::corrupted(format!(
                        "group {i} bit width {width} exceeds 32"
                    ))
                    .into());
                }
                if payload[i] as usize >= QUANT_GROUP {
                    return Err(FormatError::corrupted(format!(
                        "group {i} exception index {} out of range",
                        payload[i]
                    ))
                    .into());
                }
                index[pbase + i] = payload[i];
                bits[pbase + i] = width;
                high[pbase + i] = u32::from_le_bytes(
                    payload[HIGH_TABLE_OFFSET + i * 4..HIGH_TABLE_OFFSET + i * 4 + 4]
                        .try_into()
                        .unwrap(),
                );
                total += width as usize;
            }
            if payload.len() != PARAM_TABLE_BYTES + total * 4 {
                return Err(FormatError::corrupted(format!(
                    "packed region holds {} bytes, bits tables demand {}",
                    payload.len() - PARAM_TABLE_BYTES,
                    total * 4
                ))
                .into());
            }
            let wbase = b * MAX_BLOCK_WORDS;
            for (slot, chunk) in packed[wbase..wbase + total]
                .iter_mut()
                .zip(payload[PACKED_OFFSET..].chunks_exact(4))
            {
                *slot = u32::from_le_bytes(chunk.try_into().unwrap());
            }
        }

        let d_index = self.device.htod_sync_copy(&index)?;
        let d_bits = self.device.htod_sync_copy(&bits)?;
        let d_high = self.device.htod_sync_copy(&high)?;
        let d_packed = self.device.htod_sync_copy(&packed)?;
        let d_floats = self.device.alloc_zeros::<f32>(blocks * FLOATS_PER_BLOCK)?;

        unsafe {
            self.decode_kernel.clone().launch(
                Self::launch_config(blocks),
                (&d_index, &d_bits, &d_high, &d_packed, &d_floats, epsilon),
            )?;
        }
        self.device.synchronize()?;

        let mut floats = self.device.dtoh_sync_copy(&d_floats)?;
        floats.truncate(float_count);
        Ok(floats)
    }
}
