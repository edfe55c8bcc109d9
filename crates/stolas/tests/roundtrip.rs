//! End-to-end scenarios over the public compress / decompress surface.

use stolas::stolas_core::{
    block_payload_bytes, EntropyDecoder, StreamHeader, BITS_TABLE_OFFSET, FLOATS_PER_BLOCK,
    HEADER_PREFIX_BYTES, PARAMS_PER_BLOCK, PARAM_TABLE_BYTES,
};
use stolas::{compress, decompress, ZstdEntropyDecoder};

/// Pull the logical stream back out of the entropy frame:
/// `(epsilon, float_count, block_used_words, block_payloads)`.
fn logical_stream(compressed: &[u8]) -> (f32, u32, Vec<u32>, Vec<Vec<u8>>) {
    let mut entropy = ZstdEntropyDecoder::new(compressed).unwrap();
    let mut prefix = [0u8; HEADER_PREFIX_BYTES];
    entropy.read_exact(&mut prefix).unwrap();
    let (epsilon, float_count) = StreamHeader::parse_prefix(&prefix).unwrap();

    let blocks = (float_count as usize).div_ceil(FLOATS_PER_BLOCK);
    let mut used_words = Vec::with_capacity(blocks);
    for _ in 0..blocks {
        let mut word = [0u8; 4];
        entropy.read_exact(&mut word).unwrap();
        used_words.push(u32::from_le_bytes(word));
    }

    let mut payloads = Vec::with_capacity(blocks);
    for &used in &used_words {
        let mut payload = vec![0u8; block_payload_bytes(used)];
        entropy.read_exact(&mut payload).unwrap();
        payloads.push(payload);
    }

    // The logical stream ends exactly here.
    assert!(entropy.read_exact(&mut [0u8; 1]).is_err());

    (epsilon, float_count, used_words, payloads)
}

fn bits_table(payload: &[u8]) -> &[u8] {
    &payload[BITS_TABLE_OFFSET..BITS_TABLE_OFFSET + PARAMS_PER_BLOCK]
}

#[test]
fn identity_on_zeros() {
    let floats = vec![0f32; FLOATS_PER_BLOCK];
    let compressed = compress(&floats, 0.01).unwrap();

    let (epsilon, float_count, used_words, payloads) = logical_stream(&compressed);
    assert_eq!(epsilon, 0.01);
    assert_eq!(float_count, FLOATS_PER_BLOCK as u32);
    assert_eq!(used_words, vec![0]);
    assert_eq!(payloads[0].len(), PARAM_TABLE_BYTES);
    assert!(bits_table(&payloads[0]).iter().all(|&b| b == 0));

    assert_eq!(decompress(&compressed).unwrap(), floats);
}

#[test]
fn header_integrity() {
    let floats = vec![0.5f32; 100];
    let compressed = compress(&floats, 0.25).unwrap();

    let mut entropy = ZstdEntropyDecoder::new(&compressed).unwrap();
    let mut prefix = [0u8; HEADER_PREFIX_BYTES];
    entropy.read_exact(&mut prefix).unwrap();
    assert_eq!(&prefix[0..4], &0xCA7D_D007u32.to_le_bytes());
    assert_eq!(&prefix[4..8], &0.25f32.to_le_bytes());
    assert_eq!(&prefix[8..12], &100u32.to_le_bytes());
}

#[test]
fn constant_nonzero_run() {
    let floats = vec![1.0f32; 128];
    let compressed = compress(&floats, 1.0).unwrap();

    // Every delta after the first is zero, so no group packs any words.
    let (_, _, used_words, _) = logical_stream(&compressed);
    assert_eq!(used_words, vec![0]);

    assert_eq!(decompress(&compressed).unwrap(), floats);
}

#[test]
fn linear_ramp() {
    let floats: Vec<f32> = (0..128).map(|i| i as f32).collect();
    let compressed = compress(&floats, 1.0).unwrap();

    // One worker, four groups, all-ones deltas: two bits per group.
    let (_, _, used_words, payloads) = logical_stream(&compressed);
    assert_eq!(used_words, vec![8]);
    assert_eq!(&bits_table(&payloads[0])[..4], &[2, 2, 2, 2]);

    assert_eq!(decompress(&compressed).unwrap(), floats);
}

#[test]
fn single_spike() {
    let mut floats = vec![0f32; 32];
    floats[31] = 1000.0;
    let compressed = compress(&floats, 1.0).unwrap();

    let (_, _, used_words, _) = logical_stream(&compressed);
    assert_eq!(used_words, vec![0]);

    let restored = decompress(&compressed).unwrap();
    assert_eq!(restored[31], 1000.0);
    assert_eq!(&restored[..31], &[0.0; 31]);
}

#[test]
fn cross_block_boundary() {
    let epsilon = 0.5f32;
    let floats: Vec<f32> = (0..FLOATS_PER_BLOCK + 1)
        .map(|i| ((i as f32) * 0.017).sin() * 300.0)
        .collect();
    let compressed = compress(&floats, epsilon).unwrap();

    let (_, float_count, used_words, _) = logical_stream(&compressed);
    assert_eq!(float_count as usize, FLOATS_PER_BLOCK + 1);
    assert_eq!(used_words.len(), 2);

    let restored = decompress(&compressed).unwrap();
    assert_eq!(restored.len(), floats.len());
    for (orig, dec) in floats.iter().zip(restored.iter()) {
        assert!((orig - dec).abs() <= epsilon);
    }
}

#[test]
fn prefix_sum_consistency() {
    let floats: Vec<f32> = (0..2 * FLOATS_PER_BLOCK)
        .map(|i| ((i * i) % 997) as f32 * 0.3)
        .collect();
    let compressed = compress(&floats, 0.1).unwrap();

    let (_, _, used_words, payloads) = logical_stream(&compressed);
    for (used, payload) in used_words.iter().zip(payloads.iter()) {
        let total: u32 = bits_table(payload).iter().map(|&b| b as u32).sum();
        assert_eq!(*used, total);
    }
}

#[test]
fn epsilon_is_idempotent() {
    let epsilon = 0.2f32;
    let floats: Vec<f32> = (0..5000).map(|i| ((i as f32) * 0.03).cos() * 17.0).collect();

    let once = decompress(&compress(&floats, epsilon).unwrap()).unwrap();
    let twice = decompress(&compress(&once, epsilon).unwrap()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn truncated_stream_fails() {
    let floats: Vec<f32> = (0..1000).map(|i| i as f32 * 0.7).collect();
    let compressed = compress(&floats, 0.5).unwrap();

    assert!(decompress(&compressed[..compressed.len() - 1]).is_err());
    assert!(decompress(&compressed[..4]).is_err());
    assert!(decompress(&[]).is_err());
}

#[test]
fn negative_and_fractional_values() {
    let epsilon = 0.001f32;
    let floats: Vec<f32> = (0..300)
        .map(|i| (i as f32 - 150.0) * 0.0317)
        .collect();
    let restored = decompress(&compress(&floats, epsilon).unwrap()).unwrap();
    for (orig, dec) in floats.iter().zip(restored.iter()) {
        assert!((orig - dec).abs() <= epsilon, "{orig} vs {dec}");
    }
}
