//! Compress a synthetic weight tensor and report the ratio.
//!
//! Run with: cargo run --release --example roundtrip

use stolas::stolas_core::CompressionRatio;
use stolas::{compress, decompress, Result};

fn main() -> Result<()> {
    let epsilon = 1e-4f32;
    let weights: Vec<f32> = (0..1_000_000)
        .map(|i| ((i as f32 * 0.001).sin() * 0.1) + ((i % 64) as f32 * 1e-3))
        .collect();

    let compressed = compress(&weights, epsilon)?;
    let restored = decompress(&compressed)?;

    let worst = weights
        .iter()
        .zip(&restored)
        .map(|(a, b)| (a - b).abs())
        .fold(0f32, f32::max);

    let ratio = CompressionRatio::new(weights.len() * 4, compressed.len());
    println!("{ratio}");
    println!("max reconstruction error: {worst:e} (bound {epsilon:e})");
    assert!(worst <= epsilon);
    Ok(())
}
