//! Throughput benchmarks for the float stream codec.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use stolas::stolas_core::FLOATS_PER_BLOCK;
use stolas::{compress, decompress};

fn weight_like(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| ((i as f32 * 0.0013).sin() + (i as f32 * 0.00007).cos()) * 0.05)
        .collect()
}

fn bench_codec(c: &mut Criterion) {
    let floats = weight_like(4 * FLOATS_PER_BLOCK);
    let epsilon = 1e-4f32;
    let compressed = compress(&floats, epsilon).unwrap();

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes((floats.len() * 4) as u64));

    group.bench_function("compress_4_blocks", |b| {
        b.iter(|| compress(black_box(&floats), epsilon).unwrap())
    });
    group.bench_function("decompress_4_blocks", |b| {
        b.iter(|| decompress(black_box(&compressed)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
