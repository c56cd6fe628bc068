use rand::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn criterion_benchmark(c: &mut Criterion) {
    let mut data = vec![0u8; 1_000_000];
    for (i, b) in data.iter_mut().enumerate() {
        *b = (i % 251) as u8 ^ (i / 4096) as u8;
    }
    thread_rng().fill(&mut data[200_000..600_000]); // mixed

    let uncompressed_data: &[u8] = data.as_slice();
    let compressed_data = syaz0::compress(uncompressed_data);

    let mut group = c.benchmark_group("compress");
    group.sample_size(10);
    for &level in &[1, 4, 7] {
        group.bench_with_input(format!("level {}", level), &uncompressed_data, |b, d| {
            b.iter(|| syaz0::CompressionSettings::default().level(level).compress(black_box(d)))
        });
    }
    group.finish();

    let mut group = c.benchmark_group("decompress");
    group.bench_with_input("checked", &compressed_data.as_slice(), |b, c| b.iter(|| syaz0::decompress(black_box(c))));
    group.bench_with_input("unchecked", &compressed_data.as_slice(), |b, c| b.iter(|| syaz0::decompress_unsafe(black_box(c))));
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
