use criterion::{Criterion, black_box, criterion_group, criterion_main};
use qr_art::{PipelineConfig, extract_batch, extract_matrix};

mod common;

fn bench_extract_small(c: &mut Criterion) {
    let image = common::synthetic_image(25, 8);
    let config = PipelineConfig::default();
    c.bench_function("extract_v2_200px", |b| {
        b.iter(|| extract_matrix(black_box(&image), &config))
    });
}

fn bench_extract_large(c: &mut Criterion) {
    let image = common::synthetic_image(57, 16);
    let config = PipelineConfig::default();
    c.bench_function("extract_v10_912px", |b| {
        b.iter(|| extract_matrix(black_box(&image), &config))
    });
}

fn bench_extract_photo_preset(c: &mut Criterion) {
    let image = common::synthetic_image(33, 12);
    let config = PipelineConfig::photo();
    c.bench_function("extract_photo_v4_396px", |b| {
        b.iter(|| extract_matrix(black_box(&image), &config))
    });
}

fn bench_extract_batch(c: &mut Criterion) {
    let images: Vec<_> = (0..8).map(|_| common::synthetic_image(29, 10)).collect();
    let config = PipelineConfig::default();
    c.bench_function("extract_batch_8x290px", |b| {
        b.iter(|| extract_batch(black_box(&images), &config))
    });
}

criterion_group!(
    benches,
    bench_extract_small,
    bench_extract_large,
    bench_extract_photo_preset,
    bench_extract_batch
);
criterion_main!(benches);
