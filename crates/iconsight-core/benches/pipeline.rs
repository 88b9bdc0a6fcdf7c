//! Benchmarks for the Iconsight labeling pipeline.
//!
//! Run with: cargo bench -p iconsight-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use iconsight_core::classifier::preprocess::{InputShape, TensorPreprocessor};
use iconsight_core::config::RasterConfig;
use iconsight_core::element::{IconElement, IconKind, VectorGraphicElement};
use iconsight_core::math::{rank_descending, softmax};
use iconsight_core::raster::{RasterOptions, Rasterizer};
use ndarray::Array3;

const GEAR_SVG: &str = r#"<svg width="24" height="24" class="icon" viewBox="0 0 24 24"><path d="M19.4 13a7.5 7.5 0 0 0 0-2l2.1-1.6-2-3.5-2.5 1a7.3 7.3 0 0 0-1.7-1L15 3h-4l-.4 2.7a7.3 7.3 0 0 0-1.7 1l-2.5-1-2 3.5L6.6 11a7.5 7.5 0 0 0 0 2l-2.1 1.6 2 3.5 2.5-1a7.3 7.3 0 0 0 1.7 1L11 21h4l.4-2.7a7.3 7.3 0 0 0 1.7-1l2.5 1 2-3.5zM13 15.5a3.5 3.5 0 1 1 0-7 3.5 3.5 0 0 1 0 7z" fill="currentColor"/></svg>"#;

fn benchmark_preprocess(c: &mut Criterion) {
    let image = Array3::from_elem((96, 96, 3), 128.0f32);
    let resized = Array3::from_elem((75, 60, 3), 128.0f32);
    let rgb = TensorPreprocessor::new(InputShape::new(96, 96, 3));
    let gray = TensorPreprocessor::new(InputShape::new(96, 96, 1));

    c.bench_function("preprocess_96_rgb", |b| {
        b.iter(|| rgb.prepare(black_box(&image), "bench", None))
    });
    c.bench_function("preprocess_resize_to_gray", |b| {
        b.iter(|| gray.prepare(black_box(&resized), "bench", None))
    });
}

fn benchmark_softmax(c: &mut Criterion) {
    let logits: Vec<f32> = (0..512).map(|i| ((i * 37) % 101) as f32 / 10.0).collect();

    c.bench_function("softmax_rank_512", |b| {
        b.iter(|| rank_descending(&softmax(black_box(&logits))))
    });
}

fn benchmark_rasterize(c: &mut Criterion) {
    let rasterizer = match Rasterizer::new(&RasterConfig::default()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Skipping rasterize benchmark: {e}");
            return;
        }
    };
    let icon = IconElement::new(
        "gear",
        24,
        24,
        IconKind::VectorGraphic(VectorGraphicElement {
            markup: GEAR_SVG.to_string(),
        }),
    );
    let options = RasterOptions::new(96);
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("rasterize_svg_96", |b| {
        b.iter(|| rt.block_on(rasterizer.rasterize(black_box(&icon), &options)))
    });
}

criterion_group!(
    benches,
    benchmark_preprocess,
    benchmark_softmax,
    benchmark_rasterize
);
criterion_main!(benches);
