use criterion::{criterion_group, criterion_main, Criterion};
use seiscube::GeometryModel;
use std::hint::black_box;

fn survey_geometry() -> GeometryModel {
    let inlines: Vec<i32> = (0..400).map(|i| 1000 + i * 2).collect();
    let crosslines: Vec<i32> = (0..600).map(|i| 2000 + i).collect();
    let samples: Vec<f64> = (0..1500).map(|i| f64::from(i) * 2.0).collect();
    GeometryModel::derive(&inlines, &crosslines, &samples).unwrap()
}

fn bench_geometry(c: &mut Criterion) {
    let geometry = survey_geometry();

    c.bench_function("snap_to_nearest_node", |b| {
        b.iter(|| geometry.snap_to_nearest_node(black_box(1503), black_box(2351)))
    });

    c.bench_function("inline_crossline_pairs", |b| {
        b.iter(|| geometry.inline_crossline_pairs().count())
    });

    c.bench_function("derive_geometry", |b| {
        let inlines: Vec<i32> = (0..400).map(|i| 1000 + i * 2).collect();
        let crosslines: Vec<i32> = (0..600).map(|i| 2000 + i).collect();
        let samples: Vec<f64> = (0..1500).map(|i| f64::from(i) * 2.0).collect();
        b.iter(|| GeometryModel::derive(black_box(&inlines), &crosslines, &samples).unwrap())
    });
}

criterion_group!(benches, bench_geometry);
criterion_main!(benches);
