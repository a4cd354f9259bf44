use gridfit::lowlevel::{distance_transform, variance_field};
use gridfit::{detect_grid_points, fit_grid, BinaryMask, Point2D, ScalarField};
use criterion::{criterion_group, criterion_main, Criterion};
use std::f64::consts::FRAC_PI_2;
use std::hint::black_box;

fn make_micropattern(size: usize, pitch: usize, island: usize) -> ScalarField {
    ScalarField::from_fn(size, size, |x, y| {
        let inside = |v: usize| v >= pitch / 5 && (v - pitch / 5) % pitch < island;
        if inside(x) && inside(y) {
            (((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF) as f32
        } else {
            128.0
        }
    })
    .unwrap()
}

fn make_lattice(count: usize, spacing: f64, angle: f64) -> Vec<Point2D> {
    let (s, c) = angle.sin_cos();
    let mut points = Vec::with_capacity(count * count);
    for j in 0..count {
        for i in 0..count {
            let (fi, fj) = (i as f64, j as f64);
            let x = 40.0 + spacing * (fi * c - fj * s) + spacing * count as f64 * s;
            let y = 40.0 + spacing * (fi * s + fj * c);
            points.push(Point2D::new(x.round() as usize, y.round() as usize));
        }
    }
    points
}

fn bench_stages(c: &mut Criterion) {
    let image = make_micropattern(512, 50, 30);
    c.bench_function("variance_field_r5_512", |b| {
        b.iter(|| black_box(variance_field(black_box(&image), 5)))
    });

    let mask = BinaryMask::from_fn(512, 512, |x, y| (x / 25 + y / 25) % 2 == 0).unwrap();
    c.bench_function("distance_transform_512", |b| {
        b.iter(|| black_box(distance_transform(black_box(&mask))))
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let image = make_micropattern(512, 50, 30);
    c.bench_function("detect_grid_points_512", |b| {
        b.iter(|| black_box(detect_grid_points(black_box(&image), 5)))
    });

    let points = make_lattice(12, 40.0, 0.2);
    let canvas = 40 * 2 + 40 * 12 * 2;
    c.bench_function("fit_grid_144_points", |b| {
        b.iter(|| black_box(fit_grid(black_box(&points), canvas, canvas, FRAC_PI_2)))
    });
}

criterion_group!(benches, bench_stages, bench_pipeline);
criterion_main!(benches);
