//! Benchmarking SP3 clock parsing & processing,
//! on tiny file and synthetic day long series
extern crate criterion;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

use sp3_clock::prelude::*;

fn white_phase_noise(size: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(0);
    let normal = Normal::new(0.0, 10.0E-12).unwrap();
    (0..size).map(|_| normal.sample(&mut rng)).collect()
}

fn benchmark(c: &mut Criterion) {
    let mut parsing_grp = c.benchmark_group("parsing");
    parsing_grp.bench_function("SP3/Ref23450", |b| {
        b.iter(|| {
            let _ = parse_file("test_resources/SP3/Ref23450.sp3", gpst_origin()).unwrap();
        })
    });
    parsing_grp.finish();

    // one day at 30s
    let x = white_phase_noise(2880);

    let mut processing_grp = c.benchmark_group("processing");
    processing_grp.bench_function("outlier_filter", |b| {
        b.iter(|| outlier_filter(black_box(&x), 7, 5.0).unwrap())
    });
    processing_grp.bench_function("detrend/seconds", |b| {
        let t = (0..x.len()).map(|i| i as f64 * 30.0).collect::<Vec<_>>();
        b.iter(|| detrend_seconds(black_box(&t), black_box(&x), 2).unwrap())
    });
    processing_grp.bench_function("oadev/decade", |b| {
        b.iter(|| allan(black_box(&x), 30.0, &TauGrid::Decade, true).unwrap())
    });
    processing_grp.bench_function("oadev/dense", |b| {
        b.iter(|| allan(black_box(&x), 30.0, &TauGrid::default(), true).unwrap())
    });
    processing_grp.bench_function("psd", |b| {
        b.iter(|| psd(black_box(&x), 30.0, 512, 5.0E6).unwrap())
    });
    processing_grp.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
