extern crate floatz;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use floatz::config::{Config, Dims, ErrorBoundMode, PredictorFlags};
use floatz::{compress, Array};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn gaussian_array(dims: Dims, seed: u64) -> Array {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = dims.num_elements() as usize;
    let data: Vec<f32> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    Array::new(dims, data).unwrap()
}

fn bench_config(dims: Dims) -> Config {
    Config {
        dims,
        error_bound_mode: ErrorBoundMode::Abs,
        abs_error_bound: 1e-3,
        rel_error_bound: 0.0,
        block_size: 6,
        stride: 6,
        quantbin_cnt: 65536,
        predictors: PredictorFlags::LORENZO | PredictorFlags::LORENZO2 | PredictorFlags::REGRESSION,
        method_batch: 0,
    }
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    group.sample_size(20).measurement_time(Duration::new(10, 0));

    let dims_1d = Dims::new(vec![1 << 16]).unwrap();
    let array_1d = gaussian_array(dims_1d.clone(), 1);
    let config_1d = bench_config(dims_1d);
    group.bench_function("compress_1d_gaussian", |b| {
        b.iter(|| compress(black_box(&config_1d), black_box(&array_1d)))
    });

    let dims_2d = Dims::new(vec![256, 256]).unwrap();
    let array_2d = gaussian_array(dims_2d.clone(), 2);
    let config_2d = bench_config(dims_2d);
    group.bench_function("compress_2d_gaussian", |b| {
        b.iter(|| compress(black_box(&config_2d), black_box(&array_2d)))
    });

    group.finish();
}

criterion_group!(benches, bench_compress);
criterion_main!(benches);
