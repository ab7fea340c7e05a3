use floatz::config::{Config, Dims, ErrorBoundMode, PredictorFlags};
use floatz::frontend::{exaalt, time_based};
use floatz::selector;
use floatz::{compress, decompress, Array};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn base_config(dims: Dims, eps: f32, predictors: PredictorFlags) -> Config {
    Config {
        dims,
        error_bound_mode: ErrorBoundMode::Abs,
        abs_error_bound: eps,
        rel_error_bound: 0.0,
        block_size: 6,
        stride: 6,
        quantbin_cnt: 65536,
        predictors,
        method_batch: 0,
    }
}

fn assert_within_bound(original: &[f32], restored: &[f32], eps: f32) {
    assert_eq!(original.len(), restored.len());
    for (a, b) in original.iter().zip(restored.iter()) {
        assert!(
            (a - b).abs() <= eps + 1e-5,
            "expected {} within {} of {}",
            b,
            eps,
            a
        );
    }
}

#[test]
fn ramp_compresses_well_with_lorenzo() {
    let dims = Dims::new(vec![64]).unwrap();
    let config = base_config(dims.clone(), 0.01, PredictorFlags::LORENZO);
    let data: Vec<f32> = (0..64).map(|x| x as f32).collect();
    let array = Array::new(dims, data.clone()).unwrap();

    let bytes = compress(&config, &array).unwrap();
    let restored = decompress(&bytes).unwrap();

    assert_within_bound(&data, restored.as_slice(), config.abs_error_bound);
    // A perfect ramp is exactly representable; the compressed stream should
    // be much smaller than the raw 4 bytes/element.
    assert!(bytes.len() < data.len() * 4);
}

#[test]
fn constant_array_compresses_to_almost_nothing() {
    // spec.md §8 scenario 2: constant 7.5 array of length 1000, eps=1e-3,
    // all bins the zero bin, unpredictable stream empty, size <= 64 bytes
    // after Huffman + lossless.
    let dims = Dims::new(vec![1000]).unwrap();
    let config = base_config(dims.clone(), 0.001, PredictorFlags::LORENZO);
    let data = vec![7.5f32; 1000];
    let array = Array::new(dims, data.clone()).unwrap();

    let bytes = compress(&config, &array).unwrap();
    let restored = decompress(&bytes).unwrap();

    assert_eq!(restored.as_slice(), data.as_slice());
    assert!(
        bytes.len() <= 64,
        "expected <= 64 bytes for a constant array, got {}",
        bytes.len()
    );
}

#[test]
fn linear_ramp_prefers_regression_and_round_trips() {
    let dims = Dims::new(vec![100]).unwrap();
    let config = base_config(dims.clone(), 0.02, PredictorFlags::REGRESSION);
    let data: Vec<f32> = (0..100).map(|x| 3.0 + 0.5 * x as f32).collect();
    let array = Array::new(dims, data.clone()).unwrap();

    let bytes = compress(&config, &array).unwrap();
    let restored = decompress(&bytes).unwrap();

    assert_within_bound(&data, restored.as_slice(), config.abs_error_bound);
}

#[test]
fn gaussian_noise_round_trips_within_bound() {
    let dims = Dims::new(vec![32, 32]).unwrap();
    let config = base_config(
        dims.clone(),
        0.05,
        PredictorFlags::LORENZO | PredictorFlags::LORENZO2 | PredictorFlags::REGRESSION,
    );
    let mut rng = StdRng::seed_from_u64(7);
    let n = dims.num_elements() as usize;
    let data: Vec<f32> = (0..n).map(|_| rng.gen_range(-10.0..10.0)).collect();
    let array = Array::new(dims, data.clone()).unwrap();

    let bytes = compress(&config, &array).unwrap();
    let restored = decompress(&bytes).unwrap();

    assert_within_bound(&data, restored.as_slice(), config.abs_error_bound);
}

#[test]
fn time_series_frontend_beats_independent_compression() {
    let dims = Dims::new(vec![64]).unwrap();
    let config = base_config(dims.clone(), 0.02, PredictorFlags::LORENZO);

    let steps: Vec<Array> = (0..6)
        .map(|t| {
            let data: Vec<f32> = (0..64)
                .map(|i| (i as f32 / 8.0).sin() * 5.0 + (t as f32) * 0.01)
                .collect();
            Array::new(dims.clone(), data).unwrap()
        })
        .collect();

    let series_bytes = time_based::compress(&config, &steps).unwrap();
    let restored = time_based::decompress(&series_bytes).unwrap();

    for (original, got) in steps.iter().zip(restored.iter()) {
        assert_within_bound(original.as_slice(), got.as_slice(), config.abs_error_bound * 2.0);
    }

    let independent_total: usize = steps
        .iter()
        .map(|step| compress(&config, step).unwrap().len())
        .sum();
    assert!(
        series_bytes.len() <= independent_total + steps.len() * 64,
        "time-series frontend ({} bytes) should not be drastically worse than independent per-step compression ({} bytes)",
        series_bytes.len(),
        independent_total
    );
}

#[test]
fn adaptive_selector_chooses_a_valid_method_across_a_mixed_run() {
    let dims = Dims::new(vec![40]).unwrap();
    let config = base_config(dims.clone(), 0.02, PredictorFlags::LORENZO);
    let mut selector_state = selector::AdaptiveSelector::new(2);

    let ramp: Vec<f32> = (0..40).map(|x| x as f32).collect();
    let mut rng = StdRng::seed_from_u64(3);
    let noisy: Vec<f32> = (0..40).map(|_| rng.gen_range(-5.0..5.0)).collect();

    for data in [ramp, noisy].iter() {
        let array = Array::new(dims.clone(), data.clone()).unwrap();
        let chosen = selector_state
            .method_for_next_batch(&config, &array, None)
            .unwrap();
        assert!(chosen < 5);
    }
}

#[test]
fn exaalt_vq_round_trips_within_bound() {
    let dims = Dims::new(vec![16]).unwrap();
    let config = base_config(dims.clone(), 0.02, PredictorFlags::LORENZO);
    let params = exaalt::LevelParams {
        level_start: -5.0,
        level_offset: 10.0,
        level_count: 2,
    };
    let data: Vec<f32> = (0..16)
        .map(|i| if i < 8 { -5.0 + (i as f32) * 0.1 } else { 5.0 - (i as f32) * 0.1 })
        .collect();
    let array = Array::new(dims, data.clone()).unwrap();

    let bytes = exaalt::compress_vq(&config, &params, &array).unwrap();
    let restored = exaalt::decompress_vq(&bytes, &params).unwrap();

    assert_within_bound(&data, restored.as_slice(), config.abs_error_bound);
}

#[test]
fn single_element_array_round_trips() {
    let dims = Dims::new(vec![1]).unwrap();
    let config = base_config(dims.clone(), 0.01, PredictorFlags::LORENZO);
    let array = Array::new(dims, vec![123.456]).unwrap();

    let bytes = compress(&config, &array).unwrap();
    let restored = decompress(&bytes).unwrap();
    assert_within_bound(&[123.456], restored.as_slice(), config.abs_error_bound);
}

#[test]
fn all_unpredictable_stream_round_trips_exactly() {
    // A tiny radius forces every residual to escape the quantizer's range.
    let dims = Dims::new(vec![8]).unwrap();
    let mut config = base_config(dims.clone(), 0.001, PredictorFlags::LORENZO);
    config.quantbin_cnt = 2;
    let mut rng = StdRng::seed_from_u64(11);
    let data: Vec<f32> = (0..8).map(|_| rng.gen_range(-1000.0..1000.0)).collect();
    let array = Array::new(dims, data.clone()).unwrap();

    let bytes = compress(&config, &array).unwrap();
    let restored = decompress(&bytes).unwrap();
    assert_eq!(restored.as_slice(), data.as_slice());
}
