//! Time-based frontend (component G, spec.md §4.G): a series of equally
//! shaped spatial arrays, one per time step. The first step is compressed
//! verbatim; every later step is compressed as its residual against the
//! *decoded* previous step, so temporal drift never accumulates past the
//! per-step error bound.

use crate::array::Array;
use crate::compressor;
use crate::config::Config;
use crate::error::{self, DecodingError};
use crate::format;
use crate::Result;

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    if offset + 4 > data.len() {
        return error::decoding_error(DecodingError::Truncated);
    }
    Ok(u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]))
}

/// Compresses `steps`, a sequence of arrays sharing one spatial shape, one
/// time step per entry (spec.md §4.G "baseline row verbatim, subsequent
/// rows predicted from `(t,i) - (t-1,i)`").
pub fn compress(config: &Config, steps: &[Array]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    push_u32(&mut out, steps.len() as u32);

    let mut previous: Option<Vec<f32>> = None;
    for step in steps {
        let to_compress = match &previous {
            None => step.clone(),
            Some(prev) => {
                let diff: Vec<f32> = step
                    .as_slice()
                    .iter()
                    .zip(prev.iter())
                    .map(|(&cur, &p)| cur - p)
                    .collect();
                Array::new(step.dims().clone(), diff)
                    .expect("diff array has the same length as the source step")
            }
        };

        let blob = compressor::compress(config, &to_compress)?;
        format::append_body(&mut out, &blob);

        // Replay the decoder's reconstruction so the next step's residual is
        // taken against what the decoder will actually see, not the exact
        // input -- matches spec.md §3's single source of truth for
        // "already decoded" state.
        let reconstructed_step = compressor::decompress(&blob)?;
        let next_previous = match &previous {
            None => reconstructed_step.into_vec(),
            Some(prev) => prev
                .iter()
                .zip(reconstructed_step.as_slice().iter())
                .map(|(&p, &d)| p + d)
                .collect(),
        };
        previous = Some(next_previous);
    }

    Ok(out)
}

/// Decompresses a stream produced by `compress`, returning one array per
/// time step in order.
pub fn decompress(data: &[u8]) -> Result<Vec<Array>> {
    let count = read_u32(data, 0)? as usize;
    let mut offset = 4;
    let mut steps = Vec::with_capacity(count);
    let mut previous: Option<Array> = None;

    for _ in 0..count {
        let blob = format::read_body(data, offset)?;
        offset += 8 + blob.len();

        let decoded_diff_or_base = compressor::decompress(blob)?;
        let step = match &previous {
            None => decoded_diff_or_base,
            Some(prev) => {
                let values: Vec<f32> = prev
                    .as_slice()
                    .iter()
                    .zip(decoded_diff_or_base.as_slice().iter())
                    .map(|(&p, &d)| p + d)
                    .collect();
                Array::new(prev.dims().clone(), values)
                    .expect("reconstructed step has the same length as the previous step")
            }
        };
        previous = Some(step.clone());
        steps.push(step);
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Dims, ErrorBoundMode, PredictorFlags};

    fn config(dims: Dims) -> Config {
        Config {
            dims,
            error_bound_mode: ErrorBoundMode::Abs,
            abs_error_bound: 0.05,
            rel_error_bound: 0.0,
            block_size: 4,
            stride: 4,
            quantbin_cnt: 65536,
            predictors: PredictorFlags::LORENZO,
            method_batch: 0,
        }
    }

    #[test]
    fn test_time_series_round_trip_within_error_bound() {
        let dims = Dims::new(vec![8]).unwrap();
        let cfg = config(dims.clone());
        let steps: Vec<Array> = (0..4)
            .map(|t| {
                let data: Vec<f32> = (0..8).map(|i| (i as f32) + (t as f32) * 0.1).collect();
                Array::new(dims.clone(), data).unwrap()
            })
            .collect();

        let bytes = compress(&cfg, &steps).unwrap();
        let restored = decompress(&bytes).unwrap();

        assert_eq!(restored.len(), steps.len());
        for (original, got) in steps.iter().zip(restored.iter()) {
            for (a, b) in original.as_slice().iter().zip(got.as_slice().iter()) {
                assert!((a - b).abs() <= cfg.abs_error_bound * 2.0 + 1e-5);
            }
        }
    }

    #[test]
    fn test_empty_series_round_trips_to_empty() {
        let cfg = config(Dims::new(vec![4]).unwrap());
        let bytes = compress(&cfg, &[]).unwrap();
        let restored = decompress(&bytes).unwrap();
        assert!(restored.is_empty());
    }
}
