//! Exaalt/VQ clustered-level frontend (component H, spec.md §4.H).
//!
//! The clustering collaborator (`get_cluster`) is out of scope (spec.md
//! §1) and is modeled exactly by its documented return value: `(level_start,
//! level_offset, level_count)` describing an evenly spaced level grid
//! `level_start + i * level_offset` for `i in 0..level_count` (grounded on
//! `original_source/tools/mdz/mdz/mdz.hpp`'s `get_cluster(..., level_start,
//! level_offset, level_num)` and `sz.set_level(level_start, level_offset,
//! level_num)`). This module derives the level table and each sample's
//! nearest-level assignment from that triple alone; it never accepts a
//! caller-supplied level or assignment table. Per spec.md §4.H, VQ emits
//! `(level_index, quantized_offset)` per element, so the assignment stream
//! is entropy-coded and carried alongside the residual stream rather than
//! recomputed on the decode side, where only the residual is available.

use crate::array::Array;
use crate::compressor;
use crate::config::Config;
use crate::error::{self, ConfigError, DecodingError};
use crate::format;
use crate::huffman::{CanonicalCode, Symbol};
use crate::Result;

/// `(level_start, level_offset, level_count)` as produced by the clustering
/// collaborator: the level table is the evenly spaced grid `level_start + i
/// * level_offset` for `i` in `0..level_count`.
#[derive(Clone, Copy, Debug)]
pub struct LevelParams {
    pub level_start: f32,
    pub level_offset: f32,
    pub level_count: u32,
}

impl LevelParams {
    /// Rejects a level table that is empty or implausibly large relative to
    /// the sample count it quantizes (spec.md §4.H: `level_count == 0` or
    /// `level_count > 0.25 * per_step_sample_count`).
    pub fn validate(&self, per_step_sample_count: usize) -> Result<()> {
        if self.level_count == 0 {
            return error::config_error(ConfigError::IncompatibleFrontend);
        }
        if self.level_count as f64 > 0.25 * per_step_sample_count as f64 {
            return error::config_error(ConfigError::IncompatibleFrontend);
        }
        Ok(())
    }

    /// Materializes the level table `level_start + i * level_offset`.
    fn levels(&self) -> Vec<f32> {
        (0..self.level_count)
            .map(|i| self.level_start + i as f32 * self.level_offset)
            .collect()
    }

    /// Nearest-level index for `sample`, clamped into `0..level_count`. A
    /// zero `level_offset` (a degenerate single-value grid) always assigns
    /// level 0.
    fn assign(&self, sample: f32) -> u32 {
        if self.level_offset == 0.0 || self.level_count == 1 {
            return 0;
        }
        let raw = ((sample - self.level_start) / self.level_offset).round();
        raw.max(0.0).min((self.level_count - 1) as f32) as u32
    }
}

/// Assigns each sample to its nearest level and returns the per-sample
/// residual against that level, along with the assignment that produced it.
fn residual_and_assignments(samples: &[f32], params: &LevelParams) -> (Vec<f32>, Vec<u32>) {
    let levels = params.levels();
    let mut residuals = Vec::with_capacity(samples.len());
    let mut assignments = Vec::with_capacity(samples.len());
    for &sample in samples {
        let assignment = params.assign(sample);
        residuals.push(sample - levels[assignment as usize]);
        assignments.push(assignment);
    }
    (residuals, assignments)
}

fn reconstruct(residuals: &[f32], assignments: &[u32], params: &LevelParams) -> Vec<f32> {
    let levels = params.levels();
    residuals
        .iter()
        .zip(assignments.iter())
        .map(|(&res, &assignment)| res + levels[assignment as usize])
        .collect()
}

/// Entropy-codes the assignment stream, self-describing (length table plus
/// payload length) since the decoder must rebuild the same `CanonicalCode`
/// before it can read a single symbol. Grounded on the same length-table
/// scheme `format.rs` uses for its own streams.
fn encode_assignments(assignments: &[u32], level_count: u32) -> Result<Vec<u8>> {
    let mut frequencies = vec![0u64; level_count as usize];
    for &a in assignments {
        frequencies[a as usize] += 1;
    }
    let freq_table: Vec<(Symbol, u64)> = frequencies
        .into_iter()
        .enumerate()
        .map(|(i, f)| (i as u32, f))
        .collect();
    let code = CanonicalCode::from_frequencies(&freq_table)?;
    let table = code.length_table();
    let payload = code.encode(assignments)?;

    let mut out = Vec::with_capacity(4 + table.len() * 8 + 4 + payload.len());
    out.extend_from_slice(&(table.len() as u32).to_le_bytes());
    for (sym, len) in table {
        out.extend_from_slice(&sym.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
    }
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

fn read_u32(data: &[u8], pos: &mut usize) -> Result<u32> {
    if *pos + 4 > data.len() {
        return error::decoding_error(DecodingError::Truncated);
    }
    let bytes = [data[*pos], data[*pos + 1], data[*pos + 2], data[*pos + 3]];
    *pos += 4;
    Ok(u32::from_le_bytes(bytes))
}

fn decode_assignments(data: &[u8], count: usize) -> Result<Vec<u32>> {
    let mut pos = 0;
    let table_len = read_u32(data, &mut pos)? as usize;
    let mut table = Vec::with_capacity(table_len);
    for _ in 0..table_len {
        let symbol = read_u32(data, &mut pos)?;
        let length = read_u32(data, &mut pos)?;
        table.push((symbol, length));
    }
    let payload_len = read_u32(data, &mut pos)? as usize;
    let payload = match data.get(pos..pos + payload_len) {
        Some(slice) => slice,
        None => return error::decoding_error(DecodingError::Truncated),
    };
    let code = CanonicalCode::from_length_table(table);
    code.decode(payload, count)
}

/// VQ: compresses one step's samples as residuals against their assigned
/// level, with no temporal reuse. The assignment stream and the residual
/// stream are bundled together as two `format::append_body` entries.
pub fn compress_vq(config: &Config, params: &LevelParams, samples: &Array) -> Result<Vec<u8>> {
    params.validate(samples.len())?;
    let (residuals, assignments) = residual_and_assignments(samples.as_slice(), params);
    let array = Array::new(samples.dims().clone(), residuals)
        .expect("residual array has the same length as samples");
    let compressed = compressor::compress(config, &array)?;
    let assignment_bytes = encode_assignments(&assignments, params.level_count)?;

    let mut out = Vec::new();
    format::append_body(&mut out, &assignment_bytes);
    format::append_body(&mut out, &compressed);
    Ok(out)
}

/// Decoder counterpart of `compress_vq`; `params` must be the same
/// collaborator output used at encode time.
pub fn decompress_vq(data: &[u8], params: &LevelParams) -> Result<Array> {
    let assignment_bytes = format::read_body(data, 0)?;
    let compressed = format::read_body(data, 8 + assignment_bytes.len())?;
    let residual_array = compressor::decompress(compressed)?;
    let assignments = decode_assignments(assignment_bytes, residual_array.len())?;
    let values = reconstruct(residual_array.as_slice(), &assignments, params);
    Ok(Array::new(residual_array.dims().clone(), values)
        .expect("reconstructed array has the same length as its residual"))
}

/// VQT: as `compress_vq`, but the per-sample residual against the level
/// table is additionally diffed against the previous step's residual
/// before compression, so a slowly drifting cluster assignment costs near
/// nothing per step (spec.md §4.H "VQT ... temporal variant"). Returns the
/// compressed bytes plus this step's (pre-temporal-diff) residual, which
/// the caller threads into the next call as `previous_residual`.
pub fn compress_vqt(
    config: &Config,
    params: &LevelParams,
    samples: &Array,
    previous_residual: Option<&[f32]>,
) -> Result<(Vec<u8>, Vec<f32>)> {
    params.validate(samples.len())?;
    let (residuals, assignments) = residual_and_assignments(samples.as_slice(), params);
    let to_compress = match previous_residual {
        None => residuals.clone(),
        Some(prev) => residuals.iter().zip(prev.iter()).map(|(&r, &p)| r - p).collect(),
    };
    let array = Array::new(samples.dims().clone(), to_compress)
        .expect("residual array has the same length as samples");
    let compressed = compressor::compress(config, &array)?;
    let assignment_bytes = encode_assignments(&assignments, params.level_count)?;

    let mut out = Vec::new();
    format::append_body(&mut out, &assignment_bytes);
    format::append_body(&mut out, &compressed);
    Ok((out, residuals))
}

/// Decoder counterpart of `compress_vqt`. Returns the reconstructed samples
/// plus this step's residual, to be threaded into the next call.
pub fn decompress_vqt(
    data: &[u8],
    params: &LevelParams,
    previous_residual: Option<&[f32]>,
) -> Result<(Array, Vec<f32>)> {
    let assignment_bytes = format::read_body(data, 0)?;
    let compressed = format::read_body(data, 8 + assignment_bytes.len())?;
    let decoded = compressor::decompress(compressed)?;
    let residuals: Vec<f32> = match previous_residual {
        None => decoded.as_slice().to_vec(),
        Some(prev) => decoded
            .as_slice()
            .iter()
            .zip(prev.iter())
            .map(|(&d, &p)| d + p)
            .collect(),
    };
    let assignments = decode_assignments(assignment_bytes, residuals.len())?;
    let values = reconstruct(&residuals, &assignments, params);
    let array = Array::new(decoded.dims().clone(), values)
        .expect("reconstructed array has the same length as its residual");
    Ok((array, residuals))
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
    fn test_level_params_rejects_zero_level_count() {
        let params = LevelParams {
            level_start: 0.0,
            level_offset: 0.0,
            level_count: 0,
        };
        assert!(params.validate(100).is_err());
    }

    #[test]
    fn test_level_params_rejects_oversized_level_count() {
        let params = LevelParams {
            level_start: 0.0,
            level_offset: 1.0,
            level_count: 30,
        };
        assert!(params.validate(100).is_err());
        assert!(params.validate(121).is_ok());
    }

    #[test]
    fn test_assign_picks_nearest_level_on_a_grid() {
        let params = LevelParams {
            level_start: 0.0,
            level_offset: 10.0,
            level_count: 2,
        };
        assert_eq!(params.assign(0.1), 0);
        assert_eq!(params.assign(9.9), 1);
        assert_eq!(params.assign(-5.0), 0);
        assert_eq!(params.assign(50.0), 1);
    }

    #[test]
    fn test_vq_round_trip_within_error_bound() {
        let dims = Dims::new(vec![8]).unwrap();
        let cfg = config(dims.clone());
        let params = LevelParams {
            level_start: 0.0,
            level_offset: 10.0,
            level_count: 2,
        };
        let samples: Vec<f32> = vec![0.1, 0.2, -0.1, 0.0, 10.1, 9.9, 10.0, 10.2];
        let array = Array::new(dims, samples.clone()).unwrap();

        let bytes = compress_vq(&cfg, &params, &array).unwrap();
        let restored = decompress_vq(&bytes, &params).unwrap();

        for (a, b) in samples.iter().zip(restored.as_slice().iter()) {
            assert!((a - b).abs() <= cfg.abs_error_bound + 1e-5);
        }
    }

    #[test]
    fn test_vqt_round_trip_across_two_steps() {
        let dims = Dims::new(vec![8]).unwrap();
        let cfg = config(dims.clone());
        let params = LevelParams {
            level_start: 0.0,
            level_offset: 10.0,
            level_count: 2,
        };
        let step_a: Vec<f32> = vec![0.1, 0.2, -0.1, 0.0, 10.1, 9.9, 10.0, 10.2];
        let step_b: Vec<f32> = vec![0.2, 0.3, 0.0, 0.1, 10.2, 10.0, 10.1, 10.3];
        let array_a = Array::new(dims.clone(), step_a.clone()).unwrap();
        let array_b = Array::new(dims, step_b.clone()).unwrap();

        let (bytes_a, residual_a) = compress_vqt(&cfg, &params, &array_a, None).unwrap();
        let (bytes_b, _residual_b) =
            compress_vqt(&cfg, &params, &array_b, Some(&residual_a)).unwrap();

        let (restored_a, decoded_residual_a) = decompress_vqt(&bytes_a, &params, None).unwrap();
        let (restored_b, _decoded_residual_b) =
            decompress_vqt(&bytes_b, &params, Some(&decoded_residual_a)).unwrap();

        for (a, b) in step_a.iter().zip(restored_a.as_slice().iter()) {
            assert!((a - b).abs() <= cfg.abs_error_bound + 1e-5);
        }
        for (a, b) in step_b.iter().zip(restored_b.as_slice().iter()) {
            assert!((a - b).abs() <= cfg.abs_error_bound * 2.0 + 1e-5);
        }
    }
}
