//! The `config` module defines the caller-supplied compression configuration.

use bitflags::bitflags;

use super::error::{self, ConfigError};
use super::Result;

bitflags! {
    /// Bitmap of enabled predictors, persisted byte-for-byte in the
    /// compressed stream header (spec §6, byte 5: "predictor-set bitmap").
    pub struct PredictorFlags: u8 {
        const LORENZO    = 0b0000_0001;
        const LORENZO2   = 0b0000_0010;
        const REGRESSION = 0b0000_0100;
    }
}

impl PredictorFlags {
    /// Number of enabled predictors. Used to decide whether a composed
    /// selector is needed at all, or whether a single predictor can be used
    /// directly (mirrors `original_source`'s `use_single_predictor` check).
    pub fn count(self) -> usize {
        self.bits().count_ones() as usize
    }
}

/// ABS: the bound is an absolute error; REL: the bound is a fraction of the
/// per-batch value range and is converted to an absolute bound before use.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorBoundMode {
    Abs,
    Rel,
}

/// Up to 4 positive dimension extents, row-major, slowest-varying first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dims(Vec<u64>);

impl Dims {
    pub fn new(dims: Vec<u64>) -> Result<Dims> {
        if dims.is_empty() || dims.len() > 4 || dims.iter().any(|&d| d == 0) {
            return error::config_error(ConfigError::InvalidDims);
        }
        Ok(Dims(dims))
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Total element count `N = product(dims)`.
    pub fn num_elements(&self) -> u64 {
        self.0.iter().product()
    }
}

/// Compression configuration, passed by the caller. Mirrors spec.md §6.
#[derive(Clone, Debug)]
pub struct Config {
    pub dims: Dims,
    pub error_bound_mode: ErrorBoundMode,
    pub abs_error_bound: f32,
    pub rel_error_bound: f32,
    pub block_size: u32,
    pub stride: u32,
    pub quantbin_cnt: u32,
    pub predictors: PredictorFlags,
    /// Number of time-steps compressed per adaptive-selector re-invocation;
    /// `<= 0` locks the selector to its initial choice (spec.md §4.I).
    pub method_batch: i32,
}

impl Config {
    /// Validates the configuration per spec.md §7 `ConfigError` cases that
    /// are independent of the data being compressed (dims, error bound,
    /// predictor set, quant bin count). Frontend/data-dependent checks (e.g.
    /// Exaalt level count) are validated where that data becomes available.
    pub fn validate(&self) -> Result<()> {
        if self.predictors.is_empty() {
            return error::config_error(ConfigError::EmptyPredictorSet);
        }
        if self.quantbin_cnt == 0 || self.quantbin_cnt % 2 != 0 || self.radius() < 1 {
            return error::config_error(ConfigError::InvalidQuantBinCount);
        }
        let bound = match self.error_bound_mode {
            ErrorBoundMode::Abs => self.abs_error_bound,
            ErrorBoundMode::Rel => self.rel_error_bound,
        };
        if !(bound > 0.0) || !bound.is_finite() {
            return error::config_error(ConfigError::InvalidErrorBound);
        }
        if self.block_size == 0 || self.stride == 0 {
            return error::config_error(ConfigError::InvalidDims);
        }
        Ok(())
    }

    /// Bin count / 2, per spec.md §4.C.
    pub fn radius(&self) -> u32 {
        self.quantbin_cnt / 2
    }

    /// Derives the absolute error bound for a batch whose value range is
    /// `(min, max)`, converting REL -> ABS with a max-min pass as spec.md §6
    /// describes ("one is provided; the other is derived after a max-min
    /// pass").
    pub fn resolved_abs_error_bound(&self, min: f32, max: f32) -> f32 {
        match self.error_bound_mode {
            ErrorBoundMode::Abs => self.abs_error_bound,
            ErrorBoundMode::Rel => self.rel_error_bound * (max - min),
        }
    }
}

#[test]
fn test_dims_rejects_empty_and_oversized() {
    assert!(Dims::new(vec![]).is_err());
    assert!(Dims::new(vec![1, 2, 3, 4, 5]).is_err());
    assert!(Dims::new(vec![4, 0]).is_err());
    assert!(Dims::new(vec![4, 4]).is_ok());
}

#[test]
fn test_predictor_flags_count() {
    let flags = PredictorFlags::LORENZO | PredictorFlags::REGRESSION;
    assert_eq!(flags.count(), 2);
    assert_eq!(PredictorFlags::LORENZO.count(), 1);
}

#[test]
fn test_config_validate_rejects_empty_predictor_set() {
    let cfg = Config {
        dims: Dims::new(vec![16]).unwrap(),
        error_bound_mode: ErrorBoundMode::Abs,
        abs_error_bound: 0.1,
        rel_error_bound: 0.0,
        block_size: 4,
        stride: 4,
        quantbin_cnt: 65536,
        predictors: PredictorFlags::empty(),
        method_batch: 0,
    };
    assert!(matches!(
        cfg.validate(),
        Err(crate::error::Error::Config(ConfigError::EmptyPredictorSet))
    ));
}
