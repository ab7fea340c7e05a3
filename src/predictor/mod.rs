//! The `predictor` module implements the predictor family (component B):
//! Lorenzo order-1/2, (polynomial) regression, and a composed selector.
//!
//! Per spec.md §9 ("Cyclic predictor composition ... reduces to a sum-type
//! tag + owned variant payload"), composition is an ordered `Vec` of an enum
//! rather than `Vec<Box<dyn Predictor>>` with shared pointers; the teacher's
//! equivalent idiom is `flac/decoder.rs` picking one of a fixed set of
//! subframe decoders by an integer tag read off the wire.

pub mod composed;
mod linalg;
mod lorenzo;
mod poly_regression;
mod regression;

pub use poly_regression::PolyRegressionPredictor;
pub use regression::RegressionPredictor;

use super::array::Array;
use super::block::BlockDescriptor;
use super::config::Dims;

/// Identifies which predictor produced a block's residuals. Persisted
/// per-block in the compressed stream (spec.md §3 "Per-block predictor tag
/// stream").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PredictorTag {
    Lorenzo1 = 0,
    Lorenzo2 = 1,
    Regression = 2,
    PolyRegression = 3,
}

impl PredictorTag {
    pub fn from_u8(byte: u8) -> Option<PredictorTag> {
        match byte {
            0 => Some(PredictorTag::Lorenzo1),
            1 => Some(PredictorTag::Lorenzo2),
            2 => Some(PredictorTag::Regression),
            3 => Some(PredictorTag::PolyRegression),
            _ => None,
        }
    }

    /// Size of the fixed tag alphabet, for sizing the tag stream's
    /// frequency table before entropy-coding it (spec.md §3 "per-block
    /// predictor tag stream").
    pub fn alphabet_size() -> usize {
        4
    }
}

/// Looks up a decoded neighbor at `idx - offset`, treating any
/// out-of-array-bounds component as a missing neighbor that contributes 0,
/// per spec.md §4.B ("missing neighbors contribute 0").
pub(crate) fn decoded_at(decoded: &[f32], dims: &Dims, idx: &[i64], offset: &[i64]) -> f32 {
    let shape = dims.as_slice();
    let ndim = idx.len();
    let mut linear: i64 = 0;
    let mut stride: i64 = 1;
    for i in (0..ndim).rev() {
        let coord = idx[i] - offset[i];
        if coord < 0 || coord >= shape[i] as i64 {
            return 0.0;
        }
        linear += coord * stride;
        stride *= shape[i] as i64;
    }
    decoded[linear as usize]
}

/// One variant per predictor family; the sum-type payload spec.md §9 calls
/// for instead of a shared-pointer composition.
#[derive(Clone, Debug)]
pub enum PredictorVariant {
    Lorenzo1,
    Lorenzo2,
    Regression(RegressionPredictor),
    PolyRegression(PolyRegressionPredictor),
}

impl PredictorVariant {
    /// Builds an empty variant for `tag`, ready to receive `load_params` on
    /// the decode side (the encoder side builds variants via
    /// `composed::candidates` instead).
    pub fn from_tag(tag: PredictorTag, ndim: usize) -> PredictorVariant {
        match tag {
            PredictorTag::Lorenzo1 => PredictorVariant::Lorenzo1,
            PredictorTag::Lorenzo2 => PredictorVariant::Lorenzo2,
            PredictorTag::Regression => PredictorVariant::Regression(RegressionPredictor::new(ndim)),
            PredictorTag::PolyRegression => {
                PredictorVariant::PolyRegression(PolyRegressionPredictor::new(ndim))
            }
        }
    }

    /// Number of `f32` coefficients `params()`/`load_params` exchange for
    /// this predictor tag, without needing an instance (used by the decoder
    /// to size the per-block parameter slice before constructing a variant).
    pub fn param_count_for_tag(tag: PredictorTag, ndim: usize) -> usize {
        match tag {
            PredictorTag::Lorenzo1 | PredictorTag::Lorenzo2 => 0,
            PredictorTag::Regression => ndim + 1,
            PredictorTag::PolyRegression => 2 * ndim + 1,
        }
    }

    pub fn tag(&self) -> PredictorTag {
        match self {
            PredictorVariant::Lorenzo1 => PredictorTag::Lorenzo1,
            PredictorVariant::Lorenzo2 => PredictorTag::Lorenzo2,
            PredictorVariant::Regression(_) => PredictorTag::Regression,
            PredictorVariant::PolyRegression(_) => PredictorTag::PolyRegression,
        }
    }

    /// Minimum decoded-neighbor count a block must offer for this predictor
    /// to be eligible; corner/edge blocks smaller than this are excluded
    /// from candidacy (spec.md §4.B "Any predictor with fewer than the
    /// minimum neighbor count ... is excluded").
    pub fn min_elements_required(&self, ndim: usize) -> usize {
        match self {
            PredictorVariant::Lorenzo1 => 1,
            PredictorVariant::Lorenzo2 => 1,
            PredictorVariant::Regression(_) => ndim + 1,
            PredictorVariant::PolyRegression(_) => 2 * ndim + 1,
        }
    }

    /// Derives this predictor's parameters from the block (a no-op for the
    /// stateless Lorenzo predictors).
    pub fn fit(&mut self, array: &Array, block: &BlockDescriptor) {
        match self {
            PredictorVariant::Lorenzo1 | PredictorVariant::Lorenzo2 => {}
            PredictorVariant::Regression(r) => r.fit(array, block),
            PredictorVariant::PolyRegression(r) => r.fit(array, block),
        }
    }

    /// Predicts the value at `idx` (global, per-dimension coordinates) using
    /// already-decoded neighbors in `decoded`.
    pub fn predict(&self, decoded: &[f32], dims: &Dims, idx: &[i64]) -> f32 {
        match self {
            PredictorVariant::Lorenzo1 => lorenzo::predict_order1(decoded, dims, idx),
            PredictorVariant::Lorenzo2 => lorenzo::predict_order2(decoded, dims, idx),
            PredictorVariant::Regression(r) => r.predict(idx),
            PredictorVariant::PolyRegression(r) => r.predict(idx),
        }
    }

    /// Floating point coefficients to be quantized and persisted to the
    /// per-block parameter stream (empty for the stateless Lorenzo
    /// predictors).
    pub fn params(&self) -> Vec<f32> {
        match self {
            PredictorVariant::Lorenzo1 | PredictorVariant::Lorenzo2 => Vec::new(),
            PredictorVariant::Regression(r) => r.coefficients.clone(),
            PredictorVariant::PolyRegression(r) => r.coefficients.clone(),
        }
    }

    /// Rebuilds this predictor's state from dequantized coefficients, the
    /// decoder-side counterpart of `fit` (spec.md §3 invariant: "decoder
    /// reconstructs them exactly").
    pub fn load_params(&mut self, params: &[f32]) {
        match self {
            PredictorVariant::Lorenzo1 | PredictorVariant::Lorenzo2 => {}
            PredictorVariant::Regression(r) => r.coefficients = params.to_vec(),
            PredictorVariant::PolyRegression(r) => r.coefficients = params.to_vec(),
        }
    }

    /// Upper bound on quantization error count / byte cost for this
    /// predictor over the block, used by the composed selector. Approximated
    /// as the sum of absolute residuals (cheaper residuals quantize to
    /// smaller/more compressible indices).
    pub fn estimate_cost(&self, array: &Array, dims: &Dims, block: &BlockDescriptor) -> f64 {
        // Approximated using the true (not yet quantized) neighbor values as
        // an oracle stand-in for "already decoded" -- good enough to rank
        // candidates, even though at encode time only causal neighbors would
        // actually be available.
        let data = array.as_slice();
        let mut cost = 0.0f64;
        for pos in super::block::ElementIterator::new(dims, block) {
            let global_idx: Vec<i64> = block
                .start
                .iter()
                .zip(pos.index.iter())
                .map(|(&s, &i)| (s + i) as i64)
                .collect();
            let predicted = self.predict(data, dims, &global_idx);
            let original = data[pos.offset as usize];
            cost += (original - predicted).abs() as f64;
        }
        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Array;
    use crate::block::BlockDescriptor;

    #[test]
    fn test_lorenzo1_predicts_ramp_exactly_after_warm_up() {
        let dims = Dims::new(vec![4]).unwrap();
        let decoded = vec![0.0, 1.0, 2.0, 3.0];
        // idx 2 predicted from idx 1 (linear ramp -> residual 0 for step 1).
        let pred = lorenzo::predict_order1(&decoded, &dims, &[2]);
        assert_eq!(pred, 1.0);
    }

    #[test]
    fn test_lorenzo_missing_neighbor_is_zero() {
        let dims = Dims::new(vec![4]).unwrap();
        let decoded = vec![5.0, 0.0, 0.0, 0.0];
        let pred = lorenzo::predict_order1(&decoded, &dims, &[0]);
        assert_eq!(pred, 0.0);
    }

    #[test]
    fn test_regression_fits_linear_ramp() {
        let dims = Dims::new(vec![8]).unwrap();
        let data: Vec<f32> = (0..8).map(|x| x as f32).collect();
        let array = Array::new(dims.clone(), data).unwrap();
        let block = BlockDescriptor { start: vec![0], shape: vec![8] };
        let mut r = RegressionPredictor::new(dims.ndim());
        r.fit(&array, &block);
        let predicted = r.predict(&[4]);
        assert!((predicted - 4.0).abs() < 1e-3);
    }
}
