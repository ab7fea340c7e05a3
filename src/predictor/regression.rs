//! Affine least-squares regression predictor (spec.md §4.B "Regression").

use super::linalg;
use crate::array::Array;
use crate::block::{BlockDescriptor, ElementIterator};

/// `f(x_1, ..., x_n) = c_0 + sum(c_i * x_i)`, fit by least squares over the
/// block's global coordinates. Coefficients are quantized by the caller to
/// the same bound used for residuals (spec.md §3 invariant), typically a
/// fraction of the main error bound so coefficient error stays subordinate
/// (spec.md §4.B).
#[derive(Clone, Debug)]
pub struct RegressionPredictor {
    pub coefficients: Vec<f32>,
    ndim: usize,
}

impl RegressionPredictor {
    pub fn new(ndim: usize) -> RegressionPredictor {
        RegressionPredictor {
            coefficients: vec![0.0; ndim + 1],
            ndim,
        }
    }

    pub fn fit(&mut self, array: &Array, block: &BlockDescriptor) {
        let n = self.ndim;
        let dims = array.dims().clone();
        let data = array.as_slice();

        let mut ata = vec![vec![0.0f64; n + 1]; n + 1];
        let mut atb = vec![0.0f64; n + 1];

        for pos in ElementIterator::new(&dims, block) {
            let mut x = vec![1.0f64; n + 1];
            for (i, &bi) in pos.index.iter().enumerate() {
                x[i + 1] = (block.start[i] + bi) as f64;
            }
            let y = data[pos.offset as usize] as f64;
            for row in 0..=n {
                atb[row] += x[row] * y;
                for col in 0..=n {
                    ata[row][col] += x[row] * x[col];
                }
            }
        }

        if let Some(sol) = linalg::solve(ata, atb) {
            self.coefficients = sol.iter().map(|&v| v as f32).collect();
        } else {
            self.coefficients = vec![0.0; n + 1];
        }
    }

    pub fn predict(&self, idx: &[i64]) -> f32 {
        let mut acc = self.coefficients[0];
        for (i, &coord) in idx.iter().enumerate() {
            acc += self.coefficients[i + 1] * coord as f32;
        }
        acc
    }
}
