//! Quadratic extension of the regression predictor (spec.md §4.B "Polynomial
//! regression"). Fits `c_0 + sum(c_i * x_i) + sum(d_i * x_i^2)`, omitting
//! cross terms to keep the normal-equations system small (`2n + 1` unknowns
//! instead of the full `(n+1)(n+2)/2` of a general quadratic).

use super::linalg;
use crate::array::Array;
use crate::block::{BlockDescriptor, ElementIterator};

#[derive(Clone, Debug)]
pub struct PolyRegressionPredictor {
    pub coefficients: Vec<f32>,
    ndim: usize,
}

impl PolyRegressionPredictor {
    pub fn new(ndim: usize) -> PolyRegressionPredictor {
        PolyRegressionPredictor {
            coefficients: vec![0.0; 2 * ndim + 1],
            ndim,
        }
    }

    fn terms(&self, idx: &[i64]) -> Vec<f64> {
        let n = self.ndim;
        let mut x = vec![1.0f64; 2 * n + 1];
        for (i, &coord) in idx.iter().enumerate() {
            x[1 + i] = coord as f64;
            x[1 + n + i] = (coord * coord) as f64;
        }
        x
    }

    pub fn fit(&mut self, array: &Array, block: &BlockDescriptor) {
        let n = self.ndim;
        let width = 2 * n + 1;
        let dims = array.dims().clone();
        let data = array.as_slice();

        let mut ata = vec![vec![0.0f64; width]; width];
        let mut atb = vec![0.0f64; width];

        for pos in ElementIterator::new(&dims, block) {
            let idx: Vec<i64> = pos
                .index
                .iter()
                .enumerate()
                .map(|(i, &bi)| (block.start[i] + bi) as i64)
                .collect();
            let x = self.terms(&idx);
            let y = data[pos.offset as usize] as f64;
            for row in 0..width {
                atb[row] += x[row] * y;
                for col in 0..width {
                    ata[row][col] += x[row] * x[col];
                }
            }
        }

        if let Some(sol) = linalg::solve(ata, atb) {
            self.coefficients = sol.iter().map(|&v| v as f32).collect();
        } else {
            self.coefficients = vec![0.0; width];
        }
    }

    pub fn predict(&self, idx: &[i64]) -> f32 {
        let x = self.terms(idx);
        x.iter()
            .zip(self.coefficients.iter())
            .map(|(&xi, &ci)| xi as f32 * ci)
            .sum()
    }
}

#[test]
fn test_poly_regression_fits_quadratic() {
    use crate::config::Dims;

    let dims = Dims::new(vec![8]).unwrap();
    let data: Vec<f32> = (0..8).map(|x| (x * x) as f32).collect();
    let array = Array::new(dims, data).unwrap();
    let block = BlockDescriptor { start: vec![0], shape: vec![8] };
    let mut p = PolyRegressionPredictor::new(1);
    p.fit(&array, &block);
    let predicted = p.predict(&[5]);
    assert!((predicted - 25.0).abs() < 1e-1);
}
