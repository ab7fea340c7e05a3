//! Minimal dense linear solve used by the regression predictors. Grounded on
//! the normal-equations idiom in `other_examples/93c26af1_avhz-RustQuant__
//! src-ml-regression-linear.rs.rs`, which builds its design matrix as a
//! `nalgebra::DMatrix`/`DVector` pair and solves via LU factorization; this
//! module follows the same idiom instead of hand-rolled elimination.

use nalgebra::DMatrix;

/// Solves `a * x = b`. `a` is `n x n`, row-major. Returns `None` if the
/// system is singular to working precision.
pub fn solve(a: Vec<Vec<f64>>, b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let flat: Vec<f64> = a.into_iter().flatten().collect();
    let matrix = DMatrix::from_row_slice(n, n, &flat);
    let rhs = DMatrix::from_vec(n, 1, b);
    matrix.lu().solve(&rhs).map(|x| x.iter().copied().collect())
}

#[test]
fn test_solve_identity() {
    let a = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
    let b = vec![3.0, 4.0];
    assert_eq!(solve(a, b), Some(vec![3.0, 4.0]));
}

#[test]
fn test_solve_rejects_singular_system() {
    let a = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
    let b = vec![2.0, 2.0];
    assert!(solve(a, b).is_none());
}
