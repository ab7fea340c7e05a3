//! The `quantizer` module implements the error-bounded integer quantizer
//! (component C, spec.md §4.C).

/// Result of quantizing one residual.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QuantizeResult {
    /// The residual fell inside the quantizer's range. Carries the
    /// non-negative bin index (shifted by `radius`, so 0 is reserved to mean
    /// "read the next raw float") and the reconstructed value.
    Bin { index: u32, reconstructed: f32 },
    /// The residual escaped the quantizer's range; the exact original value
    /// is stored verbatim in the unpredictable-value stream.
    Unpredictable { original: f32 },
}

/// `LinearQuantizer` maps a prediction residual `r = original - predicted`
/// to a bin index `q = round(r / (2*eps))`, valid when `|q| < radius` and
/// `|r - 2*eps*q| <= eps` (spec.md §4.C).
#[derive(Clone, Copy, Debug)]
pub struct LinearQuantizer {
    eps: f32,
    radius: u32,
}

impl LinearQuantizer {
    pub fn new(eps: f32, radius: u32) -> LinearQuantizer {
        LinearQuantizer { eps, radius }
    }

    pub fn eps(&self) -> f32 {
        self.eps
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Number of distinct bin indices, `2 * radius` (spec.md §4.C "Index
    /// range is [0, 2R)").
    pub fn alphabet_span(&self) -> u32 {
        2 * self.radius
    }

    /// Quantizes `original` given a `predicted` value. Guarantees
    /// `|original - reconstructed| <= eps` for `Bin` results, and exact
    /// reconstruction via the unpredictable stream otherwise (spec.md §8
    /// invariant 1 and 2).
    pub fn quantize(&self, original: f32, predicted: f32) -> QuantizeResult {
        let r = original - predicted;
        let step = 2.0 * self.eps;
        let q = (r / step).round();

        if q.abs() < self.radius as f32 {
            let reconstructed = predicted + step * q;
            if (original - reconstructed).abs() <= self.eps {
                let shifted = (q as i64 + self.radius as i64) as u32;
                return QuantizeResult::Bin {
                    index: shifted,
                    reconstructed,
                };
            }
        }
        QuantizeResult::Unpredictable { original }
    }

    /// Reconstructs a value from a non-escape bin index (the decoder
    /// counterpart of `quantize`'s `Bin` branch). `index` must be nonzero;
    /// index 0 means "read the next raw float" and is handled by the
    /// caller, not here.
    pub fn reconstruct(&self, index: u32, predicted: f32) -> f32 {
        let q = index as i64 - self.radius as i64;
        predicted + 2.0 * self.eps * q as f32
    }
}

#[test]
fn test_quantize_in_range_round_trips_within_eps() {
    let q = LinearQuantizer::new(0.1, 32768);
    match q.quantize(10.04, 10.0) {
        QuantizeResult::Bin { index, reconstructed } => {
            assert!((10.04 - reconstructed).abs() <= 0.1);
            assert_eq!(q.reconstruct(index, 10.0), reconstructed);
        }
        QuantizeResult::Unpredictable { .. } => panic!("expected a bin hit"),
    }
}

#[test]
fn test_quantize_exact_match_is_zero_bin_relative_to_radius() {
    let q = LinearQuantizer::new(0.1, 32768);
    match q.quantize(10.0, 10.0) {
        QuantizeResult::Bin { index, reconstructed } => {
            assert_eq!(index, 32768);
            assert_eq!(reconstructed, 10.0);
        }
        QuantizeResult::Unpredictable { .. } => panic!("expected a bin hit"),
    }
}

#[test]
fn test_quantize_large_residual_escapes() {
    let q = LinearQuantizer::new(0.1, 4);
    match q.quantize(1000.0, 0.0) {
        QuantizeResult::Unpredictable { original } => assert_eq!(original, 1000.0),
        QuantizeResult::Bin { .. } => panic!("expected an escape"),
    }
}

#[test]
fn test_alphabet_span() {
    let q = LinearQuantizer::new(0.1, 100);
    assert_eq!(q.alphabet_span(), 200);
}
