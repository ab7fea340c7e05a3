//! The `array` module defines the dense row-major N-D tensor the core
//! operates on (spec.md §3 "Array").

use super::config::Dims;

/// A dense row-major tensor of `f32`, `1 <= dims.ndim() <= 4`.
///
/// The entire array is held in memory for the lifetime of a compress or
/// decompress call (spec.md §3 "Lifecycle"); there is no streaming variant.
#[derive(Clone, Debug)]
pub struct Array {
    dims: Dims,
    data: Vec<f32>,
}

impl Array {
    /// Wraps `data` as a dense tensor of the given shape. `data.len()` must
    /// equal `dims.num_elements()`.
    pub fn new(dims: Dims, data: Vec<f32>) -> Option<Array> {
        if data.len() as u64 != dims.num_elements() {
            return None;
        }
        Some(Array { dims, data })
    }

    pub fn dims(&self) -> &Dims {
        &self.dims
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Min and max element, used to derive a REL -> ABS error bound
    /// (spec.md §6). Returns `None` for an empty array.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        if self.data.is_empty() {
            return None;
        }
        let mut min = self.data[0];
        let mut max = self.data[0];
        for &v in &self.data[1..] {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        Some((min, max))
    }
}

#[test]
fn test_array_new_rejects_mismatched_len() {
    let dims = Dims::new(vec![2, 2]).unwrap();
    assert!(Array::new(dims.clone(), vec![1.0, 2.0, 3.0]).is_none());
    assert!(Array::new(dims, vec![1.0, 2.0, 3.0, 4.0]).is_some());
}

#[test]
fn test_value_range() {
    let dims = Dims::new(vec![4]).unwrap();
    let arr = Array::new(dims, vec![3.0, -1.0, 7.0, 2.0]).unwrap();
    assert_eq!(arr.value_range(), Some((-1.0, 7.0)));
}
