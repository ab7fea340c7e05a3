//! The `block` module implements the multi-dimensional block iteration
//! framework (spec.md §4.A). Two nested traversals are provided: an
//! inter-block range over block starting coordinates, and an intra-block
//! range over every element inside one block.
//!
//! Per spec.md §9 ("Template specialization on dimension count becomes a
//! runtime dimension parameter with small hand-specialized loops"), both
//! ranges carry the dimension count as a runtime value but avoid generic
//! N-D recursion by padding every shape/stride/coordinate out to 4 entries
//! and looping over a fixed `[u64; 4]`.

use super::config::Dims;

const MAX_DIMS: usize = 4;

/// Pads a dimension slice out to `MAX_DIMS` entries with the given fill
/// value, trailing entries unused beyond `ndim`.
fn pad(dims: &[u64], ndim: usize, fill: u64) -> [u64; MAX_DIMS] {
    let mut out = [fill; MAX_DIMS];
    out[..ndim].copy_from_slice(dims);
    out
}

/// Row-major strides (in elements) for a shape, slowest-varying first.
fn strides(shape: &[u64; MAX_DIMS], ndim: usize) -> [u64; MAX_DIMS] {
    let mut s = [1u64; MAX_DIMS];
    for i in (0..ndim.saturating_sub(1)).rev() {
        s[i] = s[i + 1] * shape[i + 1];
    }
    s
}

/// Iterates the starting coordinates of every block tiling (or sampling)
/// an array of shape `dims`, stepped by `stride` in each dimension.
///
/// Stride equal to the block size yields a tiling (every element belongs to
/// exactly one block); stride greater than the block size yields sampling
/// (elements between blocks are skipped by the caller).
pub struct BlockIterator {
    ndim: usize,
    dims: [u64; MAX_DIMS],
    stride: u64,
    block_size: u64,
    /// Number of blocks along each dimension: `ceil(dims[i] / stride)`.
    counts: [u64; MAX_DIMS],
    next: u64,
    total: u64,
}

/// Starting coordinates and per-dimension length of one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub start: Vec<u64>,
    pub shape: Vec<u64>,
}

impl BlockIterator {
    pub fn new(dims: &Dims, block_size: u32, stride: u32) -> BlockIterator {
        let ndim = dims.ndim();
        let padded = pad(dims.as_slice(), ndim, 1);
        let stride = stride as u64;
        let mut counts = [1u64; MAX_DIMS];
        let mut total = 1u64;
        for i in 0..ndim {
            counts[i] = (padded[i] + stride - 1) / stride;
            total *= counts[i];
        }
        BlockIterator {
            ndim,
            dims: padded,
            stride,
            block_size: block_size as u64,
            counts,
            next: 0,
            total,
        }
    }
}

impl Iterator for BlockIterator {
    type Item = BlockDescriptor;

    fn next(&mut self) -> Option<BlockDescriptor> {
        if self.next >= self.total {
            return None;
        }
        // Unravel the flat block index into per-dimension block coordinates,
        // row-major (slowest-varying first), matching spec.md §3's "their
        // iteration order is row-major in block-coordinate space."
        let mut rem = self.next;
        let mut coords = [0u64; MAX_DIMS];
        for i in (0..self.ndim).rev() {
            coords[i] = rem % self.counts[i];
            rem /= self.counts[i];
        }
        self.next += 1;

        let mut start = Vec::with_capacity(self.ndim);
        let mut shape = Vec::with_capacity(self.ndim);
        for i in 0..self.ndim {
            let k = coords[i] * self.stride;
            start.push(k);
            shape.push(self.dims[i].saturating_sub(k).min(self.block_size));
        }
        Some(BlockDescriptor { start, shape })
    }
}


/// Iterates every linear offset and per-dimension index inside one block,
/// advancing the slowest-varying dimension last (row-major), per spec.md
/// §4.A "Intra-block range".
pub struct ElementIterator {
    ndim: usize,
    array_strides: [u64; MAX_DIMS],
    start: [u64; MAX_DIMS],
    shape: [u64; MAX_DIMS],
    cursor: [u64; MAX_DIMS],
    done: bool,
}

impl ElementIterator {
    pub fn new(dims: &Dims, block: &BlockDescriptor) -> ElementIterator {
        let ndim = dims.ndim();
        let full_shape = pad(dims.as_slice(), ndim, 1);
        let array_strides = strides(&full_shape, ndim);
        let start = pad(&block.start, ndim, 0);
        let shape = pad(&block.shape, ndim, 1);
        let done = shape[..ndim].iter().any(|&s| s == 0);
        ElementIterator {
            ndim,
            array_strides,
            start,
            shape,
            cursor: [0; MAX_DIMS],
            done,
        }
    }

    /// Rebinds this range to a new block without allocating, per spec.md
    /// §4.A "Setting offsets and starting position rebinds the intra-range
    /// without allocating."
    pub fn rebind(&mut self, block: &BlockDescriptor) {
        let ndim = self.ndim;
        self.start = pad(&block.start, ndim, 0);
        self.shape = pad(&block.shape, ndim, 1);
        self.cursor = [0; MAX_DIMS];
        self.done = self.shape[..ndim].iter().any(|&s| s == 0);
    }
}

/// One element's linear offset into the full array plus its per-dimension
/// index within the block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementPos {
    pub offset: u64,
    pub index: Vec<u64>,
}

impl Iterator for ElementIterator {
    type Item = ElementPos;

    fn next(&mut self) -> Option<ElementPos> {
        if self.done {
            return None;
        }
        let mut offset = 0u64;
        let mut index = Vec::with_capacity(self.ndim);
        for i in 0..self.ndim {
            let abs = self.start[i] + self.cursor[i];
            offset += abs * self.array_strides[i];
            index.push(self.cursor[i]);
        }

        // Advance the cursor, fastest-varying (last) dimension first, so
        // the slowest-varying dimension advances last.
        for i in (0..self.ndim).rev() {
            self.cursor[i] += 1;
            if self.cursor[i] < self.shape[i] {
                break;
            }
            self.cursor[i] = 0;
            if i == 0 {
                self.done = true;
            }
        }

        Some(ElementPos { offset, index })
    }
}

#[test]
fn test_tiling_covers_every_index_exactly_once() {
    let dims = Dims::new(vec![4, 4]).unwrap();
    let mut seen = vec![false; 16];
    for block in BlockIterator::new(&dims, 2, 2) {
        for pos in ElementIterator::new(&dims, &block) {
            assert!(!seen[pos.offset as usize], "duplicate offset {}", pos.offset);
            seen[pos.offset as usize] = true;
        }
    }
    assert!(seen.iter().all(|&s| s), "not all offsets covered");
}

#[test]
fn test_edge_block_truncation() {
    // 5 is not divisible by block size 2: edge blocks truncate.
    let dims = Dims::new(vec![5]).unwrap();
    let blocks: Vec<_> = BlockIterator::new(&dims, 2, 2).collect();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[2].shape, vec![1]);
}

#[test]
fn test_sampling_stride_greater_than_block_skips_elements() {
    let dims = Dims::new(vec![8]).unwrap();
    // A stride of 4 but intra-block iteration only used for a block length
    // of 2 (simulated here by constructing shape directly) would skip
    // elements 2,3 / 6,7. We approximate this by manually building
    // descriptors of length 2 at stride-4 starts.
    let descriptors = vec![
        BlockDescriptor { start: vec![0], shape: vec![2] },
        BlockDescriptor { start: vec![4], shape: vec![2] },
    ];
    let mut offsets = Vec::new();
    for block in &descriptors {
        for pos in ElementIterator::new(&dims, block) {
            offsets.push(pos.offset);
        }
    }
    assert_eq!(offsets, vec![0, 1, 4, 5]);
}

#[test]
fn test_rebind_does_not_allocate_new_iterator() {
    let dims = Dims::new(vec![4]).unwrap();
    let mut it = ElementIterator::new(&dims, &BlockDescriptor { start: vec![0], shape: vec![2] });
    let first: Vec<_> = it.by_ref().collect();
    assert_eq!(first.len(), 2);
    it.rebind(&BlockDescriptor { start: vec![2], shape: vec![2] });
    let second: Vec<_> = it.collect();
    assert_eq!(second.iter().map(|p| p.offset).collect::<Vec<_>>(), vec![2, 3]);
}
