//! Lossless back-end adapter (component E, spec.md §4.E). A thin wrapper
//! over `zstd`'s one-shot buffer API, grounded on the adapter shape in
//! `other_examples/495d7096_abitofhelp-adaptive_pipeline__adaptive_pipeline-src-infrastructure-adapters-compression.rs.rs`.

use crate::error::{self, DecodingError};
use crate::Result;

/// Default compression level, matching the teacher's SZ3 lineage default.
pub const DEFAULT_LEVEL: i32 = 3;

/// Compresses `data` with zstd at `level`.
pub fn compress(data: &[u8], level: i32) -> Result<Vec<u8>> {
    zstd::bulk::compress(data, level).map_err(crate::error::Error::from)
}

/// Decompresses `data`, which must expand to exactly `decompressed_len`
/// bytes. The exact length is always known up front: it is the sum of the
/// format's declared stream lengths (spec.md §6), never guessed.
pub fn decompress(data: &[u8], decompressed_len: usize) -> Result<Vec<u8>> {
    match zstd::bulk::decompress(data, decompressed_len) {
        Ok(bytes) => Ok(bytes),
        Err(_) => error::decoding_error(DecodingError::Corrupt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_decompress_round_trip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(20);
        let compressed = compress(&data, DEFAULT_LEVEL).unwrap();
        assert!(compressed.len() < data.len());
        let decompressed = decompress(&compressed, data.len()).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_decompress_rejects_corrupt_input() {
        let garbage = vec![0xffu8; 16];
        assert!(decompress(&garbage, 1024).is_err());
    }
}
