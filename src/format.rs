//! Compressed-stream byte format (spec.md §6): magic, version, dims, ε,
//! radius, predictor-set bitmap, per-stream Huffman tables, lossless
//! payload. All multi-byte fields are little-endian.
//!
//! Everything that describes the stream -- the header fields below *and*
//! the per-block tag/parameter/index streams -- is serialized into one
//! plain buffer and zstd-compressed as a single unit (`wrap`/`unwrap`); only
//! the 13-byte magic/version/length prefix stays outside the compressed
//! region, so a small or constant array's fixed per-stream overhead doesn't
//! dominate its compressed size (spec.md §8).

use crate::config::{Dims, PredictorFlags};
use crate::error::{self, DecodingError};
use crate::lossless;
use crate::Result;

const MAGIC: [u8; 4] = *b"FLTZ";
const VERSION: u8 = 2;

/// Everything needed to parse and replay the compressed body, minus the
/// body bytes themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub dims: Vec<u64>,
    pub eps: f32,
    pub radius: u32,
    pub predictor_flags: u8,
    pub block_size: u32,
    pub stride: u32,
    pub num_blocks: u32,
    pub num_elements: u64,
    /// Total quantized-coefficient count across all blocks (tag stream
    /// length is `num_blocks`, this is the parameter stream's).
    pub param_count: u32,
    /// Residual-stream escape count (raw floats in the unpredictable-value
    /// stream).
    pub unpredictable_count: u32,
    /// Parameter-stream escape count (raw floats in the parameter
    /// unpredictable-value stream).
    pub param_unpredictable_count: u32,
    pub tag_table: Vec<(u32, u32)>,
    pub tag_payload_len: u32,
    pub param_table: Vec<(u32, u32)>,
    pub param_payload_len: u32,
    pub huffman_table: Vec<(u32, u32)>,
    pub huffman_payload_len: u32,
}

impl Header {
    pub fn predictors(&self) -> PredictorFlags {
        PredictorFlags::from_bits_truncate(self.predictor_flags)
    }

    pub fn dims(&self) -> Result<Dims> {
        Dims::new(self.dims.clone())
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Cursor<'a> {
        Cursor { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return error::decoding_error(DecodingError::Truncated);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.u32()?))
    }

    fn table(&mut self) -> Result<Vec<(u32, u32)>> {
        let len = self.u32()? as usize;
        let mut table = Vec::with_capacity(len);
        for _ in 0..len {
            let symbol = self.u32()?;
            let length = self.u32()?;
            table.push((symbol, length));
        }
        Ok(table)
    }
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_f32(out: &mut Vec<u8>, v: f32) {
    out.extend_from_slice(&v.to_bits().to_le_bytes());
}

fn push_table(out: &mut Vec<u8>, table: &[(u32, u32)]) {
    push_u32(out, table.len() as u32);
    for &(symbol, length) in table {
        push_u32(out, symbol);
        push_u32(out, length);
    }
}

/// Serializes the header fields (not the stream bytes) into the plain
/// buffer that `wrap` will compress.
pub fn encode_header(header: &Header) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(header.dims.len() as u8);
    for &d in &header.dims {
        push_u64(&mut out, d);
    }
    push_f32(&mut out, header.eps);
    push_u32(&mut out, header.radius);
    out.push(header.predictor_flags);
    push_u32(&mut out, header.block_size);
    push_u32(&mut out, header.stride);
    push_u32(&mut out, header.num_blocks);
    push_u64(&mut out, header.num_elements);
    push_u32(&mut out, header.param_count);
    push_u32(&mut out, header.unpredictable_count);
    push_u32(&mut out, header.param_unpredictable_count);
    push_table(&mut out, &header.tag_table);
    push_u32(&mut out, header.tag_payload_len);
    push_table(&mut out, &header.param_table);
    push_u32(&mut out, header.param_payload_len);
    push_table(&mut out, &header.huffman_table);
    push_u32(&mut out, header.huffman_payload_len);
    out
}

/// Parses the header fields, returning the header and the number of bytes
/// consumed (the tag/parameter/index/unpredictable streams follow
/// immediately, in that order).
pub fn decode_header(data: &[u8]) -> Result<(Header, usize)> {
    let mut cur = Cursor::new(data);
    let ndim = cur.u8()? as usize;
    let mut dims = Vec::with_capacity(ndim);
    for _ in 0..ndim {
        dims.push(cur.u64()?);
    }
    let eps = cur.f32()?;
    let radius = cur.u32()?;
    let predictor_flags = cur.u8()?;
    let block_size = cur.u32()?;
    let stride = cur.u32()?;
    let num_blocks = cur.u32()?;
    let num_elements = cur.u64()?;
    let param_count = cur.u32()?;
    let unpredictable_count = cur.u32()?;
    let param_unpredictable_count = cur.u32()?;
    let tag_table = cur.table()?;
    let tag_payload_len = cur.u32()?;
    let param_table = cur.table()?;
    let param_payload_len = cur.u32()?;
    let huffman_table = cur.table()?;
    let huffman_payload_len = cur.u32()?;

    Ok((
        Header {
            dims,
            eps,
            radius,
            predictor_flags,
            block_size,
            stride,
            num_blocks,
            num_elements,
            param_count,
            unpredictable_count,
            param_unpredictable_count,
            tag_table,
            tag_payload_len,
            param_table,
            param_payload_len,
            huffman_table,
            huffman_payload_len,
        },
        cur.pos,
    ))
}

/// Compresses `payload` and wraps it with the magic, version, and length
/// prefix needed to decompress it again; the top-level entry point for
/// assembling a complete compressed stream (spec.md §6).
pub fn wrap(payload: &[u8]) -> Result<Vec<u8>> {
    let compressed = lossless::compress(payload, lossless::DEFAULT_LEVEL)?;
    let mut out = Vec::with_capacity(4 + 1 + 8 + 8 + compressed.len());
    out.extend_from_slice(&MAGIC);
    out.push(VERSION);
    push_u64(&mut out, payload.len() as u64);
    push_u64(&mut out, compressed.len() as u64);
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Validates the magic/version prefix and decompresses the rest, returning
/// the plain buffer `wrap` compressed (header fields followed by the
/// tag/parameter/index/unpredictable streams).
pub fn unwrap(data: &[u8]) -> Result<Vec<u8>> {
    let mut cur = Cursor::new(data);
    let magic = cur.take(4)?;
    if magic != MAGIC {
        return error::decoding_error(DecodingError::Magic);
    }
    let version = cur.u8()?;
    if version != VERSION {
        return error::decoding_error(DecodingError::Magic);
    }
    let plain_len = cur.u64()? as usize;
    let compressed_len = cur.u64()? as usize;
    let compressed = cur.take(compressed_len)?;
    lossless::decompress(compressed, plain_len)
}

/// Appends a length-prefixed blob as-is, without the magic/version wrapper
/// `wrap` adds -- used by frontends that stitch several already-complete
/// compressed streams together (e.g. `frontend::time_based`'s per-step
/// blobs).
pub fn append_body(out: &mut Vec<u8>, blob: &[u8]) {
    push_u64(out, blob.len() as u64);
    out.extend_from_slice(blob);
}

/// Reads a blob appended by `append_body` off the tail of a stream, given
/// the byte offset right after the previous entry.
pub fn read_body<'a>(data: &'a [u8], offset: usize) -> Result<&'a [u8]> {
    let mut cur = Cursor::new(&data[offset..]);
    let len = cur.u64()? as usize;
    cur.take(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Header {
        Header {
            dims: vec![4, 8],
            eps: 0.01,
            radius: 32768,
            predictor_flags: 0b101,
            block_size: 6,
            stride: 6,
            num_blocks: 4,
            num_elements: 32,
            param_count: 8,
            unpredictable_count: 2,
            param_unpredictable_count: 1,
            tag_table: vec![(0, 1), (2, 1)],
            tag_payload_len: 3,
            param_table: vec![(0, 1)],
            param_payload_len: 0,
            huffman_table: vec![(0, 1), (1, 2), (2, 2)],
            huffman_payload_len: 17,
        }
    }

    #[test]
    fn test_header_round_trip() {
        let header = sample_header();
        let bytes = encode_header(&header);
        let (decoded, consumed) = decode_header(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_wrap_unwrap_round_trip() {
        let header = sample_header();
        let mut payload = encode_header(&header);
        payload.extend_from_slice(b"stream-bytes-go-here");

        let wrapped = wrap(&payload).unwrap();
        let unwrapped = unwrap(&wrapped).unwrap();
        assert_eq!(unwrapped, payload);
    }

    #[test]
    fn test_unwrap_rejects_bad_magic() {
        let bytes = vec![0u8; 32];
        assert!(unwrap(&bytes).is_err());
    }

    #[test]
    fn test_body_round_trip() {
        let mut out = Vec::new();
        append_body(&mut out, &[1, 2, 3, 4, 5]);
        let body = read_body(&out, 0).unwrap();
        assert_eq!(body, &[1, 2, 3, 4, 5]);
    }
}
