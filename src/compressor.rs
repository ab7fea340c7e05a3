//! General block compressor (component F, spec.md §4.F). Ties together
//! block iteration, predictor selection, quantization, Huffman coding, and
//! the lossless back-end for both directions.
//!
//! Single-threaded: per spec.md §5, parallel block fitting is *possible*
//! but not required, and nothing here spans a thread (mirrors the teacher's
//! decode loop, which is single-threaded end to end).

use tracing::debug;

use crate::array::Array;
use crate::block::{BlockDescriptor, BlockIterator, ElementIterator};
use crate::config::Config;
use crate::error::{self, DecodingError};
use crate::format::{self, Header};
use crate::huffman::{CanonicalCode, Symbol};
use crate::predictor::{composed, PredictorTag, PredictorVariant};
use crate::quantizer::{LinearQuantizer, QuantizeResult};
use crate::Result;

/// Global index into a linearized array, used to look up already-decoded
/// neighbors during both compression and decompression so the two sides
/// walk an identical causal order.
fn global_index(block: &BlockDescriptor, local: &[u64]) -> Vec<i64> {
    block
        .start
        .iter()
        .zip(local.iter())
        .map(|(&s, &i)| (s + i) as i64)
        .collect()
}

/// Builds a canonical code over `0..alphabet_size` from the symbols actually
/// used, the same construction spec.md §4.D uses for the residual-index
/// alphabet, reused here for the tag and parameter streams.
fn build_code(symbols: &[Symbol], alphabet_size: usize) -> Result<CanonicalCode> {
    let mut frequencies: Vec<(Symbol, u64)> = (0..alphabet_size as u32).map(|s| (s, 0u64)).collect();
    for &sym in symbols {
        frequencies[sym as usize].1 += 1;
    }
    CanonicalCode::from_frequencies(&frequencies)
}

fn push_f32(out: &mut Vec<u8>, v: f32) {
    out.extend_from_slice(&v.to_bits().to_le_bytes());
}

fn read_f32_stream(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_bits(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
        .collect()
}

/// Compresses `array` under `config`, producing a self-describing byte
/// stream per spec.md §6.
pub fn compress(config: &Config, array: &Array) -> Result<Vec<u8>> {
    config.validate()?;
    if array.dims() != &config.dims {
        return error::config_error(crate::error::ConfigError::InvalidDims);
    }

    let dims = config.dims.clone();
    let ndim = dims.ndim();
    let (min, max) = array.value_range().unwrap_or((0.0, 0.0));
    let eps = config.resolved_abs_error_bound(min, max);
    let quantizer = LinearQuantizer::new(eps, config.radius());

    let n = array.len();
    let mut decoded = vec![0.0f32; n];
    let data = array.as_slice();

    let mut tags: Vec<Symbol> = Vec::new();
    let mut param_indices: Vec<Symbol> = Vec::new();
    let mut param_unpredictable: Vec<f32> = Vec::new();
    let mut indices: Vec<Symbol> = Vec::with_capacity(n);
    let mut unpredictable: Vec<f32> = Vec::new();

    let mut num_blocks = 0u32;
    for block in BlockIterator::new(&dims, config.block_size, config.stride) {
        num_blocks += 1;
        let mut candidates = composed::candidates(config.predictors, ndim);
        let chosen = composed::select(&mut candidates, config, array, &block);
        let predictor = &mut candidates[chosen];

        // Quantize the fitted coefficients through the same bound used for
        // residuals (spec.md §3 invariant), then rebuild the predictor from
        // the *quantized* values so encode-side predictions match what the
        // decoder will reconstruct from the parameter stream exactly.
        let raw_params = predictor.params();
        let mut quantized_params = Vec::with_capacity(raw_params.len());
        for coef in raw_params {
            match quantizer.quantize(coef, 0.0) {
                QuantizeResult::Bin { index, reconstructed } => {
                    param_indices.push(index);
                    quantized_params.push(reconstructed);
                }
                QuantizeResult::Unpredictable { original } => {
                    param_indices.push(0);
                    param_unpredictable.push(original);
                    quantized_params.push(original);
                }
            }
        }
        predictor.load_params(&quantized_params);
        tags.push(predictor.tag() as Symbol);

        for pos in ElementIterator::new(&dims, &block) {
            let idx = global_index(&block, &pos.index);
            let predicted = predictor.predict(&decoded, &dims, &idx);
            let original = data[pos.offset as usize];
            match quantizer.quantize(original, predicted) {
                QuantizeResult::Bin { index, reconstructed } => {
                    indices.push(index);
                    decoded[pos.offset as usize] = reconstructed;
                }
                QuantizeResult::Unpredictable { original } => {
                    indices.push(0);
                    unpredictable.push(original);
                    decoded[pos.offset as usize] = original;
                }
            }
        }
    }

    debug!(
        num_blocks,
        unpredictable = unpredictable.len(),
        eps,
        "compressed blocks"
    );

    let tag_code = build_code(&tags, PredictorTag::alphabet_size())?;
    let tag_bytes = tag_code.encode(&tags)?;

    let span = quantizer.alphabet_span() as usize;
    let param_code = build_code(&param_indices, span)?;
    let param_bytes = param_code.encode(&param_indices)?;

    let index_code = build_code(&indices, span)?;
    let index_bytes = index_code.encode(&indices)?;

    let header = Header {
        dims: dims.as_slice().to_vec(),
        eps,
        radius: config.radius(),
        predictor_flags: config.predictors.bits(),
        block_size: config.block_size,
        stride: config.stride,
        num_blocks,
        num_elements: n as u64,
        param_count: param_indices.len() as u32,
        unpredictable_count: unpredictable.len() as u32,
        param_unpredictable_count: param_unpredictable.len() as u32,
        tag_table: tag_code.length_table(),
        tag_payload_len: tag_bytes.len() as u32,
        param_table: param_code.length_table(),
        param_payload_len: param_bytes.len() as u32,
        huffman_table: index_code.length_table(),
        huffman_payload_len: index_bytes.len() as u32,
    };

    let mut payload = format::encode_header(&header);
    payload.extend_from_slice(&tag_bytes);
    payload.extend_from_slice(&param_bytes);
    for &u in &param_unpredictable {
        push_f32(&mut payload, u);
    }
    payload.extend_from_slice(&index_bytes);
    for &u in &unpredictable {
        push_f32(&mut payload, u);
    }

    format::wrap(&payload)
}

/// Decompresses a stream produced by `compress`, reconstructing an `Array`
/// whose values satisfy the error bound recorded in its own header.
pub fn decompress(data: &[u8]) -> Result<Array> {
    let payload = format::unwrap(data)?;
    let (header, offset) = format::decode_header(&payload)?;
    let body = &payload[offset..];

    let tag_len = header.tag_payload_len as usize;
    let param_len = header.param_payload_len as usize;
    let param_unpred_len = header.param_unpredictable_count as usize * 4;
    let huff_len = header.huffman_payload_len as usize;
    let unpred_len = header.unpredictable_count as usize * 4;
    if body.len() < tag_len + param_len + param_unpred_len + huff_len + unpred_len {
        return error::decoding_error(DecodingError::Truncated);
    }

    let mut cursor = 0usize;
    let tag_bytes = &body[cursor..cursor + tag_len];
    cursor += tag_len;
    let param_bytes = &body[cursor..cursor + param_len];
    cursor += param_len;
    let param_unpredictable = read_f32_stream(&body[cursor..cursor + param_unpred_len]);
    cursor += param_unpred_len;
    let huffman_bytes = &body[cursor..cursor + huff_len];
    cursor += huff_len;
    let unpredictable = read_f32_stream(&body[cursor..cursor + unpred_len]);

    let dims = header.dims()?;
    let ndim = dims.ndim();
    let quantizer = LinearQuantizer::new(header.eps, header.radius);

    let tag_code = CanonicalCode::from_length_table(header.tag_table.clone());
    let tags = tag_code.decode(tag_bytes, header.num_blocks as usize)?;
    let param_code = CanonicalCode::from_length_table(header.param_table.clone());
    let param_indices = param_code.decode(param_bytes, header.param_count as usize)?;
    let index_code = CanonicalCode::from_length_table(header.huffman_table.clone());
    let indices = index_code.decode(huffman_bytes, header.num_elements as usize)?;

    let mut decoded = vec![0.0f32; header.num_elements as usize];
    let mut index_cursor = 0usize;
    let mut param_cursor = 0usize;
    let mut param_unpredictable_cursor = 0usize;
    let mut unpredictable_cursor = 0usize;

    for (block_no, &tag_sym) in tags.iter().enumerate() {
        let tag = match PredictorTag::from_u8(tag_sym as u8) {
            Some(tag) => tag,
            None => return error::decoding_error(DecodingError::Corrupt),
        };
        let block = match BlockIterator::new(&dims, header.block_size, header.stride).nth(block_no) {
            Some(block) => block,
            None => return error::decoding_error(DecodingError::Corrupt),
        };

        let param_count = PredictorVariant::param_count_for_tag(tag, ndim);
        let mut predictor = PredictorVariant::from_tag(tag, ndim);
        let mut block_params = Vec::with_capacity(param_count);
        for _ in 0..param_count {
            let symbol = param_indices[param_cursor];
            param_cursor += 1;
            let value = if symbol == 0 {
                let v = param_unpredictable[param_unpredictable_cursor];
                param_unpredictable_cursor += 1;
                v
            } else {
                quantizer.reconstruct(symbol, 0.0)
            };
            block_params.push(value);
        }
        predictor.load_params(&block_params);

        for pos in ElementIterator::new(&dims, &block) {
            let idx = global_index(&block, &pos.index);
            let predicted = predictor.predict(&decoded, &dims, &idx);
            let symbol = indices[index_cursor];
            index_cursor += 1;
            let value = if symbol == 0 {
                let v = unpredictable[unpredictable_cursor];
                unpredictable_cursor += 1;
                v
            } else {
                quantizer.reconstruct(symbol, predicted)
            };
            decoded[pos.offset as usize] = value;
        }
    }

    match Array::new(dims, decoded) {
        Some(array) => Ok(array),
        None => error::decoding_error(DecodingError::Corrupt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Dims, ErrorBoundMode, PredictorFlags};

    fn ramp_config(dims: Dims) -> Config {
        Config {
            dims,
            error_bound_mode: ErrorBoundMode::Abs,
            abs_error_bound: 0.05,
            rel_error_bound: 0.0,
            block_size: 4,
            stride: 4,
            quantbin_cnt: 65536,
            predictors: PredictorFlags::LORENZO | PredictorFlags::REGRESSION,
            method_batch: 0,
        }
    }

    #[test]
    fn test_round_trip_ramp_is_within_error_bound() {
        let dims = Dims::new(vec![16]).unwrap();
        let config = ramp_config(dims.clone());
        let data: Vec<f32> = (0..16).map(|x| x as f32).collect();
        let array = Array::new(dims, data.clone()).unwrap();

        let bytes = compress(&config, &array).unwrap();
        let restored = decompress(&bytes).unwrap();

        for (a, b) in data.iter().zip(restored.as_slice().iter()) {
            assert!((a - b).abs() <= config.abs_error_bound + 1e-5);
        }
    }

    #[test]
    fn test_round_trip_constant_array() {
        let dims = Dims::new(vec![8]).unwrap();
        let config = ramp_config(dims.clone());
        let data = vec![3.0f32; 8];
        let array = Array::new(dims, data.clone()).unwrap();

        let bytes = compress(&config, &array).unwrap();
        let restored = decompress(&bytes).unwrap();
        assert_eq!(restored.as_slice(), data.as_slice());
    }

    #[test]
    fn test_round_trip_2d_with_edge_blocks() {
        let dims = Dims::new(vec![5, 5]).unwrap();
        let mut config = ramp_config(dims.clone());
        config.block_size = 2;
        config.stride = 2;
        let data: Vec<f32> = (0..25).map(|x| (x as f32) * 0.5).collect();
        let array = Array::new(dims, data.clone()).unwrap();

        let bytes = compress(&config, &array).unwrap();
        let restored = decompress(&bytes).unwrap();
        for (a, b) in data.iter().zip(restored.as_slice().iter()) {
            assert!((a - b).abs() <= config.abs_error_bound + 1e-5);
        }
    }

    #[test]
    fn test_header_records_the_configured_stride() {
        // Previously both BlockIterator::new calls hardcoded block_size as
        // the stride, so a config with stride != block_size silently lost
        // its stride and the header always reported block_size instead.
        let dims = Dims::new(vec![9]).unwrap();
        let mut config = ramp_config(dims.clone());
        config.block_size = 3;
        config.stride = 3;
        let data: Vec<f32> = (0..9).map(|x| x as f32).collect();
        let array = Array::new(dims, data).unwrap();

        let bytes = compress(&config, &array).unwrap();
        let payload = crate::format::unwrap(&bytes).unwrap();
        let (header, _) = crate::format::decode_header(&payload).unwrap();
        assert_eq!(header.stride, config.stride);
        assert_eq!(header.block_size, config.block_size);
    }
}
