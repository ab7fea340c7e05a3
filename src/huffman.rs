//! Canonical Huffman coder (component D, spec.md §4.D).
//!
//! Builds a code from symbol frequencies, canonicalizes it to code lengths
//! only (so the decoder rebuilds the same assignment from the length table
//! alone, per spec.md §4.D "canonical form"), and packs/unpacks codes
//! MSB-first via `bitio`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::bitio::{BitReader, BitWriter};
use crate::error::{self, DecodingError, EncodingError};
use crate::Result;

/// A symbol is a `u32` alphabet index (quantizer bin index or escape code).
pub type Symbol = u32;

/// Maximum canonical code length this coder will emit; longer codes are
/// rejected rather than silently truncated (spec.md §4.D "codes longer than
/// 32 bits are a hard encoding error").
const MAX_CODE_LEN: u32 = 32;

#[derive(Debug)]
struct HeapNode {
    freq: u64,
    // Tie-break by insertion order so the merge is deterministic across
    // platforms (spec.md §4.D "ties broken by first-seen symbol order").
    order: u64,
    node: Node,
}

impl PartialEq for HeapNode {
    fn eq(&self, other: &Self) -> bool {
        self.freq == other.freq && self.order == other.order
    }
}
impl Eq for HeapNode {}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the lowest frequency (and,
        // within a tie, the lowest insertion order) pops first.
        other
            .freq
            .cmp(&self.freq)
            .then_with(|| other.order.cmp(&self.order))
    }
}

#[derive(Debug)]
enum Node {
    Leaf(Symbol),
    Internal(Box<Node>, Box<Node>),
}

fn code_lengths(node: &Node, depth: u32, out: &mut Vec<(Symbol, u32)>) {
    match node {
        Node::Leaf(sym) => out.push((*sym, depth.max(1))),
        Node::Internal(left, right) => {
            code_lengths(left, depth + 1, out);
            code_lengths(right, depth + 1, out);
        }
    }
}

/// Builds per-symbol code lengths from `frequencies` (symbol -> count,
/// zero-frequency symbols are skipped). A single-symbol alphabet gets code
/// length 1 (spec.md §4.D "a lone symbol still costs one bit per
/// occurrence").
fn build_lengths(frequencies: &[(Symbol, u64)]) -> Vec<(Symbol, u32)> {
    let mut heap: BinaryHeap<HeapNode> = BinaryHeap::new();
    let mut order = 0u64;
    for &(sym, freq) in frequencies {
        if freq == 0 {
            continue;
        }
        heap.push(HeapNode {
            freq,
            order,
            node: Node::Leaf(sym),
        });
        order += 1;
    }

    if heap.is_empty() {
        return Vec::new();
    }
    if heap.len() == 1 {
        let only = heap.pop().unwrap();
        let mut out = Vec::new();
        code_lengths(&only.node, 0, &mut out);
        return out;
    }

    while heap.len() > 1 {
        let a = heap.pop().unwrap();
        let b = heap.pop().unwrap();
        heap.push(HeapNode {
            freq: a.freq + b.freq,
            order,
            node: Node::Internal(Box::new(a.node), Box::new(b.node)),
        });
        order += 1;
    }

    let root = heap.pop().unwrap();
    let mut out = Vec::new();
    code_lengths(&root.node, 0, &mut out);
    out
}

/// Builds a dense prefix lookup table of `2^max_len` slots: a codeword of
/// length `len < max_len` fills every slot whose top `len` bits equal its
/// code, so looking up any `max_len`-bit window yields the unique matching
/// codeword (and its length) in one step, per spec.md §4.D's O(1)-decode
/// requirement instead of a per-bit scan over `entries`.
fn build_decode_table(entries: &[(Symbol, u32, u32)]) -> (u32, Vec<Option<(Symbol, u32)>>) {
    let max_len = entries.iter().map(|&(_, len, _)| len).max().unwrap_or(0);
    if max_len == 0 {
        return (0, Vec::new());
    }
    let mut table = vec![None; 1usize << max_len];
    for &(sym, len, code) in entries {
        let shift = max_len - len;
        let base = (code as usize) << shift;
        for slot in table.iter_mut().skip(base).take(1usize << shift) {
            *slot = Some((sym, len));
        }
    }
    (max_len, table)
}

/// Canonical codeword assignment: symbols sorted by `(length, symbol)`,
/// consecutive codes of a given length, left-shifted when length increases
/// (the standard canonical-Huffman construction; spec.md §4.D).
#[derive(Debug, Clone)]
pub struct CanonicalCode {
    /// `(symbol, length, code)` sorted by `(length, symbol)`.
    entries: Vec<(Symbol, u32, u32)>,
    max_len: u32,
    decode_table: Vec<Option<(Symbol, u32)>>,
}

impl CanonicalCode {
    pub fn from_frequencies(frequencies: &[(Symbol, u64)]) -> Result<CanonicalCode> {
        let mut lengths = build_lengths(frequencies);
        if lengths.iter().any(|&(_, len)| len > MAX_CODE_LEN) {
            return error::encoding_error(EncodingError::LengthOverflow);
        }
        lengths.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

        let mut entries = Vec::with_capacity(lengths.len());
        let mut code: u32 = 0;
        let mut prev_len = 0u32;
        for (sym, len) in lengths {
            if prev_len != 0 {
                code <<= len - prev_len;
            }
            entries.push((sym, len, code));
            code += 1;
            prev_len = len;
        }
        let (max_len, decode_table) = build_decode_table(&entries);
        Ok(CanonicalCode { entries, max_len, decode_table })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Code length table in symbol order, suitable for serializing into the
    /// compressed format header (spec.md §6 "Huffman table segment").
    pub fn length_table(&self) -> Vec<(Symbol, u32)> {
        let mut out: Vec<(Symbol, u32)> = self.entries.iter().map(|&(s, l, _)| (s, l)).collect();
        out.sort_by_key(|&(sym, _)| sym);
        out
    }

    /// Rebuilds a `CanonicalCode` from a decoded length table (decoder side:
    /// the canonical assignment is fully determined by the lengths alone).
    pub fn from_length_table(mut table: Vec<(Symbol, u32)>) -> CanonicalCode {
        table.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        let mut entries = Vec::with_capacity(table.len());
        let mut code: u32 = 0;
        let mut prev_len = 0u32;
        for (sym, len) in table {
            if prev_len != 0 {
                code <<= len - prev_len;
            }
            entries.push((sym, len, code));
            code += 1;
            prev_len = len;
        }
        let (max_len, decode_table) = build_decode_table(&entries);
        CanonicalCode { entries, max_len, decode_table }
    }

    fn encode_one(&self, symbol: Symbol, writer: &mut BitWriter) -> Result<()> {
        match self.entries.iter().find(|&&(sym, _, _)| sym == symbol) {
            Some(&(_, len, code)) => {
                writer.write_bits(code, len);
                Ok(())
            }
            None => error::encoding_error(EncodingError::BufferOverflow),
        }
    }

    pub fn encode(&self, symbols: &[Symbol]) -> Result<Vec<u8>> {
        if self.entries.len() == 1 {
            // A single-symbol alphabet needs zero payload bits; the symbol
            // count alone (carried by the caller) is enough to reconstruct
            // the stream on decode.
            return Ok(Vec::new());
        }
        let mut writer = BitWriter::with_capacity(symbols.len() / 2 + 1);
        for &sym in symbols {
            self.encode_one(sym, &mut writer)?;
        }
        Ok(writer.into_bytes())
    }

    /// Decodes exactly `count` symbols from `data`. A single-symbol alphabet
    /// bypasses the bit reader entirely and just repeats that symbol;
    /// otherwise each symbol is one `decode_table` lookup against a
    /// `max_len`-bit lookahead window, rather than a per-bit scan.
    pub fn decode(&self, data: &[u8], count: usize) -> Result<Vec<Symbol>> {
        if self.entries.len() == 1 {
            return Ok(vec![self.entries[0].0; count]);
        }
        let mut reader = BitReader::new(data);
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let window = reader.peek_bits(self.max_len) as usize;
            match self.decode_table.get(window).and_then(|e| *e) {
                Some((sym, len)) => {
                    reader.consume_bits(len)?;
                    out.push(sym);
                }
                None => return error::decoding_error(DecodingError::Corrupt),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_skewed_frequencies() {
        let freqs = vec![(0, 50u64), (1, 10), (2, 1), (3, 1)];
        let code = CanonicalCode::from_frequencies(&freqs).unwrap();
        let symbols = vec![0u32, 0, 1, 0, 2, 0, 3, 1, 0];
        let bytes = code.encode(&symbols).unwrap();
        let decoded = code.decode(&bytes, symbols.len()).unwrap();
        assert_eq!(decoded, symbols);
    }

    #[test]
    fn test_single_symbol_alphabet_round_trips_without_bits() {
        let freqs = vec![(7u32, 100u64)];
        let code = CanonicalCode::from_frequencies(&freqs).unwrap();
        let symbols = vec![7u32; 20];
        let bytes = code.encode(&symbols).unwrap();
        assert!(bytes.is_empty());
        let decoded = code.decode(&bytes, symbols.len()).unwrap();
        assert_eq!(decoded, symbols);
    }

    #[test]
    fn test_length_table_round_trip_rebuilds_same_codes() {
        let freqs = vec![(0u32, 5u64), (1, 3), (2, 3), (3, 1), (4, 1)];
        let original = CanonicalCode::from_frequencies(&freqs).unwrap();
        let table = original.length_table();
        let rebuilt = CanonicalCode::from_length_table(table);
        let symbols = vec![0u32, 1, 2, 3, 4, 0, 1];
        let bytes = rebuilt.encode(&symbols).unwrap();
        let decoded = rebuilt.decode(&bytes, symbols.len()).unwrap();
        assert_eq!(decoded, symbols);
    }
}
