//! Frontends that reshape a time-series or clustered-level workload into
//! the per-array problem `compressor::compress`/`decompress` solve, per
//! spec.md §4.G/§4.H. Both delegate every residual array they produce back
//! to `crate::compressor` rather than duplicating its entropy coding or
//! lossless wrapping; `exaalt` additionally entropy-codes its own
//! level-assignment stream, since that stream has no counterpart in the
//! per-array format `compressor` handles.

pub mod exaalt;
pub mod time_based;
