//! The `error` module defines the common error types.

use std::error;
use std::fmt;
use std::io;

use super::Result;

/// Reasons a `Config` was rejected before any compression work started.
#[derive(Debug)]
pub enum ConfigError {
    /// `dims` was empty or had more than 4 entries, or contained a zero.
    InvalidDims,
    /// Neither an absolute nor a relative error bound was usable (e.g. zero
    /// or negative after derivation).
    InvalidErrorBound,
    /// None of `lorenzo`, `lorenzo2`, `regression` was enabled.
    EmptyPredictorSet,
    /// `quantbinCnt` was odd, zero, or radius ended up below 1.
    InvalidQuantBinCount,
    /// The Exaalt/VQ frontend was requested with `level_count == 0` or
    /// `level_count` exceeding 25% of the per-step sample count.
    IncompatibleFrontend,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigError::InvalidDims => write!(f, "dims must have 1 to 4 positive entries"),
            ConfigError::InvalidErrorBound => write!(f, "error bound must be a positive finite number"),
            ConfigError::EmptyPredictorSet => write!(f, "at least one predictor must be enabled"),
            ConfigError::InvalidQuantBinCount => write!(f, "quantbinCnt must be even and yield radius >= 1"),
            ConfigError::IncompatibleFrontend => {
                write!(f, "frontend is not compatible with the supplied level parameters")
            }
        }
    }
}

/// Reasons encoding (compression) failed partway through.
#[derive(Debug)]
pub enum EncodingError {
    /// A canonical Huffman code length exceeded the hard cap (32 bits).
    LengthOverflow,
    /// The predicted output size for a scratch buffer was exceeded.
    BufferOverflow,
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EncodingError::LengthOverflow => write!(f, "huffman code length exceeds the 32-bit cap"),
            EncodingError::BufferOverflow => write!(f, "predicted output size exceeded scratch buffer"),
        }
    }
}

/// Reasons decoding (decompression) failed partway through.
#[derive(Debug)]
pub enum DecodingError {
    /// Magic bytes or version byte did not match.
    Magic,
    /// Input bytes ended before the declared stream lengths were satisfied.
    Truncated,
    /// Data was internally inconsistent: out-of-range bin index, a Huffman
    /// code with no match in the table, or an unknown predictor tag.
    Corrupt,
}

impl fmt::Display for DecodingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodingError::Magic => write!(f, "magic bytes or version do not match"),
            DecodingError::Truncated => write!(f, "input ended before declared stream lengths were satisfied"),
            DecodingError::Corrupt => write!(f, "decoded stream is internally inconsistent"),
        }
    }
}

/// `Error` provides an enumeration of all possible errors reported by the
/// core compression pipeline.
#[derive(Debug)]
pub enum Error {
    /// The supplied configuration was rejected before any work started.
    Config(ConfigError),
    /// Compression failed partway through.
    Encoding(EncodingError),
    /// Decompression failed partway through.
    Decoding(DecodingError),
    /// An IO error surfaced unchanged from a collaborator (e.g. the file
    /// back-end, not used by the core itself).
    IoError(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Config(ref err) => write!(f, "invalid configuration: {}", err),
            Error::Encoding(ref err) => write!(f, "encoding failed: {}", err),
            Error::Decoding(ref err) => write!(f, "decoding failed: {}", err),
            Error::IoError(ref err) => err.fmt(f),
        }
    }
}

impl error::Error for Error {
    fn cause(&self) -> Option<&dyn error::Error> {
        match *self {
            Error::IoError(ref err) => Some(err),
            Error::Config(_) | Error::Encoding(_) | Error::Decoding(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

impl From<EncodingError> for Error {
    fn from(err: EncodingError) -> Error {
        Error::Encoding(err)
    }
}

impl From<DecodingError> for Error {
    fn from(err: DecodingError) -> Error {
        Error::Decoding(err)
    }
}

/// Builds a config error result.
pub fn config_error<T>(kind: ConfigError) -> Result<T> {
    Err(Error::Config(kind))
}

/// Builds an encoding error result.
pub fn encoding_error<T>(kind: EncodingError) -> Result<T> {
    Err(Error::Encoding(kind))
}

/// Builds a decoding error result.
pub fn decoding_error<T>(kind: DecodingError) -> Result<T> {
    Err(Error::Decoding(kind))
}
