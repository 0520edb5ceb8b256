//! Error types for the header store.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading or fetching a header chain.
///
/// A load that fails with any of these leaves the served chain untouched.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The mirror artifact is not valid JSON of the expected shape.
    #[error("malformed headers artifact: {0}")]
    Malformed(String),

    /// A record could not be decoded.
    #[error("invalid header record at {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// A hex field has the wrong byte length.
    #[error("header {index}: {field} must be {expected} bytes, got {got}")]
    FieldLength {
        index: usize,
        field: &'static str,
        expected: usize,
        got: usize,
    },

    /// A record's fields disagree with its raw header bytes.
    #[error("header {index}: {field} does not match the raw header")]
    RawMismatch { index: usize, field: &'static str },

    /// The candidate chain has no headers.
    #[error("empty header chain")]
    EmptyChain,

    /// `prev_hash` does not point at the preceding header.
    #[error("chain break at height {height}: prev hash {got} != {expected}")]
    BrokenLink {
        height: u64,
        expected: String,
        got: String,
    },

    /// Heights are not consecutive.
    #[error("bad height at {index}: {got} does not follow {previous}")]
    HeightGap {
        index: usize,
        previous: u64,
        got: u64,
    },

    /// In the keyed artifact form, a key disagrees with its record's hash.
    #[error("key {key} does not match header hash {hash}")]
    KeyMismatch { key: String, hash: String },

    /// Reading a mirror file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An HTTP mirror request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// An HTTP mirror answered with a non-success status.
    #[error("mirror returned status {0}")]
    Status(u16),

    /// Fetching the mirror took longer than allowed.
    #[error("mirror fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for header operations.
pub type Result<T> = std::result::Result<T, HeaderError>;
