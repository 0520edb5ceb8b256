//! Error types for the anchoring core.
//!
//! Malformed binary input is a hard failure for that input. Callers decide
//! whether that rejects a submission or marks one lineage node unverifiable.

use thiserror::Error;

/// Errors raised while parsing raw binary structures (transactions, headers).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("unexpected end of input at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("varint value {0} does not fit the platform word")]
    VarIntOverflow(u64),

    #[error("block header must be 80 bytes, got {0}")]
    HeaderLength(usize),

    #[error("expected {expected} bytes for {field}, got {got}")]
    FieldLength {
        field: &'static str,
        expected: usize,
        got: usize,
    },
}

/// Errors raised by the on-chain anchor codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unexpected end of anchor record at offset {0}")]
    Truncated(usize),

    #[error("length {0} exceeds the 32-bit limit")]
    LengthTooLarge(u64),

    #[error("unsupported additional info {0} in item header")]
    UnsupportedHeader(u8),

    #[error("expected {expected}, found major type {found}")]
    UnexpectedType { expected: &'static str, found: u8 },

    #[error("map key is not valid UTF-8")]
    InvalidKey,

    #[error("skipped value nests deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("duplicate key {0:?}")]
    DuplicateKey(String),

    #[error("missing manifest hash")]
    MissingManifestHash,

    #[error("{field} must be 32 bytes, got {got}")]
    HashLength { field: &'static str, got: usize },

    #[error("duplicate parent {0}")]
    DuplicateParent(String),
}

/// Errors raised while deriving identifiers from a manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("manifest must be a JSON object")]
    NotAnObject,

    #[error("versionId-mismatch: declared {declared}, computed {computed}")]
    VersionIdMismatch { declared: String, computed: String },

    #[error("manifest field {field}: {problem}")]
    InvalidField {
        field: &'static str,
        problem: &'static str,
    },

    #[error("anchor encoding failed: {0}")]
    Codec(#[from] CodecError),
}

impl ManifestError {
    /// Stable reason code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            ManifestError::NotAnObject => "invalid-manifest",
            ManifestError::VersionIdMismatch { .. } => "versionId-mismatch",
            ManifestError::InvalidField { .. } => "schema-validation-failed",
            ManifestError::Codec(_) => "anchor-encoding-failed",
        }
    }
}
