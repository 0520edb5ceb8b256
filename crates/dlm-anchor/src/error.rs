//! Error types for the anchoring facade.

use dlm_anchor_core::{CodecError, ManifestError, ParseError};
use dlm_anchor_headers::HeaderError;
use dlm_anchor_identity::IdentityError;
use dlm_anchor_spv::BundleError;
use thiserror::Error;

/// Errors that can occur during anchoring and verification operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Raw transaction or header bytes could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Anchor record encoding or decoding failed.
    #[error("anchor codec error: {0}")]
    Codec(#[from] CodecError),

    /// A manifest was rejected.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Header loading failed.
    #[error("headers error: {0}")]
    Headers(#[from] HeaderError),

    /// A lineage bundle could not be fetched or checked.
    #[error("bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// Identity signing failed.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, Error>;
