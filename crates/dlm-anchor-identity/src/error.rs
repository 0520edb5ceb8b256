//! Error types for the identity module.
//!
//! Verification never returns these; a failed check is an
//! [`crate::IdentityCheck::Rejected`]. Errors only arise on the signing side.

use thiserror::Error;

/// Errors that can occur while creating keys or signing.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The private key is not 64 hex characters or not a valid scalar.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// The nonce is not 32 hex characters.
    #[error("invalid nonce: expected 32 hex characters")]
    InvalidNonce,

    /// The signer failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Result type for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;
