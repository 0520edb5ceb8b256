//! Error types for bundle verification and fetching.
//!
//! A bundle that parses but fails verification is not an error; it yields a
//! [`crate::BundleReport`] with `ok == false`. These errors cover bundles
//! that cannot be checked at all.

use std::time::Duration;

use thiserror::Error;

/// Errors that prevent a lineage bundle from being verified.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The bundle is structurally invalid.
    #[error("malformed bundle: {0}")]
    Malformed(String),

    /// The bundle provider could not be reached.
    #[error("bundle provider error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bundle provider answered with a non-success status.
    #[error("bundle provider returned status {0}")]
    Status(u16),

    /// The bundle provider did not answer in time.
    #[error("bundle fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The provider's response is not a bundle.
    #[error("invalid bundle JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider has no bundle for the requested version.
    #[error("no bundle for version {0}")]
    NotFound(String),
}

impl BundleError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        BundleError::Malformed(msg.into())
    }
}

/// Result type for bundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;
