//! # DLM Anchor
//!
//! Anchor dataset version manifests on chain and verify their lineage with
//! SPV proofs.
//!
//! ## Overview
//!
//! A dataset version is described by a JSON manifest. Its identifier is the
//! SHA-256 of the manifest's canonical form. Publishing embeds a compact
//! record of that identifier and its parents in a data output; anyone holding
//! the transaction, a merkle path and a trusted header set can later prove
//! the version was anchored, and how deeply.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dlm_anchor::{AnchorVerifier, HeaderStore, VerifierConfig};
//!
//! async fn example() -> dlm_anchor::Result<()> {
//!     let config = VerifierConfig::from_env()?;
//!     let headers = Arc::new(HeaderStore::new());
//!     let verifier = AnchorVerifier::from_config(headers, config)?;
//!
//!     // Keep the handle alive while the headers should stay fresh.
//!     let _reload = verifier.start_hot_reload().await?;
//!
//!     let report = verifier.verify_version(&"ab".repeat(32)).await?;
//!     println!("ok={} weakest={}", report.ok, report.min_confirmations);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `dlm_anchor::core` - Scanning, codec, canonical JSON, merkle primitives
//! - `dlm_anchor::headers` - Header store and mirror reload
//! - `dlm_anchor::spv` - Envelope and bundle verification
//! - `dlm_anchor::identity` - Identity-signed request headers

pub mod config;
pub mod error;
pub mod publish;
pub mod verifier;

pub use dlm_anchor_core as core;
pub use dlm_anchor_headers as headers;
pub use dlm_anchor_identity as identity;
pub use dlm_anchor_spv as spv;

pub use config::VerifierConfig;
pub use error::{Error, Result};
pub use publish::{prepare_publication, Publication};
pub use verifier::{inspect_transaction, AnchorSighting, AnchorVerifier};

pub use dlm_anchor_core::{
    build_anchor_from_manifest, canonicalize_manifest, decode_anchor, derive_manifest_ids,
    encode_anchor, scan_transaction, AnchorRecord, AnchorTag, Hash256, VersionId,
};
pub use dlm_anchor_headers::{HeaderStore, HeaderStoreConfig, ReloadHandle};
pub use dlm_anchor_spv::{
    verify_bundle, verify_envelope, BundleOptions, BundleReport, EnvelopeOutcome, LineageBundle,
    RejectReason, SpvEnvelope,
};
