//! # DLM Anchor SPV
//!
//! Proof-of-inclusion verification for anchored dataset versions.
//!
//! ## Overview
//!
//! An [`SpvEnvelope`] lets anyone holding a raw transaction, its merkle path
//! and a block reference prove that the transaction was mined, using only a
//! header set they trust. A [`LineageBundle`] extends this to a version and
//! all of its ancestors.
//!
//! ## Key Types
//!
//! - [`verify_envelope`] - Single envelope, returns an [`EnvelopeOutcome`]
//! - [`verify_bundle`] - Every node of a lineage, returns a [`BundleReport`]
//! - [`BundleProvider`] - Where bundles come from ([`HttpBundleProvider`], [`StaticBundleProvider`])
//! - [`verify_version`] - Fetch with a timeout, then verify
//!
//! ## Outcomes
//!
//! Verification failures are values, not errors. [`RejectReason`] and
//! [`NodeFailure`] carry stable reason codes such as `insufficient-confs`.
//! [`BundleError`] is reserved for bundles that cannot be checked at all.

pub mod bundle;
pub mod envelope;
pub mod error;
pub mod provider;

pub use bundle::{
    verify_bundle, BundleOptions, BundleReport, GraphEdge, GraphNode, LineageBundle,
    LineageGraph, ManifestEntry, NodeFailure, NodeReport, ProofEntry, BUNDLE_TYPE,
};
pub use envelope::{
    verify_envelope, BlockRef, EnvelopeOutcome, EnvelopeReport, Inclusion, MerkleProofJson,
    PathStepJson, RejectReason, SpvEnvelope,
};
pub use error::{BundleError, Result};
pub use provider::{
    verify_version, BundleProvider, HttpBundleProvider, StaticBundleProvider, DEFAULT_DEPTH,
};
