//! # DLM Anchor Testkit
//!
//! Testing utilities for DLM anchoring.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known manifests and chain data with expected outputs
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Builders for transactions, header chains, envelopes and bundles
//!
//! ## Golden Vectors
//!
//! ```rust
//! use dlm_anchor_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches) in verify_all_vectors() {
//!     assert!(matches, "{name}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use dlm_anchor_core::manifest_hash;
//! use dlm_anchor_testkit::generators::{manifest_from_params, ManifestParams};
//!
//! proptest! {
//!     #[test]
//!     fn version_id_is_deterministic(params: ManifestParams) {
//!         let m = manifest_from_params(&params);
//!         prop_assert_eq!(manifest_hash(&m), manifest_hash(&m.clone()));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use dlm_anchor_spv::{verify_bundle, BundleOptions};
//! use dlm_anchor_testkit::LineageFixture;
//!
//! let lineage = LineageFixture::new(2, 5);
//! let report = verify_bundle(&lineage.bundle, &lineage.index(), &BundleOptions::default()).unwrap();
//! assert!(report.ok);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    envelope_for, sample_manifest, BlockRefStyle, HeaderChainBuilder, LineageFixture, TxBuilder,
};
pub use generators::{manifest_from_params, ManifestParams};
pub use vectors::{all_vectors, root_manifest, verify_all_vectors, GoldenVector};
