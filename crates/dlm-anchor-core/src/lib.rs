//! # DLM Anchor Core
//!
//! Pure primitives for anchoring dataset manifests on chain and proving
//! their inclusion.
//!
//! This crate contains no I/O, no storage, no networking. Every function is
//! a deterministic computation over caller-supplied bytes and is safe on
//! adversarial input.
//!
//! ## Key Types
//!
//! - [`DataOutput`] - A data-carrying output found by [`scan_transaction`]
//! - [`AnchorRecord`] - The compact on-chain commitment (`mh` + parents)
//! - [`VersionId`] - Content-addressed manifest identifier (SHA-256)
//! - [`Hash256`] - Chain hash (txid, block hash, merkle root) in display order
//! - [`BlockHeader`] - Parsed 80-byte block header
//!
//! ## Canonicalization
//!
//! Manifest identifiers are computed over a canonical JSON form. See the
//! [`canonical`] module.

pub mod anchor;
pub mod canonical;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod header;
pub mod manifest;
pub mod merkle;
pub mod scanner;
pub mod script;
pub mod types;

pub use anchor::{decode_anchor, encode_anchor, AnchorRecord};
pub use canonical::canonicalize_manifest;
pub use crypto::{sha256, sha256_hex, sha256d, txid};
pub use error::{CodecError, ManifestError, ParseError};
pub use header::{BlockHeader, HEADER_LEN};
pub use manifest::{
    build_anchor_from_manifest, derive_manifest_ids, extract_parents, manifest_hash,
    validate_manifest_shape, BuiltAnchor, ManifestIds,
};
pub use merkle::{
    compute_merkle_root, merkle_path_for, merkle_root_of, verify_merkle_path, MerkleStep, Position,
};
pub use scanner::{
    detect_anchor_tag, first_data_output, scan_transaction, scan_transaction_hex, AnchorTag,
    DataOutput,
};
pub use script::{build_data_script, build_data_script_multi, data_output_size};
pub use types::{is_hex64, Hash256, VersionId};

/// Prepend a protocol tag to an anchor body, producing a single push payload.
pub fn compose_tagged_payload(tag: AnchorTag, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + body.len());
    out.extend_from_slice(tag.as_bytes());
    out.extend_from_slice(body);
    out
}
