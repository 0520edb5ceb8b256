//! Manifest identifiers, lineage parents and anchor construction.

use serde_json::Value;

use crate::anchor::{encode_anchor, AnchorRecord};
use crate::canonical::canonicalize_manifest;
use crate::crypto::sha256;
use crate::error::ManifestError;
use crate::types::{is_hex64, VersionId};

/// Manifest document type accepted for publication.
pub const MANIFEST_TYPE: &str = "datasetVersionManifest";

/// Allowed values of `policy.classification`.
pub const CLASSIFICATIONS: [&str; 4] = ["public", "internal", "restricted", "clinical-research"];

/// Identifiers derived from a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestIds {
    pub version_id: VersionId,
    pub manifest_hash: VersionId,
}

/// Output of [`build_anchor_from_manifest`]: what gets embedded on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltAnchor {
    /// Encoded anchor record, without the protocol tag.
    pub cbor: Vec<u8>,
    pub version_id: VersionId,
    pub parents: Vec<VersionId>,
}

/// SHA-256 of the canonical form.
pub fn manifest_hash(manifest: &Value) -> VersionId {
    VersionId::from_bytes(sha256(canonicalize_manifest(manifest).as_bytes()))
}

/// Compute the manifest hash and check it against a declared `versionId`.
///
/// A declared `versionId` that is not 64 hex characters is ignored, since it
/// cannot name a hash at all.
pub fn derive_manifest_ids(manifest: &Value) -> Result<ManifestIds, ManifestError> {
    let obj = manifest.as_object().ok_or(ManifestError::NotAnObject)?;
    let computed = manifest_hash(manifest);

    if let Some(declared) = obj.get("versionId").and_then(Value::as_str) {
        if is_hex64(declared) && !declared.eq_ignore_ascii_case(&computed.to_hex()) {
            return Err(ManifestError::VersionIdMismatch {
                declared: declared.to_ascii_lowercase(),
                computed: computed.to_hex(),
            });
        }
    }

    Ok(ManifestIds {
        version_id: computed,
        manifest_hash: computed,
    })
}

/// Parents declared in `lineage.parents`: valid 64-hex entries only,
/// lowercased, first occurrence kept.
pub fn extract_parents(manifest: &Value) -> Vec<VersionId> {
    let Some(list) = manifest
        .pointer("/lineage/parents")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    let mut parents: Vec<VersionId> = Vec::new();
    for entry in list.iter().filter_map(Value::as_str) {
        if !is_hex64(entry) {
            continue;
        }
        if let Ok(id) = VersionId::from_hex(entry) {
            if !parents.contains(&id) {
                parents.push(id);
            }
        }
    }
    parents
}

/// Derive ids and parents from `manifest` and encode its anchor record.
pub fn build_anchor_from_manifest(manifest: &Value) -> Result<BuiltAnchor, ManifestError> {
    let ids = derive_manifest_ids(manifest)?;
    let parents = extract_parents(manifest);
    let record = AnchorRecord::new(ids.version_id).with_parents(parents.clone());
    let cbor = encode_anchor(&record)?;
    Ok(BuiltAnchor {
        cbor,
        version_id: ids.version_id,
        parents,
    })
}

/// Check the fields a publishable manifest must carry.
pub fn validate_manifest_shape(manifest: &Value) -> Result<(), ManifestError> {
    if !manifest.is_object() {
        return Err(ManifestError::NotAnObject);
    }

    if manifest.get("type").and_then(Value::as_str) != Some(MANIFEST_TYPE) {
        return Err(invalid("type", "must be \"datasetVersionManifest\""));
    }

    match manifest.get("datasetId").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => {}
        _ => return Err(invalid("datasetId", "must be a non-empty string")),
    }

    match manifest.pointer("/content/contentHash").and_then(Value::as_str) {
        Some(h) if is_hex64(h) => {}
        _ => return Err(invalid("content.contentHash", "must be 64 hex characters")),
    }

    if manifest
        .pointer("/provenance/createdAt")
        .and_then(Value::as_str)
        .is_none()
    {
        return Err(invalid("provenance.createdAt", "must be a string"));
    }

    if manifest.pointer("/policy/license").and_then(Value::as_str).is_none() {
        return Err(invalid("policy.license", "must be a string"));
    }

    match manifest.pointer("/policy/classification").and_then(Value::as_str) {
        Some(c) if CLASSIFICATIONS.contains(&c) => {}
        _ => return Err(invalid("policy.classification", "unknown classification")),
    }

    if let Some(parents) = manifest.pointer("/lineage/parents") {
        if !parents.is_array() {
            return Err(invalid("lineage.parents", "must be an array"));
        }
    }

    Ok(())
}

fn invalid(field: &'static str, problem: &'static str) -> ManifestError {
    ManifestError::InvalidField { field, problem }
}
