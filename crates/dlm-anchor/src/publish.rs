//! Preparing a manifest for publication on chain.

use serde_json::Value;

use dlm_anchor_core::{
    build_anchor_from_manifest, build_data_script, compose_tagged_payload, data_output_size,
    derive_manifest_ids, validate_manifest_shape, AnchorTag, VersionId,
};

use crate::error::Result;

/// Everything needed to publish one manifest version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub version_id: VersionId,
    pub manifest_hash: VersionId,
    pub parents: Vec<VersionId>,
    /// `DLM1` tag followed by the encoded anchor record.
    pub payload: Vec<u8>,
    /// `OP_FALSE OP_RETURN <payload>`.
    pub script: Vec<u8>,
}

impl Publication {
    pub fn script_hex(&self) -> String {
        hex::encode(&self.script)
    }

    /// Serialized size of the zero-value output carrying [`Publication::script`].
    pub fn output_size(&self) -> usize {
        data_output_size(self.script.len())
    }
}

/// Validate `manifest` and build its on-chain anchor output.
pub fn prepare_publication(manifest: &Value) -> Result<Publication> {
    validate_manifest_shape(manifest)?;
    let ids = derive_manifest_ids(manifest)?;
    let built = build_anchor_from_manifest(manifest)?;
    let payload = compose_tagged_payload(AnchorTag::Dlm1, &built.cbor);
    let script = build_data_script(&payload);

    tracing::debug!(
        version_id = %ids.version_id,
        parents = built.parents.len(),
        script_len = script.len(),
        "prepared manifest publication"
    );

    Ok(Publication {
        version_id: ids.version_id,
        manifest_hash: ids.manifest_hash,
        parents: built.parents,
        payload,
        script,
    })
}
