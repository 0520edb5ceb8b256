//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use dlm_anchor_core::{AnchorRecord, Hash256, VersionId};

/// Generate a random chain hash.
pub fn hash256() -> impl Strategy<Value = Hash256> {
    any::<[u8; 32]>().prop_map(Hash256::from_bytes)
}

/// Generate a random version id.
pub fn version_id() -> impl Strategy<Value = VersionId> {
    any::<[u8; 32]>().prop_map(VersionId::from_bytes)
}

/// Generate an anchor record with up to `max_parents` distinct parents.
pub fn anchor_record(max_parents: usize) -> impl Strategy<Value = AnchorRecord> {
    (
        version_id(),
        prop::collection::hash_set(any::<[u8; 32]>(), 0..=max_parents),
    )
        .prop_map(|(mh, parents)| {
            AnchorRecord::new(mh).with_parents(parents.into_iter().map(VersionId::from_bytes).collect())
        })
}

/// Generate a set of txids for one block.
pub fn block_txids(max_len: usize) -> impl Strategy<Value = Vec<Hash256>> {
    prop::collection::vec(hash256(), 1..=max_len)
}

/// Generate arbitrary bytes of at most `max_len`.
pub fn bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate an object key, including integer-like keys and non-ASCII ones.
pub fn json_key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z_][a-zA-Z0-9_]{0,8}".prop_map(String::from),
        (0u32..1000).prop_map(|n| n.to_string()),
        "[\u{e9}\u{3b1}\u{4e2d}\u{1f600}][a-z]{0,3}".prop_map(String::from),
        Just("versionId".to_string()),
        Just("signatures".to_string()),
    ]
}

/// Generate JSON values limited to integers, strings, booleans and nesting.
///
/// Floats are left out: their text form depends on the formatter, which is
/// exercised by dedicated vectors instead.
pub fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[ -~\u{e9}\u{2028}\n\t\"\\\\]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((json_key(), inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Parameters for generating a publishable manifest.
#[derive(Debug, Clone)]
pub struct ManifestParams {
    pub dataset_id: String,
    pub content_hash: [u8; 32],
    pub created_at: String,
    pub license: String,
    pub classification: &'static str,
    pub parents: Vec<VersionId>,
    /// Free-form extra content, placed under `extra`.
    pub extra: Option<Value>,
}

impl Arbitrary for ManifestParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            "[a-z][a-z0-9-]{0,15}",
            any::<[u8; 32]>(),
            "20[0-9]{2}-0[1-9]-[0-2][0-9]T00:00:00Z",
            prop_oneof![Just("MIT"), Just("CC-BY-4.0"), Just("proprietary")],
            prop_oneof![
                Just("public"),
                Just("internal"),
                Just("restricted"),
                Just("clinical-research")
            ],
            prop::collection::hash_set(any::<[u8; 32]>(), 0..4),
            prop::option::of(json_value()),
        )
            .prop_map(
                |(dataset_id, content_hash, created_at, license, classification, parents, extra)| {
                    ManifestParams {
                        dataset_id,
                        content_hash,
                        created_at,
                        license: license.to_string(),
                        classification,
                        parents: parents.into_iter().map(VersionId::from_bytes).collect(),
                        extra,
                    }
                },
            )
            .boxed()
    }
}

/// Build the manifest document described by `params`.
pub fn manifest_from_params(params: &ManifestParams) -> Value {
    let mut manifest = json!({
        "type": "datasetVersionManifest",
        "datasetId": params.dataset_id,
        "content": {"contentHash": hex::encode(params.content_hash)},
        "provenance": {"createdAt": params.created_at},
        "policy": {"license": params.license, "classification": params.classification},
    });
    if !params.parents.is_empty() {
        let parents: Vec<String> = params.parents.iter().map(VersionId::to_hex).collect();
        manifest["lineage"] = json!({ "parents": parents });
    }
    if let Some(extra) = &params.extra {
        manifest["extra"] = extra.clone();
    }
    manifest
}

/// Rebuild `value` with every object's keys inserted in reverse order.
pub fn reverse_key_order(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(reverse_key_order).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .rev()
                .map(|(k, v)| (k.clone(), reverse_key_order(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
