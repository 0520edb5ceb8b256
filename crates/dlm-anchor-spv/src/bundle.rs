//! Lineage bundle verification.
//!
//! A bundle carries a version, its ancestors, their manifests and one SPV
//! envelope per version. Verification runs every node against the same
//! header lookup; the lineage is only as trustworthy as its least confirmed
//! ancestor.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use dlm_anchor_core::encoding::decode_hex;
use dlm_anchor_core::{
    decode_anchor, derive_manifest_ids, is_hex64, manifest_hash, scan_transaction, AnchorTag,
    ManifestError,
};
use dlm_anchor_headers::HeaderLookup;

use crate::envelope::{verify_envelope, EnvelopeOutcome, RejectReason, SpvEnvelope};
use crate::error::{BundleError, Result};

/// Value of `bundleType` for lineage bundles.
pub const BUNDLE_TYPE: &str = "datasetLineageBundle";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageBundle {
    pub bundle_type: String,
    /// Version the bundle was requested for.
    pub target: String,
    pub graph: LineageGraph,
    #[serde(default)]
    pub manifests: Vec<ManifestEntry>,
    #[serde(default)]
    pub proofs: Vec<ProofEntry>,
    /// Confirmation policy the provider assembled the bundle under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confs_used: Option<u64>,
    /// Provider's best height at assembly time. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_height: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageGraph {
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub version_id: String,
    pub manifest_hash: String,
    /// Anchoring output as `txid:vout`.
    pub txo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub child: String,
    pub parent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub manifest_hash: String,
    pub manifest: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofEntry {
    pub version_id: String,
    pub envelope: SpvEnvelope,
}

/// Bundle verification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleOptions {
    /// Confirmations every node's envelope must reach.
    pub min_confirmations: u64,
    /// Also check that manifests, version ids and on-chain anchors agree.
    pub check_bindings: bool,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            min_confirmations: 1,
            check_bindings: true,
        }
    }
}

impl BundleOptions {
    pub fn with_min_confirmations(mut self, min_confirmations: u64) -> Self {
        self.min_confirmations = min_confirmations;
        self
    }

    pub fn with_bindings(mut self, check_bindings: bool) -> Self {
        self.check_bindings = check_bindings;
        self
    }
}

/// Why one lineage node failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeFailure {
    /// No envelope was supplied for the node.
    MissingProof,
    /// The envelope did not verify.
    Envelope(RejectReason),
    /// No manifest was supplied under the node's manifest hash.
    MissingManifest,
    /// The supplied manifest does not hash to the node's manifest hash.
    ManifestHashMismatch,
    /// The manifest derives a different version id than the node claims.
    VersionIdMismatch,
    /// The node's `txo` names a different transaction than the proven one.
    TxoMismatch,
    /// The proven transaction carries no decodable DLM1 anchor.
    AnchorMissing,
    /// The transaction's anchors commit to other versions.
    AnchorMismatch,
}

impl NodeFailure {
    /// Stable reason code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            NodeFailure::MissingProof => "missing-envelope",
            NodeFailure::Envelope(reason) => reason.code(),
            NodeFailure::MissingManifest => "missing-manifest",
            NodeFailure::ManifestHashMismatch => "manifest-hash-mismatch",
            NodeFailure::VersionIdMismatch => "versionId-mismatch",
            NodeFailure::TxoMismatch => "txo-mismatch",
            NodeFailure::AnchorMissing => "anchor-missing",
            NodeFailure::AnchorMismatch => "anchor-mismatch",
        }
    }
}

impl Serialize for NodeFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Verification result for one lineage node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReport {
    /// Lowercase version id.
    pub version_id: String,
    pub ok: bool,
    pub confirmations: u64,
    #[serde(rename = "reason", skip_serializing_if = "Option::is_none")]
    pub failure: Option<NodeFailure>,
}

/// Aggregate result for a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleReport {
    /// True iff every node verified.
    pub ok: bool,
    /// Fewest confirmations observed across all nodes.
    pub min_confirmations: u64,
    /// One entry per graph node, in graph order.
    pub nodes: Vec<NodeReport>,
}

impl BundleReport {
    pub fn failures(&self) -> impl Iterator<Item = &NodeReport> {
        self.nodes.iter().filter(|n| !n.ok)
    }

    pub fn node(&self, version_id: &str) -> Option<&NodeReport> {
        let wanted = version_id.to_ascii_lowercase();
        self.nodes.iter().find(|n| n.version_id == wanted)
    }
}

/// Verify every node of `bundle` against `headers`.
///
/// Structural problems (wrong type, bad ids, dangling edges, cycles) fail
/// the whole call. Per-node problems are reported in the returned
/// [`BundleReport`].
pub fn verify_bundle<L>(
    bundle: &LineageBundle,
    headers: &L,
    options: &BundleOptions,
) -> Result<BundleReport>
where
    L: HeaderLookup + ?Sized,
{
    check_structure(bundle)?;

    let mut proofs: HashMap<String, &SpvEnvelope> = HashMap::new();
    for entry in &bundle.proofs {
        proofs
            .entry(entry.version_id.to_ascii_lowercase())
            .or_insert(&entry.envelope);
    }
    let manifests: HashMap<String, &Value> = bundle
        .manifests
        .iter()
        .map(|m| (m.manifest_hash.to_ascii_lowercase(), &m.manifest))
        .collect();

    let nodes: Vec<NodeReport> = bundle
        .graph
        .nodes
        .iter()
        .map(|node| {
            let report = verify_node(node, &proofs, &manifests, headers, options);
            if let Some(failure) = &report.failure {
                tracing::debug!(
                    version_id = %report.version_id,
                    reason = failure.code(),
                    confirmations = report.confirmations,
                    "lineage node failed verification"
                );
            }
            report
        })
        .collect();

    Ok(BundleReport {
        ok: nodes.iter().all(|n| n.ok),
        min_confirmations: nodes.iter().map(|n| n.confirmations).min().unwrap_or(0),
        nodes,
    })
}

fn verify_node<L>(
    node: &GraphNode,
    proofs: &HashMap<String, &SpvEnvelope>,
    manifests: &HashMap<String, &Value>,
    headers: &L,
    options: &BundleOptions,
) -> NodeReport
where
    L: HeaderLookup + ?Sized,
{
    let version_id = node.version_id.to_ascii_lowercase();
    let (confirmations, failure) = match proofs.get(&version_id) {
        None => (0, Some(NodeFailure::MissingProof)),
        Some(envelope) => match verify_envelope(envelope, headers, options.min_confirmations) {
            EnvelopeOutcome::Rejected(reason) => (
                EnvelopeOutcome::Rejected(reason).confirmations(),
                Some(NodeFailure::Envelope(reason)),
            ),
            EnvelopeOutcome::Verified(inclusion) => {
                let failure = if options.check_bindings {
                    check_bindings(node, &version_id, envelope, &inclusion.txid.to_hex(), manifests)
                        .err()
                } else {
                    None
                };
                (inclusion.confirmations, failure)
            }
        },
    };

    NodeReport {
        version_id,
        ok: failure.is_none(),
        confirmations,
        failure,
    }
}

/// Tie a node to its manifest and to the anchor in its proven transaction.
fn check_bindings(
    node: &GraphNode,
    version_id: &str,
    envelope: &SpvEnvelope,
    proven_txid: &str,
    manifests: &HashMap<String, &Value>,
) -> std::result::Result<(), NodeFailure> {
    let declared_hash = node.manifest_hash.to_ascii_lowercase();
    let manifest = manifests
        .get(&declared_hash)
        .ok_or(NodeFailure::MissingManifest)?;
    if manifest_hash(manifest).to_hex() != declared_hash {
        return Err(NodeFailure::ManifestHashMismatch);
    }
    match derive_manifest_ids(manifest) {
        Ok(ids) if ids.version_id.to_hex() == version_id => {}
        Ok(_) | Err(ManifestError::VersionIdMismatch { .. }) => {
            return Err(NodeFailure::VersionIdMismatch)
        }
        Err(_) => return Err(NodeFailure::ManifestHashMismatch),
    }

    let (txo_txid, txo_vout) = split_txo(&node.txo);
    if txo_txid.is_some_and(|t| t != proven_txid) {
        return Err(NodeFailure::TxoMismatch);
    }

    // The envelope already verified, so the raw transaction decodes as hex.
    let raw = decode_hex(&envelope.raw_tx).map_err(|_| NodeFailure::AnchorMissing)?;
    let outputs = scan_transaction(&raw).map_err(|_| NodeFailure::AnchorMissing)?;
    let anchors: Vec<_> = outputs
        .iter()
        .filter(|o| o.tag == Some(AnchorTag::Dlm1))
        .filter(|o| txo_vout.map_or(true, |vout| o.vout == vout))
        .filter_map(|o| o.anchor_payload().and_then(|p| decode_anchor(p).ok()))
        .collect();
    if anchors.is_empty() {
        return Err(NodeFailure::AnchorMissing);
    }
    if anchors
        .iter()
        .any(|a| a.manifest_hash.to_hex() == version_id)
    {
        Ok(())
    } else {
        Err(NodeFailure::AnchorMismatch)
    }
}

/// Split `txid:vout`. Either part is `None` when absent or unparseable.
fn split_txo(txo: &str) -> (Option<String>, Option<u32>) {
    let (txid, vout) = match txo.split_once(':') {
        Some((txid, vout)) => (txid, vout.parse().ok()),
        None => (txo, None),
    };
    let txid = is_hex64(txid).then(|| txid.to_ascii_lowercase());
    (txid, vout)
}

fn check_structure(bundle: &LineageBundle) -> Result<()> {
    if bundle.bundle_type != BUNDLE_TYPE {
        return Err(BundleError::malformed(format!(
            "bundleType must be {BUNDLE_TYPE:?}, got {:?}",
            bundle.bundle_type
        )));
    }
    if !is_hex64(&bundle.target) {
        return Err(BundleError::malformed("target is not a 64-hex version id"));
    }

    let mut ids = HashSet::new();
    for node in &bundle.graph.nodes {
        if !is_hex64(&node.version_id) {
            return Err(BundleError::malformed(format!(
                "node versionId {:?} is not 64-hex",
                node.version_id
            )));
        }
        if !is_hex64(&node.manifest_hash) {
            return Err(BundleError::malformed(format!(
                "node {} manifestHash is not 64-hex",
                node.version_id
            )));
        }
        if !ids.insert(node.version_id.to_ascii_lowercase()) {
            return Err(BundleError::malformed(format!(
                "duplicate node {}",
                node.version_id
            )));
        }
    }
    if !ids.contains(&bundle.target.to_ascii_lowercase()) {
        return Err(BundleError::malformed("target is not a graph node"));
    }

    let mut parents: HashMap<String, Vec<String>> = HashMap::new();
    for edge in &bundle.graph.edges {
        let child = edge.child.to_ascii_lowercase();
        let parent = edge.parent.to_ascii_lowercase();
        for end in [&child, &parent] {
            if !ids.contains(end) {
                return Err(BundleError::malformed(format!(
                    "edge references unknown node {end}"
                )));
            }
        }
        parents.entry(child).or_default().push(parent);
    }
    if has_cycle(&ids, &parents) {
        return Err(BundleError::malformed("lineage graph contains a cycle"));
    }
    Ok(())
}

/// Iterative three-color DFS over child -> parent edges.
fn has_cycle(ids: &HashSet<String>, parents: &HashMap<String, Vec<String>>) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    for start in ids {
        if marks.contains_key(start.as_str()) {
            continue;
        }
        let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
        marks.insert(start.as_str(), Mark::Visiting);
        while let Some((node, next)) = stack.pop() {
            let edges = parents.get(node).map(Vec::as_slice).unwrap_or_default();
            match edges.get(next) {
                Some(parent) => {
                    stack.push((node, next + 1));
                    match marks.get(parent.as_str()) {
                        Some(Mark::Visiting) => return true,
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(parent.as_str(), Mark::Visiting);
                            stack.push((parent.as_str(), 0));
                        }
                    }
                }
                None => {
                    marks.insert(node, Mark::Done);
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{BlockRef, MerkleProofJson, PathStepJson};
    use dlm_anchor_core::{
        build_anchor_from_manifest, build_data_script, compose_tagged_payload, merkle_path_for,
        merkle_root_of, txid, BlockHeader, Hash256, HEADER_LEN,
    };
    use dlm_anchor_headers::{CompactHeader, HeaderIndex};
    use serde_json::json;

    fn manifest(dataset: &str, parents: &[&str]) -> Value {
        json!({
            "type": "datasetVersionManifest",
            "datasetId": dataset,
            "content": {"contentHash": "a".repeat(64)},
            "provenance": {"createdAt": "2024-01-01T00:00:00Z"},
            "policy": {"license": "MIT", "classification": "public"},
            "lineage": {"parents": parents},
        })
    }

    /// Legacy tx with one funding input and one anchor output.
    fn anchor_tx(manifest: &Value) -> Vec<u8> {
        let built = build_anchor_from_manifest(manifest).unwrap();
        let script = build_data_script(&compose_tagged_payload(AnchorTag::Dlm1, &built.cbor));
        let mut tx = vec![1, 0, 0, 0, 1];
        tx.extend_from_slice(&[0x11; 32]);
        tx.extend_from_slice(&0u32.to_le_bytes());
        tx.push(0);
        tx.extend_from_slice(&u32::MAX.to_le_bytes());
        tx.push(1);
        tx.extend_from_slice(&0u64.to_le_bytes());
        tx.push(script.len() as u8);
        tx.extend_from_slice(&script);
        tx.extend_from_slice(&0u32.to_le_bytes());
        tx
    }

    fn header(prev: Hash256, root: Hash256, height: u64) -> CompactHeader {
        let mut raw = [0u8; HEADER_LEN];
        raw[0] = 1;
        raw[4..36].copy_from_slice(&prev.to_internal());
        raw[36..68].copy_from_slice(&root.to_internal());
        let parsed = BlockHeader::parse(&raw).unwrap();
        CompactHeader {
            raw,
            hash: parsed.hash(),
            prev_hash: prev,
            merkle_root: root,
            height,
            time: 0,
        }
    }

    struct Lineage {
        bundle: LineageBundle,
        index: HeaderIndex,
        parent_id: String,
        child_id: String,
    }

    /// Parent anchored at height 100, child at the tip (height 101).
    fn lineage() -> Lineage {
        let parent = manifest("ds1", &[]);
        let parent_id = manifest_hash(&parent).to_hex();
        let child = manifest("ds1", &[parent_id.as_str()]);
        let child_id = manifest_hash(&child).to_hex();

        let parent_tx = anchor_tx(&parent);
        let child_tx = anchor_tx(&child);
        let filler = Hash256::from_bytes([0xee; 32]);

        let parent_txids = vec![txid(&parent_tx), filler];
        let child_txids = vec![filler, txid(&child_tx)];
        let h100 = header(Hash256::ZERO, merkle_root_of(&parent_txids).unwrap(), 100);
        let h101 = header(h100.hash, merkle_root_of(&child_txids).unwrap(), 101);

        let envelope = |raw: &[u8], txids: &[Hash256], i: usize, block: &CompactHeader| {
            SpvEnvelope {
                raw_tx: hex::encode(raw),
                txid: Some(txids[i].to_hex()),
                proof: MerkleProofJson {
                    txid: txids[i].to_hex(),
                    merkle_root: block.merkle_root.to_hex(),
                    path: merkle_path_for(txids, i)
                        .unwrap()
                        .into_iter()
                        .map(PathStepJson::from)
                        .collect(),
                },
                block: BlockRef::Hash {
                    block_hash: block.hash.to_hex(),
                    block_height: Some(block.height),
                },
            }
        };

        let bundle = LineageBundle {
            bundle_type: BUNDLE_TYPE.into(),
            target: child_id.clone(),
            graph: LineageGraph {
                nodes: vec![
                    GraphNode {
                        version_id: child_id.clone(),
                        manifest_hash: child_id.clone(),
                        txo: format!("{}:0", txid(&child_tx)),
                    },
                    GraphNode {
                        version_id: parent_id.clone(),
                        manifest_hash: parent_id.clone(),
                        txo: format!("{}:0", txid(&parent_tx)),
                    },
                ],
                edges: vec![GraphEdge {
                    child: child_id.clone(),
                    parent: parent_id.clone(),
                }],
            },
            manifests: vec![
                ManifestEntry {
                    manifest_hash: child_id.clone(),
                    manifest: child,
                },
                ManifestEntry {
                    manifest_hash: parent_id.clone(),
                    manifest: parent,
                },
            ],
            proofs: vec![
                ProofEntry {
                    version_id: child_id.clone(),
                    envelope: envelope(&child_tx, &child_txids, 1, &h101),
                },
                ProofEntry {
                    version_id: parent_id.clone(),
                    envelope: envelope(&parent_tx, &parent_txids, 0, &h100),
                },
            ],
            confs_used: None,
            best_height: None,
        };

        Lineage {
            bundle,
            index: HeaderIndex::build(vec![h100, h101]).unwrap(),
            parent_id,
            child_id,
        }
    }

    #[test]
    fn test_valid_lineage_reports_weakest_depth() {
        let l = lineage();
        let report = verify_bundle(&l.bundle, &l.index, &BundleOptions::default()).unwrap();
        assert!(report.ok, "{report:?}");
        assert_eq!(report.min_confirmations, 1);
        assert_eq!(report.node(&l.parent_id).unwrap().confirmations, 2);
        assert_eq!(report.node(&l.child_id.to_uppercase()).unwrap().confirmations, 1);
    }

    #[test]
    fn test_unconfirmed_node_fails_bundle() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut l = lineage();
        // Point the child at a header the index does not know.
        let tip = l.index.tip().unwrap().clone();
        let orphan = header(tip.hash, tip.merkle_root, tip.height + 1);
        l.bundle.proofs[0].envelope.block = BlockRef::Header {
            block_header: hex::encode(orphan.raw),
        };
        l.bundle.proofs[0].envelope.proof.merkle_root = tip.merkle_root.to_hex();

        let report = verify_bundle(&l.bundle, &l.index, &BundleOptions::default()).unwrap();
        assert!(!report.ok);
        assert_eq!(report.min_confirmations, 0);
        let child = report.node(&l.child_id).unwrap();
        assert_eq!(
            child.failure.map(|f| f.code()),
            Some("insufficient-confs")
        );
        assert!(report.node(&l.parent_id).unwrap().ok);

        let relaxed = BundleOptions::default().with_min_confirmations(0);
        assert!(verify_bundle(&l.bundle, &l.index, &relaxed).unwrap().ok);
    }

    #[test]
    fn test_missing_proof_and_manifest() {
        let mut l = lineage();
        l.bundle.proofs.remove(1);
        l.bundle.manifests.remove(0);
        let report = verify_bundle(&l.bundle, &l.index, &BundleOptions::default()).unwrap();
        assert_eq!(
            report.node(&l.parent_id).unwrap().failure,
            Some(NodeFailure::MissingProof)
        );
        assert_eq!(
            report.node(&l.child_id).unwrap().failure,
            Some(NodeFailure::MissingManifest)
        );
        assert_eq!(report.failures().count(), 2);

        let unbound = BundleOptions::default().with_bindings(false);
        let report = verify_bundle(&l.bundle, &l.index, &unbound).unwrap();
        assert!(report.node(&l.child_id).unwrap().ok);
    }

    #[test]
    fn test_binding_failures() {
        // Swap the envelopes: each proof is valid but anchors the other version.
        let mut l = lineage();
        let (a, b) = (l.bundle.proofs[0].envelope.clone(), l.bundle.proofs[1].envelope.clone());
        l.bundle.proofs[0].envelope = b;
        l.bundle.proofs[1].envelope = a;
        for node in &mut l.bundle.graph.nodes {
            node.txo.clear();
        }
        let report = verify_bundle(&l.bundle, &l.index, &BundleOptions::default()).unwrap();
        assert_eq!(
            report.node(&l.child_id).unwrap().failure,
            Some(NodeFailure::AnchorMismatch)
        );

        let mut l = lineage();
        l.bundle.graph.nodes[1].txo = format!("{}:0", "ab".repeat(32));
        let report = verify_bundle(&l.bundle, &l.index, &BundleOptions::default()).unwrap();
        assert_eq!(
            report.node(&l.parent_id).unwrap().failure,
            Some(NodeFailure::TxoMismatch)
        );

        let mut l = lineage();
        l.bundle.manifests[1].manifest["datasetId"] = json!("tampered");
        let report = verify_bundle(&l.bundle, &l.index, &BundleOptions::default()).unwrap();
        assert_eq!(
            report.node(&l.parent_id).unwrap().failure,
            Some(NodeFailure::ManifestHashMismatch)
        );

        let mut l = lineage();
        l.bundle.manifests[1].manifest["versionId"] = json!("cd".repeat(32));
        let report = verify_bundle(&l.bundle, &l.index, &BundleOptions::default()).unwrap();
        assert_eq!(
            report.node(&l.parent_id).unwrap().failure,
            Some(NodeFailure::VersionIdMismatch)
        );
    }

    #[test]
    fn test_structural_errors() {
        let cases: Vec<Box<dyn Fn(&mut LineageBundle)>> = vec![
            Box::new(|b| b.bundle_type = "other".into()),
            Box::new(|b| b.target = "zz".into()),
            Box::new(|b| b.target = "00".repeat(32)),
            Box::new(|b| b.graph.nodes[1].version_id = b.graph.nodes[0].version_id.to_uppercase()),
            Box::new(|b| b.graph.nodes[0].manifest_hash = "short".into()),
            Box::new(|b| b.graph.edges[0].parent = "11".repeat(32)),
            Box::new(|b| {
                let edge = b.graph.edges[0].clone();
                b.graph.edges.push(GraphEdge {
                    child: edge.parent,
                    parent: edge.child,
                })
            }),
        ];
        for mutate in cases {
            let mut l = lineage();
            mutate(&mut l.bundle);
            assert!(matches!(
                verify_bundle(&l.bundle, &l.index, &BundleOptions::default()),
                Err(BundleError::Malformed(_))
            ));
        }
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let mut l = lineage();
        l.bundle.graph.edges.push(GraphEdge {
            child: l.parent_id.clone(),
            parent: l.parent_id.clone(),
        });
        assert!(verify_bundle(&l.bundle, &l.index, &BundleOptions::default()).is_err());
    }

    #[test]
    fn test_report_json_shape() {
        let mut l = lineage();
        l.bundle.proofs.remove(1);
        let report = verify_bundle(&l.bundle, &l.index, &BundleOptions::default()).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["minConfirmations"], 0);
        assert_eq!(value["nodes"][1]["reason"], "missing-envelope");
        assert!(value["nodes"][0].get("reason").is_none());
    }

    #[test]
    fn test_bundle_json_roundtrip_shape() {
        let l = lineage();
        let text = serde_json::to_string(&l.bundle).unwrap();
        assert!(text.contains("\"bundleType\":\"datasetLineageBundle\""));
        assert!(text.contains("\"manifestHash\""));
        let back: LineageBundle = serde_json::from_str(&text).unwrap();
        assert_eq!(back, l.bundle);
    }
}
