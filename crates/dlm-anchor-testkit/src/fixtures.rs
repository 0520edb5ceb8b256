//! Test fixtures and helpers.
//!
//! Builders for transactions, linked header chains, SPV envelopes and whole
//! lineage bundles. Everything produced here is internally consistent: the
//! headers link, the merkle paths lead to the header roots, and the anchors
//! commit to the manifests.

use serde_json::{json, Value};

use dlm_anchor_core::encoding::write_varint;
use dlm_anchor_core::{
    build_anchor_from_manifest, build_data_script, build_data_script_multi,
    compose_tagged_payload, manifest_hash, merkle_path_for, merkle_root_of, txid, AnchorTag,
    BlockHeader, Hash256, HEADER_LEN,
};
use dlm_anchor_headers::{CompactHeader, HeaderIndex, HeaderRecord};
use dlm_anchor_spv::{
    BlockRef, GraphEdge, GraphNode, LineageBundle, LineageGraph, ManifestEntry, MerkleProofJson,
    PathStepJson, ProofEntry, SpvEnvelope, BUNDLE_TYPE,
};

/// Builder for legacy-serialized transactions.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    version: i32,
    inputs: Vec<(Hash256, u32, Vec<u8>)>,
    outputs: Vec<(u64, Vec<u8>)>,
    lock_time: Option<u32>,
}

impl Default for TxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TxBuilder {
    /// Version 1, no inputs, no outputs, lock time 0.
    pub fn new() -> Self {
        Self {
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: Some(0),
        }
    }

    pub fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn input(mut self, prev_txid: Hash256, vout: u32, script_sig: &[u8]) -> Self {
        self.inputs.push((prev_txid, vout, script_sig.to_vec()));
        self
    }

    /// An input spending output 0 of a made-up transaction.
    pub fn funding_input(self, seed: u8) -> Self {
        self.input(Hash256::from_bytes([seed; 32]), 0, &[0x51])
    }

    pub fn output(mut self, satoshis: u64, script: &[u8]) -> Self {
        self.outputs.push((satoshis, script.to_vec()));
        self
    }

    /// A pay-to-pubkey-hash output to a fixed hash.
    pub fn p2pkh_output(self, satoshis: u64) -> Self {
        let mut script = vec![0x76, 0xa9, 0x14];
        script.extend_from_slice(&[0x42; 20]);
        script.extend_from_slice(&[0x88, 0xac]);
        self.output(satoshis, &script)
    }

    /// A zero-value `OP_FALSE OP_RETURN` output with the given pushes.
    pub fn data_output(self, pushes: &[&[u8]]) -> Self {
        self.output(0, &build_data_script_multi(pushes))
    }

    /// A zero-value output carrying `tag || body` in a single push.
    pub fn tagged_output(self, tag: AnchorTag, body: &[u8]) -> Self {
        self.output(0, &build_data_script(&compose_tagged_payload(tag, body)))
    }

    /// A `DLM1` anchor output for `manifest`.
    pub fn anchor_output(self, manifest: &Value) -> Self {
        let built = build_anchor_from_manifest(manifest)
            .unwrap_or_else(|e| panic!("fixture manifest must build: {e}"));
        self.tagged_output(AnchorTag::Dlm1, &built.cbor)
    }

    /// Omit the trailing lock time.
    pub fn without_lock_time(mut self) -> Self {
        self.lock_time = None;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut tx = self.version.to_le_bytes().to_vec();
        write_varint(&mut tx, self.inputs.len() as u64);
        for (prev, vout, script_sig) in &self.inputs {
            tx.extend_from_slice(&prev.to_internal());
            tx.extend_from_slice(&vout.to_le_bytes());
            write_varint(&mut tx, script_sig.len() as u64);
            tx.extend_from_slice(script_sig);
            tx.extend_from_slice(&u32::MAX.to_le_bytes());
        }
        write_varint(&mut tx, self.outputs.len() as u64);
        for (satoshis, script) in &self.outputs {
            tx.extend_from_slice(&satoshis.to_le_bytes());
            write_varint(&mut tx, script.len() as u64);
            tx.extend_from_slice(script);
        }
        if let Some(lock_time) = self.lock_time {
            tx.extend_from_slice(&lock_time.to_le_bytes());
        }
        tx
    }

    pub fn build_hex(&self) -> String {
        hex::encode(self.build())
    }
}

/// Builder for a linked chain of real 80-byte headers.
#[derive(Debug, Clone)]
pub struct HeaderChainBuilder {
    start_height: u64,
    roots: Vec<Hash256>,
    start_time: u32,
}

impl HeaderChainBuilder {
    pub fn new(start_height: u64) -> Self {
        Self {
            start_height,
            roots: Vec::new(),
            start_time: 1_700_000_000,
        }
    }

    /// Append a block with the given merkle root.
    pub fn block(mut self, merkle_root: Hash256) -> Self {
        self.roots.push(merkle_root);
        self
    }

    /// Append a block whose merkle root commits to `raw_txs`.
    pub fn block_with_txs(self, raw_txs: &[Vec<u8>]) -> Self {
        let txids: Vec<Hash256> = raw_txs.iter().map(|tx| txid(tx)).collect();
        let root = merkle_root_of(&txids).unwrap_or(Hash256::ZERO);
        self.block(root)
    }

    /// Append `count` blocks with filler roots.
    pub fn empty_blocks(mut self, count: usize) -> Self {
        for _ in 0..count {
            let n = self.roots.len() as u8;
            self.roots.push(Hash256::from_bytes([n.wrapping_add(0x80); 32]));
        }
        self
    }

    pub fn build(&self) -> Vec<CompactHeader> {
        let mut out: Vec<CompactHeader> = Vec::with_capacity(self.roots.len());
        let mut prev = Hash256::ZERO;
        for (i, root) in self.roots.iter().enumerate() {
            let time = self.start_time + 600 * i as u32;
            // `BlockHeader` caches its hash privately, so fill the public
            // fields on a parsed template and re-parse the serialized bytes.
            let mut header =
                BlockHeader::parse(&[0u8; HEADER_LEN]).expect("80 bytes always parse");
            header.version = 1;
            header.prev_hash = prev;
            header.merkle_root = *root;
            header.time = time;
            header.bits = 0x207f_ffff;
            header.nonce = i as u32;
            let raw: [u8; HEADER_LEN] = header.to_bytes();
            let hash = BlockHeader::parse(&raw)
                .expect("80 bytes always parse")
                .hash();
            out.push(CompactHeader {
                raw,
                hash,
                prev_hash: prev,
                merkle_root: *root,
                height: self.start_height + i as u64,
                time,
            });
            prev = hash;
        }
        out
    }

    pub fn index(&self) -> HeaderIndex {
        HeaderIndex::build(self.build())
            .unwrap_or_else(|e| panic!("fixture chain must validate: {e}"))
    }

    pub fn records(&self) -> Vec<HeaderRecord> {
        self.build().iter().map(CompactHeader::to_record).collect()
    }

    /// The chain as a JSON mirror artifact.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.records()).unwrap_or_default()
    }
}

/// How an envelope refers to its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRefStyle {
    /// The 80-byte header in place.
    Header,
    /// Block hash and height, resolved through the header index.
    Hash,
}

/// An envelope proving `raw_txs[position]` is in `block`.
///
/// `block.merkle_root` must be the root of `raw_txs`.
pub fn envelope_for(
    raw_txs: &[Vec<u8>],
    position: usize,
    block: &CompactHeader,
    style: BlockRefStyle,
) -> SpvEnvelope {
    let txids: Vec<Hash256> = raw_txs.iter().map(|tx| txid(tx)).collect();
    let path = merkle_path_for(&txids, position).unwrap_or_default();
    let leaf = txids[position].to_hex();
    SpvEnvelope {
        raw_tx: hex::encode(&raw_txs[position]),
        txid: Some(leaf.clone()),
        proof: MerkleProofJson {
            txid: leaf,
            merkle_root: block.merkle_root.to_hex(),
            path: path.into_iter().map(PathStepJson::from).collect(),
        },
        block: match style {
            BlockRefStyle::Header => BlockRef::Header {
                block_header: hex::encode(block.raw),
            },
            BlockRefStyle::Hash => BlockRef::Hash {
                block_hash: block.hash.to_hex(),
                block_height: Some(block.height),
            },
        },
    }
}

/// A minimal manifest that passes shape validation.
pub fn sample_manifest(dataset_id: &str, parents: &[String]) -> Value {
    let mut manifest = json!({
        "type": "datasetVersionManifest",
        "datasetId": dataset_id,
        "content": {"contentHash": "a".repeat(64)},
        "provenance": {"createdAt": "2024-01-01T00:00:00Z"},
        "policy": {"license": "MIT", "classification": "public"},
    });
    if !parents.is_empty() {
        manifest["lineage"] = json!({ "parents": parents });
    }
    manifest
}

/// A fully consistent linear lineage: generation 0 is the root, each later
/// generation names the previous one as its parent. Generation `g` is mined
/// at height `start + g`, followed by `extra_blocks` empty blocks.
#[derive(Debug, Clone)]
pub struct LineageFixture {
    pub manifests: Vec<Value>,
    /// Lowercase version ids, root first.
    pub version_ids: Vec<String>,
    pub raw_txs: Vec<Vec<u8>>,
    pub headers: Vec<CompactHeader>,
    pub bundle: LineageBundle,
}

impl LineageFixture {
    pub fn new(generations: usize, extra_blocks: usize) -> Self {
        assert!(generations > 0, "a lineage needs at least one version");

        let mut manifests = Vec::with_capacity(generations);
        let mut version_ids: Vec<String> = Vec::with_capacity(generations);
        for g in 0..generations {
            let parents: Vec<String> = version_ids.last().cloned().into_iter().collect();
            let manifest = sample_manifest(&format!("ds-{g}"), &parents);
            version_ids.push(manifest_hash(&manifest).to_hex());
            manifests.push(manifest);
        }

        // One anchor tx per block, next to a coinbase-like filler tx.
        let blocks: Vec<Vec<Vec<u8>>> = manifests
            .iter()
            .enumerate()
            .map(|(g, m)| {
                let filler = TxBuilder::new().funding_input(g as u8).p2pkh_output(5000).build();
                let anchor = TxBuilder::new()
                    .funding_input(0xa0 ^ g as u8)
                    .anchor_output(m)
                    .p2pkh_output(900)
                    .build();
                vec![filler, anchor]
            })
            .collect();

        let mut chain = HeaderChainBuilder::new(800_000);
        for txs in &blocks {
            chain = chain.block_with_txs(txs);
        }
        let headers = chain.empty_blocks(extra_blocks).build();

        let proofs = blocks
            .iter()
            .zip(&version_ids)
            .zip(&headers)
            .map(|((txs, id), header)| ProofEntry {
                version_id: id.clone(),
                envelope: envelope_for(txs, 1, header, BlockRefStyle::Hash),
            })
            .collect();

        let nodes = version_ids
            .iter()
            .zip(&blocks)
            .map(|(id, txs)| GraphNode {
                version_id: id.clone(),
                manifest_hash: id.clone(),
                txo: format!("{}:0", txid(&txs[1])),
            })
            .rev()
            .collect();
        let edges = version_ids
            .windows(2)
            .map(|pair| GraphEdge {
                child: pair[1].clone(),
                parent: pair[0].clone(),
            })
            .collect();

        let bundle = LineageBundle {
            bundle_type: BUNDLE_TYPE.into(),
            target: version_ids[generations - 1].clone(),
            graph: LineageGraph { nodes, edges },
            manifests: version_ids
                .iter()
                .zip(&manifests)
                .map(|(id, m)| ManifestEntry {
                    manifest_hash: id.clone(),
                    manifest: m.clone(),
                })
                .collect(),
            proofs,
            confs_used: None,
            best_height: headers.last().map(|h| h.height),
        };

        Self {
            manifests,
            version_ids,
            raw_txs: blocks.into_iter().map(|mut txs| txs.remove(1)).collect(),
            headers,
            bundle,
        }
    }

    pub fn index(&self) -> HeaderIndex {
        HeaderIndex::build(self.headers.clone())
            .unwrap_or_else(|e| panic!("fixture chain must validate: {e}"))
    }

    /// Version id of the newest generation.
    pub fn target(&self) -> &str {
        &self.bundle.target
    }

    /// Confirmations of generation `g` against the full chain.
    pub fn expected_confirmations(&self, g: usize) -> u64 {
        (self.headers.len() - g) as u64
    }

    /// Envelope of generation `g`.
    pub fn envelope(&self, g: usize) -> &SpvEnvelope {
        &self.bundle.proofs[g].envelope
    }
}
