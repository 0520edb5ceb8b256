//! SPV envelope verification.
//!
//! An envelope carries a raw transaction, a merkle path for its txid and a
//! reference to the containing block. Verification is a pure function of the
//! envelope and a header lookup; it short-circuits on the first failure.
//!
//! Every expected failure is a [`RejectReason`], never an error or a panic.

use serde::{Deserialize, Serialize};
use std::fmt;

use dlm_anchor_core::encoding::decode_hex;
use dlm_anchor_core::{compute_merkle_root, txid, BlockHeader, Hash256, MerkleStep, Position};
use dlm_anchor_headers::HeaderLookup;

/// Wire form of an SPV envelope. Hash fields are display-order hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpvEnvelope {
    pub raw_tx: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    pub proof: MerkleProofJson,
    pub block: BlockRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProofJson {
    pub txid: String,
    /// Informational; inclusion is checked against the resolved block's root.
    pub merkle_root: String,
    pub path: Vec<PathStepJson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStepJson {
    pub hash: String,
    /// `"left"` or `"right"`: the side the sibling sits on.
    pub position: String,
}

impl From<MerkleStep> for PathStepJson {
    fn from(step: MerkleStep) -> Self {
        Self {
            hash: step.sibling.to_hex(),
            position: step.position.as_str().to_string(),
        }
    }
}

/// The block an envelope claims inclusion in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockRef {
    /// The 80-byte header itself, as 160 hex characters.
    Header {
        #[serde(rename = "blockHeader")]
        block_header: String,
    },
    /// A block hash to resolve in the local header index.
    Hash {
        #[serde(rename = "blockHash")]
        block_hash: String,
        #[serde(
            rename = "blockHeight",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        block_height: Option<u64>,
    },
}

/// Why an envelope failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// `rawTx` is not hex or is empty.
    InvalidRawTx,
    /// A proof hash or path step could not be parsed.
    InvalidProof,
    /// The top-level `txid` differs from the proof's `txid`.
    TxidMismatch,
    /// The txid recomputed from `rawTx` differs from the proof's `txid`.
    RawTxTxidMismatch,
    /// The in-place block header could not be parsed.
    InvalidBlockHeader,
    /// The referenced block hash could not be parsed.
    InvalidBlockRef,
    /// The referenced block hash is not in the header index.
    UnknownBlock,
    /// The declared height disagrees with the indexed header.
    BlockHeightMismatch,
    /// The path does not lead from the txid to the block's merkle root.
    MerklePathMismatch,
    /// Inclusion holds but the block is not buried deep enough.
    InsufficientConfs { confirmations: u64, required: u64 },
}

impl RejectReason {
    /// Stable reason code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::InvalidRawTx => "invalid-rawtx",
            RejectReason::InvalidProof => "invalid-proof",
            RejectReason::TxidMismatch => "txid-mismatch",
            RejectReason::RawTxTxidMismatch => "rawtx-txid-mismatch",
            RejectReason::InvalidBlockHeader => "invalid-block-header",
            RejectReason::InvalidBlockRef => "invalid-block-ref",
            RejectReason::UnknownBlock => "unknown-block",
            RejectReason::BlockHeightMismatch => "block-height-mismatch",
            RejectReason::MerklePathMismatch => "merkle-path-mismatch",
            RejectReason::InsufficientConfs { .. } => "insufficient-confs",
        }
    }

    /// True when the envelope could not be parsed, as opposed to parsed but invalid.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            RejectReason::InvalidRawTx
                | RejectReason::InvalidProof
                | RejectReason::InvalidBlockHeader
                | RejectReason::InvalidBlockRef
        )
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A proven inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inclusion {
    pub txid: Hash256,
    pub block_hash: Hash256,
    /// Known only when the block is in the header index.
    pub block_height: Option<u64>,
    pub confirmations: u64,
}

/// Result of verifying one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeOutcome {
    Verified(Inclusion),
    Rejected(RejectReason),
}

impl EnvelopeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, EnvelopeOutcome::Verified(_))
    }

    /// Observed confirmations. Reported for insufficient depth too; 0 for
    /// every other rejection.
    pub fn confirmations(&self) -> u64 {
        match self {
            EnvelopeOutcome::Verified(inclusion) => inclusion.confirmations,
            EnvelopeOutcome::Rejected(RejectReason::InsufficientConfs { confirmations, .. }) => {
                *confirmations
            }
            EnvelopeOutcome::Rejected(_) => 0,
        }
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            EnvelopeOutcome::Verified(_) => None,
            EnvelopeOutcome::Rejected(reason) => Some(reason),
        }
    }

    /// JSON-facing summary: `{ok, confirmations, reason?}`.
    pub fn report(&self) -> EnvelopeReport {
        EnvelopeReport {
            ok: self.is_ok(),
            confirmations: self.confirmations(),
            reason: self.reason().map(|r| r.code().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeReport {
    pub ok: bool,
    pub confirmations: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Verify `envelope` against `headers`, requiring at least `min_confs`.
///
/// When the block is given as an in-place header that the index does not
/// know, inclusion can still be proven but the block's depth cannot, so it
/// reports 0 confirmations. With `min_confs == 0` such an envelope verifies.
pub fn verify_envelope<L>(envelope: &SpvEnvelope, headers: &L, min_confs: u64) -> EnvelopeOutcome
where
    L: HeaderLookup + ?Sized,
{
    match check(envelope, headers, min_confs) {
        Ok(inclusion) => EnvelopeOutcome::Verified(inclusion),
        Err(reason) => EnvelopeOutcome::Rejected(reason),
    }
}

fn check<L>(envelope: &SpvEnvelope, headers: &L, min_confs: u64) -> Result<Inclusion, RejectReason>
where
    L: HeaderLookup + ?Sized,
{
    // 1. txid consistency
    let raw = decode_hex(&envelope.raw_tx).map_err(|_| RejectReason::InvalidRawTx)?;
    if raw.is_empty() {
        return Err(RejectReason::InvalidRawTx);
    }
    let proof_txid = parse_hash(&envelope.proof.txid)?;
    if let Some(declared) = &envelope.txid {
        if parse_hash(declared)? != proof_txid {
            return Err(RejectReason::TxidMismatch);
        }
    }
    let computed = txid(&raw);
    if computed != proof_txid {
        return Err(RejectReason::RawTxTxidMismatch);
    }

    let path = envelope
        .proof
        .path
        .iter()
        .map(|step| {
            Ok(MerkleStep::new(
                parse_hash(&step.hash)?,
                step.position
                    .parse::<Position>()
                    .map_err(|_| RejectReason::InvalidProof)?,
            ))
        })
        .collect::<Result<Vec<_>, RejectReason>>()?;

    // 2. merkle root resolution
    let (block_hash, block_root, block_height) = match &envelope.block {
        BlockRef::Header { block_header } => {
            let header =
                BlockHeader::from_hex(block_header).map_err(|_| RejectReason::InvalidBlockHeader)?;
            let height = headers.header_by_hash(&header.hash()).map(|h| h.height);
            (header.hash(), header.merkle_root, height)
        }
        BlockRef::Hash {
            block_hash,
            block_height,
        } => {
            let hash = Hash256::from_hex(block_hash).map_err(|_| RejectReason::InvalidBlockRef)?;
            let header = headers
                .header_by_hash(&hash)
                .ok_or(RejectReason::UnknownBlock)?;
            if block_height.is_some_and(|h| h != header.height) {
                return Err(RejectReason::BlockHeightMismatch);
            }
            (hash, header.merkle_root, Some(header.height))
        }
    };
    // 3. merkle inclusion
    if compute_merkle_root(&computed, &path) != block_root {
        return Err(RejectReason::MerklePathMismatch);
    }

    // 4. confirmation depth
    let confirmations = headers.confirmations(&block_hash);
    if confirmations < min_confs {
        return Err(RejectReason::InsufficientConfs {
            confirmations,
            required: min_confs,
        });
    }

    Ok(Inclusion {
        txid: computed,
        block_hash,
        block_height,
        confirmations,
    })
}

fn parse_hash(s: &str) -> Result<Hash256, RejectReason> {
    Hash256::from_hex(s).map_err(|_| RejectReason::InvalidProof)
}
