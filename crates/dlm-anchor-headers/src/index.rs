//! Immutable, validated header chains.
//!
//! A [`HeaderIndex`] is only ever produced by [`HeaderIndex::build`], which
//! checks the whole candidate chain before returning. There is no way to
//! mutate an index after construction; stores replace it wholesale.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dlm_anchor_core::encoding::decode_hex;
use dlm_anchor_core::{BlockHeader, Hash256, HEADER_LEN};

use crate::error::{HeaderError, Result};

/// A header record as published by the mirror process.
///
/// Hashes are display-order hex; `raw` is the 80-byte wire header as hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderRecord {
    pub raw: String,
    pub hash: String,
    pub prev_hash: String,
    pub merkle_root: String,
    pub height: u64,
    pub time: u32,
}

/// A header whose fields have been length-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactHeader {
    pub raw: [u8; HEADER_LEN],
    pub hash: Hash256,
    pub prev_hash: Hash256,
    pub merkle_root: Hash256,
    pub height: u64,
    pub time: u32,
}

impl CompactHeader {
    /// Decode and length-check a mirror record. `index` is used in errors.
    ///
    /// The hash, prev hash, merkle root and time must agree with what the
    /// `raw` bytes encode.
    pub fn from_record(record: &HeaderRecord, index: usize) -> Result<Self> {
        let header = Self {
            raw: fixed_hex(&record.raw, "raw", index)?,
            hash: Hash256::from_bytes(fixed_hex(&record.hash, "hash", index)?),
            prev_hash: Hash256::from_bytes(fixed_hex(&record.prev_hash, "prevHash", index)?),
            merkle_root: Hash256::from_bytes(fixed_hex(&record.merkle_root, "merkleRoot", index)?),
            height: record.height,
            time: record.time,
        };
        header.check_raw(index)?;
        Ok(header)
    }

    fn check_raw(&self, index: usize) -> Result<()> {
        let parsed = BlockHeader::parse(&self.raw).map_err(|e| HeaderError::InvalidRecord {
            index,
            reason: format!("raw: {e}"),
        })?;
        let mismatch = if parsed.hash() != self.hash {
            Some("hash")
        } else if parsed.prev_hash != self.prev_hash {
            Some("prevHash")
        } else if parsed.merkle_root != self.merkle_root {
            Some("merkleRoot")
        } else if parsed.time != self.time {
            Some("time")
        } else {
            None
        };
        match mismatch {
            Some(field) => Err(HeaderError::RawMismatch { index, field }),
            None => Ok(()),
        }
    }

    pub fn to_record(&self) -> HeaderRecord {
        HeaderRecord {
            raw: hex::encode(self.raw),
            hash: self.hash.to_hex(),
            prev_hash: self.prev_hash.to_hex(),
            merkle_root: self.merkle_root.to_hex(),
            height: self.height,
            time: self.time,
        }
    }
}

fn fixed_hex<const N: usize>(s: &str, field: &'static str, index: usize) -> Result<[u8; N]> {
    let bytes = decode_hex(s).map_err(|e| HeaderError::InvalidRecord {
        index,
        reason: format!("{field}: {e}"),
    })?;
    bytes.try_into().map_err(|bytes: Vec<u8>| HeaderError::FieldLength {
        index,
        field,
        expected: N,
        got: bytes.len(),
    })
}

/// Read-only header queries, as consumed by proof verification.
pub trait HeaderLookup {
    /// Header with the given block hash, if known.
    fn header_by_hash(&self, hash: &Hash256) -> Option<CompactHeader>;

    /// Height of the chain tip, 0 when no chain is loaded.
    fn best_height(&self) -> u64;

    /// Confirmation depth of a block: `best - height + 1`, or 0 if unknown.
    fn confirmations(&self, hash: &Hash256) -> u64;
}

impl<T: HeaderLookup + ?Sized> HeaderLookup for Arc<T> {
    fn header_by_hash(&self, hash: &Hash256) -> Option<CompactHeader> {
        (**self).header_by_hash(hash)
    }

    fn best_height(&self) -> u64 {
        (**self).best_height()
    }

    fn confirmations(&self, hash: &Hash256) -> u64 {
        (**self).confirmations(hash)
    }
}

/// A contiguous, linked chain of headers in ascending height order.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    headers: Vec<CompactHeader>,
    by_hash: HashMap<Hash256, usize>,
    generation: u64,
}

impl HeaderIndex {
    /// An index with no headers. Every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate `headers` as a chain and index it.
    ///
    /// Every adjacent pair must satisfy `cur.prev_hash == prev.hash` and
    /// `cur.height == prev.height + 1`. Any violation rejects the whole chain.
    pub fn build(headers: Vec<CompactHeader>) -> Result<Self> {
        if headers.is_empty() {
            return Err(HeaderError::EmptyChain);
        }
        for (i, pair) in headers.windows(2).enumerate() {
            let (prev, cur) = (&pair[0], &pair[1]);
            if cur.prev_hash != prev.hash {
                return Err(HeaderError::BrokenLink {
                    height: cur.height,
                    expected: prev.hash.to_hex(),
                    got: cur.prev_hash.to_hex(),
                });
            }
            if prev.height.checked_add(1) != Some(cur.height) {
                return Err(HeaderError::HeightGap {
                    index: i + 1,
                    previous: prev.height,
                    got: cur.height,
                });
            }
        }

        let by_hash = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.hash, i))
            .collect();
        Ok(Self {
            headers,
            by_hash,
            generation: 0,
        })
    }

    /// Decode and validate mirror records.
    pub fn from_records(records: &[HeaderRecord]) -> Result<Self> {
        let headers = records
            .iter()
            .enumerate()
            .map(|(i, r)| CompactHeader::from_record(r, i))
            .collect::<Result<Vec<_>>>()?;
        Self::build(headers)
    }

    /// Parse a mirror artifact.
    ///
    /// Accepts a JSON array of records in ascending height order, or an
    /// object mapping each block hash to its record.
    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_slice(text.as_bytes())
    }

    /// [`HeaderIndex::from_json`] over raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| HeaderError::Malformed(e.to_string()))?;

        match value {
            Value::Array(items) => {
                let records = items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| parse_record(item, i))
                    .collect::<Result<Vec<_>>>()?;
                Self::from_records(&records)
            }
            Value::Object(map) => {
                let mut headers = Vec::new();
                for (i, (key, item)) in map.into_iter().enumerate() {
                    let header = CompactHeader::from_record(&parse_record(item, i)?, i)?;
                    let key_hash = Hash256::from_hex(&key).ok();
                    if key_hash != Some(header.hash) {
                        return Err(HeaderError::KeyMismatch {
                            key,
                            hash: header.hash.to_hex(),
                        });
                    }
                    headers.push(header);
                }
                headers.sort_by_key(|h| h.height);
                Self::build(headers)
            }
            _ => Err(HeaderError::Malformed(
                "expected an array or an object keyed by hash".into(),
            )),
        }
    }

    /// Serialize as the array artifact form.
    pub fn to_records(&self) -> Vec<HeaderRecord> {
        self.headers.iter().map(CompactHeader::to_record).collect()
    }

    pub fn headers(&self) -> &[CompactHeader] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Number of successful swaps that preceded this index in its store.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn tip(&self) -> Option<&CompactHeader> {
        self.headers.last()
    }

    pub fn tip_hash(&self) -> Option<Hash256> {
        self.tip().map(|h| h.hash)
    }

    pub fn best_height(&self) -> u64 {
        self.tip().map_or(0, |h| h.height)
    }

    pub fn header_by_hash(&self, hash: &Hash256) -> Option<&CompactHeader> {
        self.by_hash.get(hash).map(|&i| &self.headers[i])
    }

    pub fn header_at(&self, height: u64) -> Option<&CompactHeader> {
        let first = self.headers.first()?.height;
        let offset = usize::try_from(height.checked_sub(first)?).ok()?;
        self.headers.get(offset)
    }

    pub fn confirmations(&self, hash: &Hash256) -> u64 {
        match self.header_by_hash(hash) {
            Some(h) => self.best_height().saturating_add(1).saturating_sub(h.height),
            None => 0,
        }
    }
}

impl HeaderLookup for HeaderIndex {
    fn header_by_hash(&self, hash: &Hash256) -> Option<CompactHeader> {
        HeaderIndex::header_by_hash(self, hash).cloned()
    }

    fn best_height(&self) -> u64 {
        HeaderIndex::best_height(self)
    }

    fn confirmations(&self, hash: &Hash256) -> u64 {
        HeaderIndex::confirmations(self, hash)
    }
}

fn parse_record(item: Value, index: usize) -> Result<HeaderRecord> {
    serde_json::from_value(item).map_err(|e| HeaderError::InvalidRecord {
        index,
        reason: e.to_string(),
    })
}
