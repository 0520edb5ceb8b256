//! Merkle inclusion proofs over transaction ids.
//!
//! Paths list sibling hashes in display order. Hashing happens in wire
//! order: every node is reversed before concatenation and the final
//! accumulator is reversed back before comparison.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::hash_pair;
use crate::types::Hash256;

/// Which side of the running accumulator a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Left => "left",
            Position::Right => "right",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Position::Left),
            "right" => Ok(Position::Right),
            other => Err(format!("invalid merkle position: {other:?}")),
        }
    }
}

/// One step of a merkle path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MerkleStep {
    pub sibling: Hash256,
    pub position: Position,
}

impl MerkleStep {
    pub fn new(sibling: Hash256, position: Position) -> Self {
        Self { sibling, position }
    }
}

/// Fold `path` over `leaf` and return the resulting root in display order.
pub fn compute_merkle_root(leaf: &Hash256, path: &[MerkleStep]) -> Hash256 {
    let mut acc = leaf.to_internal();
    for step in path {
        let sibling = step.sibling.to_internal();
        acc = match step.position {
            Position::Left => hash_pair(&sibling, &acc),
            Position::Right => hash_pair(&acc, &sibling),
        };
    }
    Hash256::from_internal(acc)
}

/// True if `path` leads from `leaf` to exactly `root`.
///
/// An empty path verifies only when the leaf is itself the root.
pub fn verify_merkle_path(leaf: &Hash256, path: &[MerkleStep], root: &Hash256) -> bool {
    compute_merkle_root(leaf, path) == *root
}

/// Merkle root of a full, ordered txid list.
///
/// Odd levels pair the last node with itself. Returns `None` for an empty list.
pub fn merkle_root_of(txids: &[Hash256]) -> Option<Hash256> {
    if txids.is_empty() {
        return None;
    }
    let mut level: Vec<[u8; 32]> = txids.iter().map(Hash256::to_internal).collect();
    while level.len() > 1 {
        level = next_level(&level);
    }
    Some(Hash256::from_internal(level[0]))
}

/// Inclusion path for the txid at `index` within a full, ordered txid list.
pub fn merkle_path_for(txids: &[Hash256], index: usize) -> Option<Vec<MerkleStep>> {
    if index >= txids.len() {
        return None;
    }
    let mut level: Vec<[u8; 32]> = txids.iter().map(Hash256::to_internal).collect();
    let mut idx = index;
    let mut path = Vec::new();
    while level.len() > 1 {
        let step = if idx % 2 == 0 {
            // Last node of an odd level is paired with itself.
            let sibling = level.get(idx + 1).unwrap_or(&level[idx]);
            MerkleStep::new(Hash256::from_internal(*sibling), Position::Right)
        } else {
            MerkleStep::new(Hash256::from_internal(level[idx - 1]), Position::Left)
        };
        path.push(step);
        level = next_level(&level);
        idx /= 2;
    }
    Some(path)
}

fn next_level(level: &[[u8; 32]]) -> Vec<[u8; 32]> {
    level
        .chunks(2)
        .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
        .collect()
}
