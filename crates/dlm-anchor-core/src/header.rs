//! 80-byte block header parsing.

use crate::crypto::sha256d;
use crate::encoding::{decode_hex, ByteReader};
use crate::error::ParseError;
use crate::types::Hash256;

/// Serialized size of a block header.
pub const HEADER_LEN: usize = 80;

/// A parsed block header. Hash fields are held in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_hash: Hash256,
    pub merkle_root: Hash256,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
    hash: Hash256,
}

impl BlockHeader {
    /// Parse exactly 80 bytes of wire-format header.
    pub fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        if raw.len() != HEADER_LEN {
            return Err(ParseError::HeaderLength(raw.len()));
        }
        let mut reader = ByteReader::new(raw);
        let version = reader.read_u32_le()? as i32;
        let prev_hash = Hash256::from_internal(reader.read_array()?);
        let merkle_root = Hash256::from_internal(reader.read_array()?);
        let time = reader.read_u32_le()?;
        let bits = reader.read_u32_le()?;
        let nonce = reader.read_u32_le()?;

        Ok(Self {
            version,
            prev_hash,
            merkle_root,
            time,
            bits,
            nonce,
            hash: Hash256::from_internal(sha256d(raw)),
        })
    }

    /// Parse a 160-character hex header.
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        Self::parse(&decode_hex(s)?)
    }

    /// Block hash: double SHA-256 of the 80 bytes, in display order.
    pub fn hash(&self) -> Hash256 {
        self.hash
    }

    /// Re-serialize to wire format.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(&self.prev_hash.to_internal());
        out[36..68].copy_from_slice(&self.merkle_root.to_internal());
        out[68..72].copy_from_slice(&self.time.to_le_bytes());
        out[72..76].copy_from_slice(&self.bits.to_le_bytes());
        out[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }
}
