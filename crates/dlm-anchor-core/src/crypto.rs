//! Hashing primitives shared by every component.
//!
//! Chain identifiers (txids, block hashes, merkle nodes) use double SHA-256;
//! manifest identifiers and identity preimages use single SHA-256.

use sha2::{Digest, Sha256};

use crate::types::Hash256;

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Transaction id of a raw serialized transaction, in display order.
pub fn txid(raw_tx: &[u8]) -> Hash256 {
    Hash256::from_internal(sha256d(raw_tx))
}

/// Double SHA-256 of two concatenated 32-byte wire-order nodes.
pub(crate) fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left);
    buf[32..].copy_from_slice(right);
    sha256d(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256d_empty() {
        assert_eq!(
            hex::encode(sha256d(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_txid_is_reversed_digest() {
        let raw = b"not a real transaction";
        let mut digest = sha256d(raw);
        digest.reverse();
        assert_eq!(txid(raw).as_bytes(), &digest);
    }
}
