//! secp256k1 identity keys and the signing preimage.
//!
//! Signatures are deterministic ECDSA (RFC 6979) over SHA-256 of the
//! preimage, DER-encoded.

use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{DerSignature, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{IdentityError, Result};

/// Domain tag that opens every signing preimage.
pub const DOMAIN_TAG: &str = "dlm1/identity-sig/";

/// Preimage format version.
pub const PROTOCOL_VERSION: &str = "v1";

/// Length in hex characters of a compressed public key.
pub const PUBLIC_KEY_HEX_LEN: usize = 66;

/// Length in hex characters of a request nonce.
pub const NONCE_HEX_LEN: usize = 32;

/// Build the bytes that are signed for `nonce` and `body`:
/// `dlm1/identity-sig/v1|<nonce>|<sha256hex(body)>`.
pub fn signing_preimage(nonce: &str, body: &[u8]) -> String {
    format!(
        "{DOMAIN_TAG}{PROTOCOL_VERSION}|{nonce}|{}",
        hex::encode(Sha256::digest(body))
    )
}

/// A fresh random nonce: 16 bytes as 32 lowercase hex characters.
pub fn new_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub(crate) fn is_hex_of_len(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// A secp256k1 identity private key.
#[derive(Clone)]
pub struct IdentityKey(SigningKey);

impl IdentityKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        Self(SigningKey::random(&mut OsRng))
    }

    /// Load a 32-byte private key.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))
    }

    /// Load a private key from 64 hex characters.
    pub fn from_hex(s: &str) -> Result<Self> {
        if !is_hex_of_len(s, 64) {
            return Err(IdentityError::InvalidKey(
                "expected 64 hex characters".into(),
            ));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// The private key as 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }

    pub fn public_key(&self) -> IdentityPublicKey {
        IdentityPublicKey(self.0.verifying_key().clone())
    }

    /// Compressed public key as 66 hex characters.
    pub fn public_key_hex(&self) -> String {
        self.public_key().to_hex()
    }

    /// Sign `message` (hashed with SHA-256). Returns the DER signature.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signature: Signature = self
            .0
            .try_sign(message)
            .map_err(|e| IdentityError::Signing(e.to_string()))?;
        let der: DerSignature = signature.to_der();
        Ok(der.as_bytes().to_vec())
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdentityKey")
            .field(&self.public_key_hex())
            .finish()
    }
}

/// A compressed secp256k1 public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPublicKey(VerifyingKey);

impl IdentityPublicKey {
    /// Parse a SEC1-encoded public key.
    pub fn from_sec1(bytes: &[u8]) -> Option<Self> {
        VerifyingKey::from_sec1_bytes(bytes).ok().map(Self)
    }

    /// Parse a compressed key from 66 hex characters.
    pub fn from_hex(s: &str) -> Option<Self> {
        if !is_hex_of_len(s, PUBLIC_KEY_HEX_LEN) {
            return None;
        }
        Self::from_sec1(&hex::decode(s).ok()?)
    }

    pub fn to_bytes(&self) -> [u8; 33] {
        let point = self.0.to_encoded_point(true);
        let mut out = [0u8; 33];
        out.copy_from_slice(point.as_bytes());
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Check a DER signature over `message`. Any parse failure is `false`.
    pub fn verify(&self, message: &[u8], der: &[u8]) -> bool {
        match Signature::from_der(der) {
            Ok(signature) => self.0.verify(message, &signature).is_ok(),
            Err(_) => false,
        }
    }
}
