//! Identity-signed request headers.
//!
//! A client signs each request body with its identity key and sends the
//! public key, a nonce and the signature as headers. Rejecting replayed
//! nonces is the receiving service's job.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::{
    is_hex_of_len, new_nonce, signing_preimage, IdentityKey, IdentityPublicKey, NONCE_HEX_LEN,
    PUBLIC_KEY_HEX_LEN,
};
use crate::error::{IdentityError, Result};

pub const HEADER_IDENTITY_KEY: &str = "X-Identity-Key";
pub const HEADER_NONCE: &str = "X-Nonce";
pub const HEADER_SIGNATURE: &str = "X-Signature";

/// The three identity headers of a signed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityHeaders {
    /// Compressed public key, 66 hex characters.
    #[serde(rename = "X-Identity-Key")]
    pub identity_key: String,
    /// 32 hex characters.
    #[serde(rename = "X-Nonce")]
    pub nonce: String,
    /// DER signature as hex.
    #[serde(rename = "X-Signature")]
    pub signature: String,
}

impl IdentityHeaders {
    /// Header name/value pairs, ready to attach to a request.
    pub fn to_pairs(&self) -> [(&'static str, &str); 3] {
        [
            (HEADER_IDENTITY_KEY, self.identity_key.as_str()),
            (HEADER_NONCE, self.nonce.as_str()),
            (HEADER_SIGNATURE, self.signature.as_str()),
        ]
    }

    /// Collect the identity headers from name/value pairs.
    ///
    /// Names match case-insensitively. Returns `None` if any is missing.
    pub fn from_pairs<'a, I>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (mut key, mut nonce, mut signature) = (None, None, None);
        for (name, value) in pairs {
            if name.eq_ignore_ascii_case(HEADER_IDENTITY_KEY) {
                key = Some(value.trim().to_string());
            } else if name.eq_ignore_ascii_case(HEADER_NONCE) {
                nonce = Some(value.trim().to_string());
            } else if name.eq_ignore_ascii_case(HEADER_SIGNATURE) {
                signature = Some(value.trim().to_string());
            }
        }
        Some(Self {
            identity_key: key?,
            nonce: nonce?,
            signature: signature?,
        })
    }
}

/// Sign `body` under a fresh random nonce.
pub fn sign_request(key: &IdentityKey, body: &[u8]) -> Result<IdentityHeaders> {
    sign_request_with_nonce(key, &new_nonce(), body)
}

/// Sign `body` under `nonce`, which must be 32 hex characters.
pub fn sign_request_with_nonce(
    key: &IdentityKey,
    nonce: &str,
    body: &[u8],
) -> Result<IdentityHeaders> {
    if !is_hex_of_len(nonce, NONCE_HEX_LEN) {
        return Err(IdentityError::InvalidNonce);
    }
    let signature = key.sign(signing_preimage(nonce, body).as_bytes())?;
    Ok(IdentityHeaders {
        identity_key: key.public_key_hex(),
        nonce: nonce.to_string(),
        signature: hex::encode(signature),
    })
}

/// Why a signed request was rejected. Deliberately coarse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRejection {
    /// A header is missing or has the wrong shape.
    MalformedHeaders,
    /// The signature does not verify for this key, nonce and body.
    BadSignature,
}

impl IdentityRejection {
    pub fn code(&self) -> &'static str {
        match self {
            IdentityRejection::MalformedHeaders => "malformed-identity-headers",
            IdentityRejection::BadSignature => "bad-signature",
        }
    }
}

impl fmt::Display for IdentityRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of checking a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityCheck {
    /// Signed by the holder of this key (lowercase hex).
    Verified { identity_key: String },
    Rejected(IdentityRejection),
}

impl IdentityCheck {
    pub fn is_ok(&self) -> bool {
        matches!(self, IdentityCheck::Verified { .. })
    }

    pub fn identity_key(&self) -> Option<&str> {
        match self {
            IdentityCheck::Verified { identity_key } => Some(identity_key),
            IdentityCheck::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<IdentityRejection> {
        match self {
            IdentityCheck::Verified { .. } => None,
            IdentityCheck::Rejected(r) => Some(*r),
        }
    }
}

/// Check that `headers` carry a valid signature over `body`.
pub fn verify_request(headers: &IdentityHeaders, body: &[u8]) -> IdentityCheck {
    if !is_hex_of_len(&headers.identity_key, PUBLIC_KEY_HEX_LEN)
        || !is_hex_of_len(&headers.nonce, NONCE_HEX_LEN)
    {
        return IdentityCheck::Rejected(IdentityRejection::MalformedHeaders);
    }
    let (Some(public_key), Ok(signature)) = (
        IdentityPublicKey::from_hex(&headers.identity_key),
        hex::decode(&headers.signature),
    ) else {
        return IdentityCheck::Rejected(IdentityRejection::BadSignature);
    };

    let preimage = signing_preimage(&headers.nonce, body);
    if public_key.verify(preimage.as_bytes(), &signature) {
        IdentityCheck::Verified {
            identity_key: headers.identity_key.to_ascii_lowercase(),
        }
    } else {
        IdentityCheck::Rejected(IdentityRejection::BadSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NONCE: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_sign_then_verify() {
        let key = IdentityKey::generate();
        let headers = sign_request(&key, br#"{"hello":"world"}"#).unwrap();
        let check = verify_request(&headers, br#"{"hello":"world"}"#);
        assert!(check.is_ok());
        assert_eq!(check.identity_key(), Some(key.public_key_hex().as_str()));
    }

    #[test]
    fn test_same_nonce_same_signature() {
        let key = IdentityKey::generate();
        let a = sign_request_with_nonce(&key, NONCE, b"body").unwrap();
        let b = sign_request_with_nonce(&key, NONCE, b"body").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tampering_is_bad_signature() {
        let key = IdentityKey::generate();
        let headers = sign_request_with_nonce(&key, NONCE, b"body").unwrap();

        let check = verify_request(&headers, b"body!");
        assert_eq!(check.rejection(), Some(IdentityRejection::BadSignature));

        let mut other_nonce = headers.clone();
        other_nonce.nonce = "f".repeat(32);
        assert!(!verify_request(&other_nonce, b"body").is_ok());

        let mut other_key = headers.clone();
        other_key.identity_key = IdentityKey::generate().public_key_hex();
        assert!(!verify_request(&other_key, b"body").is_ok());

        let mut garbage = headers;
        garbage.signature = "zz".into();
        assert_eq!(
            verify_request(&garbage, b"body").rejection(),
            Some(IdentityRejection::BadSignature)
        );
    }

    #[test]
    fn test_malformed_headers() {
        let key = IdentityKey::generate();
        let headers = sign_request_with_nonce(&key, NONCE, b"body").unwrap();

        let mut short_key = headers.clone();
        short_key.identity_key.pop();
        assert_eq!(
            verify_request(&short_key, b"body").rejection(),
            Some(IdentityRejection::MalformedHeaders)
        );

        let mut uuid_nonce = headers;
        uuid_nonce.nonce = "4f9c2a1e-7b3d-4e8a-9c1f-2d6b8e0a4c7f".into();
        assert_eq!(
            verify_request(&uuid_nonce, b"body").rejection(),
            Some(IdentityRejection::MalformedHeaders)
        );

        assert!(matches!(
            sign_request_with_nonce(&key, "short", b"body"),
            Err(IdentityError::InvalidNonce)
        ));
    }

    #[test]
    fn test_header_names() {
        let key = IdentityKey::generate();
        let headers = sign_request(&key, b"").unwrap();
        let json = serde_json::to_value(&headers).unwrap();
        assert_eq!(json["X-Identity-Key"], headers.identity_key.as_str());
        assert_eq!(json["X-Nonce"], headers.nonce.as_str());

        assert_eq!(IdentityHeaders::from_pairs(headers.to_pairs()), Some(headers.clone()));

        let pairs = [
            ("content-type", "application/json"),
            ("x-identity-key", headers.identity_key.as_str()),
            ("X-SIGNATURE", headers.signature.as_str()),
            ("x-nonce", headers.nonce.as_str()),
        ];
        assert_eq!(IdentityHeaders::from_pairs(pairs), Some(headers.clone()));
        assert_eq!(IdentityHeaders::from_pairs([("X-Nonce", "00")]), None);
    }

    proptest! {
        #[test]
        fn prop_verify_never_panics(
            key in "[0-9a-f]{0,70}",
            nonce in "[0-9a-zA-Z-]{0,40}",
            sig in "[0-9a-f]{0,160}",
            body in prop::collection::vec(any::<u8>(), 0..64),
        ) {
            let headers = IdentityHeaders { identity_key: key, nonce, signature: sig };
            prop_assert!(!verify_request(&headers, &body).is_ok());
        }
    }
}
