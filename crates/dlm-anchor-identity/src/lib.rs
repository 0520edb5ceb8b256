//! # DLM Anchor Identity
//!
//! Identity-signed requests for dataset anchoring services.
//!
//! ## Overview
//!
//! A client holding a secp256k1 identity key signs each request body and
//! sends three headers: its compressed public key, a nonce, and a DER
//! signature. The signed preimage is domain-separated so a signature made
//! for one context cannot be replayed in another:
//!
//! ```text
//! dlm1/identity-sig/v1|<nonce>|<sha256hex(body)>
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use dlm_anchor_identity::{sign_request, verify_request, IdentityKey};
//!
//! let key = IdentityKey::generate();
//! let headers = sign_request(&key, b"{}").unwrap();
//! assert!(verify_request(&headers, b"{}").is_ok());
//! ```
//!
//! Verification never errors. Every failure collapses to one of two coarse
//! [`IdentityRejection`]s. Nonce uniqueness is left to the caller.

pub mod crypto;
pub mod error;
pub mod headers;

pub use crypto::{new_nonce, signing_preimage, IdentityKey, IdentityPublicKey, DOMAIN_TAG};
pub use error::{IdentityError, Result};
pub use headers::{
    sign_request, sign_request_with_nonce, verify_request, IdentityCheck, IdentityHeaders,
    IdentityRejection, HEADER_IDENTITY_KEY, HEADER_NONCE, HEADER_SIGNATURE,
};
