//! # DLM Anchor Headers
//!
//! A validated, contiguous chain of block headers, served to proof
//! verification and refreshed from an external mirror.
//!
//! ## Overview
//!
//! The mirror process that follows the chain is out of scope. This crate
//! only checks the internal consistency of what the mirror publishes: field
//! lengths, `prev_hash` linkage and consecutive heights. It does not check
//! proof of work or any other consensus rule.
//!
//! ## Key Types
//!
//! - [`HeaderIndex`] - Immutable, validated chain with hash and height lookups
//! - [`HeaderStore`] - Atomic-swap owner of the served index
//! - [`HeaderLookup`] - Read-only queries consumed by proof verification
//! - [`MirrorSource`] - Where artifacts come from ([`FileMirror`], [`HttpMirror`])
//! - [`MirrorReloader`] - Fingerprinted, non-overlapping hot reload
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use dlm_anchor_headers::{FileMirror, HeaderStore, MirrorReloader};
//!
//! async fn example() {
//!     let store = Arc::new(HeaderStore::new());
//!     let mirror = Arc::new(FileMirror::new("headers.json"));
//!     let mut reloader = MirrorReloader::new(Arc::clone(&store), mirror);
//!     reloader.initial_load().await.unwrap();
//!
//!     // Keep the handle alive for as long as reloading should continue.
//!     let _handle = reloader.spawn(Duration::from_secs(5));
//!     println!("tip at height {}", store.best_height());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **All-or-nothing loads**: a candidate chain is validated in full before it
//!   becomes visible; a rejected chain leaves the served one untouched
//! - **Copy-on-write**: readers hold an `Arc` snapshot, writers swap the pointer
//! - **Availability over freshness**: reload failures are logged, not fatal

pub mod error;
pub mod index;
pub mod mirror;
pub mod reload;
pub mod store;

pub use error::{HeaderError, Result};
pub use index::{CompactHeader, HeaderIndex, HeaderLookup, HeaderRecord};
pub use mirror::{fetch_header_index, FileMirror, HttpMirror, MirrorSource};
pub use reload::{MirrorReloader, ReloadHandle, TickOutcome};
pub use store::{HeaderStore, HeaderStoreConfig};
