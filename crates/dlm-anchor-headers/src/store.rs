//! The process-wide header store.
//!
//! Readers take an `Arc` snapshot and never hold the lock while working.
//! Writers validate a complete candidate index off-lock and then swap the
//! pointer, so a reader sees either the old chain or the new one.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use dlm_anchor_core::Hash256;

use crate::error::Result;
use crate::index::{CompactHeader, HeaderIndex, HeaderLookup, HeaderRecord};
use crate::mirror::{fetch_header_index, FileMirror, HttpMirror, MirrorSource};

/// Header store configuration.
#[derive(Debug, Clone)]
pub struct HeaderStoreConfig {
    /// Mirror artifact location: a file path, or an `http(s)://` URL.
    pub mirror: Option<String>,
    /// Delay between hot-reload ticks.
    pub reload_interval: Duration,
    /// Upper bound on one mirror fetch.
    pub fetch_timeout: Duration,
}

impl Default for HeaderStoreConfig {
    fn default() -> Self {
        Self {
            mirror: None,
            reload_interval: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl HeaderStoreConfig {
    pub fn with_mirror(mut self, mirror: impl Into<String>) -> Self {
        self.mirror = Some(mirror.into());
        self
    }

    pub fn with_reload_interval(mut self, interval: Duration) -> Self {
        self.reload_interval = interval;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Build the configured mirror source, if any.
    pub fn mirror_source(&self) -> Result<Option<Arc<dyn MirrorSource>>> {
        let Some(location) = self.mirror.as_deref() else {
            return Ok(None);
        };
        let source: Arc<dyn MirrorSource> =
            if location.starts_with("http://") || location.starts_with("https://") {
                Arc::new(HttpMirror::new(location, self.fetch_timeout)?)
            } else {
                Arc::new(FileMirror::new(PathBuf::from(location)).with_timeout(self.fetch_timeout))
            };
        Ok(Some(source))
    }
}

/// Owner of the currently served header chain.
pub struct HeaderStore {
    current: RwLock<Arc<HeaderIndex>>,
}

impl HeaderStore {
    /// A store serving no headers.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(HeaderIndex::empty())),
        }
    }

    /// A store serving `index`.
    pub fn with_index(index: HeaderIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index.with_generation(1))),
        }
    }

    /// The currently served index.
    pub fn snapshot(&self) -> Arc<HeaderIndex> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Validate `headers` and, on success, serve them. Returns the new generation.
    pub fn load(&self, headers: Vec<CompactHeader>) -> Result<u64> {
        Ok(self.swap(HeaderIndex::build(headers)?))
    }

    /// [`HeaderStore::load`] from mirror records.
    pub fn load_records(&self, records: &[HeaderRecord]) -> Result<u64> {
        Ok(self.swap(HeaderIndex::from_records(records)?))
    }

    /// [`HeaderStore::load`] from a JSON mirror artifact.
    pub fn load_json(&self, text: &str) -> Result<u64> {
        Ok(self.swap(HeaderIndex::from_json(text)?))
    }

    /// Fetch, validate and serve the chain published by `mirror`.
    pub async fn load_from(&self, mirror: &dyn MirrorSource) -> Result<u64> {
        let index = fetch_header_index(mirror).await?;
        Ok(self.swap(index))
    }

    /// Replace the served index with an already validated one.
    pub(crate) fn swap(&self, index: HeaderIndex) -> u64 {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let generation = current.generation() + 1;
        let index = index.with_generation(generation);
        tracing::info!(
            generation,
            best_height = index.best_height(),
            tip = %index.tip_hash().map(|h| h.to_hex()).unwrap_or_default(),
            headers = index.len(),
            "headers loaded"
        );
        *current = Arc::new(index);
        generation
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().generation()
    }

    pub fn best_height(&self) -> u64 {
        self.snapshot().best_height()
    }

    pub fn tip_hash(&self) -> Option<Hash256> {
        self.snapshot().tip_hash()
    }

    pub fn header_by_hash(&self, hash: &Hash256) -> Option<CompactHeader> {
        HeaderIndex::header_by_hash(&self.snapshot(), hash).cloned()
    }

    pub fn confirmations(&self, hash: &Hash256) -> u64 {
        self.snapshot().confirmations(hash)
    }
}

impl Default for HeaderStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Each call reads whichever snapshot is current at that moment. Callers
/// needing several consistent answers should query one [`HeaderStore::snapshot`].
impl HeaderLookup for HeaderStore {
    fn header_by_hash(&self, hash: &Hash256) -> Option<CompactHeader> {
        HeaderStore::header_by_hash(self, hash)
    }

    fn best_height(&self) -> u64 {
        HeaderStore::best_height(self)
    }

    fn confirmations(&self, hash: &Hash256) -> u64 {
        HeaderStore::confirmations(self, hash)
    }
}
