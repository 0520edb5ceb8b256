//! Hot reload of the header store from its mirror.
//!
//! Ticks run one after another on a single task: the next sleep starts only
//! after the previous tick finished, so reloads never overlap. A failed tick
//! is logged and the store keeps serving its last good chain.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use dlm_anchor_core::sha256;

use crate::error::Result;
use crate::index::HeaderIndex;
use crate::mirror::MirrorSource;
use crate::store::HeaderStore;

/// What a single reload tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The artifact is byte-identical to the last one loaded.
    Unchanged,
    /// A new chain was validated and swapped in.
    Reloaded { generation: u64, best_height: u64 },
    /// Fetching or validation failed; the served chain is unchanged.
    Failed(String),
}

/// Drives reloads of one store from one mirror.
pub struct MirrorReloader {
    store: Arc<HeaderStore>,
    source: Arc<dyn MirrorSource>,
    last_fingerprint: Option<[u8; 32]>,
}

impl MirrorReloader {
    pub fn new(store: Arc<HeaderStore>, source: Arc<dyn MirrorSource>) -> Self {
        Self {
            store,
            source,
            last_fingerprint: None,
        }
    }

    /// Load the mirror once, propagating any failure.
    ///
    /// Used at startup, where serving no chain at all is not acceptable.
    pub async fn initial_load(&mut self) -> Result<u64> {
        let bytes = self.source.fetch().await?;
        let index = HeaderIndex::from_slice(&bytes)?;
        let generation = self.store.swap(index);
        self.last_fingerprint = Some(sha256(&bytes));
        Ok(generation)
    }

    /// Check the mirror once and swap in a changed, valid chain.
    pub async fn tick(&mut self) -> TickOutcome {
        let bytes = match self.source.fetch().await {
            Ok(bytes) => bytes,
            Err(e) => return self.failed(e.to_string()),
        };

        let fingerprint = sha256(&bytes);
        if self.last_fingerprint == Some(fingerprint) {
            tracing::debug!(mirror = %self.source.describe(), "headers unchanged");
            return TickOutcome::Unchanged;
        }

        match HeaderIndex::from_slice(&bytes) {
            Ok(index) => {
                let best_height = index.best_height();
                let generation = self.store.swap(index);
                self.last_fingerprint = Some(fingerprint);
                TickOutcome::Reloaded {
                    generation,
                    best_height,
                }
            }
            Err(e) => self.failed(e.to_string()),
        }
    }

    fn failed(&self, reason: String) -> TickOutcome {
        tracing::warn!(
            mirror = %self.source.describe(),
            error = %reason,
            served_generation = self.store.generation(),
            "headers reload failed, keeping last good chain"
        );
        TickOutcome::Failed(reason)
    }

    /// Run ticks every `interval` on a background task.
    pub fn spawn(mut self, interval: Duration) -> ReloadHandle {
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                self.tick().await;
            }
        });
        ReloadHandle {
            handle: Some(handle),
        }
    }
}

/// Owns the background reload task; dropping it stops reloading.
#[derive(Debug)]
pub struct ReloadHandle {
    handle: Option<JoinHandle<()>>,
}

impl ReloadHandle {
    /// Stop reloading. The store keeps its current chain.
    pub fn stop(mut self) {
        self.abort();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ReloadHandle {
    fn drop(&mut self) {
        self.abort();
    }
}
