//! Sources of the header mirror artifact.
//!
//! The mirror process that follows the chain is external; these sources
//! only fetch what it publishes. No retries happen here.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{HeaderError, Result};
use crate::index::HeaderIndex;

/// Where the mirror artifact is read from.
#[async_trait]
pub trait MirrorSource: Send + Sync {
    /// Fetch the raw artifact bytes.
    async fn fetch(&self) -> Result<Vec<u8>>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// A mirror artifact on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileMirror {
    path: PathBuf,
    timeout: Option<Duration>,
}

impl FileMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: None,
        }
    }

    /// Bound each read, for files on slow or network-backed mounts.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl MirrorSource for FileMirror {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let read = tokio::fs::read(&self.path);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| HeaderError::Timeout(limit))?
                .map_err(HeaderError::from),
            None => read.await.map_err(HeaderError::from),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A mirror artifact served over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMirror {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpMirror {
    /// Create a mirror client. `timeout` bounds the whole request.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }
}

#[async_trait]
impl MirrorSource for HttpMirror {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                HeaderError::Timeout(self.timeout)
            } else {
                HeaderError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HeaderError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Fetch and validate the chain published by `mirror`.
pub async fn fetch_header_index(mirror: &dyn MirrorSource) -> Result<HeaderIndex> {
    let bytes = mirror.fetch().await?;
    HeaderIndex::from_slice(&bytes)
}
