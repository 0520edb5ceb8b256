//! Bundle providers and version-level verification.
//!
//! A provider assembles the lineage bundle for a version id. Fetches are
//! bounded by a caller-supplied timeout; retries belong to the caller.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use dlm_anchor_core::is_hex64;
use dlm_anchor_headers::HeaderLookup;

use crate::bundle::{verify_bundle, BundleOptions, BundleReport, LineageBundle};
use crate::error::{BundleError, Result};

/// Ancestor depth requested when the caller does not choose one.
pub const DEFAULT_DEPTH: u32 = 10;

/// Source of lineage bundles.
#[async_trait]
pub trait BundleProvider: Send + Sync {
    /// Fetch the bundle for `version_id`, including up to `depth` ancestor levels.
    async fn fetch_bundle(&self, version_id: &str, depth: u32) -> Result<LineageBundle>;
}

/// Fetches bundles from `GET {base}/bundle?versionId=..&depth=..`.
#[derive(Debug, Clone)]
pub struct HttpBundleProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBundleProvider {
    /// Create a provider client. `timeout` bounds each request.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl BundleProvider for HttpBundleProvider {
    async fn fetch_bundle(&self, version_id: &str, depth: u32) -> Result<LineageBundle> {
        let depth = depth.to_string();
        let response = self
            .client
            .get(format!("{}/bundle", self.base_url))
            .query(&[("versionId", version_id), ("depth", depth.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BundleError::Timeout(self.timeout)
                } else {
                    BundleError::Http(e)
                }
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(BundleError::NotFound(version_id.to_string())),
            status if !status.is_success() => Err(BundleError::Status(status.as_u16())),
            _ => {
                let body = response.bytes().await?;
                Ok(serde_json::from_slice(&body)?)
            }
        }
    }
}

/// In-memory provider keyed by target version id.
#[derive(Debug, Clone, Default)]
pub struct StaticBundleProvider {
    bundles: HashMap<String, LineageBundle>,
    delay: Option<Duration>,
}

impl StaticBundleProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bundle` for its `target`.
    pub fn with_bundle(mut self, bundle: LineageBundle) -> Self {
        self.insert(bundle);
        self
    }

    /// Wait this long before answering each fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn insert(&mut self, bundle: LineageBundle) {
        self.bundles
            .insert(bundle.target.to_ascii_lowercase(), bundle);
    }
}

#[async_trait]
impl BundleProvider for StaticBundleProvider {
    async fn fetch_bundle(&self, version_id: &str, _depth: u32) -> Result<LineageBundle> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.bundles
            .get(&version_id.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| BundleError::NotFound(version_id.to_string()))
    }
}

/// Fetch the bundle for `version_id` and verify it.
///
/// The fetch is abandoned after `timeout`. A bundle whose target is not the
/// requested version is rejected as malformed.
pub async fn verify_version<P, L>(
    provider: &P,
    version_id: &str,
    depth: u32,
    headers: &L,
    options: &BundleOptions,
    timeout: Duration,
) -> Result<BundleReport>
where
    P: BundleProvider + ?Sized,
    L: HeaderLookup + ?Sized,
{
    if !is_hex64(version_id) {
        return Err(BundleError::malformed("versionId is not 64-hex"));
    }

    let bundle = match tokio::time::timeout(timeout, provider.fetch_bundle(version_id, depth)).await
    {
        Ok(result) => result?,
        Err(_) => {
            tracing::warn!(version_id, ?timeout, "bundle fetch timed out");
            return Err(BundleError::Timeout(timeout));
        }
    };

    if !bundle.target.eq_ignore_ascii_case(version_id) {
        return Err(BundleError::malformed(format!(
            "bundle target {} does not match requested {version_id}",
            bundle.target
        )));
    }
    verify_bundle(&bundle, headers, options)
}
