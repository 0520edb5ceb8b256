//! Verifier configuration.

use std::time::Duration;

use dlm_anchor_headers::HeaderStoreConfig;
use dlm_anchor_spv::{BundleOptions, DEFAULT_DEPTH};

use crate::error::{Error, Result};

/// Configuration for an [`crate::AnchorVerifier`].
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Confirmations required of every envelope.
    pub min_confirmations: u64,
    /// Whether bundle nodes must also bind to their manifests and anchors.
    pub check_bindings: bool,
    /// Header mirror and reload settings.
    pub headers: HeaderStoreConfig,
    /// Base URL of the bundle provider, if bundles are fetched remotely.
    pub bundle_provider: Option<String>,
    /// Upper bound on one bundle fetch.
    pub bundle_fetch_timeout: Duration,
    /// Ancestor levels requested per bundle.
    pub bundle_depth: u32,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            min_confirmations: 1,
            check_bindings: true,
            headers: HeaderStoreConfig::default(),
            bundle_provider: None,
            bundle_fetch_timeout: Duration::from_secs(8),
            bundle_depth: DEFAULT_DEPTH,
        }
    }
}

impl VerifierConfig {
    /// Read overrides from the process environment.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `HEADERS_FILE` | `headers.mirror` (path or URL) |
    /// | `HEADERS_RELOAD_MS` | `headers.reload_interval` |
    /// | `POLICY_MIN_CONFS` | `min_confirmations` |
    /// | `BUNDLE_FETCH_TIMEOUT_MS` | `bundle_fetch_timeout` |
    /// | `BUNDLE_PROVIDER_URL` | `bundle_provider` |
    /// | `BUNDLE_DEPTH` | `bundle_depth` |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// [`VerifierConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(mirror) = get("HEADERS_FILE") {
            config.headers = config.headers.with_mirror(mirror.trim());
        }
        if let Some(ms) = get("HEADERS_RELOAD_MS") {
            let interval = Duration::from_millis(parse_number("HEADERS_RELOAD_MS", &ms)?);
            config.headers = config.headers.with_reload_interval(interval);
        }
        if let Some(confs) = get("POLICY_MIN_CONFS") {
            config.min_confirmations = parse_number("POLICY_MIN_CONFS", &confs)?;
        }
        if let Some(ms) = get("BUNDLE_FETCH_TIMEOUT_MS") {
            config.bundle_fetch_timeout =
                Duration::from_millis(parse_number("BUNDLE_FETCH_TIMEOUT_MS", &ms)?);
        }
        if let Some(url) = get("BUNDLE_PROVIDER_URL") {
            config.bundle_provider = Some(url.trim().to_string());
        }
        if let Some(depth) = get("BUNDLE_DEPTH") {
            let depth = parse_number("BUNDLE_DEPTH", &depth)?;
            config.bundle_depth = u32::try_from(depth)
                .map_err(|_| Error::Config(format!("BUNDLE_DEPTH out of range: {depth}")))?;
        }
        Ok(config)
    }

    pub fn with_min_confirmations(mut self, min_confirmations: u64) -> Self {
        self.min_confirmations = min_confirmations;
        self
    }

    pub fn with_bindings(mut self, check_bindings: bool) -> Self {
        self.check_bindings = check_bindings;
        self
    }

    pub fn with_headers(mut self, headers: HeaderStoreConfig) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_bundle_provider(mut self, url: impl Into<String>) -> Self {
        self.bundle_provider = Some(url.into());
        self
    }

    pub fn with_bundle_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.bundle_fetch_timeout = timeout;
        self
    }

    pub fn with_bundle_depth(mut self, depth: u32) -> Self {
        self.bundle_depth = depth;
        self
    }

    /// Bundle policy derived from this configuration.
    pub fn bundle_options(&self) -> BundleOptions {
        BundleOptions::default()
            .with_min_confirmations(self.min_confirmations)
            .with_bindings(self.check_bindings)
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} must be a non-negative integer, got {value:?}")))
}
