//! The anchor verifier: header store, bundle provider and policy in one place.

use std::sync::Arc;

use dlm_anchor_core::encoding::decode_hex;
use dlm_anchor_core::{decode_anchor, scan_transaction, AnchorRecord, AnchorTag, CodecError};
use dlm_anchor_headers::{HeaderStore, MirrorReloader, ReloadHandle};
use dlm_anchor_spv::{
    verify_bundle, verify_envelope, verify_version, BundleProvider, BundleReport,
    EnvelopeOutcome, HttpBundleProvider, LineageBundle, SpvEnvelope,
};

use crate::config::VerifierConfig;
use crate::error::{Error, Result};

/// A tagged anchor found in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorSighting {
    pub vout: u32,
    pub tag: AnchorTag,
    /// Payload after the tag.
    pub payload: Vec<u8>,
    /// Decoded record, for `DLM1` payloads.
    pub record: Option<std::result::Result<AnchorRecord, CodecError>>,
}

/// Scan a raw transaction (hex) for tagged anchors.
///
/// A `DLM1` payload that fails to decode is still reported, with the codec
/// error in `record`. Untagged data outputs are skipped.
pub fn inspect_transaction(raw_hex: &str) -> Result<Vec<AnchorSighting>> {
    let raw = decode_hex(raw_hex)?;
    let outputs = scan_transaction(&raw)?;
    Ok(outputs
        .iter()
        .filter_map(|output| {
            let tag = output.tag?;
            let payload = output.anchor_payload()?.to_vec();
            let record = (tag == AnchorTag::Dlm1).then(|| decode_anchor(&payload));
            Some(AnchorSighting {
                vout: output.vout,
                tag,
                payload,
                record,
            })
        })
        .collect())
}

/// Verifies envelopes, bundles and versions under one policy.
pub struct AnchorVerifier<P> {
    headers: Arc<HeaderStore>,
    provider: P,
    config: VerifierConfig,
}

impl<P: BundleProvider> AnchorVerifier<P> {
    pub fn new(headers: Arc<HeaderStore>, provider: P, config: VerifierConfig) -> Self {
        Self {
            headers,
            provider,
            config,
        }
    }

    pub fn headers(&self) -> &Arc<HeaderStore> {
        &self.headers
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify one envelope at the configured confirmation depth.
    pub fn verify_envelope(&self, envelope: &SpvEnvelope) -> EnvelopeOutcome {
        self.verify_envelope_with(envelope, self.config.min_confirmations)
    }

    /// Verify one envelope at an explicit confirmation depth.
    pub fn verify_envelope_with(&self, envelope: &SpvEnvelope, min_confs: u64) -> EnvelopeOutcome {
        verify_envelope(envelope, &*self.headers.snapshot(), min_confs)
    }

    /// Verify a bundle against a single snapshot of the served chain.
    pub fn verify_bundle(&self, bundle: &LineageBundle) -> Result<BundleReport> {
        let snapshot = self.headers.snapshot();
        Ok(verify_bundle(bundle, &*snapshot, &self.config.bundle_options())?)
    }

    /// Fetch the bundle for `version_id` from the provider and verify it.
    pub async fn verify_version(&self, version_id: &str) -> Result<BundleReport> {
        let snapshot = self.headers.snapshot();
        let report = verify_version(
            &self.provider,
            version_id,
            self.config.bundle_depth,
            &*snapshot,
            &self.config.bundle_options(),
            self.config.bundle_fetch_timeout,
        )
        .await?;
        Ok(report)
    }

    /// Load the configured header mirror and keep reloading it.
    ///
    /// Returns `None` when no mirror is configured. The initial load must
    /// succeed; later reload failures only log.
    pub async fn start_hot_reload(&self) -> Result<Option<ReloadHandle>> {
        let Some(source) = self.config.headers.mirror_source()? else {
            return Ok(None);
        };
        let mut reloader = MirrorReloader::new(Arc::clone(&self.headers), source);
        reloader.initial_load().await?;
        Ok(Some(reloader.spawn(self.config.headers.reload_interval)))
    }
}

impl AnchorVerifier<HttpBundleProvider> {
    /// A verifier fetching bundles from `config.bundle_provider`.
    pub fn from_config(headers: Arc<HeaderStore>, config: VerifierConfig) -> Result<Self> {
        let url = config
            .bundle_provider
            .as_deref()
            .ok_or_else(|| Error::Config("no bundle provider configured".into()))?;
        let provider = HttpBundleProvider::new(url, config.bundle_fetch_timeout)?;
        Ok(Self::new(headers, provider, config))
    }
}
