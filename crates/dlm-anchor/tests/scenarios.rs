//! End-to-end verification scenarios through the facade.

use std::sync::Arc;
use std::time::Duration;

use dlm_anchor::headers::HeaderStoreConfig;
use dlm_anchor::identity::{sign_request, verify_request, IdentityKey, IdentityRejection};
use dlm_anchor::spv::{BlockRef, BundleError, NodeFailure, StaticBundleProvider};
use dlm_anchor::{AnchorVerifier, Error, HeaderStore, RejectReason, VerifierConfig};
use dlm_anchor_testkit::{HeaderChainBuilder, LineageFixture};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn verifier_for(lineage: &LineageFixture, config: VerifierConfig) -> AnchorVerifier<StaticBundleProvider> {
    let headers = Arc::new(HeaderStore::new());
    headers.load(lineage.headers.clone()).unwrap();
    let provider = StaticBundleProvider::new().with_bundle(lineage.bundle.clone());
    AnchorVerifier::new(headers, provider, config)
}

#[tokio::test]
async fn test_verify_version_through_provider() {
    init_tracing();
    let lineage = LineageFixture::new(4, 3);
    let verifier = verifier_for(&lineage, VerifierConfig::default());

    let report = verifier.verify_version(&lineage.target().to_uppercase()).await.unwrap();
    assert!(report.ok, "{report:?}");
    assert_eq!(report.nodes.len(), 4);
    assert_eq!(report.min_confirmations, lineage.expected_confirmations(3));
    for (g, id) in lineage.version_ids.iter().enumerate() {
        assert_eq!(report.node(id).unwrap().confirmations, lineage.expected_confirmations(g));
    }
}

#[tokio::test]
async fn test_weakest_ancestor_bounds_the_lineage() {
    init_tracing();
    let lineage = LineageFixture::new(3, 0);
    // The newest version sits at the tip with a single confirmation.
    let verifier = verifier_for(&lineage, VerifierConfig::default().with_min_confirmations(2));

    let report = verifier.verify_bundle(&lineage.bundle).unwrap();
    assert!(!report.ok);
    assert_eq!(report.min_confirmations, 1);
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].version_id, lineage.version_ids[2]);
    assert_eq!(
        failures[0].failure,
        Some(NodeFailure::Envelope(RejectReason::InsufficientConfs {
            confirmations: 1,
            required: 2,
        }))
    );
}

#[tokio::test]
async fn test_two_node_bundle_with_unconfirmed_node() {
    init_tracing();
    let mut lineage = LineageFixture::new(2, 0);

    // Re-point the newest proof at a header extending the tip that the
    // served chain has not seen yet.
    let tip = lineage.headers.last().unwrap().clone();
    let orphan_chain = HeaderChainBuilder::new(0).block(tip.merkle_root).build();
    let orphan = &orphan_chain[0];
    lineage.bundle.proofs[1].envelope.block = BlockRef::Header {
        block_header: hex::encode(orphan.raw),
    };

    let verifier = verifier_for(&lineage, VerifierConfig::default());
    let report = verifier.verify_bundle(&lineage.bundle).unwrap();
    assert!(!report.ok);
    assert_eq!(report.min_confirmations, 0);
    let node = report.node(&lineage.version_ids[1]).unwrap();
    assert_eq!(node.failure.map(|f| f.code()), Some("insufficient-confs"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["ok"], false);
    assert_eq!(json["minConfirmations"], 0);
}

#[tokio::test]
async fn test_bundle_fetch_timeout() {
    init_tracing();
    let lineage = LineageFixture::new(1, 0);
    let headers = Arc::new(HeaderStore::new());
    headers.load(lineage.headers.clone()).unwrap();
    let provider = StaticBundleProvider::new()
        .with_bundle(lineage.bundle.clone())
        .with_delay(Duration::from_millis(500));
    let config = VerifierConfig::default().with_bundle_fetch_timeout(Duration::from_millis(20));
    let verifier = AnchorVerifier::new(headers, provider, config);

    let err = verifier.verify_version(lineage.target()).await.unwrap_err();
    assert!(matches!(err, Error::Bundle(BundleError::Timeout(_))), "{err:?}");
}

#[tokio::test]
async fn test_unknown_version_is_not_found() {
    let lineage = LineageFixture::new(1, 0);
    let verifier = verifier_for(&lineage, VerifierConfig::default());
    let err = verifier.verify_version(&"0".repeat(64)).await.unwrap_err();
    assert!(matches!(err, Error::Bundle(BundleError::NotFound(_))), "{err:?}");

    let err = verifier.verify_version("not-an-id").await.unwrap_err();
    assert!(matches!(err, Error::Bundle(BundleError::Malformed(_))), "{err:?}");
}

#[tokio::test]
async fn test_hot_reload_from_mirror_file() {
    init_tracing();
    let lineage = LineageFixture::new(2, 0);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("headers.json");

    // Start with a chain that only reaches the first version's block.
    let records: Vec<_> = lineage.headers.iter().map(|h| h.to_record()).collect();
    std::fs::write(&path, serde_json::to_string(&records[..1]).unwrap()).unwrap();

    let config = VerifierConfig::default().with_headers(
        HeaderStoreConfig::default()
            .with_mirror(path.to_string_lossy().to_string())
            .with_reload_interval(Duration::from_millis(20)),
    );
    let verifier = AnchorVerifier::new(
        Arc::new(HeaderStore::new()),
        StaticBundleProvider::new().with_bundle(lineage.bundle.clone()),
        config,
    );
    let handle = verifier.start_hot_reload().await.unwrap().unwrap();
    assert_eq!(verifier.headers().generation(), 1);

    let before = verifier.verify_bundle(&lineage.bundle).unwrap();
    assert!(!before.ok);
    assert_eq!(
        before.node(&lineage.version_ids[1]).unwrap().failure.map(|f| f.code()),
        Some("unknown-block")
    );

    // A broken artifact is ignored; the served chain stays in place.
    std::fs::write(&path, "{not json").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(verifier.headers().best_height(), lineage.headers[0].height);

    std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();
    let mut reloaded = false;
    for _ in 0..100 {
        if verifier.headers().best_height() == lineage.headers[1].height {
            reloaded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(reloaded, "mirror update was never picked up");

    let after = verifier.verify_bundle(&lineage.bundle).unwrap();
    assert!(after.ok, "{after:?}");
    assert_eq!(after.min_confirmations, 1);
    handle.stop();
}

#[tokio::test]
async fn test_config_from_env_lookup_drives_verifier() {
    let config = VerifierConfig::from_lookup(|name| match name {
        "POLICY_MIN_CONFS" => Some("3".into()),
        "BUNDLE_PROVIDER_URL" => Some("http://127.0.0.1:9/".into()),
        _ => None,
    })
    .unwrap();
    let verifier = AnchorVerifier::from_config(Arc::new(HeaderStore::new()), config).unwrap();
    assert_eq!(verifier.provider().base_url(), "http://127.0.0.1:9");
    assert_eq!(verifier.config().bundle_options().min_confirmations, 3);
    assert!(verifier.start_hot_reload().await.unwrap().is_none());
}

#[test]
fn test_identity_signed_request() {
    let key = IdentityKey::generate();
    let body = br#"{"versionId":"3c692438279534dbbd5a7efe37c0f8b29253e03caffa41da5f16f7d1262717c0"}"#;
    let headers = sign_request(&key, body).unwrap();

    let check = verify_request(&headers, body);
    assert!(check.is_ok());
    assert_eq!(check.identity_key(), Some(key.public_key_hex().as_str()));

    let check = verify_request(&headers, b"{}");
    assert_eq!(check.rejection(), Some(IdentityRejection::BadSignature));
}
