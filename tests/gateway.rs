//! HTTP gateway behavior against a mock App Store Connect.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{any, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use asc_mcp::asc::dsym::Extractor;
use asc_mcp::asc::kinds::BundleIdPlatform;
use asc_mcp::asc::{AppStoreConnect, AscClient};
use asc_mcp::config::Credential;
use asc_mcp::error::AscError;

fn credential() -> Credential {
    let pem = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/AuthKey_TEST.p8"
    ))
    .unwrap();
    Credential {
        key_id: "TESTKEY123".into(),
        issuer_id: "00000000-0000-0000-0000-000000000000".into(),
        private_key: SecretString::from(pem),
        expiry: Duration::from_secs(1200),
    }
}

/// Stands in for `unzip`: checks the archive landed and drops one dSYM bundle.
struct FakeExtractor;

#[async_trait]
impl Extractor for FakeExtractor {
    async fn extract(&self, archive: &Path, destination: &Path) -> Result<(), AscError> {
        assert_eq!(std::fs::read(archive).unwrap(), b"PK-fake-zip");
        std::fs::create_dir_all(destination.join("App.app.dSYM")).unwrap();
        Ok(())
    }
}

async fn client(server: &MockServer) -> AscClient {
    AscClient::new(&server.uri(), &credential())
        .unwrap()
        .with_extractor(Arc::new(FakeExtractor))
}

fn build_body(state: &str, dsym_url: Option<String>) -> Value {
    let mut bundle = json!({"type": "buildBundles", "id": "bb1", "attributes": {"bundleId": "com.example.app"}});
    if let Some(url) = dsym_url {
        bundle["attributes"]["dSYMUrl"] = json!(url);
    }
    json!({
        "data": {"type": "builds", "id": "b1", "attributes": {"version": "42", "processingState": state}},
        "included": [bundle]
    })
}

async fn mount_build(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/v1/builds/b1"))
        .and(query_param("include", "buildBundles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn list_apps_sends_signed_filtered_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/apps"))
        .and(query_param("filter[bundleId]", "com.example.app"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"type": "apps", "id": "123", "attributes": {"name": "Example", "bundleId": "com.example.app"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let apps = client(&server)
        .await
        .list_apps(Some("com.example.app"))
        .await
        .unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].id, "123");
}

#[tokio::test]
async fn unauthorized_uses_error_detail() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{
                "status": "401",
                "code": "NOT_AUTHORIZED",
                "title": "Authentication credentials are missing or invalid.",
                "detail": "Provide a properly configured and signed bearer token."
            }]
        })))
        .mount(&server)
        .await;

    match client(&server).await.get_app("123").await {
        Err(AscError::AuthenticationFailed(message)) => {
            assert!(message.contains("signed bearer token"), "{message}");
        }
        other => panic!("expected AuthenticationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn status_codes_map_to_error_variants() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/apps"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(path("/v1/certificates"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;
    Mock::given(path("/v1/builds/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server).await;
    assert!(matches!(client.list_apps(None).await, Err(AscError::RateLimited)));
    match client.list_certificates(None).await {
        Err(AscError::ApiError { code, message }) => {
            assert_eq!(code, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
    assert!(matches!(
        client.get_build("missing", true).await,
        Err(AscError::BuildNotFound(id)) if id == "missing"
    ));
}

#[tokio::test]
async fn invalid_bundle_identifier_never_reaches_the_api() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let result = client(&server)
        .await
        .register_bundle_id("com.-example.app", "Example", &BundleIdPlatform::Ios)
        .await;
    assert!(matches!(result, Err(AscError::InvalidBundleId(_))));
}

#[tokio::test]
async fn profiles_resolve_bundle_ids_from_included() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/profiles"))
        .and(query_param("include", "bundleId"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"type": "profiles", "id": "p1", "attributes": {"name": "Store"},
                 "relationships": {"bundleId": {"data": {"type": "bundleIds", "id": "B1"}}}},
                {"type": "profiles", "id": "p2", "attributes": {"name": "Orphan"},
                 "relationships": {"bundleId": {"data": {"type": "bundleIds", "id": "B9"}}}}
            ],
            "included": [
                {"type": "bundleIds", "id": "B1", "attributes": {"identifier": "com.example.app"}}
            ]
        })))
        .mount(&server)
        .await;

    let list = client(&server).await.list_profiles(None).await.unwrap();
    assert_eq!(list.profiles.len(), 2);
    assert_eq!(list.bundle_identifier_for(&list.profiles[0]), Some("com.example.app"));
    assert_eq!(list.bundle_identifier_for(&list.profiles[1]), None);
}

#[tokio::test]
async fn dsyms_rejected_while_processing() {
    let server = MockServer::start().await;
    mount_build(&server, build_body("PROCESSING", Some("https://cdn.invalid/d.zip".into()))).await;
    let out = tempfile::tempdir().unwrap();

    match client(&server).await.download_dsyms("b1", out.path()).await {
        Err(AscError::DownloadFailed(message)) => assert!(message.contains("processing"), "{message}"),
        other => panic!("expected DownloadFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn dsyms_rejected_for_invalid_build() {
    let server = MockServer::start().await;
    mount_build(&server, build_body("INVALID", Some("https://cdn.invalid/d.zip".into()))).await;
    let out = tempfile::tempdir().unwrap();

    match client(&server).await.download_dsyms("b1", out.path()).await {
        Err(AscError::DownloadFailed(message)) => assert!(message.contains("invalid"), "{message}"),
        other => panic!("expected DownloadFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn dsyms_unavailable_without_url() {
    let server = MockServer::start().await;
    mount_build(&server, build_body("VALID", None)).await;
    let out = tempfile::tempdir().unwrap();

    match client(&server).await.download_dsyms("b1", out.path()).await {
        Err(AscError::DownloadFailed(message)) => {
            assert!(message.contains("may not be available"), "{message}");
        }
        other => panic!("expected DownloadFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn dsyms_downloaded_and_extracted() {
    let server = MockServer::start().await;
    mount_build(&server, build_body("VALID", Some(format!("{}/cdn/b1.zip", server.uri())))).await;
    Mock::given(method("GET"))
        .and(path("/cdn/b1.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK-fake-zip".to_vec()))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().unwrap();
    // Leftovers from an earlier run are replaced.
    std::fs::create_dir_all(out.path().join("dSYMs/Stale.app.dSYM")).unwrap();
    std::fs::write(out.path().join("dsyms-b1.zip"), b"old").unwrap();

    let directory = client(&server)
        .await
        .download_dsyms("b1", out.path())
        .await
        .unwrap();

    assert_eq!(directory, out.path().join("dSYMs"));
    assert!(directory.join("App.app.dSYM").is_dir());
    assert!(!directory.join("Stale.app.dSYM").exists());
    assert!(!out.path().join("dsyms-b1.zip").exists());
}

#[tokio::test]
async fn dsym_transfer_status_is_checked() {
    let server = MockServer::start().await;
    mount_build(&server, build_body("VALID", Some(format!("{}/cdn/b1.zip", server.uri())))).await;
    Mock::given(method("GET"))
        .and(path("/cdn/b1.zip"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().unwrap();
    match client(&server).await.download_dsyms("b1", out.path()).await {
        Err(AscError::DownloadFailed(message)) => assert!(message.contains("HTTP 403"), "{message}"),
        other => panic!("expected DownloadFailed, got {other:?}"),
    }
}
