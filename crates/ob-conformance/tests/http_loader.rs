//! # Integration Tests for the HTTP Context Loader
//!
//! Runs [`HttpLoader`] and a remote-backed [`ConformanceValidator`] against
//! wiremock servers to check request headers, status handling, parse
//! failures and context caching without network access.

use std::sync::Arc;
use std::time::Duration;

use ob_conformance::{
    ConformanceError, ConformanceValidator, DocumentLoader, HttpLoader, LoaderError,
};
use serde_json::json;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn loader() -> HttpLoader {
    HttpLoader::new(Duration::from_secs(5)).expect("loader build")
}

fn context_document() -> serde_json::Value {
    json!({
        "@context": {
            "id": "@id",
            "type": "@type",
            "obi": "https://w3id.org/openbadges#",
            "Assertion": "obi:Assertion",
            "uid": "obi:uid",
            "recipient": "obi:recipient",
            "identity": "obi:identityHash",
            "hashed": "obi:hashed",
            "email": "http://schema.org/email",
            "issuedOn": "obi:issueDate",
            "badge": "obi:badge"
        }
    })
}

// ── HttpLoader ───────────────────────────────────────────────────────────

#[tokio::test]
async fn fetches_context_with_json_ld_accept_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1"))
        .and(header_regex("Accept", r"application/ld\+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(context_document()))
        .expect(1)
        .mount(&server)
        .await;

    let doc = loader()
        .load(&format!("{}/v1", server.uri()))
        .await
        .expect("load");
    assert_eq!(doc["@context"]["uid"], "obi:uid");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let err = loader().load(&url).await.unwrap_err();
    assert_eq!(err, LoaderError::Status { url, status: 404 });
}

#[tokio::test]
async fn non_json_body_is_a_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let err = loader()
        .load(&format!("{}/html", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, LoaderError::Parse { .. }));
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let url = "http://127.0.0.1:1/v1";
    let err = loader().load(url).await.unwrap_err();
    assert!(matches!(err, LoaderError::Http { .. }));
}

// ── Remote-backed validator ──────────────────────────────────────────────

#[tokio::test]
async fn remote_context_fetched_once_across_validations() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ctx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(context_document()))
        .expect(1)
        .mount(&server)
        .await;

    let ctx_url = format!("{}/ctx", server.uri());
    let validator = ConformanceValidator::new(Arc::new(loader())).expect("validator");

    for uid in ["first", "second"] {
        let doc = json!({
            "@context": ctx_url,
            "type": "Assertion",
            "id": "https://example.org/assertions/1",
            "uid": uid,
            "recipient": {"identity": "alice@example.org", "hashed": false, "type": "email"},
            "issuedOn": "2016-01-01T00:00:00Z",
            "badge": "https://example.org/badges/1"
        });
        validator
            .validate(doc.as_object().unwrap(), &ctx_url)
            .await
            .expect("valid");
    }
    assert_eq!(validator.cached_contexts(), 1);
    assert_eq!(validator.cached_verdicts(), 2);
}

#[tokio::test]
async fn failed_remote_load_is_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ctx"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let ctx_url = format!("{}/ctx", server.uri());
    let validator = ConformanceValidator::new(Arc::new(loader())).expect("validator");
    let doc = json!({
        "type": "Assertion",
        "id": "https://example.org/assertions/1",
        "uid": "x",
        "recipient": {"identity": "alice@example.org", "hashed": false, "type": "email"},
        "issuedOn": "2016-01-01T00:00:00Z",
        "badge": "https://example.org/badges/1"
    });

    for _ in 0..2 {
        let err = validator
            .validate(doc.as_object().unwrap(), &ctx_url)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConformanceError::Loader {
                source: LoaderError::Status { status: 503, .. },
                ..
            }
        ));
    }
    assert_eq!(validator.cached_contexts(), 0);
}
