/*
 * http_transport.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * HTTP transport tests against a mock citation service.
 */

use quarto_citation_client::{ClientSettings, HttpTransport};
use quarto_citation_sync::{
    CitationSync, ConnectionStatus, DocumentState, Endpoint, InMemoryDocument, RemoteService,
    RequestErrorKind, Transport, parse_token,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer) -> HttpTransport {
    let settings = ClientSettings {
        server_url: format!("{}/", server.uri()),
        timeout_secs: 5,
    };
    HttpTransport::new(&settings).unwrap()
}

#[tokio::test]
async fn health_is_a_get_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let sync = CitationSync::new(transport_for(&server), InMemoryDocument::new());

    assert_eq!(sync.check_connection().await, ConnectionStatus::Connected);
}

#[tokio::test]
async fn unhealthy_status_is_a_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "degraded"})))
        .mount(&server)
        .await;

    let sync = CitationSync::new(transport_for(&server), InMemoryDocument::new());

    assert_eq!(
        sync.check_connection().await,
        ConnectionStatus::ServerError("degraded".to_string())
    );
}

#[tokio::test]
async fn post_sends_json_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sources/search"))
        .and(body_json(json!({"q": "roads", "limit": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "S1", "title": "Roman Roads", "type": "book", "year": 2020}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = RemoteService::new(transport_for(&server));
    let hits = service.search_sources("roads", Some(5)).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].display_title(), "Roman Roads (2020)");
}

#[tokio::test]
async fn error_detail_comes_from_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/citations/create"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "source_not_found"})))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .call(Endpoint::CreateCitation, Some(json!({"doc_id": "d", "source_id": "nope"})))
        .await
        .unwrap_err();

    assert_eq!(err.endpoint, Endpoint::CreateCitation);
    assert_eq!(
        err.kind,
        RequestErrorKind::Status {
            status: 404,
            detail: "source_not_found".to_string()
        }
    );
}

#[tokio::test]
async fn empty_error_body_becomes_request_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/render/refresh"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .call(Endpoint::RenderRefresh, Some(json!({})))
        .await
        .unwrap_err();

    assert_eq!(err.detail(), Some("request_failed"));
}

#[tokio::test]
async fn non_json_success_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/styles"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .call(Endpoint::ListStyles, None)
        .await
        .unwrap_err();

    assert!(matches!(err.kind, RequestErrorKind::Decode(_)));
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let settings = ClientSettings {
        server_url: format!("http://127.0.0.1:{}", port),
        timeout_secs: 5,
    };

    let err = HttpTransport::new(&settings)
        .unwrap()
        .call(Endpoint::Health, None)
        .await
        .unwrap_err();

    assert!(matches!(err.kind, RequestErrorKind::Unreachable(_)));
}

#[tokio::test]
async fn insert_runs_against_http_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/upsert"))
        .and(body_partial_json(json!({"name": "Chapter 3"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "document": {"id": "doc-9", "doc_fingerprint": "fp", "active_style_id": "chicago"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/citations/create"))
        .and(body_json(json!({"doc_id": "doc-9", "source_id": "S1", "locator": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "citation": {"citation_uuid": "c-42", "doc_id": "doc-9", "source_id": "S1"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/render/citation"))
        .and(body_json(json!({"citation_uuid": "c-42", "doc_id": "doc-9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "plain_text": "Smith, 2020",
            "runs": [{"text": "Smith", "italic": true}, {"text": ", 2020"}],
            "metadata": {"render_hash": "h1"},
            "style_version": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let document = InMemoryDocument::from_state(DocumentState::with_title("Chapter 3"));
    let sync = CitationSync::new(transport_for(&server), document.clone());

    let inserted = sync.insert_citation("S1", None).await.unwrap();

    let state = document.snapshot().await;
    let region = state.region(&inserted.region).unwrap();
    assert_eq!(region.text(), "Smith, 2020");
    let token = parse_token(region.tag.as_deref()).unwrap();
    assert_eq!(token.citation_uuid, "c-42");
    assert_eq!(token.doc_id, "doc-9");
    assert_eq!(token.style_id, "chicago");
    assert_eq!(token.cached_style_version, "3");
    assert_eq!(token.cached_render_hash, "h1");
}
