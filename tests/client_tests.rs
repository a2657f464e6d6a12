//! HTTP client tests against local `tiny_http` stub servers.

use std::thread::{self, JoinHandle};

use pulsecheck::client::{AnalysisClient, GraphClient};
use pulsecheck::config::schema::{AnalysisConfig, GraphConfig, Method};
use tiny_http::{Header, Response, Server, StatusCode};

/// Serve exactly one request with `status` and `body`, returning the
/// requested URL from the join handle.
fn stub_server(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();

    let handle = thread::spawn(move || {
        let request = server.recv().unwrap();
        let url = request.url().to_string();
        let resp = Response::from_string(body)
            .with_header(Header::from_bytes("Content-Type", "application/json").unwrap())
            .with_status_code(StatusCode(status));
        request.respond(resp).unwrap();
        url
    });

    (format!("http://{addr}"), handle)
}

/// An address nothing listens on.
fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn analysis_client(base_url: String) -> AnalysisClient {
    AnalysisClient::from_config(&AnalysisConfig {
        base_url,
        method: Method::Nltk,
        timeout_ms: 5_000,
        ..AnalysisConfig::default()
    })
}

fn graph_client(base_url: String) -> GraphClient {
    GraphClient::from_config(&GraphConfig {
        base_url,
        picture_size: 150,
        timeout_ms: 5_000,
    })
}

// ---------------------------------------------------------------------------
// Analysis client
// ---------------------------------------------------------------------------

#[test]
fn analysis_fetch_decodes_insights() {
    let (base, handle) = stub_server(
        200,
        r#"{
            "profile": {"id": "1", "name": "Nimal"},
            "insights": [
                {"label": "positive", "original": "Great match!", "timestamp": "2024-03-01T10:00:00+0000", "type": "post"},
                {"label": "neutral", "original": "ok", "type": "comment"}
            ]
        }"#,
    );

    let payload = analysis_client(base).fetch("EAAB").unwrap();
    assert_eq!(payload.insights.len(), 2);
    assert_eq!(payload.insights[0].original, "Great match!");
    assert_eq!(payload.insights[1].kind.as_deref(), Some("comment"));
    assert!(payload.profile.is_some());

    let url = handle.join().unwrap();
    assert!(url.starts_with("/insights/analyze?"));
    assert!(url.contains("token=EAAB"));
    assert!(url.contains("method=nltk"));
}

#[test]
fn analysis_missing_insights_is_empty() {
    let (base, handle) = stub_server(200, r#"{"profile": {}}"#);
    let payload = analysis_client(base).fetch("EAAB").unwrap();
    assert!(payload.insights.is_empty());
    handle.join().unwrap();
}

#[test]
fn analysis_error_uses_service_message() {
    let (base, handle) = stub_server(
        500,
        r#"{"error": "Failed to fetch or process Facebook data", "details": "rate limited"}"#,
    );
    let err = analysis_client(base).fetch("SECRET").unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("HTTP 500"));
    assert!(message.contains("rate limited"));
    assert!(!message.contains("SECRET"));
    handle.join().unwrap();
}

#[test]
fn analysis_transport_error_hides_token() {
    let err = analysis_client(dead_url()).fetch("SECRET").unwrap_err();
    assert!(!format!("{err:#}").contains("SECRET"));
}

#[test]
fn analysis_reachability() {
    let (base, handle) = stub_server(404, "{}");
    assert!(analysis_client(base).is_reachable());
    handle.join().unwrap();

    assert!(!analysis_client(dead_url()).is_reachable());
}

// ---------------------------------------------------------------------------
// Graph client
// ---------------------------------------------------------------------------

#[test]
fn graph_fetch_profile() {
    let (base, handle) = stub_server(
        200,
        r#"{
            "id": "42",
            "name": "Nimal Perera",
            "birthday": "01/02/1990",
            "picture": {"data": {"url": "https://cdn.example/p.jpg", "width": 150, "height": 150}}
        }"#,
    );

    let profile = graph_client(base).fetch_profile("EAAB").unwrap();
    assert_eq!(profile.name, "Nimal Perera");
    assert_eq!(profile.birthday.as_deref(), Some("01/02/1990"));
    assert!(profile.gender.is_none());
    assert_eq!(
        profile.picture_url.as_deref(),
        Some("https://cdn.example/p.jpg")
    );

    let url = handle.join().unwrap();
    assert!(url.starts_with("/me?"));
    assert!(url.contains("access_token=EAAB"));
    assert!(url.contains("fields="));
}

#[test]
fn graph_error_message() {
    let (base, handle) = stub_server(
        400,
        r#"{"error": {"message": "Invalid OAuth access token.", "type": "OAuthException", "code": 190}}"#,
    );
    let err = graph_client(base).fetch_profile("SECRET").unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Invalid OAuth access token."));
    assert!(!message.contains("SECRET"));
    handle.join().unwrap();
}
