//! Web server tests: real `tiny_http` server on an ephemeral port, a stub
//! upstream and a frozen clock.

use std::path::Path;
use std::thread;

use anyhow::Result;
use chrono::{DateTime, Utc};
use pulsecheck::client::Profile;
use pulsecheck::config::schema::PulseConfig;
use pulsecheck::dashboard::Upstream;
use pulsecheck::events::{EventKind, EventLog};
use pulsecheck::insights::{InsightRecord, parse_records};
use pulsecheck::session::{FixedClock, Session, SessionStore};
use pulsecheck::web::{self, AppState};
use serde_json::{Value, json};
use tiny_http::Server;

const NOW: i64 = 1_700_000_000;

struct StubUpstream;

impl Upstream for StubUpstream {
    fn fetch_profile(&self, _token: &str) -> Result<Profile> {
        Ok(Profile {
            id: "42".to_string(),
            name: "Nimal Perera".to_string(),
            ..Default::default()
        })
    }

    fn fetch_insights(&self, _token: &str) -> Result<Vec<InsightRecord>> {
        Ok(parse_records(json!([
            {"label": "positive", "mentions_location": true, "is_respectful": true},
            {"label": "positive", "is_respectful": true},
            {"label": "negative"},
            {"label": "neutral", "is_respectful": true}
        ])))
    }
}

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// Start a server in the background and return its base URL.
fn start(dir: &Path) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();

    let state = AppState {
        config: PulseConfig::default(),
        store: SessionStore::at(dir.join("session.json")),
        log: EventLog::at(dir.join("events.jsonl")),
        upstream: StubUpstream,
        clock: FixedClock(at(NOW)),
    };

    thread::spawn(move || web::run(&server, &state));
    format!("http://{addr}")
}

fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new().redirects(0).build()
}

/// Status and JSON body, whether or not the status is an error.
fn get_json(url: &str) -> (u16, Value) {
    let resp = match agent().get(url).call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(_, resp)) => resp,
        Err(e) => panic!("request failed: {e}"),
    };
    let status = resp.status();
    (status, resp.into_json().unwrap())
}

// ---------------------------------------------------------------------------
// Login callback
// ---------------------------------------------------------------------------

#[test]
fn callback_stores_session_and_redirects() {
    let dir = tempfile::tempdir().unwrap();
    let base = start(dir.path());

    let expires = NOW + 3600;
    let resp = agent()
        .get(&format!("{base}/?token=EAAB&expires_at={expires}"))
        .call()
        .unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(resp.header("Location"), Some("/dashboard"));

    let store = SessionStore::at(dir.path().join("session.json"));
    assert_eq!(store.load(), Some(Session::new("EAAB", at(expires))));

    let events = EventLog::at(dir.path().join("events.jsonl")).read_all();
    assert_eq!(events[0].kind, EventKind::SessionStarted);
}

#[test]
fn landing_page_without_token() {
    let dir = tempfile::tempdir().unwrap();
    let base = start(dir.path());

    let resp = agent().get(&format!("{base}/")).call().unwrap();
    assert_eq!(resp.status(), 200);
    let html = resp.into_string().unwrap();
    assert!(html.contains("http://localhost:8000/auth/login"));
    assert!(!html.contains("{{login_url}}"));

    // "None" is what the login surface sends when it has no token.
    let resp = agent().get(&format!("{base}/?token=None")).call().unwrap();
    assert_eq!(resp.status(), 200);
    assert!(SessionStore::at(dir.path().join("session.json")).load().is_none());
}

// ---------------------------------------------------------------------------
// Dashboard API
// ---------------------------------------------------------------------------

#[test]
fn dashboard_requires_session() {
    let dir = tempfile::tempdir().unwrap();
    let base = start(dir.path());

    let (status, body) = get_json(&format!("{base}/api/dashboard"));
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Your session expired. Please login again.");
}

#[test]
fn expired_session_is_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::at(dir.path().join("session.json"));
    store.save(&Session::new("EAAB", at(NOW - 1))).unwrap();
    let base = start(dir.path());

    let (status, _) = get_json(&format!("{base}/api/dashboard"));
    assert_eq!(status, 401);
    assert!(store.load().is_none());

    let events = EventLog::at(dir.path().join("events.jsonl")).read_all();
    assert!(events.iter().any(|e| e.kind == EventKind::SessionExpired));
}

#[test]
fn dashboard_with_live_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::at(dir.path().join("session.json"));
    store.save(&Session::new("EAAB", at(NOW + 60))).unwrap();
    let base = start(dir.path());

    let (status, body) = get_json(&format!("{base}/api/dashboard"));
    assert_eq!(status, 200);
    assert_eq!(body["profile"]["name"], "Nimal Perera");
    assert_eq!(body["profile"]["birthday"], "N/A");
    assert_eq!(body["metrics"][0]["value"], "50%");
    assert_eq!(body["metrics"][2]["rating"], "Watch Location Sharing");
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 2);
    assert_eq!(body["posts"].as_array().unwrap().len(), 4);

    // The profile is now cached for the navigation bar.
    let (_, session) = get_json(&format!("{base}/api/session"));
    assert_eq!(session["active"], true);
    assert_eq!(session["expires_in_ms"], 60_000);
    assert_eq!(session["profile"]["name"], "Nimal Perera");
}

#[test]
fn logout_clears_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::at(dir.path().join("session.json"));
    store.save(&Session::new("EAAB", at(NOW + 60))).unwrap();
    let base = start(dir.path());

    let resp = agent().post(&format!("{base}/api/logout")).call().unwrap();
    assert_eq!(resp.status(), 200);
    assert!(store.load().is_none());

    let (_, session) = get_json(&format!("{base}/api/session"));
    assert_eq!(session["active"], false);
    assert!(session["profile"].is_null());
}

#[test]
fn unknown_route_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let base = start(dir.path());

    let (status, body) = get_json(&format!("{base}/api/nope"));
    assert_eq!(status, 404);
    assert_eq!(body["error"], "not found");
}
