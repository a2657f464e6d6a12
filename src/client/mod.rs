//! HTTP clients for the two upstreams the dashboard reads from.
//!
//! - [`analysis::AnalysisClient`]: the external analysis service that walks
//!   the user's posts and comments and returns scored insight records.
//! - [`graph::GraphClient`]: the social graph API, for the profile card.
//!
//! Both use the synchronous `ureq` client. Error messages are passed through
//! [`redact_tokens`] before they leave this module, because `ureq` errors
//! embed the full request URL, access token included.

pub mod analysis;
pub mod graph;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::redact::redact_tokens;

pub use analysis::{AnalysisClient, AnalysisPayload};
pub use graph::GraphClient;

/// Timeout for reachability probes.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// The signed-in user's public profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Normalize a configured base URL.
///
/// Trailing slashes are dropped and `localhost` is pinned to `127.0.0.1`:
/// "localhost" may resolve to `::1` first and stall when the service only
/// binds IPv4.
fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/')
        .replace("://localhost", "://127.0.0.1")
}

/// Turn a `ureq` failure into an error with a readable, token-free message.
///
/// Status errors prefer the upstream's own error text (`{"error": "..."}` or
/// the Graph style `{"error": {"message": "..."}}`).
fn describe_error(what: &str, err: ureq::Error) -> anyhow::Error {
    let message = match err {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            match upstream_error_message(&body) {
                Some(msg) => format!("{what} failed with HTTP {code}: {msg}"),
                None => format!("{what} failed with HTTP {code}"),
            }
        }
        ureq::Error::Transport(transport) => format!("{what} failed: {transport}"),
    };
    anyhow::anyhow!(redact_tokens(&message).into_owned())
}

fn upstream_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = match error {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj.get("message")?.as_str()?.to_string(),
        _ => return None,
    };

    match value.get("details").and_then(Value::as_str) {
        Some(details) => Some(format!("{message} ({details})")),
        None => Some(message),
    }
}

/// Whether anything answers HTTP at `url`. Any status code counts.
fn probe(url: &str) -> bool {
    match ureq::get(url).timeout(PROBE_TIMEOUT).call() {
        Ok(_) | Err(ureq::Error::Status(..)) => true,
        Err(ureq::Error::Transport(_)) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_url_trims_and_pins_localhost() {
        assert_eq!(
            normalize_base_url("http://localhost:8000/"),
            "http://127.0.0.1:8000"
        );
        assert_eq!(
            normalize_base_url("https://graph.facebook.com"),
            "https://graph.facebook.com"
        );
    }

    #[test]
    fn upstream_error_message_shapes() {
        assert_eq!(
            upstream_error_message(r#"{"error": "Token missing"}"#).as_deref(),
            Some("Token missing")
        );
        assert_eq!(
            upstream_error_message(
                r#"{"error": "Failed to fetch or process Facebook data", "details": "boom"}"#
            )
            .as_deref(),
            Some("Failed to fetch or process Facebook data (boom)")
        );
        assert_eq!(
            upstream_error_message(
                r#"{"error": {"message": "Invalid OAuth access token.", "code": 190}}"#
            )
            .as_deref(),
            Some("Invalid OAuth access token.")
        );
        assert_eq!(upstream_error_message("<html>"), None);
        assert_eq!(upstream_error_message(r#"{"ok": true}"#), None);
    }
}
