//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content.

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Response, StatusCode};

use crate::client::Profile;
use crate::config;
use crate::dashboard::{self, Upstream};
use crate::health;
use crate::session::{Clock, EXPIRED_MESSAGE, Session, SessionError};

use super::{AppState, HttpResponse, content_type_json, json_error};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// Session API response, read by the navigation bar and the expiry timer.
#[derive(Serialize)]
struct SessionResponse {
    active: bool,
    /// Milliseconds until expiry, 0 when inactive.
    expires_in_ms: i64,
    profile: Option<Profile>,
}

/// Config API response: the full config as a JSON value + the raw TOML.
#[derive(Serialize)]
struct ConfigResponse {
    config: config::schema::PulseConfig,
    toml_text: String,
}

/// Config update request: a list of key-value pairs.
#[derive(serde::Deserialize)]
struct ConfigUpdateRequest {
    updates: Vec<ConfigKeyValue>,
}

#[derive(serde::Deserialize)]
struct ConfigKeyValue {
    key: String,
    value: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<HttpResponse> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

/// The live session, logging an expiry when the stored one just lapsed.
fn live_session<U, C: Clock>(state: &AppState<U, C>) -> Result<Session, SessionError> {
    let result = state.store.validate(&state.clock);
    if matches!(result, Err(SessionError::Expired)) {
        state.log.session_expired();
    }
    result
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/dashboard` - fetch, aggregate and lay out the user's insights.
///
/// 401 with the expiry message when there is no live session.
pub fn get_dashboard<U: Upstream, C: Clock>(state: &AppState<U, C>) -> Result<HttpResponse> {
    let session = match live_session(state) {
        Ok(session) => session,
        Err(_) => return Ok(json_error(401, EXPIRED_MESSAGE)),
    };

    let dashboard =
        dashboard::load_with(&state.upstream, &session, Some(&state.store), &state.log);
    json_response(&dashboard)
}

/// `GET /api/session` - session state and the cached profile.
pub fn get_session<U, C: Clock>(state: &AppState<U, C>) -> Result<HttpResponse> {
    let resp = match live_session(state) {
        Ok(session) => SessionResponse {
            active: true,
            expires_in_ms: session.time_left(&state.clock).num_milliseconds(),
            profile: state.store.cached_profile(),
        },
        Err(_) => SessionResponse {
            active: false,
            expires_in_ms: 0,
            profile: None,
        },
    };

    json_response(&resp)
}

/// `POST /api/logout` - forget the stored session.
pub fn post_logout<U, C>(state: &AppState<U, C>) -> Result<HttpResponse> {
    state.store.clear()?;
    state.log.session_cleared();

    json_response(&serde_json::json!({ "success": true }))
}

/// `GET /api/config` - current effective configuration.
pub fn get_config() -> Result<HttpResponse> {
    let cfg = config::load();
    let toml_text = toml::to_string_pretty(&cfg).unwrap_or_default();

    let resp = ConfigResponse {
        config: cfg,
        toml_text,
    };

    json_response(&resp)
}

/// `PUT /api/config` - update configuration keys.
///
/// Expects JSON body: `{ "updates": [{ "key": "analysis.method", "value": "nltk" }] }`
pub fn put_config(body: &str) -> Result<HttpResponse> {
    let req: ConfigUpdateRequest =
        serde_json::from_str(body).context("invalid JSON in config update request")?;

    let mut errors: Vec<String> = Vec::new();
    let mut applied: Vec<String> = Vec::new();

    for kv in &req.updates {
        match config::set_config_value(&kv.key, &kv.value) {
            Ok(()) => applied.push(format!("{} = {}", kv.key, kv.value)),
            Err(e) => errors.push(format!("{}: {}", kv.key, e)),
        }
    }

    let result = serde_json::json!({
        "applied": applied,
        "errors": errors,
        "success": errors.is_empty(),
    });

    json_response(&result)
}

/// `POST /api/config/reset` - reset config to defaults.
pub fn post_config_reset() -> Result<HttpResponse> {
    config::reset_config().context("failed to reset config")?;

    let result = serde_json::json!({
        "success": true,
        "message": "Configuration reset to defaults",
    });

    json_response(&result)
}

/// `GET /api/health` - analysis service reachability and local state.
pub fn get_health<U, C: Clock>(state: &AppState<U, C>) -> Result<HttpResponse> {
    let report = health::check(&state.config, &state.store, &state.clock);
    json_response(&report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
