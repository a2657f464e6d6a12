//! Embedded web dashboard for pulsecheck.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A login landing page and the single-page insights dashboard
//! - JSON API endpoints for the dashboard, session state and config management
//!
//! The external login surface redirects back to `/?token=...&expires_at=...`.
//! That request stores the session and redirects to `/dashboard`, so the token
//! never lingers in the address bar.
//!
//! Launched via `pulsecheck serve` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::borrow::Cow;
use std::io::Cursor;

use anyhow::{Context, Result};
use percent_encoding::percent_decode_str;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::config::schema::PulseConfig;
use crate::dashboard::{HttpUpstream, Upstream};
use crate::events::EventLog;
use crate::session::{Clock, Session, SessionStore, SystemClock};
use crate::utils::redact::redact_tokens;

pub(crate) type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

/// Everything a request handler needs.
pub struct AppState<U, C> {
    pub config: PulseConfig,
    pub store: SessionStore,
    pub log: EventLog,
    pub upstream: U,
    pub clock: C,
}

impl AppState<HttpUpstream, SystemClock> {
    /// State backed by the configured services and the wall clock.
    pub fn from_config(config: PulseConfig) -> Result<Self> {
        Ok(Self {
            store: SessionStore::from_config(&config.session)?,
            log: EventLog::from_config(&config.logging),
            upstream: HttpUpstream::from_config(&config),
            clock: SystemClock,
            config,
        })
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server on the given address.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user dashboard). Gracefully handles errors per-request
/// without crashing the server.
pub fn serve(addr: &str, config: PulseConfig) -> Result<()> {
    let open = config.web.open_browser;
    let state = AppState::from_config(config)?;

    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("pulsecheck dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open {
        let _ = open_browser(&format!("http://{addr}"));
    }

    run(&server, &state);
    Ok(())
}

/// Answer requests from `server` until it shuts down.
pub fn run<U: Upstream, C: Clock>(server: &Server, state: &AppState<U, C>) {
    for request in server.incoming_requests() {
        handle(state, request);
    }
}

fn handle<U: Upstream, C: Clock>(state: &AppState<U, C>, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();

    // Read body up-front for methods that carry one
    let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
        let mut buf = String::new();
        let _ = request.as_reader().read_to_string(&mut buf);
        Some(buf)
    } else {
        None
    };

    match dispatch(state, &method, &url, body.as_deref()) {
        Ok(resp) => {
            let _ = request.respond(resp);
        }
        Err(e) => {
            let message = redact_tokens(&format!("{e:#}")).into_owned();
            let _ = request.respond(json_error(500, &message));
        }
    }

    // Brief access log
    println!(
        "{} {} {}",
        method,
        redact_tokens(&url),
        chrono::Local::now().format("%H:%M:%S")
    );
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch<U: Upstream, C: Clock>(
    state: &AppState<U, C>,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<HttpResponse> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(landing(state, url)),
        (&Method::Get, "/dashboard") => Ok(dashboard_page(state, url)),

        // API: dashboard and session
        (&Method::Get, "/api/dashboard") => api::get_dashboard(state),
        (&Method::Get, "/api/session") => api::get_session(state),
        (&Method::Post, "/api/logout") => api::post_logout(state),

        // API: configuration
        (&Method::Get, "/api/config") => api::get_config(),
        (&Method::Put, "/api/config") => {
            let body = body.unwrap_or("{}");
            api::put_config(body)
        }
        (&Method::Post, "/api/config/reset") => api::post_config_reset(),

        // API: health
        (&Method::Get, "/api/health") => api::get_health(state),

        // 404
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// `GET /`: store a login callback, or show the login page.
fn landing<U: Upstream, C: Clock>(state: &AppState<U, C>, url: &str) -> HttpResponse {
    if accept_callback(state, url) {
        return redirect("/dashboard");
    }

    let login_url = html_escape(&state.config.web.login_url);
    html_response(&frontend::LOGIN_HTML.replace("{{login_url}}", &login_url))
}

/// `GET /dashboard`: the dashboard page. It checks the session itself via
/// `/api/dashboard` and bounces to `/` on 401.
fn dashboard_page<U: Upstream, C: Clock>(state: &AppState<U, C>, url: &str) -> HttpResponse {
    if accept_callback(state, url) {
        return redirect("/dashboard");
    }
    html_response(frontend::DASHBOARD_HTML)
}

/// Store the session carried by a login redirect, if the URL has one.
///
/// Returns whether a session was stored. A callback with a missing or
/// malformed token is ignored.
fn accept_callback<U: Upstream, C: Clock>(state: &AppState<U, C>, url: &str) -> bool {
    let Some(token) = query_param(url, "token") else {
        return false;
    };
    let expires_at = query_param(url, "expires_at").unwrap_or_default();

    let Ok(session) = Session::from_callback(&token, &expires_at) else {
        return false;
    };
    if state.store.save(&session).is_err() {
        return false;
    }
    state.log.session_started(session.expires_at);
    true
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Decode one query parameter from a request URL. `+` is a space.
pub(crate) fn query_param(url: &str, name: &str) -> Option<String> {
    url.split_once('?')?.1.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        if decode_component(k) == name {
            Some(decode_component(v).into_owned())
        } else {
            None
        }
    })
}

fn decode_component(raw: &str) -> Cow<'_, str> {
    if raw.contains('+') {
        let spaced = raw.replace('+', " ");
        Cow::Owned(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
    } else {
        percent_decode_str(raw).decode_utf8_lossy()
    }
}

fn html_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn html_response(html: &str) -> HttpResponse {
    Response::from_data(html.as_bytes().to_vec())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

/// `302 Found` to `location`.
fn redirect(location: &str) -> HttpResponse {
    Response::from_data(Vec::new())
        .with_header(Header::from_bytes("Location", location).unwrap())
        .with_status_code(StatusCode(302))
}

/// 404 response.
fn not_found() -> HttpResponse {
    json_error(404, "not found")
}

/// `{"error": message}` with the given status.
pub(crate) fn json_error(status: u16, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
