/// Configuration schema and defaults for pulsecheck.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[analysis]`, `[graph]`, `[web]`, `[session]` and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level pulsecheck configuration.
///
/// Maps directly to `~/.pulsecheck/config.toml` and `.pulsecheck.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub analysis: AnalysisConfig,
    pub graph: GraphConfig,
    pub web: WebConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [analysis]
// ---------------------------------------------------------------------------

/// Scoring method requested from the analysis service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Trained classifier. Falls back to the lexicon server-side when the
    /// model is unavailable.
    #[default]
    Ml,
    /// Lexicon scoring.
    Nltk,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ml => write!(f, "ml"),
            Self::Nltk => write!(f, "nltk"),
        }
    }
}

/// External analysis service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Service base URL.
    pub base_url: String,
    /// Path of the analyze endpoint.
    pub path: String,
    pub method: Method,
    /// Request timeout (milliseconds). Analysis walks every post and comment,
    /// so this is generous.
    pub timeout_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            path: "/insights/analyze".to_string(),
            method: Method::default(),
            timeout_ms: 120_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [graph]
// ---------------------------------------------------------------------------

/// Social graph (profile) API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub base_url: String,
    /// Requested profile picture edge length in pixels.
    pub picture_size: u32,
    pub timeout_ms: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.facebook.com".to_string(),
            picture_size: 150,
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Embedded dashboard server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
    /// External login surface. It must redirect back to
    /// `/?token=...&expires_at=...` on success.
    pub login_url: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
            login_url: "http://localhost:8000/auth/login".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: "~/.pulsecheck/session.json".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Event log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether the JSONL event log is written.
    pub enabled: bool,
    /// Event log file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.pulsecheck/events.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl PulseConfig {
    /// Annotated default config file content, written by `pulsecheck config init`.
    pub fn default_toml() -> String {
        r#"# pulsecheck configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (PULSECHECK_*)
#   2. Project config (.pulsecheck.toml in current directory)
#   3. User global config (~/.pulsecheck/config.toml)
#   4. Built-in defaults

[analysis]
base_url = "http://localhost:8000"
path = "/insights/analyze"
method = "ml"             # ml | nltk
timeout_ms = 120000

[graph]
base_url = "https://graph.facebook.com"
picture_size = 150
timeout_ms = 10000

[web]
addr = "127.0.0.1:9747"
open_browser = true
login_url = "http://localhost:8000/auth/login"

[session]
path = "~/.pulsecheck/session.json"

[logging]
enabled = true
path = "~/.pulsecheck/events.jsonl"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
