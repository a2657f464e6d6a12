//! Event log: one JSON line per notable dashboard event.
//!
//! Records session hand-offs and expiries, failed upstream fetches, and
//! rendered dashboards so an operator can see why a dashboard came up empty.
//! Token values never reach the log; free-form detail is passed through
//! [`redact_tokens`] first.
//!
//! Log file: `~/.pulsecheck/events.jsonl` (see `[logging]`).

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::expand_home;
use crate::config::schema::LoggingConfig;
use crate::utils::redact::redact_tokens;

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStarted,
    SessionExpired,
    SessionCleared,
    FetchFailed,
    DashboardRendered,
}

/// Which upstream a fetch failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchSource {
    Profile,
    Insights,
}

impl std::fmt::Display for FetchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Profile => write!(f, "profile"),
            Self::Insights => write!(f, "insights"),
        }
    }
}

/// A single event entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: String,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<FetchSource>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
    /// Number of insight records (dashboard renders only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub records: Option<usize>,
}

impl Event {
    fn new(kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            kind,
            source: None,
            detail: None,
            records: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Append-only JSONL event log.
///
/// All writes are best-effort: a failing log never fails a request.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            path: config
                .enabled
                .then(|| expand_home(&config.path))
                .flatten(),
        }
    }

    /// Log to an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A log that drops every event.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn session_started(&self, expires_at: DateTime<Utc>) {
        let mut event = Event::new(EventKind::SessionStarted);
        event.detail = Some(format!("expires at {}", expires_at.to_rfc3339()));
        self.write(&event);
    }

    pub fn session_expired(&self) {
        self.write(&Event::new(EventKind::SessionExpired));
    }

    pub fn session_cleared(&self) {
        self.write(&Event::new(EventKind::SessionCleared));
    }

    pub fn fetch_failed(&self, source: FetchSource, error: &anyhow::Error) {
        let mut event = Event::new(EventKind::FetchFailed);
        event.source = Some(source);
        event.detail = Some(redact_tokens(&format!("{error:#}")).into_owned());
        self.write(&event);
    }

    pub fn dashboard_rendered(&self, records: usize) {
        let mut event = Event::new(EventKind::DashboardRendered);
        event.records = Some(records);
        self.write(&event);
    }

    fn write(&self, event: &Event) {
        let _ = self.append(event);
    }

    fn append(&self, event: &Event) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(event)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Read every event back. Malformed lines are skipped.
    pub fn read_all(&self) -> Vec<Event> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<Event>(&line).ok())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
