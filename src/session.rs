//! Login session: the access token handed back by the external login
//! surface, and when it stops being valid.
//!
//! A [`Session`] is an explicit value passed to whatever renders the
//! dashboard. Expiry is always checked against an injected [`Clock`], so the
//! same code path runs in tests with a [`FixedClock`].
//!
//! [`SessionStore`] persists the session (and the last fetched profile, for
//! the navigation bar) to `~/.pulsecheck/session.json` between runs.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::Profile;
use crate::config::expand_home;
use crate::config::schema::SessionConfig;

/// Message shown to the user when their session is gone.
pub const EXPIRED_MESSAGE: &str = "Your session expired. Please login again.";

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now" for expiry checks.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no active session")]
    Missing,
    #[error("Your session expired. Please login again.")]
    Expired,
    #[error("invalid session expiry: {0:?}")]
    InvalidExpiry(String),
}

/// An access token and its expiry instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Build a session from the login redirect's `token` and `expires_at`
    /// (unix seconds) query values.
    pub fn from_callback(token: &str, expires_at: &str) -> Result<Self, SessionError> {
        let token = token.trim();
        if token.is_empty() || token == "None" {
            return Err(SessionError::Missing);
        }

        // Fractional seconds are truncated.
        let secs = expires_at
            .trim()
            .split('.')
            .next()
            .and_then(|whole| whole.parse::<i64>().ok())
            .ok_or_else(|| SessionError::InvalidExpiry(expires_at.to_string()))?;
        let expires_at = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| SessionError::InvalidExpiry(expires_at.to_string()))?;

        Ok(Self::new(token, expires_at))
    }

    /// A session is expired once `now` is strictly past its expiry.
    pub fn is_expired(&self, clock: &impl Clock) -> bool {
        clock.now() > self.expires_at
    }

    /// Remaining lifetime, zero once expired.
    pub fn time_left(&self, clock: &impl Clock) -> Duration {
        (self.expires_at - clock.now()).max(Duration::zero())
    }
}

// ---------------------------------------------------------------------------
// Persistent store
// ---------------------------------------------------------------------------

/// On-disk session file layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    #[serde(flatten)]
    session: Session,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile: Option<Profile>,
}

/// File-backed session storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let path = expand_home(&config.path).context("could not determine home directory")?;
        Ok(Self { path })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored session, expired or not. A missing or unreadable file is
    /// "no session".
    pub fn load(&self) -> Option<Session> {
        self.read().map(|stored| stored.session)
    }

    /// Profile cached alongside the current session.
    pub fn cached_profile(&self) -> Option<Profile> {
        self.read().and_then(|stored| stored.profile)
    }

    /// Store a new session, dropping any profile cached for the old one.
    pub fn save(&self, session: &Session) -> Result<()> {
        self.write(&StoredSession {
            session: session.clone(),
            profile: None,
        })
    }

    /// Cache a profile next to the current session. No-op without a session.
    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        let Some(mut stored) = self.read() else {
            return Ok(());
        };
        stored.profile = Some(profile.clone());
        self.write(&stored)
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("failed to remove session file"),
        }
    }

    /// Return the live session, or why there is none.
    ///
    /// An expired session is removed from disk before returning
    /// [`SessionError::Expired`].
    pub fn validate(&self, clock: &impl Clock) -> Result<Session, SessionError> {
        let session = self.load().ok_or(SessionError::Missing)?;
        if session.is_expired(clock) {
            if let Err(e) = self.clear() {
                eprintln!("[pulsecheck] {e:#}");
            }
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    fn read(&self) -> Option<StoredSession> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn write(&self, stored: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create session directory")?;
        }

        let json = serde_json::to_string_pretty(stored).context("failed to serialize session")?;

        let mut options = fs::OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        file.write_all(json.as_bytes())
            .context("failed to write session file")?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn from_callback_parses_unix_seconds() {
        let session = Session::from_callback("EAAB", "1700000000").unwrap();
        assert_eq!(session.token, "EAAB");
        assert_eq!(session.expires_at, at(1_700_000_000));

        let session = Session::from_callback("EAAB", " 1700000000.75 ").unwrap();
        assert_eq!(session.expires_at, at(1_700_000_000));
    }

    #[test]
    fn from_callback_rejects_bad_input() {
        assert_eq!(
            Session::from_callback("", "1700000000"),
            Err(SessionError::Missing)
        );
        assert_eq!(
            Session::from_callback("None", "1700000000"),
            Err(SessionError::Missing)
        );
        assert!(matches!(
            Session::from_callback("EAAB", "soon"),
            Err(SessionError::InvalidExpiry(_))
        ));
        assert!(matches!(
            Session::from_callback("EAAB", ""),
            Err(SessionError::InvalidExpiry(_))
        ));
    }

    #[test]
    fn expiry_is_strict() {
        let session = Session::new("t", at(1000));
        assert!(!session.is_expired(&FixedClock(at(999))));
        assert!(!session.is_expired(&FixedClock(at(1000))));
        assert!(session.is_expired(&FixedClock(at(1001))));
    }

    #[test]
    fn time_left_saturates_at_zero() {
        let session = Session::new("t", at(1000));
        assert_eq!(session.time_left(&FixedClock(at(940))), Duration::seconds(60));
        assert_eq!(session.time_left(&FixedClock(at(2000))), Duration::zero());
    }

    #[test]
    fn store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("state").join("session.json"));
        assert!(store.load().is_none());

        let session = Session::new("EAAB", at(5000));
        store.save(&session).unwrap();
        assert_eq!(store.load(), Some(session));

        store.clear().unwrap();
        assert!(store.load().is_none());
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn validate_reports_missing_and_clears_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        assert_eq!(
            store.validate(&FixedClock(at(0))),
            Err(SessionError::Missing)
        );

        store.save(&Session::new("EAAB", at(100))).unwrap();
        assert!(store.validate(&FixedClock(at(50))).is_ok());
        assert_eq!(
            store.validate(&FixedClock(at(101))),
            Err(SessionError::Expired)
        );
        assert!(store.load().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn expired_session_reported_when_file_cannot_be_removed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        let store = SessionStore::at(locked.join("session.json"));
        store.save(&Session::new("EAAB", at(100))).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        let clock = FixedClock(at(101));
        assert_eq!(store.validate(&clock), Err(SessionError::Expired));
        // Without write access the stale file stays and keeps reading as expired.
        if locked.join("session.json").exists() {
            assert_eq!(store.validate(&clock), Err(SessionError::Expired));
        }

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn profile_cache_follows_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        let profile = Profile {
            id: "1".to_string(),
            name: "Nimal Perera".to_string(),
            ..Default::default()
        };

        // Without a session nothing is cached.
        store.save_profile(&profile).unwrap();
        assert!(store.cached_profile().is_none());

        store.save(&Session::new("EAAB", at(100))).unwrap();
        store.save_profile(&profile).unwrap();
        assert_eq!(store.cached_profile(), Some(profile));

        // A new login drops the old profile.
        store.save(&Session::new("EAAC", at(200))).unwrap();
        assert!(store.cached_profile().is_none());
    }

    #[test]
    fn corrupt_file_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let store = SessionStore::at(path);
        assert!(store.load().is_none());
        assert_eq!(
            store.validate(&FixedClock(at(0))),
            Err(SessionError::Missing)
        );
    }

    #[test]
    fn expired_error_carries_user_message() {
        assert_eq!(SessionError::Expired.to_string(), EXPIRED_MESSAGE);
    }
}
