//! Health summary shared by `pulsecheck health` and `GET /api/health`.

use serde::Serialize;

use crate::client::AnalysisClient;
use crate::config;
use crate::config::schema::PulseConfig;
use crate::session::{Clock, SessionStore};

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub analysis_url: String,
    pub analysis_reachable: bool,
    pub method: String,
    pub config_exists: bool,
    pub project_config_exists: bool,
    pub session_active: bool,
    /// Seconds until the stored session expires (0 when none).
    pub session_expires_in_secs: i64,
    pub logging_enabled: bool,
    pub log_exists: bool,
}

/// Probe the analysis service and inspect local state.
pub fn check(config: &PulseConfig, store: &SessionStore, clock: &impl Clock) -> HealthReport {
    let client = AnalysisClient::from_config(&config.analysis);
    let mut report = inspect(config, store, clock);
    report.analysis_reachable = client.is_reachable();
    report
}

/// Everything except the network probe.
pub fn inspect(config: &PulseConfig, store: &SessionStore, clock: &impl Clock) -> HealthReport {
    let client = AnalysisClient::from_config(&config.analysis);
    let session = store.load().filter(|s| !s.is_expired(clock));

    let exists = |path: Option<std::path::PathBuf>| path.is_some_and(|p| p.exists());

    HealthReport {
        analysis_url: client.endpoint().to_string(),
        analysis_reachable: false,
        method: client.method().to_string(),
        config_exists: exists(config::global_config_file()),
        project_config_exists: exists(config::project_config_file()),
        session_active: session.is_some(),
        session_expires_in_secs: session
            .map(|s| s.time_left(clock).num_seconds())
            .unwrap_or(0),
        logging_enabled: config.logging.enabled,
        log_exists: config.logging.enabled && exists(config::expand_home(&config.logging.path)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
