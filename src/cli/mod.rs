//! CLI command implementations for pulsecheck.
//!
//! Provides subcommand handlers for:
//! - `pulsecheck serve` - run the web dashboard
//! - `pulsecheck login` / `logout` - store or forget a session
//! - `pulsecheck report` - fetch and print the dashboard for the stored session
//! - `pulsecheck aggregate FILE` - aggregate a saved analysis payload offline
//! - `pulsecheck health` - check the analysis service, config and session
//! - `pulsecheck config show|init|set|reset` - configuration management

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::client::AnalysisPayload;
use crate::config;
use crate::dashboard::{self, Dashboard, MetricCard};
use crate::events::EventLog;
use crate::health;
use crate::session::{Session, SessionError, SessionStore, SystemClock};
use crate::web;

/// Output format for report commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Posts shown in the table report.
const TABLE_POST_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// pulsecheck serve
// ---------------------------------------------------------------------------

/// Run the web dashboard until interrupted.
pub fn run_serve(addr: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let addr = addr.unwrap_or(&cfg.web.addr).to_string();
    web::serve(&addr, cfg)
}

// ---------------------------------------------------------------------------
// pulsecheck login | logout
// ---------------------------------------------------------------------------

/// Store a session from a token and its expiry (unix seconds).
pub fn run_login(token: &str, expires_at: &str) -> Result<()> {
    let cfg = config::load();
    let store = SessionStore::from_config(&cfg.session)?;
    let session = Session::from_callback(token, expires_at)?;

    if session.is_expired(&SystemClock) {
        bail!("session already expired at {}", session.expires_at.to_rfc3339());
    }

    store.save(&session)?;
    EventLog::from_config(&cfg.logging).session_started(session.expires_at);

    let left = session.time_left(&SystemClock);
    println!(
        "{} Session stored, expires in {}m",
        "✓".green().bold(),
        left.num_minutes()
    );
    Ok(())
}

/// Forget the stored session.
pub fn run_logout() -> Result<()> {
    let cfg = config::load();
    let store = SessionStore::from_config(&cfg.session)?;
    store.clear()?;
    EventLog::from_config(&cfg.logging).session_cleared();

    println!("{} Logged out", "✓".green().bold());
    Ok(())
}

// ---------------------------------------------------------------------------
// pulsecheck report
// ---------------------------------------------------------------------------

/// Fetch the dashboard for the stored session and print it.
pub fn run_report(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let store = SessionStore::from_config(&cfg.session)?;

    let session = match store.validate(&SystemClock) {
        Ok(session) => session,
        Err(SessionError::Expired) => {
            EventLog::from_config(&cfg.logging).session_expired();
            bail!(SessionError::Expired);
        }
        Err(e) => bail!("{e} (run `pulsecheck login` or `pulsecheck serve` first)"),
    };

    let dashboard = dashboard::load(&cfg, &session);
    print_dashboard(&dashboard, format)
}

// ---------------------------------------------------------------------------
// pulsecheck aggregate
// ---------------------------------------------------------------------------

/// Aggregate a saved analysis response (or bare record array) offline.
pub fn run_aggregate(path: &Path, format: OutputFormat) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let payload = AnalysisPayload::from_json(&text)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    let dashboard = Dashboard::build(None, &payload.insights);
    print_dashboard(&dashboard, format)
}

// ---------------------------------------------------------------------------
// Dashboard output
// ---------------------------------------------------------------------------

fn print_dashboard(dashboard: &Dashboard, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(dashboard)?),
        OutputFormat::Csv => print_dashboard_csv(dashboard),
        OutputFormat::Table => print_dashboard_table(dashboard),
    }
    Ok(())
}

fn print_dashboard_table(dashboard: &Dashboard) {
    println!("{}", dashboard.title.bold().cyan());
    println!("{}", "=".repeat(60));

    if let Some(profile) = &dashboard.profile {
        println!("  {}", profile.name.bold());
        println!("  {} {}", "Birthday:".dimmed(), profile.birthday);
        println!("  {} {}", "Gender:  ".dimmed(), profile.gender);
    }
    println!();

    // Metric cards
    for card in &dashboard.metrics {
        println!(
            "  {:<26} {:>5}  {}",
            card.title.bold(),
            card.value,
            colorize_rating(card)
        );
    }
    println!();

    // Sentiment split
    println!("{}", "Sentiment".bold().cyan());
    match &dashboard.chart {
        Some(slices) => {
            let line = slices
                .iter()
                .map(|s| format!("{}: {}", s.label, s.count))
                .collect::<Vec<_>>()
                .join("  ");
            println!("  {line}");
        }
        None => println!("  {}", dashboard::NO_SENTIMENT_DATA.dimmed()),
    }
    println!();

    // Recommendations
    println!("{}", "Personalized Recommendations".bold().cyan());
    if dashboard.recommendations.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for rec in &dashboard.recommendations {
        println!("  {rec}");
    }
    println!();

    // Posts
    if !dashboard.posts.is_empty() {
        println!("{}", "Post-by-Post Sentiment".bold().cyan());
        println!("  {:<19} {:<9} Post", "Time", "Sentiment");
        println!("  {}", "-".repeat(58));

        for (i, post) in dashboard.posts.iter().take(TABLE_POST_LIMIT).enumerate() {
            let line = format!(
                "  {:<19} {:<9} {}",
                post.time,
                truncate(&post.label, 9),
                truncate(&post.text, 40)
            );
            if i % 2 == 0 {
                println!("{line}");
            } else {
                println!("{}", line.dimmed());
            }
        }

        let hidden = dashboard.posts.len().saturating_sub(TABLE_POST_LIMIT);
        if hidden > 0 {
            println!(
                "  {}",
                format!("… {hidden} more (use --format json for all)").dimmed()
            );
        }
    }
}

fn print_dashboard_csv(dashboard: &Dashboard) {
    println!("metric,percent,rating");
    for card in &dashboard.metrics {
        println!("{},{},{}", card.title, card.percent, card.rating);
    }
}

/// Green for a healthy rating, yellow for one that asks for change.
fn colorize_rating(card: &MetricCard) -> colored::ColoredString {
    match card.rating.as_str() {
        "Excellent" | "Good" | "Balanced" => card.rating.green(),
        _ => card.rating.yellow(),
    }
}

// ---------------------------------------------------------------------------
// pulsecheck health
// ---------------------------------------------------------------------------

/// Check the analysis service, config files, session and event log.
pub fn run_health() -> Result<()> {
    println!("{}", "pulsecheck Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let cfg = config::load();
    let store = SessionStore::from_config(&cfg.session)?;
    let report = health::check(&cfg, &store, &SystemClock);

    print_health_item(
        "Global config",
        report.config_exists,
        if report.config_exists {
            "~/.pulsecheck/config.toml found"
        } else {
            "not found (run `pulsecheck config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        report.project_config_exists,
        if report.project_config_exists {
            ".pulsecheck.toml found"
        } else {
            "none (optional)"
        },
    );

    let analysis_detail = if report.analysis_reachable {
        format!("reachable at {} ({})", report.analysis_url, report.method)
    } else {
        format!("not reachable at {}", report.analysis_url)
    };
    print_health_item(
        "Analysis service",
        report.analysis_reachable,
        &analysis_detail,
    );

    let session_detail = if report.session_active {
        format!("expires in {}s", report.session_expires_in_secs)
    } else {
        "none (run `pulsecheck serve` and log in)".to_string()
    };
    print_health_item("Session", report.session_active, &session_detail);

    let log_detail = match (report.logging_enabled, report.log_exists) {
        (false, _) => "disabled".to_string(),
        (true, true) => format!(
            "{} events",
            EventLog::from_config(&cfg.logging).read_all().len()
        ),
        (true, false) => "no log file yet".to_string(),
    };
    print_health_item("Event log", report.log_exists, &log_detail);

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// pulsecheck config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective pulsecheck Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    // Show source info
    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.pulsecheck/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.pulsecheck/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".pulsecheck.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            ".pulsecheck.toml (not found)".dimmed()
        );
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "PULSECHECK_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.pulsecheck/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point at your services.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_str_opt(Some("table")), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
    }

    #[test]
    fn truncate_is_char_aware() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("🌙🌙🌙🌙", 3), "🌙🌙…");
    }

    #[test]
    fn aggregate_reads_saved_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insights.json");
        std::fs::write(
            &path,
            r#"{"insights": [{"label": "positive", "original": "hi"}]}"#,
        )
        .unwrap();
        assert!(run_aggregate(&path, OutputFormat::Json).is_ok());
        assert!(run_aggregate(&dir.path().join("missing.json"), OutputFormat::Table).is_err());
    }
}
