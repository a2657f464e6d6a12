//! Dashboard view model.
//!
//! Fetches the profile and insight records for a session, aggregates the
//! records and lays the result out the way both the web page and the CLI
//! report show it: a profile card, four metric cards, pie chart slices, the
//! recommendation list and the per-post list.
//!
//! Fetch failures never fail the dashboard. A missing profile hides the card;
//! missing insights render as an empty dashboard. Both are written to the
//! event log.

use std::fmt::Display;

use anyhow::Result;
use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::client::{AnalysisClient, GraphClient, Profile};
use crate::config::schema::PulseConfig;
use crate::events::{EventLog, FetchSource};
use crate::insights::{AggregateResult, InsightRecord, aggregate_in};
use crate::session::{Session, SessionStore};

pub const TITLE: &str = "Digital Responsibility Dashboard";

/// Shown instead of the pie chart when no record has a known label.
pub const NO_SENTIMENT_DATA: &str = "No sentiment data to show.";

/// Placeholder for absent profile fields and post times.
const NOT_AVAILABLE: &str = "N/A";

/// Pie chart colors for positive, negative and neutral.
const POSITIVE_COLOR: &str = "#4caf50";
const NEGATIVE_COLOR: &str = "#f44336";
const NEUTRAL_COLOR: &str = "#ffc107";

const POST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Upstream seam
// ---------------------------------------------------------------------------

/// Where the dashboard gets its data from.
pub trait Upstream {
    fn fetch_profile(&self, token: &str) -> Result<Profile>;
    fn fetch_insights(&self, token: &str) -> Result<Vec<InsightRecord>>;
}

/// The live graph API and analysis service.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    pub analysis: AnalysisClient,
    pub graph: GraphClient,
}

impl HttpUpstream {
    pub fn from_config(config: &PulseConfig) -> Self {
        Self {
            analysis: AnalysisClient::from_config(&config.analysis),
            graph: GraphClient::from_config(&config.graph),
        }
    }
}

impl Upstream for HttpUpstream {
    fn fetch_profile(&self, token: &str) -> Result<Profile> {
        self.graph.fetch_profile(token)
    }

    fn fetch_insights(&self, token: &str) -> Result<Vec<InsightRecord>> {
        Ok(self.analysis.fetch(token)?.insights)
    }
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileCard {
    pub name: String,
    pub picture_url: Option<String>,
    pub birthday: String,
    pub gender: String,
}

impl From<&Profile> for ProfileCard {
    fn from(profile: &Profile) -> Self {
        let or_na = |field: &Option<String>| {
            field
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(NOT_AVAILABLE)
                .to_string()
        };
        Self {
            name: profile.name.clone(),
            picture_url: profile.picture_url.clone(),
            birthday: or_na(&profile.birthday),
            gender: or_na(&profile.gender),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub title: &'static str,
    /// Rounded percentage as shown, e.g. `"75%"`.
    pub value: String,
    pub percent: u32,
    pub rating: String,
}

impl MetricCard {
    fn new(title: &'static str, percent: u32, rating: impl Display) -> Self {
        Self {
            title,
            value: format!("{percent}%"),
            percent,
            rating: rating.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: &'static str,
    pub count: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostEntry {
    pub text: String,
    /// Label as sent by the analysis service.
    pub label: String,
    /// Local publish time, or `N/A`.
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Everything one dashboard render needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub title: &'static str,
    pub profile: Option<ProfileCard>,
    pub metrics: Vec<MetricCard>,
    /// `None` when no record carries a known sentiment label.
    pub chart: Option<Vec<PieSlice>>,
    pub recommendations: Vec<String>,
    pub posts: Vec<PostEntry>,
    pub summary: AggregateResult,
}

impl Dashboard {
    /// Build the dashboard, showing times in the local time zone.
    pub fn build(profile: Option<&Profile>, records: &[InsightRecord]) -> Self {
        Self::build_in(profile, records, &Local)
    }

    pub fn build_in<Tz: TimeZone>(
        profile: Option<&Profile>,
        records: &[InsightRecord],
        tz: &Tz,
    ) -> Self {
        let summary = aggregate_in(records, tz);
        let m = summary.metrics;
        let r = summary.ratings;

        let metrics = vec![
            MetricCard::new("Positive Sentiment", m.sentiment, r.sentiment),
            MetricCard::new("Healthy Usage", m.healthy, r.healthy),
            MetricCard::new("Privacy Awareness", m.privacy, r.privacy),
            MetricCard::new("Respectful Interactions", m.respect, r.respect),
        ];

        let counts = summary.counts;
        let chart = (counts.total() > 0).then(|| {
            vec![
                PieSlice {
                    label: "Positive",
                    count: counts.positive,
                    color: POSITIVE_COLOR,
                },
                PieSlice {
                    label: "Negative",
                    count: counts.negative,
                    color: NEGATIVE_COLOR,
                },
                PieSlice {
                    label: "Neutral",
                    count: counts.neutral,
                    color: NEUTRAL_COLOR,
                },
            ]
        });

        let posts = records
            .iter()
            .map(|record| PostEntry {
                text: record.original.clone(),
                label: record.label.clone(),
                time: record.timestamp.map_or_else(
                    || NOT_AVAILABLE.to_string(),
                    |ts| ts.local_in(tz).format(POST_TIME_FORMAT).to_string(),
                ),
                kind: record.kind.clone(),
            })
            .collect();

        Self {
            title: TITLE,
            profile: profile.map(ProfileCard::from),
            metrics,
            chart,
            recommendations: summary
                .recommendations
                .iter()
                .map(ToString::to_string)
                .collect(),
            posts,
            summary,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Fetch and build the dashboard for `session` from the configured services.
pub fn load(config: &PulseConfig, session: &Session) -> Dashboard {
    let upstream = HttpUpstream::from_config(config);
    let store = SessionStore::from_config(&config.session).ok();
    let log = EventLog::from_config(&config.logging);
    load_with(&upstream, session, store.as_ref(), &log)
}

/// Fetch the profile, then the insights, and build the dashboard.
///
/// A fetched profile is cached in `store` for the navigation bar.
pub fn load_with(
    upstream: &impl Upstream,
    session: &Session,
    store: Option<&SessionStore>,
    log: &EventLog,
) -> Dashboard {
    let profile = match upstream.fetch_profile(&session.token) {
        Ok(profile) => {
            if let Some(store) = store {
                let _ = store.save_profile(&profile);
            }
            Some(profile)
        }
        Err(e) => {
            log.fetch_failed(FetchSource::Profile, &e);
            None
        }
    };

    let records = upstream
        .fetch_insights(&session.token)
        .unwrap_or_else(|e| {
            log.fetch_failed(FetchSource::Insights, &e);
            Vec::new()
        });

    let dashboard = Dashboard::build(profile.as_ref(), &records);
    log.dashboard_rendered(records.len());
    dashboard
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
