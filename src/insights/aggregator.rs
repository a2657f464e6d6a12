//! Insight aggregation: raw labeled records to dashboard metrics.
//!
//! A pure reducer. The result is recomputed from scratch on every fetch and
//! is fully determined by the input records (and, for night-post detection,
//! the time zone used to read their timestamps).
//!
//! Percentages are computed against `max(record count, 1)`. With no records
//! this yields sentiment 0, healthy 100, privacy 100 and respect 0.

use chrono::{Local, TimeZone};
use serde::Serialize;

use super::InsightRecord;
use super::rating::{HealthyRating, PrivacyRating, Ratings, RespectRating, SentimentRating};
use super::recommendation::{self, Recommendation};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Per-label record counts. Records with unknown labels are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentCounts {
    /// Number of records that landed in a known bucket.
    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

/// The four rounded percentages shown on the dashboard, each in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    /// Share of positive records.
    pub sentiment: u32,
    /// Share of records not posted late at night.
    pub healthy: u32,
    /// Share of records without a location mention.
    pub privacy: u32,
    /// Share of respectful records.
    pub respect: u32,
}

/// Everything the dashboard derives from one batch of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub counts: SentimentCounts,
    pub metrics: Metrics,
    pub ratings: Ratings,
    pub recommendations: Vec<Recommendation>,
    /// Raw number of input records (before the zero-denominator guard).
    pub total_records: usize,
    pub night_posts: usize,
    pub location_mentions: usize,
    pub respectful_count: usize,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregate records, reading timestamps in the process's local time zone.
pub fn aggregate(records: &[InsightRecord]) -> AggregateResult {
    aggregate_in(records, &Local)
}

/// Aggregate records, reading timestamps in `tz`.
pub fn aggregate_in<Tz: TimeZone>(records: &[InsightRecord], tz: &Tz) -> AggregateResult {
    let mut counts = SentimentCounts::default();
    let mut night_posts = 0usize;
    let mut location_mentions = 0usize;
    let mut respectful_count = 0usize;

    for record in records {
        match record.sentiment() {
            Some(super::Label::Positive) => counts.positive += 1,
            Some(super::Label::Negative) => counts.negative += 1,
            Some(super::Label::Neutral) => counts.neutral += 1,
            None => {}
        }
        if record.is_night_post(tz) {
            night_posts += 1;
        }
        if record.mentions_location {
            location_mentions += 1;
        }
        if record.is_respectful {
            respectful_count += 1;
        }
    }

    let total = records.len().max(1) as f64;

    let positive_pct = (counts.positive as f64 / total) * 100.0;
    let privacy_score = (location_mentions as f64 / total) * 100.0;
    let respectful_score = (respectful_count as f64 / total) * 100.0;

    let metrics = Metrics {
        sentiment: round_pct(positive_pct),
        healthy: round_pct(100.0 - (night_posts as f64 / total) * 100.0),
        privacy: round_pct(100.0 - privacy_score),
        respect: round_pct(respectful_score),
    };

    let ratings = Ratings {
        sentiment: SentimentRating::from_percent(metrics.sentiment),
        healthy: HealthyRating::from_percent(metrics.healthy),
        privacy: PrivacyRating::from_percent(metrics.privacy),
        respect: RespectRating::from_percent(metrics.respect),
    };

    let recommendations =
        recommendation::evaluate(positive_pct, privacy_score, night_posts, &counts);

    AggregateResult {
        counts,
        metrics,
        ratings,
        recommendations,
        total_records: records.len(),
        night_posts,
        location_mentions,
        respectful_count,
    }
}

/// Round half-up to a whole percentage.
fn round_pct(value: f64) -> u32 {
    (value + 0.5).floor().clamp(0.0, 100.0) as u32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
