//! Insight records and their aggregation.
//!
//! An insight record is one post or comment that the external analysis
//! service has already scored: a sentiment label, a timestamp, and a few
//! behavioral flags. This module owns the tolerant deserialization of those
//! records; [`aggregator`] turns a list of them into dashboard metrics.
//!
//! Malformed records are never an error. Unknown labels, missing or
//! unparseable timestamps and non-boolean flags all degrade to "ignored"
//! values so one bad record cannot hide the rest of the data.

pub mod aggregator;
pub mod rating;
pub mod recommendation;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub use aggregator::{AggregateResult, Metrics, SentimentCounts, aggregate, aggregate_in};
pub use rating::{HealthyRating, PrivacyRating, Ratings, RespectRating, SentimentRating};
pub use recommendation::Recommendation;

/// Local hour-of-day from which a post counts as "late night".
pub const NIGHT_HOUR: u32 = 23;

// ---------------------------------------------------------------------------
// Sentiment label
// ---------------------------------------------------------------------------

/// The three sentiment buckets produced by the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Negative,
    Neutral,
}

impl Label {
    /// Parse a raw label, case-insensitively. Unknown labels yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "Positive"),
            Self::Negative => write!(f, "Negative"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

// ---------------------------------------------------------------------------
// Post time
// ---------------------------------------------------------------------------

/// When a record was published.
///
/// Timestamps without an offset are wall-clock times in the viewer's zone and
/// are never shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PostTime {
    Zoned(DateTime<FixedOffset>),
    Local(NaiveDateTime),
}

impl PostTime {
    /// Wall-clock time of the post as seen from `tz`.
    pub fn local_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDateTime {
        match self {
            Self::Zoned(ts) => ts.with_timezone(tz).naive_local(),
            Self::Local(naive) => *naive,
        }
    }
}

// ---------------------------------------------------------------------------
// Insight record
// ---------------------------------------------------------------------------

/// One externally scored post or comment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    /// Raw label as sent by the service. Kept verbatim for display.
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: String,
    /// When the post was published. `None` when absent or unparseable.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<PostTime>,
    #[serde(default, alias = "mentionsLocation", deserialize_with = "truthy")]
    pub mentions_location: bool,
    #[serde(default, alias = "isRespectful", deserialize_with = "truthy")]
    pub is_respectful: bool,
    /// Original post text.
    #[serde(default, deserialize_with = "lenient_string")]
    pub original: String,
    /// Translated text, when the service translated the post.
    #[serde(default, deserialize_with = "lenient_string")]
    pub translated: String,
    /// `"post"` or `"comment"`.
    #[serde(
        default,
        rename = "type",
        alias = "kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
}

impl InsightRecord {
    /// The recognized sentiment bucket, if any.
    pub fn sentiment(&self) -> Option<Label> {
        Label::parse(&self.label)
    }

    /// Whether the record was posted at or after [`NIGHT_HOUR`] in `tz`.
    ///
    /// Records without a timestamp are never night posts.
    pub fn is_night_post<Tz: TimeZone>(&self, tz: &Tz) -> bool {
        self.timestamp
            .is_some_and(|ts| ts.local_in(tz).hour() >= NIGHT_HOUR)
    }
}

/// Parse a record timestamp.
///
/// Accepts RFC 3339, the Graph API style `2024-03-01T23:10:00+0000`, date-times
/// without an offset (local wall-clock time) and bare dates (taken as UTC
/// midnight). Anything else is treated as unknown.
pub fn parse_timestamp(raw: &str) -> Option<PostTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(PostTime::Zoned(ts));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(PostTime::Zoned(ts));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(PostTime::Local(naive));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| PostTime::Zoned(dt.and_utc().fixed_offset()))
}

/// Decode a JSON array of records.
///
/// Every element counts as a record: entries that are not objects, or that
/// fail to decode, become an empty record so they still weigh in the
/// denominators. Anything other than an array (including `null`) is an empty
/// list.
pub fn parse_records(value: Value) -> Vec<InsightRecord> {
    let Value::Array(items) = value else {
        return Vec::new();
    };

    items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect()
}

pub(crate) fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<InsightRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_records(
        Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null),
    ))
}

// ---------------------------------------------------------------------------
// Lenient field decoders
// ---------------------------------------------------------------------------

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        _ => String::new(),
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<PostTime>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => parse_timestamp(&s),
        // Epoch milliseconds. Zero is "no timestamp".
        Some(Value::Number(n)) => n
            .as_i64()
            .filter(|ms| *ms != 0)
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| PostTime::Zoned(dt.fixed_offset())),
        _ => None,
    })
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
