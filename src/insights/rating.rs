//! Qualitative ratings for the four dashboard metrics.
//!
//! Each rating is a fixed threshold function of the *rounded* metric value.

use serde::Serialize;

/// Rating for the positive-sentiment percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SentimentRating {
    Excellent,
    Good,
    #[serde(rename = "Needs Work")]
    NeedsWork,
}

impl SentimentRating {
    pub fn from_percent(pct: u32) -> Self {
        if pct >= 75 {
            Self::Excellent
        } else if pct >= 50 {
            Self::Good
        } else {
            Self::NeedsWork
        }
    }
}

/// Rating for the healthy-usage percentage (share of daytime posts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthyRating {
    Balanced,
    #[serde(rename = "Try Reducing Late Usage")]
    ReduceLateUsage,
}

impl HealthyRating {
    pub fn from_percent(pct: u32) -> Self {
        if pct >= 80 {
            Self::Balanced
        } else {
            Self::ReduceLateUsage
        }
    }
}

/// Rating for the privacy-awareness percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrivacyRating {
    Good,
    #[serde(rename = "Watch Location Sharing")]
    WatchLocationSharing,
}

impl PrivacyRating {
    pub fn from_percent(pct: u32) -> Self {
        if pct >= 80 {
            Self::Good
        } else {
            Self::WatchLocationSharing
        }
    }
}

/// Rating for the respectful-interactions percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RespectRating {
    Excellent,
    #[serde(rename = "Improve Respectfulness")]
    ImproveRespectfulness,
}

impl RespectRating {
    pub fn from_percent(pct: u32) -> Self {
        if pct >= 75 {
            Self::Excellent
        } else {
            Self::ImproveRespectfulness
        }
    }
}

impl std::fmt::Display for SentimentRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent"),
            Self::Good => write!(f, "Good"),
            Self::NeedsWork => write!(f, "Needs Work"),
        }
    }
}

impl std::fmt::Display for HealthyRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Balanced => write!(f, "Balanced"),
            Self::ReduceLateUsage => write!(f, "Try Reducing Late Usage"),
        }
    }
}

impl std::fmt::Display for PrivacyRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Good => write!(f, "Good"),
            Self::WatchLocationSharing => write!(f, "Watch Location Sharing"),
        }
    }
}

impl std::fmt::Display for RespectRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent"),
            Self::ImproveRespectfulness => write!(f, "Improve Respectfulness"),
        }
    }
}

/// One rating per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ratings {
    pub sentiment: SentimentRating,
    pub healthy: HealthyRating,
    pub privacy: PrivacyRating,
    pub respect: RespectRating,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_thresholds() {
        assert_eq!(SentimentRating::from_percent(100), SentimentRating::Excellent);
        assert_eq!(SentimentRating::from_percent(75), SentimentRating::Excellent);
        assert_eq!(SentimentRating::from_percent(74), SentimentRating::Good);
        assert_eq!(SentimentRating::from_percent(50), SentimentRating::Good);
        assert_eq!(SentimentRating::from_percent(49), SentimentRating::NeedsWork);
        assert_eq!(SentimentRating::from_percent(0), SentimentRating::NeedsWork);
    }

    #[test]
    fn healthy_and_privacy_thresholds() {
        assert_eq!(HealthyRating::from_percent(80), HealthyRating::Balanced);
        assert_eq!(HealthyRating::from_percent(79), HealthyRating::ReduceLateUsage);
        assert_eq!(PrivacyRating::from_percent(80), PrivacyRating::Good);
        assert_eq!(
            PrivacyRating::from_percent(79),
            PrivacyRating::WatchLocationSharing
        );
    }

    #[test]
    fn respect_thresholds() {
        assert_eq!(RespectRating::from_percent(75), RespectRating::Excellent);
        assert_eq!(
            RespectRating::from_percent(74),
            RespectRating::ImproveRespectfulness
        );
    }

    #[test]
    fn display_matches_serialized_label() {
        let json = serde_json::to_string(&SentimentRating::NeedsWork).unwrap();
        assert_eq!(json, format!("\"{}\"", SentimentRating::NeedsWork));
        let json = serde_json::to_string(&HealthyRating::ReduceLateUsage).unwrap();
        assert_eq!(json, "\"Try Reducing Late Usage\"");
    }
}
