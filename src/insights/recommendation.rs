//! Advisory messages derived from aggregate metrics.
//!
//! Rules are evaluated unconditionally in declaration order; every rule whose
//! condition holds appends its message. The list order is therefore fixed and
//! does not depend on the order of the input records.

use serde::{Serialize, Serializer};

use super::aggregator::SentimentCounts;

/// Positive share (unrounded, percent) above which interactions are commended.
const GREAT_JOB_ABOVE_PCT: f64 = 80.0;

/// Location-mention rate (unrounded, percent) above which privacy is flagged.
const PRIVACY_TIP_ABOVE_PCT: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    GreatJob,
    PrivacyTip,
    LateNightUsage,
    ConstructiveTone,
}

impl Recommendation {
    /// The user-facing message.
    pub fn message(self) -> &'static str {
        match self {
            Self::GreatJob => {
                "✅ Great Job! Your interactions are consistently positive and respectful."
            }
            Self::PrivacyTip => {
                "🔒 Privacy Tip: Consider reviewing your privacy settings. You mention location in many posts."
            }
            Self::LateNightUsage => {
                "🌙 Usage Insight: You tend to post late at night. Consider daytime posting for better balance."
            }
            Self::ConstructiveTone => "💬 Engagement Quality: Your tone is constructive. Keep it up!",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

/// Evaluate every rule in order.
///
/// `privacy_score` is the raw location-mention rate, not the inverted privacy
/// metric shown on the dashboard.
pub fn evaluate(
    positive_pct: f64,
    privacy_score: f64,
    night_posts: usize,
    counts: &SentimentCounts,
) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if positive_pct > GREAT_JOB_ABOVE_PCT {
        recs.push(Recommendation::GreatJob);
    }
    if privacy_score > PRIVACY_TIP_ABOVE_PCT {
        recs.push(Recommendation::PrivacyTip);
    }
    if night_posts > 0 {
        recs.push(Recommendation::LateNightUsage);
    }
    if counts.positive + counts.neutral > counts.negative {
        recs.push(Recommendation::ConstructiveTone);
    }

    recs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
