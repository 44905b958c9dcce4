// src/trend.rs
// Domain types shared across the fetch pipeline, history buffer and API.

use serde::{Deserialize, Serialize};

/// Overall mood of a trend as labeled by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// One trending-subject record from a single fetch.
///
/// Records are created fresh on every fetch and never mutated afterwards;
/// the next fetch supersedes the whole list. Identity is the name,
/// compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub name: String,
    pub summary: String,
    /// Estimated posts per interval.
    pub volume: u64,
    pub sentiment: Sentiment,
    /// 0 = very negative, 100 = very positive, 50 = neutral.
    pub sentiment_score: u8,
    /// Signed momentum vs. the previous interval.
    pub change: i64,
    pub source_url: String,
    /// Derived: name matches a watch-registry entry (case-insensitive).
    #[serde(default)]
    pub is_tracked: bool,
}

/// The parameter tuple selected by the (external) UI. Any change to it
/// starts a new configuration epoch: history and the displayed list are
/// cleared and in-flight results become stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchParams {
    pub platform: String,
    pub category: String,
    pub country: String,
    /// Empty string means "no region selected".
    pub region: String,
}

impl Default for FetchParams {
    fn default() -> Self {
        Self {
            platform: "All Platforms".to_string(),
            category: "All".to_string(),
            country: "Worldwide".to_string(),
            region: String::new(),
        }
    }
}
