// src/fetch/mod.rs
// Fetch orchestration: build the prompt, call the provider, validate the
// payload against the documented shape, flag watched names, rank by
// volume. Retry is not handled here; the scheduler's next tick is the
// retry.

pub mod gemini;
pub mod prompt;
pub mod provider;

use serde::Deserialize;
use thiserror::Error;

use crate::trend::{FetchParams, Sentiment, Trend};

pub use gemini::GeminiProvider;
pub use provider::{ScriptedProvider, StaticProvider, TrendProvider};

/// Organic result size when the watch registry is empty.
pub const DEFAULT_TREND_COUNT: usize = 5;

/// Fetch failure taxonomy. Display strings double as the user-facing
/// messages surfaced by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The source answered, but not with the documented shape.
    #[error("The trend source returned malformed data: {0}")]
    Validation(String),
    /// Quota exhaustion; the normal polling interval is the backoff.
    #[error("API request limit reached. Please wait a moment before refreshing. Automatic updates will resume.")]
    RateLimited,
    /// Transport or processing failure of any other kind.
    #[error("Failed to get a valid response from the trend source. It might be busy or experiencing issues. ({0})")]
    Upstream(String),
}

impl FetchError {
    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Validation(_) => "validation",
            FetchError::RateLimited => "rate_limited",
            FetchError::Upstream(_) => "upstream",
        }
    }
}

/// Wire shape of one trend object as the data source must emit it.
/// Unknown or missing fields are validation failures.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawTrend {
    name: String,
    summary: String,
    volume: u64,
    sentiment: Sentiment,
    sentiment_score: u8,
    source_url: String,
    change: i64,
}

impl RawTrend {
    fn into_trend(self, watched: &[String]) -> Result<Trend, FetchError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(FetchError::Validation("trend with empty name".into()));
        }
        if self.sentiment_score > 100 {
            return Err(FetchError::Validation(format!(
                "sentiment score {} out of range for {name}",
                self.sentiment_score
            )));
        }
        let is_tracked = watched.iter().any(|w| w.eq_ignore_ascii_case(&name));
        Ok(Trend {
            name,
            summary: self.summary,
            volume: self.volume,
            sentiment: self.sentiment,
            sentiment_score: self.sentiment_score,
            change: self.change,
            source_url: self.source_url,
            is_tracked,
        })
    }
}

/// Run one fetch against `provider` and return the normalized, ranked
/// list.
///
/// `watched` is the registry snapshot captured at request time; it is not
/// re-queried after the response arrives, so concurrent track/untrack
/// calls cannot race the tracked-flag derivation.
pub async fn fetch_ranked(
    provider: &dyn TrendProvider,
    params: &FetchParams,
    watched: &[String],
    organic_count: usize,
) -> Result<Vec<Trend>, FetchError> {
    let instruction = prompt::build_prompt(params, watched, organic_count);
    let payload = provider.generate(&instruction).await?;
    parse_and_rank(&payload, watched)
}

/// Validate the raw payload and produce the final list. Split out from
/// [`fetch_ranked`] so the parsing rules are testable without a provider.
pub fn parse_and_rank(payload: &str, watched: &[String]) -> Result<Vec<Trend>, FetchError> {
    let body = strip_code_fence(payload.trim());

    let raw: Vec<RawTrend> = serde_json::from_str(body)
        .map_err(|e| FetchError::Validation(format!("not a valid trend array: {e}")))?;

    let mut trends = raw
        .into_iter()
        .map(|r| r.into_trend(watched))
        .collect::<Result<Vec<_>, _>>()?;

    // Stable sort: volume descending, ties keep input order.
    trends.sort_by(|a, b| b.volume.cmp(&a.volume));
    Ok(trends)
}

/// The source is instructed not to wrap the array in a ```json fence,
/// but occasionally does anyway. Tolerate exactly that; anything else
/// fails validation downstream.
fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(items: serde_json::Value) -> String {
        items.to_string()
    }

    fn item(name: &str, volume: u64, score: u8) -> serde_json::Value {
        json!({
            "name": name,
            "summary": "why it is trending",
            "volume": volume,
            "sentiment": "Neutral",
            "sentimentScore": score,
            "sourceUrl": format!("https://x.com/search?q={name}"),
            "change": 120,
        })
    }

    #[test]
    fn result_is_sorted_by_volume_descending() {
        let p = payload(json!([item("#A", 500, 50), item("#B", 9000, 50), item("#C", 200, 50)]));
        let out = parse_and_rank(&p, &[]).unwrap();
        let volumes: Vec<u64> = out.iter().map(|t| t.volume).collect();
        assert_eq!(volumes, vec![9000, 500, 200]);
    }

    #[test]
    fn volume_ties_keep_input_order() {
        let p = payload(json!([item("#First", 700, 50), item("#Second", 700, 50)]));
        let out = parse_and_rank(&p, &[]).unwrap();
        assert_eq!(out[0].name, "#First");
        assert_eq!(out[1].name, "#Second");
    }

    #[test]
    fn tracked_flag_matches_case_insensitively() {
        let watched = vec!["#AI".to_string()];
        let p = payload(json!([item("#ai", 1000, 50), item("#Other", 2000, 50)]));
        let out = parse_and_rank(&p, &watched).unwrap();
        let ai = out.iter().find(|t| t.name == "#ai").unwrap();
        assert!(ai.is_tracked);
        let other = out.iter().find(|t| t.name == "#Other").unwrap();
        assert!(!other.is_tracked);
    }

    #[test]
    fn missing_required_field_is_validation_error() {
        // no sentimentScore
        let p = r##"[{"name":"#A","summary":"s","volume":1,"sentiment":"Neutral","sourceUrl":"u","change":0}]"##;
        let e = parse_and_rank(p, &[]).unwrap_err();
        assert!(matches!(e, FetchError::Validation(_)));
    }

    #[test]
    fn unknown_field_is_validation_error() {
        let mut obj = item("#A", 1, 50);
        obj["surprise"] = json!(true);
        let e = parse_and_rank(&payload(json!([obj])), &[]).unwrap_err();
        assert!(matches!(e, FetchError::Validation(_)));
    }

    #[test]
    fn empty_name_is_validation_error() {
        let e = parse_and_rank(&payload(json!([item("   ", 1, 50)])), &[]).unwrap_err();
        assert!(matches!(e, FetchError::Validation(_)));
    }

    #[test]
    fn out_of_range_score_is_validation_error() {
        let e = parse_and_rank(&payload(json!([item("#A", 1, 101)])), &[]).unwrap_err();
        assert!(matches!(e, FetchError::Validation(_)));
    }

    #[test]
    fn non_array_payload_is_validation_error() {
        let e = parse_and_rank(r#"{"trends": []}"#, &[]).unwrap_err();
        assert!(matches!(e, FetchError::Validation(_)));
    }

    #[test]
    fn a_stray_json_fence_is_tolerated() {
        let p = format!("```json\n{}\n```", payload(json!([item("#A", 1, 50)])));
        let out = parse_and_rank(&p, &[]).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn names_are_trimmed_before_identity_checks() {
        let watched = vec!["#AI".to_string()];
        let out = parse_and_rank(&payload(json!([item("  #ai  ", 1, 50)])), &watched).unwrap();
        assert_eq!(out[0].name, "#ai");
        assert!(out[0].is_tracked);
    }

    #[tokio::test]
    async fn fetch_ranked_goes_through_the_provider() {
        let provider = StaticProvider::new(payload(json!([item("#A", 42, 60)])));
        let out = fetch_ranked(&provider, &FetchParams::default(), &[], DEFAULT_TREND_COUNT)
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].volume, 42);
    }

    #[test]
    fn error_kinds_are_distinct() {
        assert_eq!(FetchError::RateLimited.kind(), "rate_limited");
        assert_eq!(FetchError::Validation("x".into()).kind(), "validation");
        assert_eq!(FetchError::Upstream("x".into()).kind(), "upstream");
        assert_ne!(
            FetchError::RateLimited,
            FetchError::Upstream("429-ish".into())
        );
    }
}
