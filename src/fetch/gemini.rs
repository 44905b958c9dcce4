//! Gemini `generateContent` provider. Sends the prompt with a strict
//! response schema (JSON array, no markup) and classifies quota
//! exhaustion separately from other failures so the scheduler can show a
//! "retry will resume" message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::fetch::{FetchError, TrendProvider};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const ENV_API_KEY: &str = "GEMINI_API_KEY";

pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(model: &str, api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("trend-pulse/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: model.to_string(),
        }
    }

    /// Reads the key from `GEMINI_API_KEY`. A missing key is reported on
    /// the first fetch rather than at startup, so the process still
    /// boots and the error surfaces through the normal scheduler path.
    pub fn from_env(model: &str) -> Self {
        let api_key = std::env::var(ENV_API_KEY).unwrap_or_default();
        Self::new(model, api_key)
    }
}

#[async_trait]
impl TrendProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, FetchError> {
        if self.api_key.is_empty() {
            return Err(FetchError::Upstream(format!("{ENV_API_KEY} is not set")));
        }

        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
                "temperature": 0.9,
            },
        });

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::Upstream(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_failure(status, &text));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::Validation(e.to_string()))?;
        parsed
            .first_text()
            .ok_or_else(|| FetchError::Validation("response carried no candidate text".into()))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Map an HTTP failure to the error taxonomy. Quota exhaustion arrives
/// either as a plain 429 or as a `RESOURCE_EXHAUSTED` status in the
/// error body.
fn classify_failure(status: StatusCode, body: &str) -> FetchError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return FetchError::RateLimited;
    }
    if let Ok(api) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        if api.error.status.as_deref() == Some("RESOURCE_EXHAUSTED") || api.error.code == Some(429)
        {
            return FetchError::RateLimited;
        }
        if let Some(msg) = api.error.message {
            return FetchError::Upstream(msg);
        }
    }
    FetchError::Upstream(format!("unexpected status {status}"))
}

/// Schema forwarded to the model so it emits exactly the documented
/// array-of-trends shape.
fn response_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "summary": { "type": "STRING" },
                "volume": { "type": "INTEGER" },
                "sentiment": { "type": "STRING", "enum": ["Positive", "Neutral", "Negative"] },
                "sentimentScore": { "type": "INTEGER" },
                "sourceUrl": { "type": "STRING" },
                "change": { "type": "INTEGER" },
            },
            "required": ["name", "summary", "volume", "sentiment", "sentimentScore", "sourceUrl", "change"],
        },
    })
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()
            .map(|p| p.text)
    }
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    code: Option<u16>,
    status: Option<String>,
    message: Option<String>,
}
