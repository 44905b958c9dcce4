// src/fetch/provider.rs
use async_trait::async_trait;

use crate::fetch::FetchError;

/// Low-level data-source abstraction: turns a prompt into the raw JSON
/// payload. Separated from the orchestrator so production (Gemini) and
/// test providers share the same validation path.
#[async_trait]
pub trait TrendProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, FetchError>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Returns a fixed payload on every call. Used by tests and local runs.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    pub payload: String,
}

impl StaticProvider {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

#[async_trait]
impl TrendProvider for StaticProvider {
    async fn generate(&self, _prompt: &str) -> Result<String, FetchError> {
        Ok(self.payload.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Pops one scripted outcome per call; once the script runs dry it keeps
/// returning an upstream error. Lets tests drive success/failure cycles
/// in order.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: std::sync::Mutex<std::collections::VecDeque<Result<String, FetchError>>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, FetchError>>) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl TrendProvider for ScriptedProvider {
    async fn generate(&self, _prompt: &str) -> Result<String, FetchError> {
        self.script
            .lock()
            .expect("script mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Upstream("scripted provider exhausted".into())))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
