// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod history;
pub mod metrics;
pub mod scheduler;
pub mod trend;
pub mod watchlist;

// ---- Re-exports for stable public API ----
pub use crate::engine::{EngineCfg, EngineStatus, Phase, TrendEngine};
pub use crate::fetch::{FetchError, GeminiProvider, TrendProvider};
pub use crate::history::{HistorySample, TrendHistory};
pub use crate::scheduler::{Poller, PollerCfg};
pub use crate::trend::{FetchParams, Sentiment, Trend};
pub use crate::watchlist::WatchRegistry;
