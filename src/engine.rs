//! # Trend Engine
//! Owns the mutable state shared between the poller and the HTTP
//! surface: current parameters, watch registry, ranked list, history
//! buffer, scheduler phase and the generation counter.
//!
//! Every cycle captures the generation at start and applies its result
//! only if the counter still matches; any parameter or watch-set change
//! bumps the counter and clears derived state synchronously, so a stale
//! in-flight result is dropped instead of appended. The re-check and the
//! apply happen under the same lock `reset_epoch` takes, so a reset can
//! never slip between them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Local, Utc};
use metrics::{counter, gauge, histogram};
use serde::Serialize;

use crate::fetch::{self, FetchError, TrendProvider, DEFAULT_TREND_COUNT};
use crate::history::{TrendHistory, DEFAULT_HISTORY_CAP};
use crate::trend::{FetchParams, Trend};
use crate::watchlist::WatchRegistry;

/// Scheduler phase as shown to the UI (loading / error indicators).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Fetching,
    Error,
}

/// Presentation-facing status block.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub phase: Phase,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineCfg {
    pub history_cap: usize,
    pub organic_count: usize,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            organic_count: DEFAULT_TREND_COUNT,
        }
    }
}

/// Everything the UI reads, guarded by one mutex so cycle results are
/// applied atomically with respect to epoch resets.
#[derive(Debug)]
struct ViewState {
    trends: Vec<Trend>,
    phase: Phase,
    last_updated: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            trends: Vec::new(),
            phase: Phase::Idle,
            last_updated: None,
            last_error: None,
        }
    }
}

pub struct TrendEngine {
    provider: Arc<dyn TrendProvider>,
    organic_count: usize,
    params: Mutex<FetchParams>,
    watchlist: Mutex<WatchRegistry>,
    history: TrendHistory,
    view: Mutex<ViewState>,
    generation: AtomicU64,
}

impl TrendEngine {
    pub fn new(provider: Arc<dyn TrendProvider>, cfg: EngineCfg) -> Self {
        crate::metrics::ensure_described();
        Self {
            provider,
            organic_count: cfg.organic_count,
            params: Mutex::new(FetchParams::default()),
            watchlist: Mutex::new(WatchRegistry::new()),
            history: TrendHistory::with_capacity(cfg.history_cap),
            view: Mutex::new(ViewState::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Execute one fetch cycle against the current configuration.
    ///
    /// Returns the fetch error for callers that care (the poller only
    /// logs it); all state transitions have already happened either way.
    /// A result whose generation no longer matches is discarded and
    /// reported as `Ok`.
    pub async fn run_cycle(&self) -> Result<(), FetchError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let (params, watched) = {
            let p = self.params.lock().expect("params mutex poisoned").clone();
            let w = self
                .watchlist
                .lock()
                .expect("watchlist mutex poisoned")
                .list();
            (p, w)
        };

        self.lock_view().phase = Phase::Fetching;
        let started = Instant::now();
        let result =
            fetch::fetch_ranked(self.provider.as_ref(), &params, &watched, self.organic_count)
                .await;
        histogram!("poll_cycle_ms").record(started.elapsed().as_millis() as f64);

        match result {
            Ok(trends) => {
                let mut view = self.lock_view();
                if self.generation.load(Ordering::SeqCst) != generation {
                    drop(view);
                    self.note_stale();
                    return Ok(());
                }
                self.history.append(&trends, Local::now());
                let count = trends.len();
                view.trends = trends;
                view.last_updated = Some(Utc::now());
                view.last_error = None;
                view.phase = Phase::Idle;
                drop(view);

                counter!("poll_cycles_total").increment(1);
                gauge!("poll_last_success_ts").set(Utc::now().timestamp() as f64);
                gauge!("trend_history_len").set(self.history.len() as f64);
                tracing::info!(
                    target: "poll",
                    provider = self.provider.name(),
                    trends = count,
                    "cycle complete"
                );
                Ok(())
            }
            Err(e) => {
                let mut view = self.lock_view();
                if self.generation.load(Ordering::SeqCst) != generation {
                    drop(view);
                    self.note_stale();
                    return Ok(());
                }
                view.last_error = Some(e.to_string());
                view.phase = Phase::Error;
                drop(view);

                counter!("poll_failures_total", "kind" => e.kind()).increment(1);
                tracing::warn!(
                    target: "poll",
                    provider = self.provider.name(),
                    kind = e.kind(),
                    error = %e,
                    "cycle failed"
                );
                Err(e)
            }
        }
    }

    /// Replace the parameter tuple. Returns `true` (and starts a new
    /// epoch) only when something actually changed.
    pub fn set_params(&self, new: FetchParams) -> bool {
        {
            let mut p = self.params.lock().expect("params mutex poisoned");
            if *p == new {
                return false;
            }
            *p = new;
        }
        self.reset_epoch();
        true
    }

    /// Track a name; a real change starts a new epoch.
    pub fn track(&self, name: &str) -> bool {
        let changed = self
            .watchlist
            .lock()
            .expect("watchlist mutex poisoned")
            .track(name);
        if changed {
            self.reset_epoch();
        }
        changed
    }

    /// Untrack a name; a miss is a pure no-op (no reset).
    pub fn untrack(&self, name: &str) -> bool {
        let changed = self
            .watchlist
            .lock()
            .expect("watchlist mutex poisoned")
            .untrack(name);
        if changed {
            self.reset_epoch();
        }
        changed
    }

    /// Start a new configuration epoch: invalidate in-flight work and
    /// clear derived state synchronously, before any new result arrives.
    /// Holds the view lock across the bump and the clears so a completed
    /// fetch cannot interleave its apply with the reset.
    fn reset_epoch(&self) {
        let mut view = self.lock_view();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.history.reset();
        view.trends.clear();
        view.last_updated = None;
        view.last_error = None;
        view.phase = Phase::Idle;
        drop(view);
        gauge!("trend_history_len").set(0.0);
        tracing::debug!(target: "poll", "configuration epoch reset");
    }

    fn note_stale(&self) {
        counter!("poll_stale_discards_total").increment(1);
        tracing::info!(
            target: "poll",
            provider = self.provider.name(),
            "discarding stale cycle result after configuration change"
        );
    }

    fn lock_view(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().expect("view mutex poisoned")
    }

    // ---- presentation-facing snapshots ----

    pub fn trends(&self) -> Vec<Trend> {
        self.lock_view().trends.clone()
    }

    pub fn watched(&self) -> Vec<String> {
        self.watchlist
            .lock()
            .expect("watchlist mutex poisoned")
            .list()
    }

    pub fn params(&self) -> FetchParams {
        self.params.lock().expect("params mutex poisoned").clone()
    }

    pub fn history(&self) -> &TrendHistory {
        &self.history
    }

    pub fn status(&self) -> EngineStatus {
        let view = self.lock_view();
        EngineStatus {
            phase: view.phase,
            last_updated: view.last_updated,
            last_error: view.last_error.clone(),
        }
    }

    /// Current generation; exposed for tests asserting discard behavior.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
