// src/scheduler.rs
// Fixed-cadence polling loop with a manual-refresh funnel. All cycles run
// on one task, so at most one fetch is ever in flight and no locking is
// needed beyond what the engine already does.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::TrendEngine;

#[derive(Clone, Copy, Debug)]
pub struct PollerCfg {
    pub interval_secs: u64,
}

impl Default for PollerCfg {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Handle to the polling loop: trigger a refresh, or tear it down.
pub struct Poller {
    refresh: watch::Sender<u64>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawn the loop: one immediate cycle, then a cycle per interval
    /// tick or manual refresh, whichever comes first.
    pub fn spawn(engine: Arc<TrendEngine>, cfg: PollerCfg) -> Self {
        let (refresh, mut rx) = watch::channel(0u64);
        let interval = Duration::from_secs(cfg.interval_secs.max(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() yields its first tick immediately; that is the
            // startup cycle.
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = rx.changed() => {
                        if changed.is_err() {
                            // Poller handle dropped; stop polling.
                            break;
                        }
                    }
                }
                // Errors are already surfaced through the engine's phase
                // and logged there; the loop stays armed regardless.
                let generation = engine.generation();
                let _ = engine.run_cycle().await;
                // A refresh that arrived while that cycle was in flight
                // is coalesced with it, not queued behind it — but only
                // if the cycle's result was still current. A generation
                // bump mid-flight means the result was discarded, so a
                // pending refresh must run immediately against the new
                // configuration instead of waiting for the next tick.
                if engine.generation() == generation {
                    rx.borrow_and_update();
                }
            }
            tracing::info!(target: "poll", "polling loop stopped");
        });

        Self { refresh, handle }
    }

    /// Manual refresh. Behaves like a timer tick; if a cycle is already
    /// running it is coalesced with it.
    pub fn trigger_now(&self) {
        self.refresh.send_modify(|n| *n = n.wrapping_add(1));
    }

    /// Teardown: no further cycles start after this returns.
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
