use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metric descriptions (so series show up on /metrics).
pub(crate) fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("poll_cycles_total", "Successful fetch cycles.");
        describe_counter!(
            "poll_failures_total",
            "Failed fetch cycles, labeled by error kind."
        );
        describe_counter!(
            "poll_stale_discards_total",
            "In-flight results discarded after a configuration change."
        );
        describe_histogram!("poll_cycle_ms", "Fetch cycle duration in milliseconds.");
        describe_gauge!("poll_last_success_ts", "Unix ts of the last successful cycle.");
        describe_gauge!("trend_history_len", "Current history buffer length.");
        describe_gauge!("poll_interval_secs", "Configured polling interval.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and expose a static gauge for
    /// the polling interval.
    pub fn init(interval_secs: u64) -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        ensure_described();
        gauge!("poll_interval_secs").set(interval_secs as f64);

        Self { handle }
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
