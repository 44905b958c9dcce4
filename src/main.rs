//! Trend Pulse — Binary Entrypoint
//! Boots the polling loop and the Axum HTTP server, wiring config,
//! shared engine state and metrics.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_pulse::api::{self, AppState};
use trend_pulse::config::PulseConfig;
use trend_pulse::engine::{EngineCfg, TrendEngine};
use trend_pulse::fetch::GeminiProvider;
use trend_pulse::metrics::Metrics;
use trend_pulse::scheduler::{Poller, PollerCfg};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trend_pulse=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments. This is where
    // GEMINI_API_KEY usually comes from.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = PulseConfig::load_default().context("loading configuration")?;
    let metrics = Metrics::init(cfg.interval_secs);

    let provider = Arc::new(GeminiProvider::from_env(&cfg.model));
    let engine = Arc::new(TrendEngine::new(
        provider,
        EngineCfg {
            history_cap: cfg.history_cap,
            organic_count: cfg.default_trend_count,
        },
    ));
    let poller = Arc::new(Poller::spawn(
        engine.clone(),
        PollerCfg {
            interval_secs: cfg.interval_secs,
        },
    ));

    let router = api::create_router(AppState::new(engine, poller.clone())).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.port))
        .await
        .with_context(|| format!("binding port {}", cfg.port))?;
    tracing::info!(port = cfg.port, interval = cfg.interval_secs, "trend-pulse listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    poller.stop();
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
