// src/api.rs
// HTTP surface for the (external) dashboard UI: snapshots of the ranked
// list, history and watch registry, plus the controls that mutate
// configuration. Mutations that change the configuration epoch also nudge
// the poller so the UI sees fresh data quickly.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::engine::{EngineStatus, TrendEngine};
use crate::history::HistorySample;
use crate::scheduler::Poller;
use crate::trend::{FetchParams, Trend};

#[derive(Clone)]
pub struct AppState {
    engine: Arc<TrendEngine>,
    poller: Arc<Poller>,
}

impl AppState {
    pub fn new(engine: Arc<TrendEngine>, poller: Arc<Poller>) -> Self {
        Self { engine, poller }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/trends", get(trends))
        .route("/history", get(history))
        .route("/watchlist", get(watchlist).post(track))
        .route("/watchlist/{name}", delete(untrack))
        .route("/params", put(set_params))
        .route("/refresh", post(refresh))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct TrendsResp {
    trends: Vec<Trend>,
    #[serde(flatten)]
    status: EngineStatus,
}

async fn trends(State(state): State<AppState>) -> Json<TrendsResp> {
    Json(TrendsResp {
        trends: state.engine.trends(),
        status: state.engine.status(),
    })
}

async fn history(State(state): State<AppState>) -> Json<Vec<HistorySample>> {
    Json(state.engine.history().snapshot())
}

async fn watchlist(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.engine.watched())
}

#[derive(serde::Deserialize)]
struct TrackReq {
    name: String,
}

#[derive(serde::Serialize)]
struct WatchResp {
    changed: bool,
    watched: Vec<String>,
}

async fn track(State(state): State<AppState>, Json(body): Json<TrackReq>) -> Json<WatchResp> {
    let changed = state.engine.track(&body.name);
    if changed {
        state.poller.trigger_now();
    }
    Json(WatchResp {
        changed,
        watched: state.engine.watched(),
    })
}

async fn untrack(State(state): State<AppState>, Path(name): Path<String>) -> Json<WatchResp> {
    let changed = state.engine.untrack(&name);
    if changed {
        state.poller.trigger_now();
    }
    Json(WatchResp {
        changed,
        watched: state.engine.watched(),
    })
}

#[derive(serde::Serialize)]
struct ParamsResp {
    changed: bool,
}

async fn set_params(
    State(state): State<AppState>,
    Json(params): Json<FetchParams>,
) -> Json<ParamsResp> {
    let changed = state.engine.set_params(params);
    if changed {
        state.poller.trigger_now();
    }
    Json(ParamsResp { changed })
}

async fn refresh(State(state): State<AppState>) -> StatusCode {
    state.poller.trigger_now();
    StatusCode::ACCEPTED
}
