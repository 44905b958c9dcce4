// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use trend_pulse::api::{self, AppState};
use trend_pulse::engine::{EngineCfg, TrendEngine};
use trend_pulse::fetch::StaticProvider;
use trend_pulse::scheduler::{Poller, PollerCfg};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn payload() -> String {
    json!([
        {
            "name": "#Quiet",
            "summary": "slow news day",
            "volume": 800,
            "sentiment": "Neutral",
            "sentimentScore": 50,
            "sourceUrl": "https://x.com/search?q=%23Quiet",
            "change": 5,
        },
        {
            "name": "#Loud",
            "summary": "everyone is talking",
            "volume": 15000,
            "sentiment": "Positive",
            "sentimentScore": 90,
            "sourceUrl": "https://x.com/search?q=%23Loud",
            "change": 400,
        },
    ])
    .to_string()
}

/// Build the same Router the binary uses, backed by a static provider.
/// The poller interval is huge so tests control cycles explicitly.
async fn test_app() -> (Router, Arc<TrendEngine>) {
    let provider = Arc::new(StaticProvider::new(payload()));
    let engine = Arc::new(TrendEngine::new(provider, EngineCfg::default()));
    let poller = Arc::new(Poller::spawn(
        engine.clone(),
        PollerCfg {
            interval_secs: 86_400,
        },
    ));
    // Drain the poller's startup cycle so state is deterministic.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let router = api::create_router(AppState::new(engine.clone(), poller));
    (router, engine)
}

async fn json_body(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let (app, _engine) = test_app().await;

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    assert_eq!(std::str::from_utf8(&bytes).unwrap().trim(), "OK");
}

#[tokio::test]
async fn trends_exposes_ranked_list_and_status() {
    let (app, _engine) = test_app().await;

    let req = Request::builder()
        .method("GET")
        .uri("/trends")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    let trends = body["trends"].as_array().expect("trends array");
    assert_eq!(trends.len(), 2);
    // volume-descending
    assert_eq!(trends[0]["name"], "#Loud");
    assert_eq!(trends[0]["sentimentScore"], 90);
    assert_eq!(body["phase"], "idle");
    assert!(body["lastUpdated"].is_string());
    assert!(body["lastError"].is_null());
}

#[tokio::test]
async fn history_returns_ordered_samples() {
    let (app, engine) = test_app().await;
    engine.run_cycle().await.unwrap();

    let req = Request::builder()
        .method("GET")
        .uri("/history")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    let samples = body.as_array().expect("history array");
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0]["averageSentiment"], 70.0);
    assert_eq!(samples[0]["volumes"]["#Loud"], 15000);
}

#[tokio::test]
async fn watchlist_roundtrip_tracks_and_untracks() {
    let (app, engine) = test_app().await;

    let req = Request::builder()
        .method("POST")
        .uri("/watchlist")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": " #AI " }).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["watched"], json!(["#AI"]));

    // case-insensitive duplicate is a no-op
    let req = Request::builder()
        .method("POST")
        .uri("/watchlist")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": "#ai" }).to_string()))
        .unwrap();
    let body = json_body(app.clone().oneshot(req).await.unwrap()).await;
    assert_eq!(body["changed"], false);
    assert_eq!(body["watched"], json!(["#AI"]));

    let req = Request::builder()
        .method("DELETE")
        .uri("/watchlist/%23ai")
        .body(Body::empty())
        .unwrap();
    let body = json_body(app.clone().oneshot(req).await.unwrap()).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["watched"], json!([]));

    assert!(engine.watched().is_empty());
}

#[tokio::test]
async fn params_change_resets_state() {
    let (app, engine) = test_app().await;
    assert!(!engine.trends().is_empty());

    let req = Request::builder()
        .method("PUT")
        .uri("/params")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "platform": "X",
                "category": "Politics",
                "country": "Germany",
                "region": "Bavaria",
            })
            .to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["changed"], true);
    assert_eq!(engine.params().country, "Germany");
}

#[tokio::test]
async fn refresh_is_accepted() {
    let (app, _engine) = test_app().await;

    let req = Request::builder()
        .method("POST")
        .uri("/refresh")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
}
