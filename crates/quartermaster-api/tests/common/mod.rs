//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use quartermaster_core::publisher::InMemoryEventBus;
use quartermaster_core::repository::Repository;
use quartermaster_event_store::InMemoryEventStore;
use quartermaster_read_model::worker::InventoryProjections;
use quartermaster_test_support::FixedClock;
use tower::ServiceExt;

use quartermaster_api::state::AppState;

/// Build the full app router over an in-memory event store, a live event bus
/// and running projection workers. Uses the same wiring as `main.rs`.
pub fn build_test_app() -> Router {
    let bus = Arc::new(InMemoryEventBus::new());
    let projections = InventoryProjections::spawn(&bus).unwrap();
    let repository = Arc::new(Repository::new(Arc::new(InMemoryEventStore::new()), bus));
    let app_state = AppState::new(
        repository,
        Arc::new(projections.facade()),
        Arc::new(FixedClock::default()),
    );
    quartermaster_api::app(app_state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Polls `check` until it holds or two seconds pass. The read model is
/// eventually consistent with the commands that feed it.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}
