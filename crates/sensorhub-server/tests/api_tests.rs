//! Integration tests for the gateway REST endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. The registry is backed by in-memory storage so
//! persistence failures can be simulated.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{TimeZone, Utc};
use sensorhub_server::events::{ALL_SYNC, SENSOR_DATA};
use sensorhub_server::{AppState, CorsSettings, Timing, build_router, cors_layer};
use sensorhub_store::{MemoryStorage, ScanSource, SensorRegistry};
use sensorhub_types::{ScanResult, Sensor, SensorCollection, SensorId};
use serde_json::{Number, Value, json};
use tower::ServiceExt;

fn seed() -> SensorCollection {
    let mut collection = SensorCollection::new(vec![Sensor::new(
        SensorId::from("s1"),
        String::from("A"),
        String::from("P1"),
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
    )]);
    collection.metadata.insert(String::from("site"), json!("lab"));
    collection
}

fn make_test_state() -> (Arc<MemoryStorage>, Arc<AppState>) {
    let storage = Arc::new(MemoryStorage::new(seed()));
    let registry = Arc::new(SensorRegistry::with_collection(storage.clone(), seed()));
    let state = Arc::new(AppState::new(
        registry,
        ScanSource::Fixed(ScanResult::default()),
        Timing::default(),
    ));
    (storage, state)
}

fn make_router(state: Arc<AppState>) -> Router {
    build_router(state, cors_layer(&CorsSettings::default()).unwrap())
}

fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_health() {
    let (_, state) = make_test_state();
    let response = make_router(state)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, json!({ "status": "ok", "sensors": 1 }));
}

#[tokio::test]
async fn test_list_sensors_on_every_alias() {
    let (_, state) = make_test_state();
    let router = make_router(state);

    for uri in ["/sensors", "/sensor/all", "/api/v2/sensors", "/api/v2/sensor/all"] {
        let response = router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["data"][0]["id"], "s1");
        assert_eq!(json["site"], "lab");
    }
}

#[tokio::test]
async fn test_create_sensor_persists_and_broadcasts() {
    let (storage, state) = make_test_state();
    let mut rx = state.hub.subscribe();
    let router = make_router(Arc::clone(&state));

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v2/sensor",
            &json!({ "name": "B", "position": "P2" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["code"], 200);
    assert_eq!(json["data"]["name"], "B");
    assert_eq!(json["data"]["state"], 0);
    assert_eq!(json["data"]["noti_aps"], json!([]));
    let id = json["data"]["id"].as_str().unwrap().to_owned();
    assert_ne!(id, "s1");

    assert_eq!(storage.contents().await.len(), 2);

    let data = rx.recv().await.unwrap();
    assert_eq!(data.event, SENSOR_DATA);
    assert_eq!(data.data["data"].as_array().unwrap().len(), 2);

    let sync = rx.recv().await.unwrap();
    assert_eq!(sync.event, ALL_SYNC);
    let views = sync.data.as_array().unwrap();
    let b = views.iter().find(|v| v["id"] == id.as_str()).unwrap();
    assert_eq!(b["time_limit"], 0);
    assert_eq!(b["packet_limit"], 0);
}

#[tokio::test]
async fn test_create_missing_field_returns_400() {
    let (storage, state) = make_test_state();
    let router = make_router(Arc::clone(&state));

    let response = router
        .oneshot(json_request(Method::POST, "/sensor", &json!({ "name": "B" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["code"], 400);
    assert_eq!(json["message"], "Name and position are required fields.");
    assert_eq!(*state.registry.list_all().await, seed());
    assert_eq!(storage.save_count(), 0);
}

#[tokio::test]
async fn test_create_without_body_returns_400() {
    let (storage, state) = make_test_state();
    let router = make_router(Arc::clone(&state));

    let response = router
        .oneshot(empty_request(Method::POST, "/sensor"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["code"], 400);
    assert_eq!(json["message"], "Name and position are required fields.");
    assert_eq!(storage.save_count(), 0);
}

#[tokio::test]
async fn test_malformed_body_returns_json_400() {
    let (storage, state) = make_test_state();
    let router = make_router(Arc::clone(&state));

    let wrong_type = router
        .clone()
        .oneshot(json_request(Method::PUT, "/sensor/s1", &json!({ "state": "2" })))
        .await
        .unwrap();
    assert_eq!(wrong_type.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(wrong_type.into_body()).await;
    assert_eq!(json["code"], 400);
    assert!(json["message"].is_string());

    let broken = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/sensor")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ \"name\": "))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(broken.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_to_json(broken.into_body()).await["code"], 400);

    assert_eq!(*state.registry.list_all().await, seed());
    assert_eq!(storage.save_count(), 0);
}

#[tokio::test]
async fn test_update_keeps_unknown_keys() {
    let (storage, state) = make_test_state();
    let router = make_router(Arc::clone(&state));

    let response = router
        .oneshot(json_request(
            Method::PUT,
            "/sensor/s1",
            &json!({ "id": "hijack", "mac": "aa:bb" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["data"]["id"], "s1");
    assert_eq!(json["data"]["mac"], "aa:bb");

    let stored = storage.contents().await;
    let sensor = stored.find(&SensorId::from("s1")).unwrap();
    assert_eq!(sensor.extra.get("mac"), Some(&json!("aa:bb")));
}

#[tokio::test]
async fn test_update_changes_only_given_field() {
    let (_, state) = make_test_state();
    let router = make_router(Arc::clone(&state));

    let response = router
        .oneshot(json_request(Method::PUT, "/sensor/s1", &json!({ "state": 2 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["data"]["state"], 2);
    assert_eq!(json["data"]["name"], "A");

    let mut expected = seed();
    if let Some(s) = expected.data.first_mut() {
        s.state = Number::from(2);
    }
    assert_eq!(*state.registry.list_all().await, expected);
}

#[tokio::test]
async fn test_update_unknown_returns_404() {
    let (_, state) = make_test_state();
    let router = make_router(Arc::clone(&state));

    let response = router
        .oneshot(json_request(Method::PUT, "/api/v2/sensor/ghost", &json!({ "name": "x" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["code"], 404);
    assert_eq!(*state.registry.list_all().await, seed());
}

#[tokio::test]
async fn test_delete_then_delete_again() {
    let (_, state) = make_test_state();
    let router = make_router(state);

    let first = router
        .clone()
        .oneshot(empty_request(Method::DELETE, "/sensor/s1"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let json = body_to_json(first.into_body()).await;
    assert_eq!(json["data"]["data"], json!([]));
    assert_eq!(json["data"]["site"], "lab");

    let second = router
        .oneshot(empty_request(Method::DELETE, "/sensor/s1"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_failure_returns_500_and_keeps_memory() {
    let (storage, state) = make_test_state();
    storage.set_fail_saves(true);
    let router = make_router(Arc::clone(&state));

    let response = router
        .oneshot(json_request(Method::PUT, "/sensor/s1", &json!({ "name": "renamed" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["code"], 500);
    assert_eq!(*state.registry.list_all().await, seed());
}

#[tokio::test]
async fn test_scan_start_and_stop_routes() {
    let (_, state) = make_test_state();
    let router = make_router(Arc::clone(&state));

    let started = router
        .clone()
        .oneshot(empty_request(Method::POST, "/api/v2/sensor/s1/start-scan"))
        .await
        .unwrap();
    assert_eq!(started.status(), StatusCode::OK);
    assert_eq!(body_to_json(started.into_body()).await["code"], 200);

    let status = router
        .clone()
        .oneshot(Request::get("/scan/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_to_json(status.into_body()).await;
    assert_eq!(json, json!({ "state": "scanning", "sensor_id": "s1" }));

    for uri in ["/sensor/s1/stop", "/sensor/s1/stop-scan"] {
        let stopped = router
            .clone()
            .oneshot(empty_request(Method::POST, uri))
            .await
            .unwrap();
        assert_eq!(stopped.status(), StatusCode::OK);
        assert_eq!(body_to_json(stopped.into_body()).await["code"], 200);
    }

    assert!(!state.scanner.status().await.is_scanning());
}

#[tokio::test]
async fn test_cors_preflight_echoes_configured_origin() {
    let (_, state) = make_test_state();
    let router = make_router(state);

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/v2/sensor")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_invalid_cors_origin_is_rejected() {
    let settings = CorsSettings {
        allowed_origin: String::from("http://bad\norigin"),
        allow_credentials: false,
    };
    assert!(cors_layer(&settings).is_err());
}
