//! Integration tests for the event side of the gateway: scan frames sent
//! by clients, scan replay, and periodic sync.
//!
//! Timer-driven tests run on Tokio's paused clock, so intervals elapse
//! instantly and deterministically.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sensorhub_server::events::{ALL_SYNC, SENSOR_DATA, START_SENSOR_SCAN, STOP_SENSOR_SCAN};
use sensorhub_server::ws::{handle_frame, on_connect};
use sensorhub_server::{AppState, CorsSettings, Timing, build_router, cors_layer};
use sensorhub_store::{MemoryStorage, ScanSource, SensorRegistry};
use sensorhub_types::{NewSensor, ScanResult, ScanStatus, Sensor, SensorCollection, SensorId};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::TryRecvError;

fn payload() -> ScanResult {
    serde_json::from_value(json!({
        "data": { "aps": [{ "bssid": "aa:bb:cc:dd:ee:ff" }], "stations": [{ "mac": "11:22" }] }
    }))
    .unwrap()
}

fn make_state() -> Arc<AppState> {
    let seed = SensorCollection::new(vec![Sensor::new(
        SensorId::from("s1"),
        String::from("A"),
        String::from("P1"),
        Utc::now(),
    )]);
    let storage = Arc::new(MemoryStorage::new(seed.clone()));
    let registry = Arc::new(SensorRegistry::with_collection(storage, seed));
    Arc::new(AppState::new(
        registry,
        ScanSource::Fixed(payload()),
        Timing::default(),
    ))
}

/// Read one unmasked server frame and return its opcode and payload.
async fn read_frame(reader: &mut BufReader<TcpStream>) -> (u8, Vec<u8>) {
    let opcode = reader.read_u8().await.unwrap() & 0x0f;
    let len = match reader.read_u8().await.unwrap() & 0x7f {
        126 => u64::from(reader.read_u16().await.unwrap()),
        127 => reader.read_u64().await.unwrap(),
        short => u64::from(short),
    };
    let mut payload = vec![0; usize::try_from(len).unwrap()];
    reader.read_exact(&mut payload).await.unwrap();
    (opcode, payload)
}

#[tokio::test]
async fn on_connect_pushes_sensor_data_and_starts_sync() {
    let state = make_state();
    assert!(!state.sync.is_running());

    let msg = on_connect(&state).await.unwrap();
    assert_eq!(msg.event, SENSOR_DATA);
    assert_eq!(msg.data["data"][0]["id"], "s1");
    assert!(state.sync.is_running());

    on_connect(&state).await.unwrap();
    assert!(state.sync.is_running());
}

#[tokio::test]
async fn websocket_client_receives_sensor_data_first() {
    let state = make_state();
    let router = build_router(
        Arc::clone(&state),
        cors_layer(&CorsSettings::default()).unwrap(),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            format!(
                "GET /ws HTTP/1.1\r\n\
                 Host: {addr}\r\n\
                 Connection: Upgrade\r\n\
                 Upgrade: websocket\r\n\
                 Sec-WebSocket-Version: 13\r\n\
                 Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n"
            )
            .as_bytes(),
        )
        .await
        .unwrap();

    let mut reader = BufReader::new(stream);
    let mut status = String::new();
    reader.read_line(&mut status).await.unwrap();
    assert!(status.starts_with("HTTP/1.1 101"), "{status}");
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await.unwrap() == 0 || line == "\r\n" {
            break;
        }
    }

    let (opcode, payload) = read_frame(&mut reader).await;
    assert_eq!(opcode, 0x1);
    let frame: Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(frame["event"], SENSOR_DATA);
    assert_eq!(frame["data"]["data"][0]["id"], "s1");
    assert!(state.sync.is_running());
}

#[tokio::test(start_paused = true)]
async fn scan_frames_drive_the_simulator() {
    let state = make_state();
    let mut rx = state.hub.subscribe();

    let reply = handle_frame(&state, r#"{"event":"startSensorScan","data":"s1"}"#)
        .await
        .unwrap();
    assert_eq!(reply.event, START_SENSOR_SCAN);
    assert_eq!(reply.data["code"], 200);

    let emitted = rx.recv().await.unwrap();
    assert_eq!(emitted.event, "sensor/s1/scanresult");
    assert_eq!(emitted.data, serde_json::to_value(payload()).unwrap());

    let reply = handle_frame(&state, r#"{"event":"stopSensorScan","data":{"sensorId":"s1"}}"#)
        .await
        .unwrap();
    assert_eq!(reply.event, STOP_SENSOR_SCAN);
    assert_eq!(state.scanner.status().await, ScanStatus::Idle);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn malformed_frames_are_ignored() {
    let state = make_state();

    assert!(handle_frame(&state, "not json").await.is_none());
    assert!(handle_frame(&state, r#"{"event":"startSensorScan","data":7}"#)
        .await
        .is_none());
    assert!(handle_frame(&state, r#"{"event":"selfDestruct","data":"s1"}"#)
        .await
        .is_none());
    assert_eq!(state.scanner.status().await, ScanStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn periodic_sync_carries_new_sensors() {
    let state = make_state();
    let mut rx = state.hub.subscribe();

    state.sync.ensure_running();
    state.sync.ensure_running();
    let created = state
        .registry
        .create(NewSensor::new("B", "P2"))
        .await
        .unwrap();

    let tick = rx.recv().await.unwrap();
    assert_eq!(tick.event, ALL_SYNC);
    let views = tick.data.as_array().unwrap();
    assert_eq!(views.len(), 2);
    let b = views
        .iter()
        .find(|v| v["id"] == created.id.as_str())
        .unwrap();
    assert_eq!(b["time_limit"], 0);
    assert_eq!(b["packet_limit"], 0);

    // Another interval and a bit yields exactly one more tick.
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(rx.try_recv().unwrap().event, ALL_SYNC);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}
