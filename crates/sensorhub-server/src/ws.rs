//! `WebSocket` endpoint for live sensor state and scan control.
//!
//! Clients connect to `GET /ws`. On connect they receive the full sensor
//! envelope as a `sensorData` frame and the periodic sync is started if it
//! is not already running. From then on every hub message is forwarded as
//! a JSON text frame. Clients may send `startSensorScan` and
//! `stopSensorScan` frames and get an acknowledgement back on the same
//! event name.
//!
//! If a client falls behind, lagged messages are skipped and the client
//! resumes from the most recent one. Disconnects never stop a running scan.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::{ClientCommand, HubMessage, SENSOR_DATA};
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let conn_id = Uuid::new_v4();
    info!(%conn_id, "Client connected");

    // Subscribe before the initial push so no mutation falls in between.
    let mut rx = state.hub.subscribe();

    if let Some(msg) = on_connect(&state).await {
        if send(&mut socket, &msg).await.is_err() {
            debug!(%conn_id, "Client disconnected before initial push");
            return;
        }
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(msg) => {
                        if send(&mut socket, &msg).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(%conn_id, skipped = n, "Client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!(%conn_id, "Hub closed, shutting down socket");
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_frame(&state, text.as_str()).await {
                            if send(&mut socket, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(%conn_id, error = %e, "WebSocket error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    info!(%conn_id, "Client disconnected");
}

/// Per-connection setup: start the periodic sync if this is the first
/// client, and build the `sensorData` frame to push immediately.
pub async fn on_connect(state: &AppState) -> Option<HubMessage> {
    state.sync.ensure_running();
    HubMessage::encode(SENSOR_DATA, &*state.registry.list_all().await)
        .inspect_err(|e| warn!(error = %e, "Failed to encode initial sensor data"))
        .ok()
}

/// Execute one inbound frame and build the reply, if any.
///
/// Frames that cannot be parsed are logged and dropped.
pub async fn handle_frame(state: &AppState, text: &str) -> Option<HubMessage> {
    let command = ClientCommand::parse(text)
        .inspect_err(|e| debug!(error = %e, "Ignoring client frame"))
        .ok()?;

    let ack = match &command {
        ClientCommand::StartScan(id) => state.scanner.start(id.clone()).await,
        ClientCommand::StopScan(id) => state.scanner.stop(id).await,
    };

    HubMessage::encode(command.event(), &ack)
        .inspect_err(|e| warn!(error = %e, "Failed to encode acknowledgement"))
        .ok()
}

async fn send(socket: &mut WebSocket, msg: &HubMessage) -> Result<(), axum::Error> {
    let Ok(json) = serde_json::to_string(msg)
        .inspect_err(|e| warn!(event = %msg.event, error = %e, "Failed to serialize frame"))
    else {
        return Ok(());
    };
    socket.send(Message::Text(json.into())).await
}
