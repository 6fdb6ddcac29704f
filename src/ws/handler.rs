//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::util::rate_limit::PlayerRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    info!(conn_id = %conn_id, "New WebSocket connection");

    let outbound_rx = state.world.hub().register(conn_id);
    let (ws_sink, ws_stream) = socket.split();

    let reason = run_session(conn_id, &state, ws_sink, ws_stream, outbound_rx).await;

    // Remaining players get leave_user; the departing socket is excluded by scope
    state.world.disconnect(conn_id, &reason);
    state.world.hub().unregister(&conn_id);

    info!(conn_id = %conn_id, reason = %reason, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split, returning why it ended
async fn run_session(
    conn_id: Uuid,
    state: &AppState,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    mut outbound_rx: mpsc::Receiver<ServerMsg>,
) -> String {
    let rate_limiter = PlayerRateLimiter::new(state.config.input_rate_limit);

    // Writer task: hub queue -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(conn_id = %conn_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> world
    let mut reason = "stream ended".to_string();
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(conn_id = %conn_id, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(client_msg) => state.world.handle(conn_id, client_msg),
                    Err(e) => {
                        warn!(conn_id = %conn_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(conn_id = %conn_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(frame)) => {
                reason = frame
                    .map(|f| f.reason.to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "client closed".to_string());
                break;
            }
            Err(e) => {
                debug!(conn_id = %conn_id, error = %e, "WebSocket error");
                reason = "transport error".to_string();
                break;
            }
        }
    }

    writer_handle.abort();
    reason
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
