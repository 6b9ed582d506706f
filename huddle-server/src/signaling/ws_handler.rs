use crate::churn::ChurnCoordinator;
use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::IntoResponse;
use futures::{SinkExt, Stream, StreamExt};
use huddle_core::{ClientMessage, ConnectionId, ServerMessage};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

pub const INCORRECT_DATA_FORMAT: &str = "Incorrect data format";
pub const UNRECOGNIZED_COMMAND: &str = "Unrecognized command";

const KNOWN_TYPES: [&str; 6] = [
    "initiation",
    "roomInitiation",
    "offer",
    "answer",
    "candidate",
    "leaveRoom",
];

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(coordinator): State<ChurnCoordinator>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, coordinator))
}

async fn handle_socket(socket: WebSocket, coordinator: ChurnCoordinator) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let conn = coordinator.relay().attach(tx);
    info!(conn = %conn, "New WebSocket connection");

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!(conn = %conn, error = %e, "Failed to serialize server message");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let (stop_tx, stop_rx) = oneshot::channel();
    let mut recv_task = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { read_frames(receiver, stop_rx, &coordinator, conn).await }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            // the message being handled runs to completion
            let _ = stop_tx.send(());
            if let Err(e) = recv_task.await {
                error!(conn = %conn, error = %e, "Receive task failed");
            }
        }
        _ = (&mut recv_task) => send_task.abort(),
    };

    // whichever side stopped first, the peer is gone
    let report = coordinator.disconnect(conn).await;
    info!(conn = %conn, left_room = report.is_some(), "WebSocket disconnected");
}

/// Feeds client frames to the coordinator until the stream ends or `stop` fires.
///
/// `stop` is only checked between frames, so a message is never abandoned
/// halfway through its admission or leave.
pub async fn read_frames<S, E>(
    mut receiver: S,
    mut stop: oneshot::Receiver<()>,
    coordinator: &ChurnCoordinator,
    conn: ConnectionId,
) where
    S: Stream<Item = Result<Message, E>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            biased;
            _ = &mut stop => break,
            frame = receiver.next() => frame,
        };
        let Some(Ok(msg)) = frame else {
            break;
        };

        match msg {
            Message::Text(text) => match parse_frame(text.as_str()) {
                Ok(msg) => coordinator.handle(conn, msg).await,
                Err(reason) => {
                    warn!(conn = %conn, reason, "Rejected client frame");
                    if coordinator
                        .relay()
                        .send_to(conn, ServerMessage::error(reason))
                        .is_err()
                    {
                        break;
                    }
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }
}

/// Decodes one text frame, or names the error the client gets back.
pub fn parse_frame(text: &str) -> Result<ClientMessage, &'static str> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => Ok(msg),
        Err(_) => {
            let kind = serde_json::from_str::<serde_json::Value>(text)
                .ok()
                .and_then(|value| value.get("type")?.as_str().map(str::to_owned));
            match kind {
                Some(kind) if !KNOWN_TYPES.contains(&kind.as_str()) => Err(UNRECOGNIZED_COMMAND),
                _ => Err(INCORRECT_DATA_FORMAT),
            }
        }
    }
}
