pub mod handlers;
mod host;
mod player;
pub mod session;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt, Sink};
use std::sync::Arc;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::relay::RoomSubscription;
use crate::state::AppState;
use crate::types::RoomSnapshot;
use session::{Session, SnapshotOutcome};

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Next snapshot from the room we are bound to; pends forever while unbound
async fn next_snapshot(subscription: &mut Option<RoomSubscription>) -> Option<RoomSnapshot> {
    match subscription {
        Some(sub) => sub.next().await,
        None => std::future::pending::<Option<RoomSnapshot>>().await,
    }
}

enum Event {
    Snapshot(Option<RoomSnapshot>),
    Client(Option<Result<Message, axum::Error>>),
}

async fn send_json<S>(sender: &mut S, msg: &ServerMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            true
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut session = Session::new();
    let mut subscription: Option<RoomSubscription> = None;

    loop {
        let event = tokio::select! {
            snapshot = next_snapshot(&mut subscription) => Event::Snapshot(snapshot),
            ws_msg = receiver.next() => Event::Client(ws_msg),
        };

        match event {
            Event::Snapshot(Some(snapshot)) => match session.on_snapshot(snapshot) {
                SnapshotOutcome::Forward(snapshot) => {
                    if !send_json(&mut sender, &ServerMessage::Snapshot { snapshot }).await {
                        break;
                    }
                }
                SnapshotOutcome::Skip => {}
                SnapshotOutcome::Kicked => {
                    tracing::info!("Participant was removed from the room");
                    session.unbind();
                    subscription = None;
                    if !send_json(&mut sender, &ServerMessage::Kicked).await {
                        break;
                    }
                }
            },

            Event::Snapshot(None) => {
                let was_joined = session.unbind().is_some();
                subscription = None;
                if was_joined && !send_json(&mut sender, &ServerMessage::RoomClosed).await {
                    break;
                }
            }

            Event::Client(Some(Ok(Message::Text(text)))) => {
                tracing::debug!("Received message: {}", text);

                let response = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => handlers::handle_message(client_msg, &mut session, &state).await,
                    Err(e) => {
                        tracing::error!("Failed to parse client message: {}", e);
                        Some(ServerMessage::error(
                            "PARSE_ERROR",
                            format!("Invalid message format: {}", e),
                        ))
                    }
                };

                if !session.is_joined() {
                    subscription = None;
                }
                if let Some(sub) = session.take_subscription() {
                    subscription = Some(sub);
                }

                if let Some(response) = response {
                    if !send_json(&mut sender, &response).await {
                        tracing::error!("Failed to send response");
                        break;
                    }
                }
            }
            Event::Client(Some(Ok(Message::Close(_)))) => {
                tracing::info!("WebSocket closed");
                break;
            }
            Event::Client(Some(Ok(Message::Ping(data)))) => {
                if sender.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Event::Client(Some(Ok(_))) => {}
            Event::Client(Some(Err(e))) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
            Event::Client(None) => break,
        }
    }

    // A dropped connection counts as leaving
    if session.is_joined() {
        handlers::handle_message(ClientMessage::Leave, &mut session, &state).await;
    }

    tracing::info!("WebSocket connection closed");
}
