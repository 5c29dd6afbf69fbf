//! Host command handlers
//!
//! The arbiter rejects non-hosts inside the orchestrator, so these handlers
//! only translate results into server messages.

use crate::game::HostAction;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;

use super::session::Session;

pub async fn handle_host_action(session: &mut Session, action: HostAction) -> Option<ServerMessage> {
    let (orchestrator, rng) = session.parts_mut()?;
    match orchestrator.host_action(&action, rng).await {
        Ok(snapshot) => Some(ServerMessage::Ack { seq: snapshot.seq }),
        Err(e) => {
            tracing::warn!(
                room_id = orchestrator.room_id(),
                "Host action {:?} rejected: {}",
                action,
                e
            );
            Some(ServerMessage::error(e.code(), e.to_string()))
        }
    }
}

pub async fn handle_close_room(state: &Arc<AppState>, session: &mut Session) -> Option<ServerMessage> {
    let orchestrator = session.orchestrator()?;
    if let Err(e) = orchestrator.authorize_host() {
        return Some(ServerMessage::error(e.code(), e.to_string()));
    }
    let room_id = orchestrator.room_id().to_string();
    session.unbind();

    match state.relay.close_room(&room_id).await {
        Ok(()) => Some(ServerMessage::RoomClosed),
        Err(e) => Some(ServerMessage::error(e.code(), e.to_string())),
    }
}
