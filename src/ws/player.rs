//! Participant message handlers
//!
//! Handlers for creating/joining rooms, playing, and leaving.

use crate::game::ParticipantAction;
use crate::orchestrator::Orchestrator;
use crate::protocol::{ServerMessage, PROTOCOL_VERSION};
use crate::state::AppState;
use crate::types::{GameKind, ParticipantId, RoomId};
use std::sync::Arc;

use super::session::Session;

fn already_joined() -> Option<ServerMessage> {
    Some(ServerMessage::error(
        "ALREADY_IN_ROOM",
        "Leave the current room first",
    ))
}

async fn bind_session(
    state: &Arc<AppState>,
    session: &mut Session,
    room_id: RoomId,
    participant_id: ParticipantId,
    is_host: bool,
) -> Option<ServerMessage> {
    match Orchestrator::attach(state.relay.clone(), room_id.clone(), participant_id.clone()).await {
        Ok((orchestrator, subscription)) => {
            session.bind(orchestrator, subscription);
            Some(ServerMessage::Welcome {
                protocol: PROTOCOL_VERSION.to_string(),
                room_id,
                participant_id,
                is_host,
                server_now: chrono::Utc::now().to_rfc3339(),
            })
        }
        Err(e) => Some(ServerMessage::error(e.code(), e.to_string())),
    }
}

pub async fn handle_create_room(
    state: &Arc<AppState>,
    session: &mut Session,
    nickname: String,
    kind: GameKind,
) -> Option<ServerMessage> {
    if session.is_joined() {
        return already_joined();
    }
    let snapshot = state.relay.create_room(&nickname, kind).await;
    let room = snapshot.room;
    bind_session(state, session, room.id, room.host_id, true).await
}

pub async fn handle_join(
    state: &Arc<AppState>,
    session: &mut Session,
    room_id: RoomId,
    nickname: String,
) -> Option<ServerMessage> {
    if session.is_joined() {
        return already_joined();
    }
    match state.relay.join(&room_id, &nickname).await {
        Ok((participant, _)) => bind_session(state, session, room_id, participant.id, false).await,
        Err(e) => {
            tracing::info!(room_id = %room_id, "Join rejected: {}", e);
            Some(ServerMessage::error(e.code(), e.to_string()))
        }
    }
}

pub async fn handle_play(session: &mut Session, action: ParticipantAction) -> Option<ServerMessage> {
    let (orchestrator, _) = session.parts_mut()?;
    match orchestrator.participant_action(&action).await {
        Ok(snapshot) => Some(ServerMessage::Ack { seq: snapshot.seq }),
        Err(e) => Some(ServerMessage::error(e.code(), e.to_string())),
    }
}

/// Leave the room. A leaving host closes it, since hosting never migrates.
pub async fn handle_leave(state: &Arc<AppState>, session: &mut Session) -> Option<ServerMessage> {
    let orchestrator = session.unbind()?;
    let room_id = orchestrator.room_id();
    let participant_id = orchestrator.participant_id();

    let result = if orchestrator.authorize_host().is_ok() {
        state.relay.close_room(room_id).await
    } else {
        state
            .relay
            .remove_participant(room_id, participant_id)
            .await
            .map(|_| ())
    };

    match result {
        Ok(()) => Some(ServerMessage::Left),
        Err(e) => {
            // Already gone (kicked or closed); nothing left to clean up
            tracing::debug!(room_id, participant_id, "Leave found nothing to remove: {}", e);
            Some(ServerMessage::Left)
        }
    }
}
