//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client messages.
//! Room membership is checked here, then dispatched to the host and player
//! handler modules. Host authority itself is enforced by the arbiter.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;

use super::session::Session;
use super::{host, player};

/// Macro to require a joined room and return early otherwise
macro_rules! check_joined {
    ($session:expr, $action:expr) => {
        if !$session.is_joined() {
            return Some(ServerMessage::error(
                "NOT_IN_ROOM",
                format!("Join a room before you {}", $action),
            ));
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    session: &mut Session,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::CreateRoom { nickname, kind } => {
            player::handle_create_room(state, session, nickname, kind).await
        }

        ClientMessage::Join { room_id, nickname } => {
            player::handle_join(state, session, room_id, nickname).await
        }

        ClientMessage::Play { action } => {
            check_joined!(session, "play");
            player::handle_play(session, action).await
        }

        ClientMessage::Leave => {
            check_joined!(session, "leave");
            player::handle_leave(state, session).await
        }

        ClientMessage::Host { action } => {
            check_joined!(session, "run host actions");
            host::handle_host_action(session, action).await
        }

        ClientMessage::CloseRoom => {
            check_joined!(session, "close a room");
            host::handle_close_room(state, session).await
        }
    }
}
