use crate::game::{HostAction, ParticipantAction};
use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open a new room with the sender as host
    CreateRoom {
        nickname: String,
        kind: GameKind,
    },
    Join {
        room_id: RoomId,
        nickname: String,
    },
    // Host-only messages
    Host {
        action: HostAction,
    },
    CloseRoom,
    // Participant messages
    Play {
        action: ParticipantAction,
    },
    Leave,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        room_id: RoomId,
        participant_id: ParticipantId,
        is_host: bool,
        server_now: String,
    },
    /// Full room state. Clients derive every view from this themselves.
    Snapshot {
        snapshot: RoomSnapshot,
    },
    /// The write behind an action was accepted at `seq`
    Ack {
        seq: u64,
    },
    Left,
    Kicked,
    RoomClosed,
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: impl Into<String>, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.into(),
            msg: msg.into(),
        }
    }
}
