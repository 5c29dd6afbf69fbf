use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type RoomId = String;
pub type ParticipantId = String;

/// Which mini-game a room is currently running
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Poll,
    Counter,
    Wheel,
    Ladder,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Poll => "poll",
            GameKind::Counter => "counter",
            GameKind::Wheel => "wheel",
            GameKind::Ladder => "ladder",
        }
    }
}

/// One side of a binary-choice poll
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Answer {
    A,
    B,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub id: ParticipantId,
    pub nickname: String,
    pub score: u32,
    pub selected_answer: Option<Answer>,
    pub is_host: bool,
}

impl Participant {
    pub fn new(nickname: String, is_host: bool) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            nickname,
            score: 0,
            selected_answer: None,
            is_host,
        }
    }
}

/// The authoritative room row plus its participant rows.
///
/// `payload` is opaque to everything except the active kind's decoder:
/// a string for poll and wheel rounds, an object for ladder rounds and
/// absent for counter rounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub host_id: ParticipantId,
    /// Bumped on every write to the room row (not participant rows)
    pub version: u64,
    pub kind: GameKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub result_open: bool,
    /// Canonical (insertion) order
    pub participants: Vec<Participant>,
}

impl Room {
    /// Build a fresh room around its host participant
    pub fn new(host: Participant, kind: GameKind) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            host_id: host.id.clone(),
            version: 1,
            kind,
            payload: None,
            result_open: false,
            participants: vec![host],
        }
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn participant_mut(&mut self, id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    /// Position of a participant in canonical order
    pub fn participant_index(&self, id: &str) -> Option<usize> {
        self.participants.iter().position(|p| p.id == id)
    }

    pub fn host(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_host)
    }
}

/// A full room state as delivered by the relay subscription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSnapshot {
    /// Per-room sequence number, strictly increasing with every write
    pub seq: u64,
    pub room: Room,
}
