//! Mini-game dispatch
//!
//! A room runs one [`GameKind`] at a time. Each kind is a set of pure
//! functions over [`Room`]; this module routes views and actions to the
//! active kind and handles the room-level host transitions.

pub mod bridge;
pub mod counter;
pub mod ladder;
pub mod poll;
pub mod wheel;

use crate::arbiter;
use crate::error::{RoomError, RoomResult};
use crate::types::{Answer, GameKind, ParticipantId, Room};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostAction {
    /// Switch the room to another kind, starting from a clean slate
    SelectKind { kind: GameKind },
    /// Remove a non-host participant
    Kick { participant_id: ParticipantId },
    /// Clear the active round (payload, answers or scores depending on kind)
    Reset,
    // Poll
    NextQuestion,
    AskQuestion {
        question: String,
        option_a: String,
        option_b: String,
    },
    Reveal,
    // Wheel
    Spin,
    // Ladder
    Generate { labels: Vec<String> },
}

impl HostAction {
    /// Kind this action belongs to, `None` for room-level actions
    pub fn kind(&self) -> Option<GameKind> {
        match self {
            HostAction::SelectKind { .. } | HostAction::Kick { .. } | HostAction::Reset => None,
            HostAction::NextQuestion | HostAction::AskQuestion { .. } | HostAction::Reveal => {
                Some(GameKind::Poll)
            }
            HostAction::Spin => Some(GameKind::Wheel),
            HostAction::Generate { .. } => Some(GameKind::Ladder),
        }
    }

    /// Whether this action wipes every participant's answer, including
    /// answers the caller has not seen yet
    pub fn clears_answers(&self, active: GameKind) -> bool {
        match self {
            HostAction::SelectKind { .. } => true,
            HostAction::NextQuestion | HostAction::AskQuestion { .. } => true,
            HostAction::Reset => active == GameKind::Poll,
            _ => false,
        }
    }

    /// Whether this action zeroes every participant's score
    pub fn clears_scores(&self, active: GameKind) -> bool {
        match self {
            HostAction::SelectKind { .. } => true,
            HostAction::Reset => active == GameKind::Counter,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParticipantAction {
    Select { answer: Answer },
    Increment,
}

impl ParticipantAction {
    pub fn kind(&self) -> GameKind {
        match self {
            ParticipantAction::Select { .. } => GameKind::Poll,
            ParticipantAction::Increment => GameKind::Counter,
        }
    }
}

/// Presentation-ready state, recomputed from scratch for every snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedView {
    /// Nothing to show yet, or the payload could not be decoded
    Waiting {
        kind: GameKind,
        reason: Option<String>,
    },
    Poll(poll::PollView),
    Counter(counter::CounterView),
    Wheel(wheel::WheelView),
    Ladder(ladder::LadderView),
}

impl DerivedView {
    pub fn is_waiting(&self) -> bool {
        matches!(self, DerivedView::Waiting { .. })
    }
}

fn try_derive(room: &Room) -> RoomResult<Option<DerivedView>> {
    Ok(match room.kind {
        GameKind::Poll => poll::derive(room)?.map(DerivedView::Poll),
        GameKind::Counter => Some(DerivedView::Counter(counter::derive(room))),
        GameKind::Wheel => Some(DerivedView::Wheel(wheel::derive(room)?)),
        GameKind::Ladder => ladder::derive(room)?.map(DerivedView::Ladder),
    })
}

/// Project a room into its view. A payload that does not decode degrades to
/// [`DerivedView::Waiting`] until the host resets the round.
pub fn derive_view(room: &Room) -> DerivedView {
    match try_derive(room) {
        Ok(Some(view)) => view,
        Ok(None) => DerivedView::Waiting {
            kind: room.kind,
            reason: None,
        },
        Err(e) => {
            tracing::warn!(room_id = %room.id, kind = room.kind.as_str(), "Undecodable payload: {}", e);
            DerivedView::Waiting {
                kind: room.kind,
                reason: Some(e.to_string()),
            }
        }
    }
}

fn require_kind(room: &Room, wanted: GameKind) -> RoomResult<()> {
    if room.kind != wanted {
        return Err(RoomError::InvalidStateError(format!(
            "Room is playing {}, not {}",
            room.kind.as_str(),
            wanted.as_str()
        )));
    }
    Ok(())
}

fn select_kind(room: &Room, kind: GameKind) -> Room {
    let mut next = room.clone();
    next.kind = kind;
    next.payload = None;
    next.result_open = false;
    for p in &mut next.participants {
        p.score = 0;
        p.selected_answer = None;
    }
    next
}

fn kick(room: &Room, participant_id: &str) -> RoomResult<Room> {
    if participant_id == room.host_id {
        return Err(RoomError::ValidationError(
            "The host cannot be kicked".to_string(),
        ));
    }
    let index = room.participant_index(participant_id).ok_or_else(|| {
        RoomError::ValidationError(format!("No participant {}", participant_id))
    })?;
    let mut next = room.clone();
    next.participants.remove(index);
    Ok(next)
}

fn reset(room: &Room) -> Room {
    match room.kind {
        GameKind::Poll => poll::reset(room),
        GameKind::Counter => counter::reset(room),
        GameKind::Wheel => wheel::reset(room),
        GameKind::Ladder => ladder::reset(room),
    }
}

/// Apply a host transition. Non-hosts get `PermissionError` and the input
/// room is left untouched.
pub fn apply_host_action<R: Rng + ?Sized>(
    room: &Room,
    actor: &str,
    action: &HostAction,
    rng: &mut R,
) -> RoomResult<Room> {
    arbiter::ensure_host(room, actor)?;
    if let Some(kind) = action.kind() {
        require_kind(room, kind)?;
    }

    match action {
        HostAction::SelectKind { kind } => Ok(select_kind(room, *kind)),
        HostAction::Kick { participant_id } => kick(room, participant_id),
        HostAction::Reset => Ok(reset(room)),
        HostAction::NextQuestion => Ok(poll::next_question(room, rng)),
        HostAction::AskQuestion {
            question,
            option_a,
            option_b,
        } => poll::ask(room, question, option_a, option_b),
        HostAction::Reveal => poll::reveal(room),
        HostAction::Spin => wheel::spin(room, rng),
        HostAction::Generate { labels } => ladder::generate(room, labels, rng),
    }
}

/// Apply an action a participant takes on its own row
pub fn apply_participant_action(
    room: &Room,
    participant_id: &str,
    action: &ParticipantAction,
) -> RoomResult<Room> {
    if room.participant(participant_id).is_none() {
        return Err(RoomError::PermissionError(
            "Not a participant of this room".to_string(),
        ));
    }
    require_kind(room, action.kind())?;

    match action {
        ParticipantAction::Select { answer } => poll::select(room, participant_id, *answer),
        ParticipantAction::Increment => counter::increment(room, participant_id),
    }
}
