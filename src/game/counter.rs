//! Click-race counter
//!
//! No payload. Every observer picks the winner from the replicated score
//! list: the first participant in canonical order at or above the goal.

use crate::error::{RoomError, RoomResult};
use crate::types::{ParticipantId, Room};

pub const GOAL_SCORE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterStanding {
    pub participant_id: ParticipantId,
    pub nickname: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterView {
    pub goal: u32,
    pub standings: Vec<CounterStanding>,
    pub winner: Option<ParticipantId>,
}

/// First participant, in canonical order, whose score reached `goal`
pub fn winner(room: &Room, goal: u32) -> Option<&ParticipantId> {
    room.participants
        .iter()
        .find(|p| p.score >= goal)
        .map(|p| &p.id)
}

pub fn derive(room: &Room) -> CounterView {
    CounterView {
        goal: GOAL_SCORE,
        standings: room
            .participants
            .iter()
            .map(|p| CounterStanding {
                participant_id: p.id.clone(),
                nickname: p.nickname.clone(),
                score: p.score,
            })
            .collect(),
        winner: winner(room, GOAL_SCORE).cloned(),
    }
}

/// Bump the caller's own score. Rejected once someone has won.
///
/// The increment that reaches the goal also sets `result_open`, which closes
/// the race on the room row so late increments conflict at the store.
pub fn increment(room: &Room, participant_id: &str) -> RoomResult<Room> {
    if let Some(id) = winner(room, GOAL_SCORE) {
        return Err(RoomError::InvalidStateError(format!(
            "Race already won by {}",
            id
        )));
    }
    if room.result_open {
        return Err(RoomError::InvalidStateError(
            "Race is closed".to_string(),
        ));
    }
    let mut next = room.clone();
    let participant = next
        .participant_mut(participant_id)
        .ok_or_else(|| RoomError::PermissionError("Not a participant".to_string()))?;
    participant.score = participant.score.saturating_add(1);
    if participant.score >= GOAL_SCORE {
        next.result_open = true;
    }
    Ok(next)
}

pub fn reset(room: &Room) -> Room {
    let mut next = room.clone();
    next.result_open = false;
    for p in &mut next.participants {
        p.score = 0;
    }
    next
}
