//! Ladder puzzle round
//!
//! Payload is `{seed, results}`. The bridge matrix is rebuilt locally from
//! the seed on every client and is never put on the wire.

use super::bridge::{self, BridgeMatrix, LADDER_STEPS};
use crate::error::{RoomError, RoomResult};
use crate::types::{ParticipantId, Room};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderPayload {
    pub seed: i32,
    pub results: Vec<String>,
}

impl LadderPayload {
    pub fn encode(&self) -> serde_json::Value {
        serde_json::json!({ "seed": self.seed, "results": self.results })
    }

    pub fn decode(value: &serde_json::Value) -> RoomResult<Self> {
        let payload: LadderPayload = serde_json::from_value(value.clone())
            .map_err(|e| RoomError::DecodeError(format!("Bad ladder payload: {}", e)))?;
        if payload.results.len() < 2 {
            return Err(RoomError::DecodeError(format!(
                "Ladder needs at least 2 results, got {}",
                payload.results.len()
            )));
        }
        Ok(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderOutcome {
    pub participant_id: ParticipantId,
    pub nickname: String,
    pub start_lane: usize,
    pub final_lane: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderView {
    pub seed: i32,
    pub labels: Vec<String>,
    pub matrix: BridgeMatrix,
    pub outcomes: Vec<LadderOutcome>,
}

/// Outcome label for the participant starting in `lane`
pub fn outcome_for(payload: &LadderPayload, lane: usize) -> Option<&str> {
    let lanes = payload.results.len();
    if lane >= lanes {
        return None;
    }
    let matrix = bridge::generate(payload.seed, lanes, LADDER_STEPS);
    payload
        .results
        .get(bridge::resolve(&matrix, lane))
        .map(String::as_str)
}

/// `Ok(None)` until the host generates a ladder.
///
/// Lanes follow the participant count captured at generation time; anyone
/// who joined afterwards has no lane in this round.
pub fn derive(room: &Room) -> RoomResult<Option<LadderView>> {
    let Some(raw) = &room.payload else {
        return Ok(None);
    };
    let payload = LadderPayload::decode(raw)?;
    let lanes = payload.results.len();
    let matrix = bridge::generate(payload.seed, lanes, LADDER_STEPS);

    let outcomes = room
        .participants
        .iter()
        .take(lanes)
        .enumerate()
        .map(|(start_lane, p)| {
            let final_lane = bridge::resolve(&matrix, start_lane);
            LadderOutcome {
                participant_id: p.id.clone(),
                nickname: p.nickname.clone(),
                start_lane,
                final_lane,
                label: payload.results[final_lane].clone(),
            }
        })
        .collect();

    Ok(Some(LadderView {
        seed: payload.seed,
        labels: payload.results,
        matrix,
        outcomes,
    }))
}

pub fn generate<R: Rng + ?Sized>(room: &Room, labels: &[String], rng: &mut R) -> RoomResult<Room> {
    if room.payload.is_some() {
        return Err(RoomError::InvalidStateError(
            "A ladder is already in play; reset it first".to_string(),
        ));
    }
    let participants = room.participants.len();
    if participants < 2 {
        return Err(RoomError::ValidationError(
            "Ladder needs at least 2 participants".to_string(),
        ));
    }
    if labels.len() != participants {
        return Err(RoomError::ValidationError(format!(
            "Expected {} result labels, got {}",
            participants,
            labels.len()
        )));
    }
    let results: Vec<String> = labels.iter().map(|l| l.trim().to_string()).collect();
    if let Some(index) = results.iter().position(|l| l.is_empty()) {
        return Err(RoomError::ValidationError(format!(
            "Result label {} is empty",
            index + 1
        )));
    }

    let payload = LadderPayload {
        seed: rng.random::<i32>(),
        results,
    };
    let mut next = room.clone();
    next.payload = Some(payload.encode());
    Ok(next)
}

pub fn reset(room: &Room) -> Room {
    let mut next = room.clone();
    next.payload = None;
    next
}
