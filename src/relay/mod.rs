//! Relay channel: the single external collaborator of the room core
//!
//! `subscribe` yields full room snapshots, ordered per room; `write` merges a
//! partial update into the authoritative rows. Atomicity is per write.

mod memory;

pub use memory::InMemoryRelay;

use crate::error::RelayResult;
use crate::types::{Answer, GameKind, ParticipantId, Room, RoomSnapshot};
use async_trait::async_trait;
use tokio::sync::broadcast;

#[async_trait]
pub trait RelayChannel: Send + Sync {
    /// Stream of full snapshots, starting with the current one
    async fn subscribe(&self, room_id: &str) -> RelayResult<RoomSubscription>;

    /// Merge `update` into the room and return the resulting snapshot
    async fn write(&self, room_id: &str, update: RoomUpdate) -> RelayResult<RoomSnapshot>;
}

/// Receiving end of a room subscription
pub struct RoomSubscription {
    initial: Option<RoomSnapshot>,
    rx: broadcast::Receiver<RoomSnapshot>,
}

impl RoomSubscription {
    pub fn new(initial: RoomSnapshot, rx: broadcast::Receiver<RoomSnapshot>) -> Self {
        Self {
            initial: Some(initial),
            rx,
        }
    }

    /// The snapshot taken at subscribe time, if not yet consumed
    pub fn peek_initial(&self) -> Option<&RoomSnapshot> {
        self.initial.as_ref()
    }

    /// Next snapshot, or `None` once the room is closed
    pub async fn next(&mut self) -> Option<RoomSnapshot> {
        if let Some(snapshot) = self.initial.take() {
            return Some(snapshot);
        }
        loop {
            match self.rx.recv().await {
                Ok(snapshot) => return Some(snapshot),
                // Every snapshot is complete, so skipping ahead loses nothing
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Subscriber lagged, skipped {} snapshots", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Field-level change to one participant row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantUpdate {
    pub id: ParticipantId,
    pub score: Option<u32>,
    pub selected_answer: Option<Option<Answer>>,
}

/// Partial update merged into the authoritative rows.
///
/// `None` fields are left alone. `expected_version` turns the write into a
/// compare-and-set against the room row's version. `clear_answers` and
/// `clear_scores` apply to every row the store holds at write time, not
/// only the rows the writer knew about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomUpdate {
    pub expected_version: Option<u64>,
    pub kind: Option<GameKind>,
    pub payload: Option<Option<serde_json::Value>>,
    pub result_open: Option<bool>,
    pub clear_answers: bool,
    pub clear_scores: bool,
    pub participants: Vec<ParticipantUpdate>,
    pub removed: Vec<ParticipantId>,
}

impl RoomUpdate {
    /// Minimal update turning `before` into `after`
    pub fn diff(before: &Room, after: &Room) -> Self {
        let mut update = RoomUpdate::default();

        if before.kind != after.kind {
            update.kind = Some(after.kind);
        }
        if before.payload != after.payload {
            update.payload = Some(after.payload.clone());
        }
        if before.result_open != after.result_open {
            update.result_open = Some(after.result_open);
        }

        for old in &before.participants {
            let Some(new) = after.participant(&old.id) else {
                update.removed.push(old.id.clone());
                continue;
            };
            let change = ParticipantUpdate {
                id: old.id.clone(),
                score: (old.score != new.score).then_some(new.score),
                selected_answer: (old.selected_answer != new.selected_answer)
                    .then_some(new.selected_answer),
            };
            if change.score.is_some() || change.selected_answer.is_some() {
                update.participants.push(change);
            }
        }

        update
    }

    pub fn with_expected_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }

    /// Turn per-row clears into room-wide ones. Row changes the clear
    /// already covers are dropped so a row that left meanwhile cannot fail
    /// the write.
    pub fn with_cleared_rows(mut self, answers: bool, scores: bool) -> Self {
        self.clear_answers |= answers;
        self.clear_scores |= scores;
        for change in &mut self.participants {
            if self.clear_answers && change.selected_answer == Some(None) {
                change.selected_answer = None;
            }
            if self.clear_scores && change.score == Some(0) {
                change.score = None;
            }
        }
        self.participants
            .retain(|p| p.score.is_some() || p.selected_answer.is_some());
        self
    }

    /// Whether the write counts as a room-level transition (bumps the version)
    pub fn touches_room_row(&self) -> bool {
        self.kind.is_some()
            || self.payload.is_some()
            || self.result_open.is_some()
            || self.clear_answers
            || self.clear_scores
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_room_row() && self.participants.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Participant;

    fn room() -> Room {
        let mut room = Room::new(Participant::new("host".to_string(), true), GameKind::Poll);
        room.participants
            .push(Participant::new("guest".to_string(), false));
        room
    }

    #[test]
    fn test_diff_of_identical_rooms_is_empty() {
        let room = room();
        assert!(RoomUpdate::diff(&room, &room).is_empty());
    }

    #[test]
    fn test_diff_tracks_own_row_only() {
        let before = room();
        let mut after = before.clone();
        after.participants[1].score = 4;

        let update = RoomUpdate::diff(&before, &after);
        assert!(!update.touches_room_row());
        assert_eq!(
            update.participants,
            vec![ParticipantUpdate {
                id: before.participants[1].id.clone(),
                score: Some(4),
                selected_answer: None,
            }]
        );
    }

    #[test]
    fn test_diff_room_fields_and_removals() {
        let before = room();
        let mut after = before.clone();
        after.payload = Some(serde_json::json!("Q|a|b"));
        after.result_open = true;
        after.participants.pop();

        let update = RoomUpdate::diff(&before, &after);
        assert!(update.touches_room_row());
        assert_eq!(update.payload, Some(Some(serde_json::json!("Q|a|b"))));
        assert_eq!(update.result_open, Some(true));
        assert_eq!(update.kind, None);
        assert_eq!(update.removed, vec![before.participants[1].id.clone()]);
    }

    #[test]
    fn test_cleared_rows_replace_per_row_resets() {
        let mut before = room();
        before.participants[1].selected_answer = Some(Answer::A);
        before.participants[1].score = 3;
        let mut after = before.clone();
        after.participants[1].selected_answer = None;
        after.participants[1].score = 0;

        let update = RoomUpdate::diff(&before, &after).with_cleared_rows(true, false);
        assert!(update.clear_answers);
        assert!(!update.clear_scores);
        assert!(update.touches_room_row());
        assert_eq!(
            update.participants,
            vec![ParticipantUpdate {
                id: before.participants[1].id.clone(),
                score: Some(0),
                selected_answer: None,
            }]
        );

        let update = RoomUpdate::diff(&before, &after).with_cleared_rows(true, true);
        assert!(update.participants.is_empty());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_diff_clearing_payload() {
        let mut before = room();
        before.payload = Some(serde_json::json!("1900"));
        let mut after = before.clone();
        after.payload = None;
        assert_eq!(RoomUpdate::diff(&before, &after).payload, Some(None));
    }
}
