use super::{RelayChannel, RoomSubscription, RoomUpdate};
use crate::config::AppConfig;
use crate::error::{RelayError, RelayResult};
use crate::types::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

struct RoomRow {
    seq: u64,
    room: Room,
    tx: broadcast::Sender<RoomSnapshot>,
}

impl RoomRow {
    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            seq: self.seq,
            room: self.room.clone(),
        }
    }

    /// Bump the sequence number and fan the new snapshot out to subscribers
    fn publish(&mut self) -> RoomSnapshot {
        self.seq += 1;
        let snapshot = self.snapshot();
        // Ignore send errors (no subscribers is fine)
        let _ = self.tx.send(snapshot.clone());
        snapshot
    }
}

/// Authoritative room store held in process memory.
///
/// Every write runs under one write lock, so each write is atomic and
/// compare-and-set on the room version is exact.
#[derive(Clone)]
pub struct InMemoryRelay {
    rooms: Arc<RwLock<HashMap<RoomId, RoomRow>>>,
    max_participants: usize,
    max_nickname_chars: usize,
    snapshot_buffer: usize,
}

impl InMemoryRelay {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            max_participants: config.max_participants,
            max_nickname_chars: config.max_nickname_chars,
            snapshot_buffer: config.snapshot_buffer,
        }
    }

    /// Trim and truncate a nickname, generating one when blank
    fn normalize_nickname(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return petname::petname(2, "-").unwrap_or_else(|| "guest".to_string());
        }
        trimmed.chars().take(self.max_nickname_chars).collect()
    }

    /// Create a room with its host as the first participant
    pub async fn create_room(&self, host_nickname: &str, kind: GameKind) -> RoomSnapshot {
        let host = Participant::new(self.normalize_nickname(host_nickname), true);
        let room = Room::new(host, kind);
        let (tx, _rx) = broadcast::channel(self.snapshot_buffer);
        let row = RoomRow { seq: 1, room, tx };
        let snapshot = row.snapshot();

        tracing::info!(
            room_id = %snapshot.room.id,
            host_id = %snapshot.room.host_id,
            kind = kind.as_str(),
            "Room created"
        );
        self.rooms
            .write()
            .await
            .insert(snapshot.room.id.clone(), row);
        snapshot
    }

    /// Append a participant at the end of the canonical order
    pub async fn join(&self, room_id: &str, nickname: &str) -> RelayResult<(Participant, RoomSnapshot)> {
        let mut rooms = self.rooms.write().await;
        let row = rooms
            .get_mut(room_id)
            .ok_or_else(|| RelayError::RoomNotFound(room_id.to_string()))?;

        if row.room.participants.len() >= self.max_participants {
            return Err(RelayError::RoomFull(self.max_participants));
        }

        let participant = Participant::new(self.normalize_nickname(nickname), false);
        row.room.participants.push(participant.clone());
        tracing::info!(room_id, participant_id = %participant.id, nickname = %participant.nickname, "Participant joined");

        Ok((participant, row.publish()))
    }

    /// Drop a participant row
    pub async fn remove_participant(&self, room_id: &str, participant_id: &str) -> RelayResult<RoomSnapshot> {
        let mut rooms = self.rooms.write().await;
        let row = rooms
            .get_mut(room_id)
            .ok_or_else(|| RelayError::RoomNotFound(room_id.to_string()))?;

        let index = row
            .room
            .participant_index(participant_id)
            .ok_or_else(|| RelayError::ParticipantNotFound(participant_id.to_string()))?;
        row.room.participants.remove(index);
        tracing::info!(room_id, participant_id, "Participant removed");

        Ok(row.publish())
    }

    /// Destroy the room; all subscriptions end
    pub async fn close_room(&self, room_id: &str) -> RelayResult<()> {
        // Dropping the row drops the only sender, which closes every receiver
        self.rooms
            .write()
            .await
            .remove(room_id)
            .map(|_| tracing::info!(room_id, "Room closed"))
            .ok_or_else(|| RelayError::RoomNotFound(room_id.to_string()))
    }

    pub async fn snapshot(&self, room_id: &str) -> RelayResult<RoomSnapshot> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .map(RoomRow::snapshot)
            .ok_or_else(|| RelayError::RoomNotFound(room_id.to_string()))
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[async_trait]
impl RelayChannel for InMemoryRelay {
    async fn subscribe(&self, room_id: &str) -> RelayResult<RoomSubscription> {
        let rooms = self.rooms.read().await;
        let row = rooms
            .get(room_id)
            .ok_or_else(|| RelayError::RoomNotFound(room_id.to_string()))?;
        // Subscribe and snapshot under the same lock so no write slips between
        Ok(RoomSubscription::new(row.snapshot(), row.tx.subscribe()))
    }

    async fn write(&self, room_id: &str, update: RoomUpdate) -> RelayResult<RoomSnapshot> {
        let mut rooms = self.rooms.write().await;
        let row = rooms
            .get_mut(room_id)
            .ok_or_else(|| RelayError::RoomNotFound(room_id.to_string()))?;

        if let Some(expected) = update.expected_version {
            if row.room.version != expected {
                return Err(RelayError::VersionConflict {
                    expected,
                    actual: row.room.version,
                });
            }
        }

        // Validate every target row before touching any of them
        if let Some(missing) = update
            .participants
            .iter()
            .map(|p| &p.id)
            .chain(update.removed.iter())
            .find(|id| row.room.participant(id).is_none())
        {
            return Err(RelayError::ParticipantNotFound(missing.clone()));
        }

        if update.is_empty() {
            return Ok(row.snapshot());
        }

        if update.touches_room_row() {
            if let Some(kind) = update.kind {
                row.room.kind = kind;
            }
            if let Some(payload) = update.payload {
                row.room.payload = payload;
            }
            if let Some(result_open) = update.result_open {
                row.room.result_open = result_open;
            }
            for p in &mut row.room.participants {
                if update.clear_answers {
                    p.selected_answer = None;
                }
                if update.clear_scores {
                    p.score = 0;
                }
            }
            row.room.version += 1;
        }

        for change in update.participants {
            if let Some(p) = row.room.participant_mut(&change.id) {
                if let Some(score) = change.score {
                    p.score = score;
                }
                if let Some(answer) = change.selected_answer {
                    p.selected_answer = answer;
                }
            }
        }

        row.room
            .participants
            .retain(|p| !update.removed.contains(&p.id));

        let snapshot = row.publish();
        tracing::debug!(room_id, seq = snapshot.seq, version = snapshot.room.version, "Room written");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::ParticipantUpdate;

    fn relay() -> InMemoryRelay {
        InMemoryRelay::new(&AppConfig {
            max_participants: 3,
            max_nickname_chars: 5,
            ..AppConfig::default()
        })
    }

    #[tokio::test]
    async fn test_create_and_join() {
        let relay = relay();
        let created = relay.create_room("  Hosty McHost ", GameKind::Poll).await;
        assert_eq!(created.seq, 1);
        assert_eq!(created.room.participants.len(), 1);
        assert_eq!(created.room.participants[0].nickname, "Hosty");
        assert!(created.room.participants[0].is_host);

        let (guest, snapshot) = relay.join(&created.room.id, "").await.unwrap();
        assert!(!guest.nickname.is_empty());
        assert!(!guest.is_host);
        assert_eq!(snapshot.seq, 2);
        assert_eq!(snapshot.room.participants[1].id, guest.id);
    }

    #[tokio::test]
    async fn test_room_full() {
        let relay = relay();
        let room = relay.create_room("h", GameKind::Counter).await.room;
        relay.join(&room.id, "a").await.unwrap();
        relay.join(&room.id, "b").await.unwrap();
        assert_eq!(
            relay.join(&room.id, "c").await.unwrap_err(),
            RelayError::RoomFull(3)
        );
    }

    #[tokio::test]
    async fn test_subscription_sees_initial_then_writes() {
        let relay = relay();
        let room = relay.create_room("h", GameKind::Wheel).await.room;
        let mut sub = relay.subscribe(&room.id).await.unwrap();

        let first = sub.next().await.unwrap();
        assert_eq!(first.seq, 1);

        let update = RoomUpdate {
            payload: Some(Some(serde_json::json!("2000"))),
            ..RoomUpdate::default()
        };
        relay.write(&room.id, update).await.unwrap();

        let second = sub.next().await.unwrap();
        assert_eq!(second.seq, 2);
        assert_eq!(second.room.version, 2);
        assert_eq!(second.room.payload, Some(serde_json::json!("2000")));
    }

    #[tokio::test]
    async fn test_compare_and_set() {
        let relay = relay();
        let room = relay.create_room("h", GameKind::Wheel).await.room;
        let update = RoomUpdate {
            payload: Some(Some(serde_json::json!("2000"))),
            ..RoomUpdate::default()
        }
        .with_expected_version(room.version);

        relay.write(&room.id, update.clone()).await.unwrap();
        let err = relay.write(&room.id, update).await.unwrap_err();
        assert_eq!(
            err,
            RelayError::VersionConflict {
                expected: 1,
                actual: 2
            }
        );
    }

    #[tokio::test]
    async fn test_participant_writes_do_not_bump_version() {
        let relay = relay();
        let room = relay.create_room("h", GameKind::Counter).await.room;
        let host = room.host_id.clone();

        let update = RoomUpdate {
            participants: vec![ParticipantUpdate {
                id: host.clone(),
                score: Some(1),
                selected_answer: None,
            }],
            ..RoomUpdate::default()
        };
        let snapshot = relay.write(&room.id, update).await.unwrap();
        assert_eq!(snapshot.room.version, 1);
        assert_eq!(snapshot.room.participants[0].score, 1);
    }

    #[tokio::test]
    async fn test_clears_reach_every_row() {
        let relay = relay();
        let room = relay.create_room("h", GameKind::Poll).await.room;
        let (guest, _) = relay.join(&room.id, "g").await.unwrap();

        // Written after the clearing writer took its copy of the room
        let answer = RoomUpdate {
            participants: vec![ParticipantUpdate {
                id: guest.id.clone(),
                score: Some(4),
                selected_answer: Some(Some(Answer::B)),
            }],
            ..RoomUpdate::default()
        };
        relay.write(&room.id, answer).await.unwrap();

        let clear = RoomUpdate {
            clear_answers: true,
            clear_scores: true,
            ..RoomUpdate::default()
        }
        .with_expected_version(room.version);
        let snapshot = relay.write(&room.id, clear).await.unwrap();

        let row = snapshot.room.participant(&guest.id).unwrap();
        assert_eq!(row.selected_answer, None);
        assert_eq!(row.score, 0);
        assert_eq!(snapshot.room.version, room.version + 1);
    }

    #[tokio::test]
    async fn test_write_for_removed_participant_is_rejected() {
        let relay = relay();
        let room = relay.create_room("h", GameKind::Counter).await.room;
        let (guest, _) = relay.join(&room.id, "g").await.unwrap();
        relay.remove_participant(&room.id, &guest.id).await.unwrap();

        let update = RoomUpdate {
            participants: vec![ParticipantUpdate {
                id: guest.id.clone(),
                score: Some(10),
                selected_answer: None,
            }],
            ..RoomUpdate::default()
        };
        let before = relay.snapshot(&room.id).await.unwrap();
        assert_eq!(
            relay.write(&room.id, update).await.unwrap_err(),
            RelayError::ParticipantNotFound(guest.id)
        );
        assert_eq!(relay.snapshot(&room.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_close_ends_subscriptions() {
        let relay = relay();
        let room = relay.create_room("h", GameKind::Poll).await.room;
        let mut sub = relay.subscribe(&room.id).await.unwrap();
        sub.next().await.unwrap();

        relay.close_room(&room.id).await.unwrap();
        assert!(sub.next().await.is_none());
        assert_eq!(relay.room_count().await, 0);
        assert!(matches!(
            relay.subscribe(&room.id).await,
            Err(RelayError::RoomNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_write_is_silent() {
        let relay = relay();
        let room = relay.create_room("h", GameKind::Poll).await.room;
        let snapshot = relay.write(&room.id, RoomUpdate::default()).await.unwrap();
        assert_eq!(snapshot.seq, 1);
    }
}
