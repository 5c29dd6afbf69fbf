//! Per-room orchestration
//!
//! One [`RoomState`] value is threaded through pure functions: snapshots from
//! the relay subscription are reduced into it, views are derived from it and
//! actions are applied to it and written back through the relay.

use crate::arbiter;
use crate::error::{ActionError, RelayError, RoomError, RoomResult};
use crate::game::{self, DerivedView, HostAction, ParticipantAction};
use crate::relay::{RelayChannel, RoomSubscription, RoomUpdate};
use crate::types::{GameKind, ParticipantId, Room, RoomId, RoomSnapshot};
use rand::Rng;
use std::sync::Arc;

/// Latest known room plus the view derived from it
#[derive(Debug, Clone, Default)]
pub struct RoomState {
    snapshot: Option<RoomSnapshot>,
    view: Option<DerivedView>,
}

impl RoomState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a snapshot in. Stale or repeated snapshots (at-least-once
    /// delivery) are dropped; returns whether the state changed.
    pub fn reduce(&mut self, snapshot: RoomSnapshot) -> bool {
        if let Some(current) = &self.snapshot {
            if snapshot.seq <= current.seq {
                return false;
            }
        }
        self.view = Some(game::derive_view(&snapshot.room));
        self.snapshot = Some(snapshot);
        true
    }

    pub fn room(&self) -> Option<&Room> {
        self.snapshot.as_ref().map(|s| &s.room)
    }

    pub fn view(&self) -> Option<&DerivedView> {
        self.view.as_ref()
    }

    pub fn seq(&self) -> u64 {
        self.snapshot.as_ref().map(|s| s.seq).unwrap_or(0)
    }
}

/// Acts on one room on behalf of one participant
pub struct Orchestrator<R: RelayChannel + ?Sized> {
    relay: Arc<R>,
    room_id: RoomId,
    participant_id: ParticipantId,
    state: RoomState,
}

impl<R: RelayChannel + ?Sized> Orchestrator<R> {
    /// Subscribe to the room and prime the state with its current snapshot.
    ///
    /// The subscription still yields that first snapshot; feeding it back
    /// through [`Orchestrator::on_snapshot`] is a no-op.
    pub async fn attach(
        relay: Arc<R>,
        room_id: RoomId,
        participant_id: ParticipantId,
    ) -> Result<(Self, RoomSubscription), RelayError> {
        let subscription = relay.subscribe(&room_id).await?;
        let mut state = RoomState::new();
        if let Some(initial) = subscription.peek_initial() {
            state.reduce(initial.clone());
        }
        let orchestrator = Self {
            relay,
            room_id,
            participant_id,
            state,
        };
        Ok((orchestrator, subscription))
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    /// Feed a snapshot from the subscription; returns the fresh view if it
    /// was newer than what we had
    pub fn on_snapshot(&mut self, snapshot: RoomSnapshot) -> Option<&DerivedView> {
        if self.state.reduce(snapshot) {
            self.state.view()
        } else {
            None
        }
    }

    /// Whether the latest snapshot still lists us (false after a kick)
    pub fn is_member(&self) -> bool {
        self.state
            .room()
            .map(|room| room.participant(&self.participant_id).is_some())
            .unwrap_or(false)
    }

    fn current_room(&self) -> Result<&Room, RelayError> {
        self.state
            .room()
            .ok_or_else(|| RelayError::RoomNotFound(self.room_id.clone()))
    }

    /// Check host authority without changing anything (used before closing)
    pub fn authorize_host(&self) -> Result<(), ActionError> {
        let room = self.current_room()?;
        arbiter::ensure_host(room, &self.participant_id)?;
        Ok(())
    }

    async fn commit(&mut self, update: RoomUpdate) -> Result<RoomSnapshot, ActionError> {
        let snapshot = self.relay.write(&self.room_id, update).await?;
        // The echo will also arrive on the subscription; the reducer dedupes it
        self.state.reduce(snapshot.clone());
        Ok(snapshot)
    }

    /// Run a host action against the latest snapshot and write the result
    /// as a compare-and-set on the room version
    pub async fn host_action<G: Rng + Send + ?Sized>(
        &mut self,
        action: &HostAction,
        rng: &mut G,
    ) -> Result<RoomSnapshot, ActionError> {
        let room = self.current_room()?;
        let next = game::apply_host_action(room, &self.participant_id, action, rng)?;
        let update = RoomUpdate::diff(room, &next)
            .with_cleared_rows(
                action.clears_answers(room.kind),
                action.clears_scores(room.kind),
            )
            .with_expected_version(room.version);

        tracing::info!(
            room_id = %self.room_id,
            ?action,
            "Host action"
        );
        self.commit(update).await
    }

    /// Run a participant action; only the caller's own row is written.
    ///
    /// The write is conditional on the room version the action was checked
    /// against. Other participants' writes never bump it, so they do not
    /// conflict; a host transition (reveal, next question, reset) or a
    /// finished race does, and the action is refused as out of date.
    pub async fn participant_action(
        &mut self,
        action: &ParticipantAction,
    ) -> Result<RoomSnapshot, ActionError> {
        let room = self.current_room()?;
        let next = game::apply_participant_action(room, &self.participant_id, action)?;
        let update = own_row_only(room, RoomUpdate::diff(room, &next), &self.participant_id)?
            .with_expected_version(room.version);

        tracing::debug!(
            room_id = %self.room_id,
            participant_id = %self.participant_id,
            ?action,
            "Participant action"
        );
        match self.commit(update).await {
            Err(ActionError::Relay(RelayError::VersionConflict { expected, actual })) => {
                tracing::info!(
                    room_id = %self.room_id,
                    participant_id = %self.participant_id,
                    expected,
                    actual,
                    "Participant action raced a room transition"
                );
                Err(RoomError::InvalidStateError(
                    "The round changed before this action landed".to_string(),
                )
                .into())
            }
            other => other,
        }
    }
}

/// Participant writes may only carry the caller's own row. The one room-row
/// change allowed is closing a counter race on reaching the goal.
fn own_row_only(room: &Room, update: RoomUpdate, participant_id: &str) -> RoomResult<RoomUpdate> {
    let closes_race = room.kind == GameKind::Counter && update.result_open == Some(true);
    if update.kind.is_some()
        || update.payload.is_some()
        || (update.result_open.is_some() && !closes_race)
        || update.clear_answers
        || update.clear_scores
        || !update.removed.is_empty()
        || update.participants.iter().any(|p| p.id != participant_id)
    {
        return Err(RoomError::PermissionError(
            "Participant actions may only change the caller's own row".to_string(),
        ));
    }
    Ok(update)
}
