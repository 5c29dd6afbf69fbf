//! Per-connection binding between a socket and a room

use crate::orchestrator::Orchestrator;
use crate::relay::{InMemoryRelay, RoomSubscription};
use crate::types::RoomSnapshot;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// What the socket loop should do with a snapshot
#[derive(Debug)]
pub enum SnapshotOutcome {
    Forward(RoomSnapshot),
    /// Already sent (duplicate or older)
    Skip,
    /// We are no longer in the room
    Kicked,
}

pub struct Session {
    orchestrator: Option<Orchestrator<InMemoryRelay>>,
    pending_subscription: Option<RoomSubscription>,
    forwarded_seq: u64,
    rng: StdRng,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            orchestrator: None,
            pending_subscription: None,
            forwarded_seq: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn is_joined(&self) -> bool {
        self.orchestrator.is_some()
    }

    pub fn orchestrator(&self) -> Option<&Orchestrator<InMemoryRelay>> {
        self.orchestrator.as_ref()
    }

    /// Orchestrator and rng together, so handlers can borrow both
    pub fn parts_mut(&mut self) -> Option<(&mut Orchestrator<InMemoryRelay>, &mut StdRng)> {
        self.orchestrator.as_mut().map(|o| (o, &mut self.rng))
    }

    pub fn bind(&mut self, orchestrator: Orchestrator<InMemoryRelay>, subscription: RoomSubscription) {
        self.orchestrator = Some(orchestrator);
        self.pending_subscription = Some(subscription);
        self.forwarded_seq = 0;
    }

    /// Hand a freshly opened subscription over to the socket loop
    pub fn take_subscription(&mut self) -> Option<RoomSubscription> {
        self.pending_subscription.take()
    }

    /// Forget the room; returns the orchestrator that was bound
    pub fn unbind(&mut self) -> Option<Orchestrator<InMemoryRelay>> {
        self.pending_subscription = None;
        self.forwarded_seq = 0;
        self.orchestrator.take()
    }

    pub fn on_snapshot(&mut self, snapshot: RoomSnapshot) -> SnapshotOutcome {
        let Some(orchestrator) = self.orchestrator.as_mut() else {
            return SnapshotOutcome::Skip;
        };
        orchestrator.on_snapshot(snapshot.clone());
        if !orchestrator.is_member() {
            return SnapshotOutcome::Kicked;
        }
        if snapshot.seq <= self.forwarded_seq {
            return SnapshotOutcome::Skip;
        }
        self.forwarded_seq = snapshot.seq;
        SnapshotOutcome::Forward(snapshot)
    }
}
