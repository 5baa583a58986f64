//! Lifecycle tracking for in-flight mutations.
//!
//! Each mutation walks `PendingLocalApply -> InFlight -> Confirmed | Failed`.
//! Terminal mutations leave the tracker, so `in_flight` only ever reports
//! work the remote store has not answered yet.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::board::RecordKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    PendingLocalApply,
    InFlight,
    Confirmed,
    Failed,
}

impl MutationPhase {
    /// Check if transition to target phase is valid.
    pub fn can_advance_to(&self, target: &MutationPhase) -> bool {
        matches!(
            (self, target),
            (Self::PendingLocalApply, Self::InFlight)
                | (Self::PendingLocalApply, Self::Failed)
                | (Self::InFlight, Self::Confirmed)
                | (Self::InFlight, Self::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingLocalApply => "pending_local_apply",
            Self::InFlight => "in_flight",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Create,
    Update,
    Delete,
    Move,
    Reorder,
}

impl MutationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Move => "move",
            Self::Reorder => "reorder",
        }
    }
}

/// A mutation the remote store has not answered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub id: Uuid,
    pub op: MutationOp,
    pub kind: RecordKind,
    pub entity_id: Option<i64>,
    pub phase: MutationPhase,
}

#[derive(Clone, Default)]
pub struct MutationTracker {
    inner: Arc<Mutex<HashMap<Uuid, Mutation>>>,
}

impl MutationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new mutation in `PendingLocalApply`.
    pub fn begin(&self, op: MutationOp, kind: RecordKind, entity_id: Option<i64>) -> Uuid {
        let id = Uuid::new_v4();
        let mutation = Mutation {
            id,
            op,
            kind,
            entity_id,
            phase: MutationPhase::PendingLocalApply,
        };
        debug!(
            mutation_id = %id,
            op = op.as_str(),
            kind = kind.as_str(),
            entity_id = ?entity_id,
            "Mutation started"
        );
        self.lock().insert(id, mutation);
        id
    }

    /// Move a mutation to `phase`. Invalid transitions are logged and ignored.
    pub fn advance(&self, id: Uuid, phase: MutationPhase) {
        let mut map = self.lock();
        let Some(mutation) = map.get_mut(&id) else {
            warn!(mutation_id = %id, phase = phase.as_str(), "Unknown mutation");
            return;
        };
        if !mutation.phase.can_advance_to(&phase) {
            warn!(
                mutation_id = %id,
                from = mutation.phase.as_str(),
                to = phase.as_str(),
                "Invalid mutation transition"
            );
            return;
        }

        mutation.phase = phase;
        debug!(
            mutation_id = %id,
            op = mutation.op.as_str(),
            kind = mutation.kind.as_str(),
            phase = phase.as_str(),
            "Mutation advanced"
        );
        if phase.is_terminal() {
            map.remove(&id);
        }
    }

    pub fn in_flight(&self) -> Vec<Mutation> {
        let mut pending: Vec<Mutation> = self.lock().values().cloned().collect();
        pending.sort_by_key(|m| (m.kind.as_str(), m.entity_id));
        pending
    }

    /// Whether a mutation on this entity is still awaiting the remote store.
    pub fn is_pending(&self, kind: RecordKind, entity_id: i64) -> bool {
        self.lock()
            .values()
            .any(|m| m.kind == kind && m.entity_id == Some(entity_id))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Mutation>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transitions() {
        use MutationPhase::*;
        assert!(PendingLocalApply.can_advance_to(&InFlight));
        assert!(InFlight.can_advance_to(&Confirmed));
        assert!(InFlight.can_advance_to(&Failed));
        assert!(!Confirmed.can_advance_to(&InFlight));
        assert!(!PendingLocalApply.can_advance_to(&Confirmed));
    }

    #[test]
    fn test_terminal_phase_leaves_tracker() {
        let tracker = MutationTracker::new();
        let id = tracker.begin(MutationOp::Move, RecordKind::Card, Some(5));
        assert!(tracker.is_pending(RecordKind::Card, 5));

        tracker.advance(id, MutationPhase::InFlight);
        assert_eq!(tracker.in_flight()[0].phase, MutationPhase::InFlight);

        tracker.advance(id, MutationPhase::Confirmed);
        assert!(tracker.in_flight().is_empty());
        assert!(!tracker.is_pending(RecordKind::Card, 5));
    }

    #[test]
    fn test_invalid_transition_is_ignored() {
        let tracker = MutationTracker::new();
        let id = tracker.begin(MutationOp::Update, RecordKind::List, Some(1));
        tracker.advance(id, MutationPhase::Confirmed);
        assert_eq!(tracker.in_flight()[0].phase, MutationPhase::PendingLocalApply);
    }
}
