//! Operation Guard.
//!
//! Runs synchronously right before a state-changing request is sent. A failed
//! check returns a [`GuardViolationError`] and no request is made; a passing
//! check yields a [`Clearance`] receipt, which is the only way to hand a
//! backend result back to the session.

use waypoint_types::{GuardId, GuardViolationError, Operation, StateModel};

use crate::guards::{guard_for_operation, guard_spec};

/// Check the registered predicate for `operation_id` against `state`.
///
/// Pure and idempotent: the same snapshot always yields the same outcome.
pub fn check(operation_id: GuardId, state: &StateModel) -> Result<(), GuardViolationError> {
    guard_spec(operation_id).check(state)
}

/// Proof that an operation passed its precondition against a given snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clearance {
    operation: Operation,
    guard: Option<GuardId>,
    checked_against: StateModel,
}

impl Clearance {
    #[must_use]
    pub const fn operation(self) -> Operation {
        self.operation
    }

    /// The guard that was checked; `None` for ungated operations.
    #[must_use]
    pub const fn guard(self) -> Option<GuardId> {
        self.guard
    }

    #[must_use]
    pub const fn checked_against(self) -> StateModel {
        self.checked_against
    }
}

/// Check the guard registered for `operation`, if it has one.
pub fn clear(operation: Operation, state: &StateModel) -> Result<Clearance, GuardViolationError> {
    let guard = guard_for_operation(operation);
    if let Some(id) = guard {
        check(id, state)?;
    }
    Ok(Clearance {
        operation,
        guard,
        checked_against: *state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_types::{BaselineStatus, TimelineStatus};

    fn drafted() -> StateModel {
        StateModel::initial()
            .with_baseline(BaselineStatus::Exists)
            .and_then(|s| s.with_timeline(TimelineStatus::Draft))
            .unwrap()
    }

    #[test]
    fn committed_required_fails_on_draft() {
        let err = check(GuardId::CommittedRequired, &drafted()).unwrap_err();
        assert_eq!(err.operation_id, GuardId::CommittedRequired);
        assert_eq!(
            err.relevant_state.timeline_status(),
            Some(TimelineStatus::Draft)
        );
    }

    #[test]
    fn check_is_idempotent() {
        let state = drafted();
        for id in GuardId::ALL {
            assert_eq!(check(id, &state), check(id, &state));
        }
    }

    #[test]
    fn generate_requires_baseline() {
        let err = clear(Operation::GenerateTimeline, &StateModel::initial()).unwrap_err();
        assert_eq!(err.operation_id, GuardId::BaselineRequired);
        assert_eq!(err.message, "Please create a baseline first");
    }

    #[test]
    fn ungated_operations_always_clear() {
        let clearance = clear(Operation::CreateBaseline, &StateModel::initial()).unwrap();
        assert_eq!(clearance.operation(), Operation::CreateBaseline);
        assert_eq!(clearance.guard(), None);
    }

    #[test]
    fn commit_clears_only_while_drafted() {
        let clearance = clear(Operation::CommitTimeline, &drafted()).unwrap();
        assert_eq!(clearance.guard(), Some(GuardId::DraftRequired));
        assert_eq!(clearance.checked_against(), drafted());

        let done = drafted().committed().unwrap();
        assert!(clear(Operation::CommitTimeline, &done).is_err());
        assert!(clear(Operation::RequestAnalytics, &done).is_ok());
    }
}
