//! State Store - the single owner of the session's [`StateModel`].
//!
//! Reads return a copy of the current snapshot. Writes validate a transition
//! against that snapshot and replace it whole under the channel lock, so no
//! reader can observe a half-applied multi-field change. Subscribers hold a
//! [`watch::Receiver`] and see the new snapshot as soon as a setter returns.

use tokio::sync::watch;
use tracing::{debug, error, info};

use waypoint_types::{
    AnalyticsStatus, BaselineStatus, Confirmation, DoctorStatus, InvalidTransitionError,
    StateModel, StatusSnapshot, TimelineStatus,
};

#[derive(Debug)]
pub struct StateStore {
    tx: watch::Sender<StateModel>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// A store holding the initial state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(StateModel::initial())
    }

    /// A store seeded with an already-validated state.
    #[must_use]
    pub fn with_state(state: StateModel) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx }
    }

    /// The latest snapshot.
    #[must_use]
    pub fn get(&self) -> StateModel {
        *self.tx.borrow()
    }

    /// Receive every snapshot published after this call.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StateModel> {
        self.tx.subscribe()
    }

    pub fn set_baseline_status(
        &self,
        status: BaselineStatus,
    ) -> Result<StateModel, InvalidTransitionError> {
        self.apply("set_baseline_status", |state| state.with_baseline(status))
    }

    /// Move the timeline to `None` or `Draft`. Use [`StateStore::commit_timeline`]
    /// to commit.
    pub fn set_timeline_status(
        &self,
        status: TimelineStatus,
    ) -> Result<StateModel, InvalidTransitionError> {
        self.apply("set_timeline_status", |state| state.with_timeline(status))
    }

    pub fn set_doctor_status(
        &self,
        status: DoctorStatus,
    ) -> Result<StateModel, InvalidTransitionError> {
        self.apply("set_doctor_status", |state| state.with_doctor(status))
    }

    pub fn set_analytics_status(
        &self,
        status: AnalyticsStatus,
    ) -> Result<StateModel, InvalidTransitionError> {
        self.apply("set_analytics_status", |state| state.with_analytics(status))
    }

    /// Commit the timeline and make analytics available as one published step.
    pub fn commit_timeline(&self) -> Result<StateModel, InvalidTransitionError> {
        self.apply("commit_timeline", StateModel::committed)
    }

    /// Apply the setter that corresponds to a backend confirmation.
    pub fn confirm(
        &self,
        confirmation: Confirmation,
    ) -> Result<StateModel, InvalidTransitionError> {
        match confirmation {
            Confirmation::BaselineCreated => self.set_baseline_status(BaselineStatus::Exists),
            Confirmation::DraftGenerated => self.set_timeline_status(TimelineStatus::Draft),
            Confirmation::TimelineCommitted => self.commit_timeline(),
            Confirmation::AssessmentSubmitted => self.set_doctor_status(DoctorStatus::Submitted),
        }
    }

    /// Replace the model with a freshly queried backend snapshot.
    ///
    /// The snapshot must be internally consistent and may only move fields
    /// forward relative to the current model.
    pub fn rehydrate(
        &self,
        snapshot: StatusSnapshot,
    ) -> Result<StateModel, InvalidTransitionError> {
        let target = StateModel::from_snapshot(snapshot).inspect_err(|err| {
            error!(error = %err, "Rejected inconsistent backend snapshot");
        })?;
        let state = self.apply("rehydrate", |state| state.advance_to(target))?;
        info!(state = %state, "State rehydrated from backend");
        Ok(state)
    }

    fn apply<F>(
        &self,
        operation: &'static str,
        transition: F,
    ) -> Result<StateModel, InvalidTransitionError>
    where
        F: FnOnce(StateModel) -> Result<StateModel, InvalidTransitionError>,
    {
        let mut outcome = None;
        let changed = self.tx.send_if_modified(|state| {
            let result = transition(*state);
            let changed = matches!(result, Ok(next) if next != *state);
            if let Ok(next) = result {
                *state = next;
            }
            outcome = Some(result);
            changed
        });

        let Some(outcome) = outcome else {
            unreachable!("send_if_modified always runs its closure");
        };
        match outcome {
            Ok(next) => {
                if changed {
                    debug!(operation, state = %next, "State transition applied");
                }
                Ok(next)
            }
            Err(err) => {
                error!(operation, error = %err, "Invalid state transition");
                Err(err)
            }
        }
    }
}
