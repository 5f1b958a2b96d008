//! Session orchestration: Operation Guard, backend call, confirmation.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use waypoint_types::{
    GuardViolationError, InvalidTransitionError, Operation, StateModel, StatusSnapshot,
};

use crate::backend::{BackendError, WorkflowBackend};
use crate::notifications::{Notification, NotificationQueue};
use crate::operation::{self, Clearance};
use crate::store::StateStore;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Guard(#[from] GuardViolationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Transition(#[from] InvalidTransitionError),
}

#[derive(Debug, Default)]
pub struct Session {
    store: Arc<StateStore>,
    notifications: NotificationQueue,
}

impl Session {
    #[must_use]
    pub fn new(store: Arc<StateStore>) -> Self {
        Self {
            store,
            notifications: NotificationQueue::new(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    #[must_use]
    pub fn state(&self) -> StateModel {
        self.store.get()
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationQueue {
        &mut self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.take()
    }

    /// Run the Operation Guard against the current state.
    ///
    /// A violation is reported as a warning notification; the caller must not
    /// contact the backend.
    pub fn begin(&mut self, operation: Operation) -> Result<Clearance, GuardViolationError> {
        operation::clear(operation, &self.store.get()).inspect_err(|violation| {
            self.notifications.push(Notification::from(violation));
        })
    }

    /// Apply a backend result for a cleared operation.
    ///
    /// Failures leave the state untouched and surface as an error notification.
    pub fn complete(
        &mut self,
        clearance: Clearance,
        result: Result<Value, BackendError>,
    ) -> Result<StateModel, DispatchError> {
        let operation = clearance.operation();
        if let Err(err) = result {
            warn!(%operation, error = %err, "Backend rejected operation");
            self.notifications.push(Notification::error(err.summary()));
            return Err(err.into());
        }

        let Some(confirmation) = operation.confirmation() else {
            self.notifications
                .push(Notification::info(format!("{}: done", operation.label())));
            return Ok(self.store.get());
        };

        match self.store.confirm(confirmation) {
            Ok(state) => {
                info!(%operation, state = %state, "Operation confirmed");
                self.notifications
                    .push(Notification::info(format!("{}: done", operation.label())));
                Ok(state)
            }
            Err(err) => {
                self.notifications.push(Notification::error(format!(
                    "{}: could not apply result ({err})",
                    operation.label()
                )));
                Err(err.into())
            }
        }
    }

    /// Guard, send, and confirm `operation` in one call.
    pub async fn dispatch<B: WorkflowBackend>(
        &mut self,
        backend: &B,
        operation: Operation,
        payload: Value,
    ) -> Result<StateModel, DispatchError> {
        let clearance = self.begin(operation)?;
        let result = backend.perform(operation, payload).await;
        self.complete(clearance, result)
    }

    /// Replace the state with the backend's current snapshot.
    pub async fn rehydrate<B: WorkflowBackend>(
        &mut self,
        backend: &B,
    ) -> Result<StateModel, DispatchError> {
        let snapshot = match backend.fetch_status().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "Failed to fetch workflow status");
                self.notifications.push(Notification::error(err.summary()));
                return Err(err.into());
            }
        };
        self.apply_snapshot(snapshot)
    }

    /// Apply an already fetched snapshot.
    pub fn apply_snapshot(
        &mut self,
        snapshot: StatusSnapshot,
    ) -> Result<StateModel, DispatchError> {
        self.store.rehydrate(snapshot).map_err(|err| {
            self.notifications.push(Notification::error(format!(
                "Workflow status could not be applied ({err})"
            )));
            DispatchError::from(err)
        })
    }
}
