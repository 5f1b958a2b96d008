//! Core domain types for Waypoint.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod ids;
mod state;

pub use ids::{Confirmation, GuardId, GuardViolationError, Operation, ScreenId};
pub use state::{
    AnalyticsStatus, BaselineStatus, DoctorStatus, FieldSet, InvalidTransitionError, StateField,
    StateModel, StateSlice, StatusSnapshot, TimelineStatus,
};
