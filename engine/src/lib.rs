//! Core engine for Waypoint - workflow state machine and navigation guards.
//!
//! This crate holds everything except rendering:
//!
//! - **State Store**: [`StateStore`] owns the [`StateModel`] and publishes
//!   every accepted transition to subscribers
//! - **Guard Predicate Registry**: [`guard_spec`] maps each [`GuardId`] to its
//!   predicate, message, and the state fields it reads
//! - **Route Resolver**: [`RouteResolver`] maps paths to screens and computes
//!   the fallback route for a state
//! - **Navigation Guard**: [`NavigationGuard`] decides whether a mounted
//!   screen may render or must redirect
//! - **Operation Guard**: [`operation::clear`] checks a state-changing request
//!   before it leaves the process
//! - **Hosting shell**: [`App`] wires these to a [`WorkflowBackend`]
//!
//! The TUI layer (`waypoint_tui`) reads state from `App` and forwards input
//! back to it.

mod app;
mod backend;
mod config;
mod guards;
mod navigation;
mod notifications;
pub mod operation;
mod routes;
mod session;
mod store;

pub use app::{
    App, AppOptions, DEFAULT_START_PATH, DispatchStatus, MenuEntry, UiOptions, screen_actions,
};
pub use backend::{BackendError, HttpBackend, STATUS_PATH, WorkflowBackend, endpoint};
pub use config::{
    AppConfig, BACKEND_URL_ENV, BackendConfig, BackendSettings, ConfigError,
    NotificationSettings, NotificationsConfig, WaypointConfig, config_path, expand_env_vars,
};
pub use guards::{GuardBatch, GuardSpec, guard_for_operation, guard_for_screen, guard_spec};
pub use navigation::{
    GuardPhase, MAX_HISTORY, NavigationDecision, NavigationGuard, Navigator, Router,
};
pub use notifications::{Notification, NotificationLevel, NotificationQueue, ToastStack};
pub use operation::Clearance;
pub use routes::{RouteEntry, RouteResolver, RouteTable, RouteTableError, STANDARD_ROUTES};
pub use session::{DispatchError, Session};
pub use store::StateStore;

pub use waypoint_types::{
    AnalyticsStatus, BaselineStatus, Confirmation, DoctorStatus, FieldSet, GuardId,
    GuardViolationError, InvalidTransitionError, Operation, ScreenId, StateField, StateModel,
    StateSlice, StatusSnapshot, TimelineStatus,
};
