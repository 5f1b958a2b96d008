//! Navigation Guard.
//!
//! One guard per mounted screen. On every change of path or state it resolves
//! the path to a screen, checks that screen's precondition, and either lets
//! the screen render or redirects to the fallback route.
//!
//! ```text
//! Checking ──(unguarded or valid)──> Valid
//!     │
//!     └──(violation)──> Redirecting ──(path/state change)──> Checking ...
//! ```
//!
//! Nothing renders unless the guard is `Valid`.

use tracing::{debug, info, warn};

use waypoint_types::{GuardViolationError, StateModel};

use crate::notifications::{Notification, NotificationQueue};
use crate::routes::RouteResolver;

/// The hosting application's router, as seen by the guard.
pub trait Navigator {
    fn current_path(&self) -> &str;
    fn navigate(&mut self, path: &str);
    /// Swap the current path without recording a back entry.
    fn replace(&mut self, path: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Checking,
    Valid,
    Redirecting { target: &'static str },
}

/// Outcome of evaluating one (path, state) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Render,
    Redirect {
        target: &'static str,
        violation: GuardViolationError,
    },
}

#[derive(Debug)]
pub struct NavigationGuard {
    phase: GuardPhase,
    evaluated: Option<(String, StateModel)>,
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: GuardPhase::Checking,
            evaluated: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> GuardPhase {
        self.phase
    }

    /// Whether the guarded screen may be drawn.
    #[must_use]
    pub fn should_render(&self) -> bool {
        self.phase == GuardPhase::Valid
    }

    /// Decide what to do for `path` under `state`.
    ///
    /// Paths that resolve to no screen always render.
    #[must_use]
    pub fn evaluate(
        path: &str,
        state: &StateModel,
        resolver: &RouteResolver,
    ) -> NavigationDecision {
        let Some(screen) = resolver.screen_for(path) else {
            return NavigationDecision::Render;
        };
        match RouteResolver::violation_for(screen, state) {
            None => NavigationDecision::Render,
            Some(violation) => NavigationDecision::Redirect {
                target: resolver.fallback_route_for(state),
                violation,
            },
        }
    }

    /// Re-run the guard for the navigator's current path.
    ///
    /// Does nothing when neither path nor state changed since the last run.
    /// On a violation, issues one navigation to the fallback route (unless the
    /// navigator is already there) and queues a notification explaining it.
    pub fn sync<N: Navigator>(
        &mut self,
        navigator: &mut N,
        state: &StateModel,
        resolver: &RouteResolver,
        notifications: &mut NotificationQueue,
    ) -> GuardPhase {
        let path = navigator.current_path();
        if self
            .evaluated
            .as_ref()
            .is_some_and(|(last_path, last_state)| last_path == path && last_state == state)
        {
            return self.phase;
        }

        self.phase = GuardPhase::Checking;
        self.evaluated = Some((path.to_owned(), *state));

        match Self::evaluate(path, state, resolver) {
            NavigationDecision::Render => {
                debug!(path, "Navigation guard passed");
                self.phase = GuardPhase::Valid;
            }
            NavigationDecision::Redirect { target, violation } => {
                self.phase = GuardPhase::Redirecting { target };
                if target == path {
                    warn!(
                        path,
                        guard = %violation.operation_id,
                        "Fallback route equals current path; not redirecting"
                    );
                } else {
                    info!(
                        from = path,
                        to = target,
                        guard = %violation.operation_id,
                        "Redirecting to fallback route"
                    );
                    notifications.push(Notification::from(&violation));
                    navigator.replace(target);
                }
            }
        }
        self.phase
    }
}

/// Back entries kept by [`Router`]; the oldest is dropped past this.
pub const MAX_HISTORY: usize = 64;

/// In-memory router: current path plus bounded back history.
#[derive(Debug, Clone)]
pub struct Router {
    current: String,
    history: Vec<String>,
}

impl Router {
    #[must_use]
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            current: start.into(),
            history: Vec::new(),
        }
    }

    /// Return to the previous path. Returns `false` when history is empty.
    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl Navigator for Router {
    fn current_path(&self) -> &str {
        &self.current
    }

    fn navigate(&mut self, path: &str) {
        if self.current != path {
            let previous = std::mem::replace(&mut self.current, path.to_owned());
            if self.history.len() == MAX_HISTORY {
                self.history.remove(0);
            }
            self.history.push(previous);
        }
    }

    fn replace(&mut self, path: &str) {
        path.clone_into(&mut self.current);
    }
}
