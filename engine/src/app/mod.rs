//! Hosting shell state for Waypoint.
//!
//! [`App`] owns the session, the router, and the Navigation Guard for the
//! mounted screen. The TUI reads from it and forwards key presses back.
//! Backend requests run on background tokio tasks; their results come back
//! through a channel and are applied on the next [`App::tick`], after which
//! the Navigation Guard re-runs against the new state.
//!
//! [`App::new`] starts from a placeholder state and queries the backend for
//! the real one; until that first answer arrives the guard stays in
//! [`GuardPhase::Checking`] and nothing is judged or dispatched.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use waypoint_types::{
    GuardId, GuardViolationError, Operation, ScreenId, StateModel, StatusSnapshot,
};

use crate::backend::{BackendError, HttpBackend, WorkflowBackend};
use crate::config::{NotificationSettings, WaypointConfig};
use crate::guards::{GuardBatch, guard_for_screen};
use crate::navigation::{GuardPhase, NavigationGuard, Navigator, Router};
use crate::notifications::{Notification, ToastStack};
use crate::operation::{self, Clearance};
use crate::routes::RouteResolver;
use crate::session::Session;
use crate::store::StateStore;

/// A redirect can land on a path that itself needs one more check.
const MAX_GUARD_PASSES: usize = 2;

const SPINNER_INTERVAL: Duration = Duration::from_millis(100);

pub const DEFAULT_START_PATH: &str = "/upload";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiOptions {
    pub ascii_only: bool,
    pub high_contrast: bool,
}

#[derive(Debug, Clone)]
pub struct AppOptions {
    pub ui: UiOptions,
    pub start_path: String,
    pub notifications: NotificationSettings,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            ui: UiOptions::default(),
            start_path: DEFAULT_START_PATH.to_owned(),
            notifications: NotificationSettings::default(),
        }
    }
}

impl AppOptions {
    #[must_use]
    pub fn from_config(config: Option<&WaypointConfig>) -> Self {
        let app = config.and_then(|cfg| cfg.app.as_ref());
        Self {
            ui: UiOptions {
                ascii_only: app.is_some_and(|a| a.ascii_only),
                high_contrast: app.is_some_and(|a| a.high_contrast),
            },
            start_path: app
                .and_then(|a| a.start_path.clone())
                .filter(|path| path.starts_with('/'))
                .unwrap_or_else(|| DEFAULT_START_PATH.to_owned()),
            notifications: NotificationSettings::resolve(config),
        }
    }
}

/// Result of asking the app to dispatch an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    /// Guard passed; the request is running in the background.
    Sent,
    /// Another request is still running.
    Busy,
    /// Guard failed; nothing was sent.
    Blocked(GuardViolationError),
}

/// Operations offered on each screen.
#[must_use]
pub const fn screen_actions(screen: ScreenId) -> &'static [Operation] {
    match screen {
        ScreenId::Upload => &[Operation::CreateBaseline],
        ScreenId::Assessment => &[Operation::SubmitAssessment],
        ScreenId::TimelineGenerate => &[Operation::GenerateTimeline],
        ScreenId::TimelineDraft => &[Operation::CommitTimeline],
        ScreenId::TimelineCommitted | ScreenId::Progress => &[Operation::StartProgressTracking],
        ScreenId::Dashboard => &[Operation::StartProgressTracking, Operation::RequestAnalytics],
        ScreenId::Analytics => &[Operation::RequestAnalytics],
        ScreenId::AssessmentResults => &[],
    }
}

/// One row of the navigation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub screen: ScreenId,
    pub path: &'static str,
    pub reachable: bool,
}

#[derive(Debug)]
enum BackendEvent {
    Completed {
        clearance: Clearance,
        result: Result<Value, BackendError>,
    },
    Status(Result<StatusSnapshot, BackendError>),
}

#[derive(Debug)]
pub struct App<B: WorkflowBackend = HttpBackend> {
    session: Session,
    backend: Arc<B>,
    resolver: RouteResolver,
    router: Router,
    guard: NavigationGuard,
    menu_guards: GuardBatch,
    toasts: ToastStack,
    events_tx: mpsc::UnboundedSender<BackendEvent>,
    events_rx: mpsc::UnboundedReceiver<BackendEvent>,
    in_flight: Option<Operation>,
    rehydrating: bool,
    awaiting_status: bool,
    menu_selected: usize,
    ui_options: UiOptions,
    spinner_tick: usize,
    last_ui_tick: Instant,
    should_quit: bool,
}

impl<B: WorkflowBackend> App<B> {
    /// Start a session and fetch its state from the backend.
    ///
    /// Must be called inside a tokio runtime. Navigation is held in
    /// [`GuardPhase::Checking`] until the first status query finishes.
    pub fn new(backend: B, options: AppOptions) -> Self {
        let mut app = Self::build(backend, Arc::new(StateStore::new()), options);
        app.awaiting_status = true;
        app.rehydrate();
        app
    }

    /// Start a session over a store whose state is already authoritative.
    pub fn with_store(backend: B, store: Arc<StateStore>, options: AppOptions) -> Self {
        let mut app = Self::build(backend, store, options);
        app.sync_navigation();
        app
    }

    fn build(backend: B, store: Arc<StateStore>, options: AppOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let menu_guards = GuardBatch::new(GuardId::ALL, store.get());
        Self {
            session: Session::new(store),
            backend: Arc::new(backend),
            resolver: RouteResolver::default(),
            router: Router::new(options.start_path),
            guard: NavigationGuard::new(),
            menu_guards,
            toasts: ToastStack::new(options.notifications.max_visible, options.notifications.ttl),
            events_tx,
            events_rx,
            in_flight: None,
            rehydrating: false,
            awaiting_status: false,
            menu_selected: 0,
            ui_options: options.ui,
            spinner_tick: 0,
            last_ui_tick: Instant::now(),
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    pub fn ui_options(&self) -> UiOptions {
        self.ui_options
    }

    /// Advances at ~10Hz, independent of render FPS.
    pub fn spinner_tick(&self) -> usize {
        self.spinner_tick
    }

    #[must_use]
    pub fn state(&self) -> StateModel {
        self.session.state()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<StateStore> {
        self.session.store()
    }

    #[must_use]
    pub fn current_path(&self) -> &str {
        self.router.current_path()
    }

    #[must_use]
    pub fn current_screen(&self) -> Option<ScreenId> {
        self.resolver.screen_for(self.router.current_path())
    }

    #[must_use]
    pub fn guard_phase(&self) -> GuardPhase {
        self.guard.phase()
    }

    /// Whether the mounted screen may draw its content.
    #[must_use]
    pub fn should_render_screen(&self) -> bool {
        self.guard.should_render()
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<Operation> {
        self.in_flight
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.rehydrating
    }

    pub fn toasts(&self) -> impl Iterator<Item = &Notification> {
        self.toasts.visible()
    }

    /// Menu rows, with reachability as of the last [`App::tick`].
    pub fn menu_entries(&self) -> impl Iterator<Item = MenuEntry> + '_ {
        ScreenId::ALL.into_iter().map(move |screen| MenuEntry {
            screen,
            path: self.resolver.table().path_for(screen),
            reachable: guard_for_screen(screen)
                .is_none_or(|id| self.menu_guards.holds(id).unwrap_or(false)),
        })
    }

    #[must_use]
    pub fn menu_selected(&self) -> usize {
        self.menu_selected
    }

    pub fn select_next(&mut self) {
        self.menu_selected = (self.menu_selected + 1) % ScreenId::ALL.len();
    }

    pub fn select_prev(&mut self) {
        self.menu_selected = self
            .menu_selected
            .checked_sub(1)
            .unwrap_or(ScreenId::ALL.len() - 1);
    }

    /// Navigate to the screen highlighted in the menu.
    pub fn open_selected(&mut self) {
        let screen = ScreenId::ALL[self.menu_selected];
        let path = self.resolver.table().path_for(screen);
        self.navigate(path);
    }

    pub fn navigate(&mut self, path: &str) {
        debug!(from = self.router.current_path(), to = path, "Navigate");
        self.router.navigate(path);
        self.sync_navigation();
    }

    pub fn back(&mut self) {
        if self.router.back() {
            self.sync_navigation();
        }
    }

    /// Actions offered on the current screen whose guards hold right now.
    #[must_use]
    pub fn available_actions(&self) -> Vec<Operation> {
        let Some(screen) = self.current_screen() else {
            return Vec::new();
        };
        if !self.should_render_screen() {
            return Vec::new();
        }
        let state = self.state();
        screen_actions(screen)
            .iter()
            .copied()
            .filter(|op| operation::clear(*op, &state).is_ok())
            .collect()
    }

    pub fn dispatch(&mut self, operation: Operation) -> DispatchStatus {
        self.dispatch_with(operation, Value::Object(Map::new()))
    }

    /// Check `operation` synchronously, then send it in the background.
    pub fn dispatch_with(&mut self, operation: Operation, payload: Value) -> DispatchStatus {
        if let Some(running) = self.in_flight {
            self.session.notifications_mut().push(Notification::info(format!(
                "{} is still running",
                running.label()
            )));
            self.flush_notifications();
            return DispatchStatus::Busy;
        }
        if self.rehydrating {
            self.session
                .notifications_mut()
                .push(Notification::info("Workflow status is still loading"));
            self.flush_notifications();
            return DispatchStatus::Busy;
        }

        let clearance = match self.session.begin(operation) {
            Ok(clearance) => clearance,
            Err(violation) => {
                self.flush_notifications();
                return DispatchStatus::Blocked(violation);
            }
        };

        info!(%operation, "Dispatching operation");
        self.in_flight = Some(operation);
        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.perform(operation, payload).await;
            let _ = tx.send(BackendEvent::Completed { clearance, result });
        });
        DispatchStatus::Sent
    }

    /// Fetch the backend's status flags in the background.
    pub fn rehydrate(&mut self) {
        if self.rehydrating {
            return;
        }
        self.rehydrating = true;
        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.fetch_status().await;
            let _ = tx.send(BackendEvent::Status(result));
        });
    }

    /// Apply finished backend work, re-run the Navigation Guard, and age
    /// notifications.
    pub fn tick(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                BackendEvent::Completed { clearance, result } => {
                    self.in_flight = None;
                    // Errors already became notifications.
                    let _ = self.session.complete(clearance, result);
                }
                BackendEvent::Status(result) => {
                    self.rehydrating = false;
                    self.awaiting_status = false;
                    match result {
                        Ok(snapshot) => {
                            // Rejections already became notifications.
                            if let Ok(state) = self.session.apply_snapshot(snapshot) {
                                debug!(state = %state, "Status applied");
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, "Failed to fetch workflow status");
                            self.session
                                .notifications_mut()
                                .push(Notification::error(err.summary()));
                        }
                    }
                }
            }
        }

        self.sync_navigation();

        let now = Instant::now();
        self.toasts.expire(now);
        if now.duration_since(self.last_ui_tick) >= SPINNER_INTERVAL {
            self.last_ui_tick = now;
            self.spinner_tick = self.spinner_tick.wrapping_add(1);
        }
    }

    fn sync_navigation(&mut self) {
        if self.awaiting_status {
            return;
        }
        let recomputed = self.menu_guards.update(self.session.state());
        if recomputed > 0 {
            debug!(recomputed, "Menu guards re-evaluated");
        }
        for _ in 0..MAX_GUARD_PASSES {
            let state = self.session.state();
            let phase = self.guard.sync(
                &mut self.router,
                &state,
                &self.resolver,
                self.session.notifications_mut(),
            );
            if !matches!(phase, GuardPhase::Redirecting { .. }) {
                break;
            }
        }
        self.flush_notifications();
    }

    fn flush_notifications(&mut self) {
        let now = Instant::now();
        for notification in self.session.take_notifications() {
            self.toasts.push(notification, now);
        }
    }
}
