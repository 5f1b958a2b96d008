//! Input handling for Waypoint TUI.

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;
use tracing::debug;

use waypoint_engine::{App, DispatchStatus, Operation, WorkflowBackend};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Reads crossterm events on a blocking thread and hands them to the frame loop.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(stop2, tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close first so a backpressured send in the input thread returns.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop if caller exits early; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Operation bound to a single-letter key.
#[must_use]
pub const fn operation_for_key(c: char) -> Option<Operation> {
    match c {
        'b' => Some(Operation::CreateBaseline),
        'g' => Some(Operation::GenerateTimeline),
        'c' => Some(Operation::CommitTimeline),
        'p' => Some(Operation::StartProgressTracking),
        'a' => Some(Operation::RequestAnalytics),
        's' => Some(Operation::SubmitAssessment),
        _ => None,
    }
}

#[must_use]
pub const fn key_for_operation(operation: Operation) -> char {
    match operation {
        Operation::CreateBaseline => 'b',
        Operation::GenerateTimeline => 'g',
        Operation::CommitTimeline => 'c',
        Operation::StartProgressTracking => 'p',
        Operation::RequestAnalytics => 'a',
        Operation::SubmitAssessment => 's',
    }
}

pub fn handle_events<B: WorkflowBackend>(
    app: &mut App<B>,
    input: &mut InputPump,
) -> Result<bool> {
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };

        if apply_event(app, &ev) {
            return Ok(true);
        }
        processed += 1;
    }
    Ok(app.should_quit())
}

/// Apply one terminal event. Returns `true` when the app should exit.
pub fn apply_event<B: WorkflowBackend>(app: &mut App<B>, ev: &Event) -> bool {
    let Event::Key(key) = ev else {
        return false;
    };
    if key.kind != KeyEventKind::Press {
        return false;
    }
    handle_key(app, *key);
    app.should_quit()
}

fn handle_key<B: WorkflowBackend>(app: &mut App<B>, key: KeyEvent) {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.request_quit(),
        KeyCode::Char('q') | KeyCode::Esc => app.request_quit(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Backspace => app.back(),
        KeyCode::Char('r') => app.rehydrate(),
        KeyCode::Char(c) => {
            if let Some(operation) = operation_for_key(c) {
                let status = app.dispatch(operation);
                debug!(%operation, ?status, "Key dispatch");
                if let DispatchStatus::Blocked(violation) = status {
                    debug!(guard = %violation.operation_id, "Dispatch blocked by guard");
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use waypoint_engine::{AppOptions, BackendSettings, HttpBackend, StateStore};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn offline_app() -> App {
        let backend = HttpBackend::new(&BackendSettings {
            base_url: "http://127.0.0.1:1".to_owned(),
            timeout: Duration::from_secs(1),
        })
        .expect("client builds");
        App::with_store(backend, Arc::new(StateStore::new()), AppOptions::default())
    }

    #[test]
    fn keys_round_trip_operations() {
        for operation in Operation::ALL {
            assert_eq!(
                operation_for_key(key_for_operation(operation)),
                Some(operation)
            );
        }
        assert_eq!(operation_for_key('z'), None);
    }

    #[tokio::test]
    async fn quit_keys() {
        for code in [KeyCode::Char('q'), KeyCode::Esc] {
            let mut app = offline_app();
            assert!(apply_event(&mut app, &key(code)));
        }
        let mut app = offline_app();
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(apply_event(&mut app, &ctrl_c));
    }

    #[tokio::test]
    async fn blocked_operation_sends_nothing() {
        let mut app = offline_app();
        assert!(!apply_event(&mut app, &key(KeyCode::Char('c'))));
        assert!(!app.is_busy());
        assert_eq!(app.toasts().count(), 1);
    }

    #[tokio::test]
    async fn arrows_and_enter_navigate() {
        let mut app = offline_app();
        // Wraps to the bottom of the menu: results, then the assessment itself.
        apply_event(&mut app, &key(KeyCode::Up));
        apply_event(&mut app, &key(KeyCode::Up));
        apply_event(&mut app, &key(KeyCode::Enter));
        assert_eq!(app.current_path(), "/assessment");

        apply_event(&mut app, &key(KeyCode::Backspace));
        assert_eq!(app.current_path(), "/upload");
    }

    #[tokio::test]
    async fn release_events_are_ignored() {
        let mut app = offline_app();
        let mut release = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(!apply_event(&mut app, &Event::Key(release)));
    }
}
