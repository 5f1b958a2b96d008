//! User-facing notifications.
//!
//! Guard violations and backend failures are reported here instead of being
//! raised to a top-level error handler. The queue collects notifications as
//! they happen; the hosting shell drains it into a [`ToastStack`] that keeps
//! the most recent ones on screen for a while.

use std::time::{Duration, Instant};

use waypoint_types::GuardViolationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    level: NotificationLevel,
    message: String,
}

impl Notification {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn level(&self) -> NotificationLevel {
        self.level
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&GuardViolationError> for Notification {
    fn from(violation: &GuardViolationError) -> Self {
        Self::warning(violation.message)
    }
}

/// Queue for pending notifications.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: Vec<Notification>,
}

impl NotificationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a notification to the queue.
    ///
    /// Identical pending notifications are kept once.
    pub fn push(&mut self, notification: Notification) {
        if !self.pending.contains(&notification) {
            self.pending.push(notification);
        }
    }

    /// Take all pending notifications in the order they were added.
    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Notifications currently on screen, newest last.
#[derive(Debug)]
pub struct ToastStack {
    toasts: Vec<(Notification, Instant)>,
    max_visible: usize,
    ttl: Duration,
}

impl ToastStack {
    #[must_use]
    pub fn new(max_visible: usize, ttl: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            max_visible: max_visible.max(1),
            ttl,
        }
    }

    pub fn push(&mut self, notification: Notification, now: Instant) {
        // Re-showing the same message refreshes it instead of stacking a copy.
        self.toasts.retain(|(existing, _)| *existing != notification);
        self.toasts.push((notification, now));
        if self.toasts.len() > self.max_visible {
            let excess = self.toasts.len() - self.max_visible;
            self.toasts.drain(..excess);
        }
    }

    /// Drop toasts older than the configured lifetime.
    pub fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.toasts
            .retain(|(_, shown_at)| now.saturating_duration_since(*shown_at) < ttl);
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.toasts.iter().map(|(notification, _)| notification)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_types::{GuardId, StateSlice};

    #[test]
    fn test_queue_push_and_take() {
        let mut queue = NotificationQueue::new();
        assert!(queue.is_empty());

        queue.push(Notification::info("Baseline created"));
        queue.push(Notification::error("Backend unreachable"));
        assert_eq!(queue.len(), 2);

        let notifications = queue.take();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].level(), NotificationLevel::Info);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_deduplication() {
        let mut queue = NotificationQueue::new();

        queue.push(Notification::warning("Please create a baseline first"));
        queue.push(Notification::warning("Please create a baseline first")); // duplicate
        queue.push(Notification::info("Draft generated"));

        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_violation_becomes_warning() {
        let violation = GuardViolationError {
            operation_id: GuardId::BaselineRequired,
            message: "Please create a baseline first",
            relevant_state: StateSlice::default(),
        };
        let notification = Notification::from(&violation);
        assert_eq!(notification.level(), NotificationLevel::Warning);
        assert_eq!(notification.message(), "Please create a baseline first");
    }

    #[test]
    fn test_toasts_cap_and_expire() {
        let start = Instant::now();
        let mut toasts = ToastStack::new(2, Duration::from_secs(5));

        toasts.push(Notification::info("one"), start);
        toasts.push(Notification::info("two"), start);
        toasts.push(Notification::info("three"), start + Duration::from_secs(1));

        let visible: Vec<&str> = toasts.visible().map(Notification::message).collect();
        assert_eq!(visible, vec!["two", "three"]);

        toasts.expire(start + Duration::from_secs(5));
        let visible: Vec<&str> = toasts.visible().map(Notification::message).collect();
        assert_eq!(visible, vec!["three"]);

        toasts.expire(start + Duration::from_secs(10));
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_toast_refresh_moves_to_end() {
        let start = Instant::now();
        let mut toasts = ToastStack::new(3, Duration::from_secs(5));
        toasts.push(Notification::info("a"), start);
        toasts.push(Notification::info("b"), start);
        toasts.push(Notification::info("a"), start);

        let visible: Vec<&str> = toasts.visible().map(Notification::message).collect();
        assert_eq!(visible, vec!["b", "a"]);
    }
}
