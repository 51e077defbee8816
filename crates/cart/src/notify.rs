//! User-facing notification channel.
//!
//! Cart operations report each failure exactly once through a [`Notifier`].
//! Delivery is fire-and-forget: notifiers must not block and cannot fail.

use std::sync::{Arc, Mutex, PoisonError};

/// An error message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

/// Sink for user-facing error messages.
pub trait Notifier: Send + Sync {
    /// Show an error message to the user.
    fn error(&self, message: &str);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn error(&self, message: &str) {
        (**self).error(message);
    }
}

/// Writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::warn!(notice = %message, "User notification");
    }
}

/// Discards notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn error(&self, _message: &str) {}
}

/// Queues notifications for a front end to render.
#[derive(Debug, Default)]
pub struct BufferedNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl BufferedNotifier {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all queued notices, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Copy of the queued notices without removing them.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for BufferedNotifier {
    fn error(&self, message: &str) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notice {
                message: message.to_string(),
            });
    }
}
