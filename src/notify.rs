//! Toast notifications.
//!
//! Stores publish a `Toast` for every failed action and for notable
//! successes. Front ends subscribe and render them however they like; with no
//! subscriber a toast is simply dropped.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::ApiError;

const TOAST_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub level: ToastLevel,
    pub message: String,
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Toast>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(TOAST_CHANNEL_CAPACITY);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.tx.subscribe()
    }

    pub fn push(&self, level: ToastLevel, message: impl Into<String>) {
        let toast = Toast { id: Uuid::new_v4(), level, message: message.into() };
        // Err only means nobody is listening.
        let _ = self.tx.send(toast);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(ToastLevel::Info, message);
    }

    /// Publish the error's user-facing message.
    pub fn error(&self, error: &ApiError) {
        self.push(ToastLevel::Error, error.user_message());
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
