//! Per-domain state containers.
//!
//! DESIGN
//! ======
//! A store pairs one service with an `Arc<RwLock<State>>` and the shared
//! `Notifier`. Actions never return `Err`: they record loading/error flags
//! on the state, publish a toast on failure (and on notable successes), and
//! hand back an `ActionResult` the front end can branch on. `snapshot()`
//! clones the state for rendering.
//!
//! Background refreshes (polling) record errors without toasting so a flaky
//! connection does not flood the notification channel.

pub mod admin;
pub mod auth;
pub mod carbon;
pub mod chat;
pub mod courses;
pub mod knowledge;
pub mod library;
pub mod news;
pub mod organizations;

use std::future::Future;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::ApiError;
use crate::notify::Notifier;

/// Outcome of a store action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: Option<String>,
}

impl ActionResult {
    #[must_use]
    pub fn ok() -> Self {
        Self { success: true, message: None }
    }

    #[must_use]
    pub fn ok_with(message: impl Into<String>) -> Self {
        Self { success: true, message: Some(message.into()) }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: Some(message.into()) }
    }
}

impl From<&ApiError> for ActionResult {
    fn from(error: &ApiError) -> Self {
        Self::failed(error.user_message())
    }
}

/// Fetched data plus its request flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resource<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

/// Whether a failed load should surface as a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Feedback {
    Toast,
    Quiet,
}

/// Run `fetch` and store its result in the resource selected by `slot`.
pub(crate) async fn load<S, T, Fut>(
    state: &RwLock<S>,
    notifier: &Notifier,
    feedback: Feedback,
    slot: impl Fn(&mut S) -> &mut Resource<T>,
    fetch: Fut,
) -> ActionResult
where
    Fut: Future<Output = Result<T, ApiError>>,
{
    {
        let mut guard = state.write().await;
        let resource = slot(&mut *guard);
        resource.loading = true;
        resource.error = None;
    }

    let result = fetch.await;

    let mut guard = state.write().await;
    let resource = slot(&mut *guard);
    resource.loading = false;
    match result {
        Ok(data) => {
            resource.data = data;
            ActionResult::ok()
        }
        Err(e) => {
            resource.error = Some(e.user_message());
            drop(guard);
            match feedback {
                Feedback::Toast => report(notifier, &e),
                Feedback::Quiet => {
                    warn!(error = %e, "background refresh failed");
                    ActionResult::from(&e)
                }
            }
        }
    }
}

/// Log and toast a failed action.
pub(crate) fn report(notifier: &Notifier, error: &ApiError) -> ActionResult {
    warn!(error = %error, "action failed");
    notifier.error(error);
    ActionResult::from(error)
}

/// Toast a success and return it.
pub(crate) fn succeed(notifier: &Notifier, message: impl Into<String>) -> ActionResult {
    let message = message.into();
    notifier.success(message.clone());
    ActionResult::ok_with(message)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
