use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::ApiError;
use crate::storage::TokenStore;
use crate::types::RefreshResponse;

pub const REFRESH_PATH: &str = "/auth/refresh";

/// Session lifecycle as seen by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Active,
    /// Credentials were cleared after an unrecoverable auth failure; the
    /// caller should send the user back to login.
    LoggedOut,
}

type RefreshOutcome = Result<String, ApiError>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    storage: Arc<dyn TokenStore>,
    refresh: Mutex<RefreshState>,
    session: watch::Sender<SessionEvent>,
}

/// Shared API client. Cheap to clone; all clones share one refresh state.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

enum RefreshRole {
    Leader,
    Waiter(oneshot::Receiver<RefreshOutcome>),
    Stale(String),
}

impl HttpClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, storage: Arc<dyn TokenStore>) -> Self {
        let initial = if storage.access_token().is_some() { SessionEvent::Active } else { SessionEvent::LoggedOut };
        let (session, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner { transport, storage, refresh: Mutex::new(RefreshState::default()), session }),
        }
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn TokenStore> {
        &self.inner.storage
    }

    /// Subscribe to session changes (login, forced logout).
    #[must_use]
    pub fn session_events(&self) -> watch::Receiver<SessionEvent> {
        self.inner.session.subscribe()
    }

    #[must_use]
    pub fn session(&self) -> SessionEvent {
        *self.inner.session.borrow()
    }

    /// Mark the session active after a successful login.
    pub fn mark_active(&self) {
        self.inner.session.send_replace(SessionEvent::Active);
    }

    /// Clear credentials and publish `LoggedOut`.
    pub fn force_logout(&self) {
        if let Err(e) = self.inner.storage.clear_session() {
            warn!(error = %e, "failed to clear stored credentials");
        }
        self.inner.session.send_replace(SessionEvent::LoggedOut);
    }

    // =========================================================================
    // TYPED HELPERS
    // =========================================================================

    /// # Errors
    ///
    /// Returns the request's `ApiError` or a decode failure.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError` or a decode failure.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).body(serde_json::to_value(body)?))
            .await
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError` or a decode failure.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::put(path).body(serde_json::to_value(body)?))
            .await
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError` or a decode failure.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Execute and decode. An empty body decodes as JSON `null`, falling back
    /// to `{}` so unit-like and all-default types both accept it.
    ///
    /// # Errors
    ///
    /// Returns the request's `ApiError` or a decode failure.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        decode_body(&response.body)
    }

    // =========================================================================
    // EXECUTION
    // =========================================================================

    /// Send a request with bearer injection and one refresh-and-retry on 401.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for non-2xx responses, `ApiError::Network`
    /// when no response arrived, and `ApiError::SessionExpired` when the
    /// refresh flow could not recover.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let token = if request.authenticated { self.inner.storage.access_token() } else { None };
        request.bearer.clone_from(&token);
        debug!(method = %request.method, path = %request.path, "api request");

        let response = self.inner.transport.send(&request).await?;
        if response.status != 401 || !request.authenticated {
            return into_result(response);
        }

        debug!(path = %request.path, "unauthorized; entering refresh flow");
        let fresh = self.token_after_unauthorized(token.as_deref()).await?;
        request.bearer = Some(fresh);
        let retried = self.inner.transport.send(&request).await?;
        into_result(retried)
    }

    /// Obtain a usable access token after a 401 produced by `used`.
    async fn token_after_unauthorized(&self, used: Option<&str>) -> Result<String, ApiError> {
        let role = {
            let mut state = self
                .inner
                .refresh
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                RefreshRole::Waiter(rx)
            } else {
                match self.inner.storage.access_token() {
                    Some(current) if Some(current.as_str()) != used => RefreshRole::Stale(current),
                    _ => {
                        state.in_flight = true;
                        RefreshRole::Leader
                    }
                }
            }
        };

        match role {
            RefreshRole::Stale(current) => Ok(current),
            RefreshRole::Waiter(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::SessionExpired("token refresh was abandoned".into()))),
            RefreshRole::Leader => {
                let mut guard = LeaderGuard { client: self, finished: false };
                let outcome = self.refresh_access_token().await;
                if outcome.is_err() {
                    self.force_logout();
                }
                guard.finish(&outcome);
                outcome
            }
        }
    }

    async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let Some(refresh_token) = self.inner.storage.refresh_token() else {
            warn!("no refresh token stored; logging out");
            return Err(ApiError::SessionExpired("no refresh token".into()));
        };

        let request = ApiRequest::post(REFRESH_PATH)
            .body(serde_json::json!({ "refreshToken": refresh_token }))
            .public();
        let response = match self.inner.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "token refresh request failed");
                return Err(ApiError::SessionExpired(format!("refresh request failed: {e}")));
            }
        };
        if !response.is_success() {
            warn!(status = response.status, "token refresh rejected");
            return Err(ApiError::SessionExpired(format!("refresh rejected with status {}", response.status)));
        }

        let parsed: RefreshResponse = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::SessionExpired(format!("refresh response unreadable: {e}")))?;
        if parsed.access_token.is_empty() {
            return Err(ApiError::SessionExpired("refresh response missing access token".into()));
        }
        self.inner
            .storage
            .set_tokens(&parsed.access_token, parsed.refresh_token.as_deref())
            .map_err(|e| ApiError::SessionExpired(format!("could not store refreshed token: {e}")))?;

        info!("access token refreshed");
        Ok(parsed.access_token)
    }
}

/// Resets the in-flight flag and settles waiters even if the leader's future
/// is dropped mid-refresh.
struct LeaderGuard<'a> {
    client: &'a HttpClient,
    finished: bool,
}

impl LeaderGuard<'_> {
    fn finish(&mut self, outcome: &RefreshOutcome) {
        self.finished = true;
        for waiter in self.take_waiters() {
            let _ = waiter.send(outcome.clone());
        }
    }

    fn take_waiters(&self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        let mut state = self
            .client
            .inner
            .refresh
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.in_flight = false;
        std::mem::take(&mut state.waiters)
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            // Dropping the senders wakes waiters with a RecvError.
            drop(self.take_waiters());
        }
    }
}

fn into_result(response: ApiResponse) -> Result<ApiResponse, ApiError> {
    if response.is_success() {
        debug!(status = response.status, "api response");
        Ok(response)
    } else {
        debug!(status = response.status, "api error response");
        Err(ApiError::from_response(response.status, response.body))
    }
}

pub(crate) fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    if body.trim().is_empty() {
        return serde_json::from_value(Value::Null)
            .or_else(|_| serde_json::from_value(Value::Object(serde_json::Map::new())))
            .map_err(ApiError::from);
    }
    serde_json::from_str(body).map_err(ApiError::from)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
