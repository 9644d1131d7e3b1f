//! Session state: who is logged in and the account actions around it.
//!
//! `is_authenticated` is derived from the HTTP client's session channel on
//! every snapshot, so a forced logout during token refresh is reflected
//! without any explicit notification.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use super::{ActionResult, report, succeed};
use crate::error::ApiError;
use crate::http::SessionEvent;
use crate::notify::Notifier;
use crate::services::auth::AuthService;
use crate::types::{LoginRequest, RegisterRequest, User};
use crate::validation;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }
}

#[derive(Clone)]
pub struct AuthStore {
    service: AuthService,
    notifier: Notifier,
    state: Arc<RwLock<AuthState>>,
}

/// Form input for registration.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub organization_name: Option<String>,
}

impl AuthStore {
    /// Seed state from stored credentials.
    #[must_use]
    pub fn new(service: AuthService, notifier: Notifier) -> Self {
        let storage = service.http().storage();
        let state = AuthState {
            user: storage.user(),
            is_authenticated: storage.access_token().is_some(),
            ..AuthState::default()
        };
        Self { service, notifier, state: Arc::new(RwLock::new(state)) }
    }

    pub async fn snapshot(&self) -> AuthState {
        let mut state = self.state.read().await.clone();
        if self.service.http().session() == SessionEvent::LoggedOut {
            state.user = None;
            state.is_authenticated = false;
        }
        state
    }

    pub async fn login(&self, email: &str, password: &str) -> ActionResult {
        if let Err(e) = validation::validate_login(email, password) {
            return self.fail(&e).await;
        }
        self.begin().await;

        let request = LoginRequest { email: email.trim().to_owned(), password: password.to_owned() };
        match self.service.login(&request).await {
            Ok(response) => {
                self.establish(response.user).await;
                ActionResult::ok()
            }
            Err(e) => self.fail(&e).await,
        }
    }

    pub async fn register(&self, form: &Registration) -> ActionResult {
        if let Err(e) =
            validation::validate_registration(&form.name, &form.email, &form.password, &form.confirm_password)
        {
            return self.fail(&e).await;
        }
        self.begin().await;

        let request = RegisterRequest {
            name: form.name.trim().to_owned(),
            email: form.email.trim().to_owned(),
            password: form.password.clone(),
            organization_name: form
                .organization_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_owned),
        };
        match self.service.register(&request).await {
            Ok(response) => {
                self.establish(response.user).await;
                succeed(&self.notifier, "Account created. Welcome to Solidify!")
            }
            Err(e) => self.fail(&e).await,
        }
    }

    /// Re-fetch the current user. A session that cannot be recovered ends
    /// logged out.
    pub async fn load_user(&self) -> ActionResult {
        self.begin().await;
        match self.service.me().await {
            Ok(user) => {
                self.establish(Some(user)).await;
                ActionResult::ok()
            }
            Err(e) => {
                if self.service.http().session() == SessionEvent::LoggedOut {
                    let mut state = self.state.write().await;
                    state.user = None;
                    state.is_authenticated = false;
                }
                self.fail(&e).await
            }
        }
    }

    pub async fn logout(&self) -> ActionResult {
        self.service.logout().await;
        *self.state.write().await = AuthState::default();
        self.notifier.info("You have been logged out.");
        ActionResult::ok()
    }

    pub async fn change_password(&self, current: &str, new: &str, confirm: &str) -> ActionResult {
        if let Err(e) = validation::validate_password_change(current, new, confirm) {
            return self.fail(&e).await;
        }
        self.begin().await;
        match self.service.change_password(current, new).await {
            Ok(response) => {
                self.state.write().await.loading = false;
                succeed(&self.notifier, response.message.unwrap_or_else(|| "Password changed successfully.".into()))
            }
            Err(e) => self.fail(&e).await,
        }
    }

    pub async fn forgot_password(&self, email: &str) -> ActionResult {
        if let Err(e) = validation::validate_email(email) {
            return self.fail(&e).await;
        }
        self.begin().await;
        match self.service.forgot_password(email).await {
            Ok(response) => {
                self.state.write().await.loading = false;
                succeed(
                    &self.notifier,
                    response
                        .message
                        .unwrap_or_else(|| "If that email is registered, a reset link is on its way.".into()),
                )
            }
            Err(e) => self.fail(&e).await,
        }
    }

    pub async fn reset_password(&self, token: &str, new: &str, confirm: &str) -> ActionResult {
        if let Err(e) = validation::validate_reset_password(token, new, confirm) {
            return self.fail(&e).await;
        }
        self.begin().await;
        match self.service.reset_password(token, new).await {
            Ok(response) => {
                self.state.write().await.loading = false;
                succeed(
                    &self.notifier,
                    response
                        .message
                        .unwrap_or_else(|| "Password reset. You can now log in.".into()),
                )
            }
            Err(e) => self.fail(&e).await,
        }
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn establish(&self, user: Option<User>) {
        let user = user.or_else(|| self.service.http().storage().user());
        if let Some(user) = &user {
            info!(user_id = %user.id, "session established");
        }
        let mut state = self.state.write().await;
        state.user = user;
        state.is_authenticated = true;
        state.loading = false;
        state.error = None;
    }

    async fn fail(&self, error: &ApiError) -> ActionResult {
        {
            let mut state = self.state.write().await;
            state.loading = false;
            state.error = Some(error.user_message());
        }
        report(&self.notifier, error)
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
