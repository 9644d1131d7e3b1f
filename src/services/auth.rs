//! Auth endpoints. Login and register persist the returned credentials.

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::http::{ApiRequest, HttpClient};
use crate::types::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    ResetPasswordRequest, User,
};

/// `/auth/me` answers `{ user }`, `{ data }` or the bare user.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserResponse {
    Keyed { user: User },
    Wrapped { data: User },
    Bare(User),
}

impl UserResponse {
    fn into_user(self) -> User {
        match self {
            Self::Keyed { user } | Self::Wrapped { data: user } | Self::Bare(user) => user,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    http: HttpClient,
}

impl AuthService {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// # Errors
    ///
    /// Returns the backend's rejection or a storage failure.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let request = ApiRequest::post("/auth/login")
            .body(serde_json::to_value(request)?)
            .public();
        let response: AuthResponse = self.http.send(request).await?;
        self.persist(&response)?;
        info!("logged in");
        Ok(response)
    }

    /// # Errors
    ///
    /// Returns the backend's rejection or a storage failure.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let request = ApiRequest::post("/auth/register")
            .body(serde_json::to_value(request)?)
            .public();
        let response: AuthResponse = self.http.send(request).await?;
        self.persist(&response)?;
        info!("registered and logged in");
        Ok(response)
    }

    /// Fetch the current user and cache it in storage.
    ///
    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn me(&self) -> Result<User, ApiError> {
        let user = self
            .http
            .get::<UserResponse>("/auth/me")
            .await?
            .into_user();
        self.http.storage().set_user(&user)?;
        Ok(user)
    }

    /// Best-effort server-side logout, then local credential wipe. Never fails.
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.http.storage().refresh_token() {
            let request = ApiRequest::post("/auth/logout")
                .body(serde_json::json!({ "refreshToken": refresh_token }))
                .public();
            if let Err(e) = self.http.execute(request).await {
                warn!(error = %e, "server logout failed; clearing local session anyway");
            }
        }
        self.http.force_logout();
        info!("logged out");
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<MessageResponse, ApiError> {
        let body = ChangePasswordRequest { current_password: current.to_owned(), new_password: new.to_owned() };
        self.http.post("/auth/change-password", &body).await
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let body = ForgotPasswordRequest { email: email.trim().to_owned() };
        let request = ApiRequest::post("/auth/forgot-password")
            .body(serde_json::to_value(&body)?)
            .public();
        self.http.send(request).await
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn reset_password(&self, token: &str, new: &str) -> Result<MessageResponse, ApiError> {
        let body = ResetPasswordRequest { token: token.trim().to_owned(), new_password: new.to_owned() };
        let request = ApiRequest::post("/auth/reset-password")
            .body(serde_json::to_value(&body)?)
            .public();
        self.http.send(request).await
    }

    fn persist(&self, response: &AuthResponse) -> Result<(), ApiError> {
        if response.access_token.is_empty() {
            return Err(ApiError::Decode("auth response missing access token".into()));
        }
        let storage = self.http.storage();
        storage.set_tokens(&response.access_token, response.refresh_token.as_deref())?;
        if let Some(user) = &response.user {
            storage.set_user(user)?;
        }
        self.http.mark_active();
        Ok(())
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
