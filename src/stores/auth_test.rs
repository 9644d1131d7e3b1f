use std::sync::Arc;

use reqwest::Method;
use serde_json::json;

use super::*;
use crate::http::HttpClient;
use crate::notify::ToastLevel;
use crate::storage::{MemoryStore, TokenStore};
use crate::test_helpers::{StubTransport, client_with};

fn store(http: HttpClient) -> (AuthStore, Notifier) {
    let notifier = Notifier::new();
    (AuthStore::new(AuthService::new(http), notifier.clone()), notifier)
}

fn logged_out(stub: &Arc<StubTransport>) -> HttpClient {
    HttpClient::new(stub.clone(), Arc::new(MemoryStore::new()))
}

#[tokio::test]
async fn login_populates_state() {
    let stub = StubTransport::new();
    stub.respond(
        Method::POST,
        "/auth/login",
        200,
        json!({ "token": "a1", "refreshToken": "r1", "user": { "_id": "u1", "name": "Ada", "role": "admin" } }),
    );
    let (auth, _) = store(logged_out(&stub));
    assert!(!auth.snapshot().await.is_authenticated);

    let result = auth.login(" ada@solidify.io ", "correct-horse").await;
    assert!(result.success);

    let state = auth.snapshot().await;
    assert!(state.is_authenticated);
    assert!(state.is_admin());
    assert!(!state.loading);
    assert_eq!(stub.last_request().body.unwrap()["email"], "ada@solidify.io");
}

#[tokio::test]
async fn invalid_login_form_sends_nothing_and_toasts() {
    let stub = StubTransport::new();
    let (auth, notifier) = store(logged_out(&stub));
    let mut toasts = notifier.subscribe();

    let result = auth.login("not-an-email", "pw").await;
    assert!(!result.success);
    assert!(stub.requests().is_empty());

    let toast = toasts.try_recv().unwrap();
    assert_eq!(toast.level, ToastLevel::Error);
    assert_eq!(auth.snapshot().await.error, result.message);
}

#[tokio::test]
async fn change_password_rejects_mismatched_confirmation_locally() {
    let stub = StubTransport::new();
    let (auth, _) = store(client_with(stub.clone()));

    let result = auth
        .change_password("old-password", "new-password", "new-passw0rd")
        .await;
    assert!(!result.success);
    assert_eq!(result.message.as_deref(), Some("Passwords do not match."));
    assert!(stub.requests().is_empty());

    let short = auth.change_password("old-password", "short", "short").await;
    assert!(!short.success);
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn change_password_success_uses_backend_message() {
    let stub = StubTransport::new();
    stub.respond(Method::POST, "/auth/change-password", 200, json!({ "message": "Password updated" }));
    let (auth, notifier) = store(client_with(stub));
    let mut toasts = notifier.subscribe();

    let result = auth
        .change_password("old-password", "new-password", "new-password")
        .await;
    assert_eq!(result, ActionResult::ok_with("Password updated"));
    assert_eq!(toasts.try_recv().unwrap().level, ToastLevel::Success);
}

#[tokio::test]
async fn unrecoverable_session_ends_logged_out() {
    let stub = StubTransport::new();
    stub.respond(Method::GET, "/auth/me", 401, json!({ "message": "jwt expired" }));
    stub.respond(Method::POST, "/auth/refresh", 401, json!({ "message": "refresh token revoked" }));
    let http = client_with(stub);
    let (auth, _) = store(http.clone());
    assert!(auth.snapshot().await.is_authenticated);

    let result = auth.load_user().await;
    assert!(!result.success);

    let state = auth.snapshot().await;
    assert!(!state.is_authenticated);
    assert!(state.user.is_none());
    assert!(http.storage().access_token().is_none());
}

#[tokio::test]
async fn logout_resets_state_even_when_server_call_fails() {
    let stub = StubTransport::new();
    stub.respond(Method::POST, "/auth/logout", 500, json!({}));
    let http = client_with(stub);
    let (auth, _) = store(http.clone());

    assert!(auth.logout().await.success);
    assert_eq!(auth.snapshot().await, AuthState::default());
    assert!(http.storage().refresh_token().is_none());
}
