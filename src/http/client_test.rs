use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;

use super::*;
use crate::storage::MemoryStore;

// =========================================================================
// MockBackend
// =========================================================================

/// Accepts exactly one bearer token; `/auth/refresh` swaps it for `next`.
struct MockBackend {
    valid: Mutex<String>,
    next: String,
    refresh_ok: bool,
    refresh_delay: Duration,
    refresh_calls: AtomicUsize,
    seen: Mutex<Vec<(String, Option<String>)>>,
}

impl MockBackend {
    fn new(valid: &str, next: &str, refresh_ok: bool) -> Self {
        Self {
            valid: Mutex::new(valid.to_owned()),
            next: next.to_owned(),
            refresh_ok,
            refresh_delay: Duration::from_millis(50),
            refresh_calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn seen(&self) -> Vec<(String, Option<String>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for MockBackend {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        if request.path == REFRESH_PATH {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.refresh_delay).await;
            if !self.refresh_ok {
                return Ok(ApiResponse { status: 401, body: r#"{"message":"invalid refresh token"}"#.into() });
            }
            self.valid.lock().unwrap().clone_from(&self.next);
            let body = json!({ "accessToken": self.next, "refreshToken": "refresh-2" });
            return Ok(ApiResponse { status: 200, body: body.to_string() });
        }

        self.seen
            .lock()
            .unwrap()
            .push((request.path.clone(), request.bearer.clone()));
        let valid = self.valid.lock().unwrap().clone();
        if request.bearer.as_deref() == Some(valid.as_str()) {
            Ok(ApiResponse { status: 200, body: json!({ "path": request.path, "token": valid }).to_string() })
        } else {
            Ok(ApiResponse { status: 401, body: r#"{"message":"jwt expired"}"#.into() })
        }
    }
}

fn storage_with(access: Option<&str>, refresh: Option<&str>) -> Arc<dyn TokenStore> {
    let storage: Arc<dyn TokenStore> = Arc::new(MemoryStore::new());
    if let Some(access) = access {
        storage.set_tokens(access, refresh).unwrap();
    } else if let Some(refresh) = refresh {
        storage.set(crate::storage::REFRESH_TOKEN_KEY, refresh).unwrap();
    }
    storage
}

// =========================================================================
// happy path
// =========================================================================

#[tokio::test]
async fn attaches_stored_bearer_token() {
    let backend = Arc::new(MockBackend::new("good", "unused", true));
    let client = HttpClient::new(backend.clone(), storage_with(Some("good"), Some("r")));

    let body: Value = client.get("/auth/me").await.unwrap();
    assert_eq!(body["token"], "good");
    assert_eq!(backend.refresh_calls(), 0);
    assert_eq!(backend.seen(), vec![("/auth/me".to_owned(), Some("good".to_owned()))]);
}

#[tokio::test(start_paused = true)]
async fn expired_token_refreshes_and_retries() {
    let backend = Arc::new(MockBackend::new("never-issued", "fresh", true));
    let storage = storage_with(Some("stale"), Some("refresh-1"));
    let client = HttpClient::new(backend.clone(), storage.clone());

    let body: Value = client.get("/carbon/entries").await.unwrap();
    assert_eq!(body["token"], "fresh");
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(storage.access_token().as_deref(), Some("fresh"));
    assert_eq!(storage.refresh_token().as_deref(), Some("refresh-2"));
}

// =========================================================================
// single flight
// =========================================================================

#[tokio::test(start_paused = true)]
async fn concurrent_401s_share_one_refresh() {
    let backend = Arc::new(MockBackend::new("never-issued", "fresh", true));
    let client = HttpClient::new(backend.clone(), storage_with(Some("stale"), Some("refresh-1")));

    let paths: Vec<String> = (0..5).map(|i| format!("/news/{i}")).collect();
    let results = futures::future::join_all(paths.iter().map(|p| client.get::<Value>(p))).await;

    assert_eq!(backend.refresh_calls(), 1);
    for result in &results {
        assert_eq!(result.as_ref().unwrap()["token"], "fresh");
    }

    let seen = backend.seen();
    assert_eq!(seen.len(), 10);
    assert!(seen[..5].iter().all(|(_, t)| t.as_deref() == Some("stale")));
    assert!(seen[5..].iter().all(|(_, t)| t.as_deref() == Some("fresh")));
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_rejects_every_waiter_and_clears_credentials() {
    let backend = Arc::new(MockBackend::new("never-issued", "unused", false));
    let storage = storage_with(Some("stale"), Some("refresh-1"));
    let client = HttpClient::new(backend.clone(), storage.clone());
    let events = client.session_events();

    let results = futures::future::join_all((0..3).map(|_| client.get::<Value>("/courses"))).await;

    assert_eq!(backend.refresh_calls(), 1);
    assert!(
        results
            .iter()
            .all(|r| matches!(r, Err(ApiError::SessionExpired(_))))
    );
    assert!(storage.access_token().is_none());
    assert!(storage.refresh_token().is_none());
    assert_eq!(*events.borrow(), SessionEvent::LoggedOut);
}

#[tokio::test]
async fn missing_refresh_token_logs_out_without_calling_refresh() {
    let backend = Arc::new(MockBackend::new("never-issued", "unused", true));
    let storage = storage_with(Some("stale"), None);
    let client = HttpClient::new(backend.clone(), storage.clone());
    assert_eq!(client.session(), SessionEvent::Active);

    let result = client.get::<Value>("/auth/me").await;

    assert!(matches!(result, Err(ApiError::SessionExpired(_))));
    assert_eq!(backend.refresh_calls(), 0);
    assert!(storage.access_token().is_none());
    assert_eq!(client.session(), SessionEvent::LoggedOut);
}

#[tokio::test(start_paused = true)]
async fn retried_request_is_not_refreshed_twice() {
    struct AlwaysUnauthorized {
        inner: MockBackend,
    }

    #[async_trait::async_trait]
    impl Transport for AlwaysUnauthorized {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
            if request.path == REFRESH_PATH {
                return self.inner.send(request).await;
            }
            Ok(ApiResponse { status: 401, body: String::new() })
        }
    }

    let backend = Arc::new(AlwaysUnauthorized { inner: MockBackend::new("x", "fresh", true) });
    let client = HttpClient::new(backend.clone(), storage_with(Some("stale"), Some("refresh-1")));

    let result = client.get::<Value>("/organizations").await;
    assert_eq!(result.unwrap_err().status(), Some(401));
    assert_eq!(backend.inner.refresh_calls(), 1);
}

// =========================================================================
// stale token
// =========================================================================

/// Simulates another caller finishing a refresh between our send and our
/// 401 handling: storage already holds a newer token.
struct RacingBackend {
    storage: Arc<dyn TokenStore>,
    refresh_calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Transport for RacingBackend {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        if request.path == REFRESH_PATH {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(ApiResponse { status: 500, body: String::new() });
        }
        if request.bearer.as_deref() == Some("newer") {
            return Ok(ApiResponse { status: 200, body: "{}".into() });
        }
        self.storage.set_tokens("newer", None).unwrap();
        Ok(ApiResponse { status: 401, body: String::new() })
    }
}

#[tokio::test]
async fn stale_token_retries_with_current_token() {
    let storage = storage_with(Some("old"), Some("refresh-1"));
    let backend = Arc::new(RacingBackend { storage: storage.clone(), refresh_calls: AtomicUsize::new(0) });
    let client = HttpClient::new(backend.clone(), storage);

    let result = client.get::<Value>("/chat/conversations").await;
    assert!(result.is_ok());
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 0);
}

// =========================================================================
// public endpoints & status mapping
// =========================================================================

#[tokio::test]
async fn public_request_skips_refresh_and_token() {
    let backend = Arc::new(MockBackend::new("good", "unused", true));
    let client = HttpClient::new(backend.clone(), storage_with(Some("stale"), Some("r")));

    let result = client
        .send::<Value>(ApiRequest::post("/auth/login").public())
        .await;
    let err = result.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "jwt expired");
    assert_eq!(backend.refresh_calls(), 0);
    assert_eq!(backend.seen()[0].1, None);
}

#[tokio::test]
async fn non_success_status_maps_to_status_error() {
    struct NotFound;

    #[async_trait::async_trait]
    impl Transport for NotFound {
        async fn send(&self, _request: &ApiRequest) -> Result<ApiResponse, ApiError> {
            Ok(ApiResponse { status: 404, body: String::new() })
        }
    }

    let client = HttpClient::new(Arc::new(NotFound), storage_with(Some("t"), Some("r")));
    let err = client.get::<Value>("/news/missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message(), crate::error::default_status_message(404));
}

#[test]
fn empty_body_decodes_for_unit_and_default_types() {
    decode_body::<()>("").unwrap();
    let msg: crate::types::MessageResponse = decode_body("  ").unwrap();
    assert!(msg.message.is_none());
}

#[test]
fn session_starts_logged_out_without_token() {
    let client = HttpClient::new(
        Arc::new(MockBackend::new("x", "y", true)),
        storage_with(None, None),
    );
    assert_eq!(client.session(), SessionEvent::LoggedOut);
    client.mark_active();
    assert_eq!(client.session(), SessionEvent::Active);
}
