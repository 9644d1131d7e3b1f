//! Shared fixtures for service and store tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use reqwest::Method;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{ApiRequest, ApiResponse, HttpClient, Transport};
use crate::storage::{MemoryStore, TokenStore};

/// Canned responses keyed by method + path. Queued responses are consumed in
/// order; the last one repeats. Unrouted requests get 404.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl StubTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        let body = if body.is_null() { String::new() } else { body.to_string() };
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(ApiResponse { status, body });
    }

    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    #[must_use]
    pub fn last_request(&self) -> ApiRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }

    #[must_use]
    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.method == method && r.path == path)
            .count()
    }
}

#[async_trait::async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut routes = self.routes.lock().unwrap();
        let Some(queue) = routes.get_mut(&(request.method.clone(), request.path.clone())) else {
            return Ok(ApiResponse { status: 404, body: String::new() });
        };
        let response = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
        Ok(response.unwrap_or(ApiResponse { status: 404, body: String::new() }))
    }
}

/// Storage holding a valid-looking session.
#[must_use]
pub fn logged_in_storage() -> Arc<dyn TokenStore> {
    let storage: Arc<dyn TokenStore> = Arc::new(MemoryStore::new());
    storage
        .set_tokens("access-token", Some("refresh-token"))
        .unwrap();
    storage
}

#[must_use]
pub fn client_with(transport: Arc<StubTransport>) -> HttpClient {
    HttpClient::new(transport, logged_in_storage())
}
