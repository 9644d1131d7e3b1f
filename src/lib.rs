//! Solidify client: typed access to the Solidify carbon-tracking API.
//!
//! ARCHITECTURE
//! ============
//! Layered bottom-up:
//! - `storage`: synchronous credential store (access/refresh token, user).
//! - `http`: authenticated client with single-flight token refresh.
//! - `queue`: paced FIFO for admin writes that must stay under rate limits.
//! - `services`: per-resource REST wrappers.
//! - `stores`: per-domain state containers returning `ActionResult`s.
//!
//! `Solidify` wires the layers together for a single session.

pub mod config;
pub mod emissions;
pub mod error;
pub mod http;
pub mod notify;
pub mod polling;
pub mod queue;
pub mod services;
pub mod storage;
pub mod stores;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;

pub use config::ClientConfig;
pub use error::{ApiError, ErrorCode};
pub use http::HttpClient;
pub use notify::{Notifier, Toast, ToastLevel};
pub use queue::RequestQueue;
pub use storage::{FileStore, MemoryStore, TokenStore};
pub use stores::ActionResult;

/// Fully wired client: one HTTP client, one admin queue, one store per domain.
///
/// Must be constructed inside a tokio runtime (the admin queue spawns its
/// worker task).
#[derive(Clone)]
pub struct Solidify {
    pub http: HttpClient,
    pub notifier: Notifier,
    pub auth: stores::auth::AuthStore,
    pub carbon: stores::carbon::CarbonStore,
    pub chat: stores::chat::ChatStore,
    pub courses: stores::courses::CourseStore,
    pub knowledge: stores::knowledge::KnowledgeStore,
    pub library: stores::library::LibraryStore,
    pub news: stores::news::NewsStore,
    pub organizations: stores::organizations::OrganizationStore,
    pub admin: stores::admin::AdminStore,
}

impl Solidify {
    /// Build a client talking to the real backend over `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, storage: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let transport = http::ReqwestTransport::new(&config.base_url, config.timeouts)?;
        Ok(Self::with_transport(config, storage, Arc::new(transport)))
    }

    /// Build a client over an arbitrary transport.
    #[must_use]
    pub fn with_transport(
        config: &ClientConfig,
        storage: Arc<dyn TokenStore>,
        transport: Arc<dyn http::Transport>,
    ) -> Self {
        let http = HttpClient::new(transport, storage);
        let notifier = Notifier::new();
        let queue = RequestQueue::spawn(config.queue);

        Self {
            auth: stores::auth::AuthStore::new(services::auth::AuthService::new(http.clone()), notifier.clone()),
            carbon: stores::carbon::CarbonStore::new(
                services::carbon::CarbonService::new(http.clone()),
                notifier.clone(),
            ),
            chat: stores::chat::ChatStore::new(
                services::chat::ChatService::new(http.clone()),
                notifier.clone(),
                config.polling,
            ),
            courses: stores::courses::CourseStore::new(
                services::courses::CourseService::new(http.clone()),
                notifier.clone(),
            ),
            knowledge: stores::knowledge::KnowledgeStore::new(
                services::knowledge::KnowledgeService::new(http.clone()),
                notifier.clone(),
            ),
            library: stores::library::LibraryStore::new(
                services::library::LibraryService::new(http.clone()),
                notifier.clone(),
            ),
            news: stores::news::NewsStore::new(services::news::NewsService::new(http.clone()), notifier.clone()),
            organizations: stores::organizations::OrganizationStore::new(
                services::organizations::OrganizationService::new(http.clone()),
                notifier.clone(),
            ),
            admin: stores::admin::AdminStore::new(
                services::admin::AdminService::new(http.clone(), queue),
                notifier.clone(),
            ),
            http,
            notifier,
        }
    }
}
