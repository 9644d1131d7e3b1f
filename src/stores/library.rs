//! Resource library listing.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use super::{ActionResult, Feedback, Resource, load};
use crate::notify::Notifier;
use crate::services::library::LibraryService;
use crate::types::{LibraryResource, SustainabilityLevel};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LibraryState {
    pub resources: Resource<Vec<LibraryResource>>,
}

impl LibraryState {
    /// Resources aimed at `level`.
    #[must_use]
    pub fn for_level(&self, level: SustainabilityLevel) -> Vec<&LibraryResource> {
        self.resources
            .data
            .iter()
            .filter(|r| r.level == level)
            .collect()
    }
}

#[derive(Clone)]
pub struct LibraryStore {
    service: LibraryService,
    notifier: Notifier,
    state: Arc<RwLock<LibraryState>>,
}

impl LibraryStore {
    #[must_use]
    pub fn new(service: LibraryService, notifier: Notifier) -> Self {
        Self { service, notifier, state: Arc::default() }
    }

    pub async fn snapshot(&self) -> LibraryState {
        self.state.read().await.clone()
    }

    pub async fn load_resources(&self) -> ActionResult {
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.resources, self.service.list()).await
    }
}
