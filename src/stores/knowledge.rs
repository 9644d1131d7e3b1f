//! Knowledge base articles and search.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use super::{ActionResult, Feedback, Resource, load};
use crate::notify::Notifier;
use crate::services::knowledge::KnowledgeService;
use crate::types::KnowledgeArticle;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KnowledgeState {
    pub articles: Resource<Vec<KnowledgeArticle>>,
    pub selected: Resource<Option<KnowledgeArticle>>,
    /// Query behind `articles`; empty for the full listing.
    pub query: String,
}

#[derive(Clone)]
pub struct KnowledgeStore {
    service: KnowledgeService,
    notifier: Notifier,
    state: Arc<RwLock<KnowledgeState>>,
}

impl KnowledgeStore {
    #[must_use]
    pub fn new(service: KnowledgeService, notifier: Notifier) -> Self {
        Self { service, notifier, state: Arc::default() }
    }

    pub async fn snapshot(&self) -> KnowledgeState {
        self.state.read().await.clone()
    }

    pub async fn load_articles(&self) -> ActionResult {
        self.state.write().await.query.clear();
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.articles, self.service.list()).await
    }

    /// Search; a blank query falls back to the full listing.
    pub async fn search(&self, query: &str) -> ActionResult {
        let query = query.trim();
        if query.is_empty() {
            return self.load_articles().await;
        }
        query.clone_into(&mut self.state.write().await.query);
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.articles, self.service.search(query)).await
    }

    pub async fn open(&self, id: &str) -> ActionResult {
        let fetch = async { self.service.get(id).await.map(Some) };
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.selected, fetch).await
    }
}
