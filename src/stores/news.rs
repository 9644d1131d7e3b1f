//! Sustainability news feed.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use super::{ActionResult, Feedback, Resource, load};
use crate::error::ApiError;
use crate::notify::Notifier;
use crate::services::news::NewsService;
use crate::types::NewsArticle;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewsState {
    pub articles: Resource<Vec<NewsArticle>>,
    pub selected: Resource<Option<NewsArticle>>,
}

#[derive(Clone)]
pub struct NewsStore {
    service: NewsService,
    notifier: Notifier,
    state: Arc<RwLock<NewsState>>,
}

impl NewsStore {
    #[must_use]
    pub fn new(service: NewsService, notifier: Notifier) -> Self {
        Self { service, notifier, state: Arc::default() }
    }

    pub async fn snapshot(&self) -> NewsState {
        self.state.read().await.clone()
    }

    /// Load the feed, newest first.
    pub async fn load_articles(&self) -> ActionResult {
        let fetch = async {
            let mut articles = self.service.list().await?;
            articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
            Ok::<_, ApiError>(articles)
        };
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.articles, fetch).await
    }

    pub async fn open(&self, id: &str) -> ActionResult {
        let fetch = async { self.service.get(id).await.map(Some) };
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.selected, fetch).await
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::test_helpers::{StubTransport, client_with};

    #[tokio::test]
    async fn feed_is_sorted_newest_first() {
        let stub = StubTransport::new();
        stub.respond(
            Method::GET,
            "/news",
            200,
            json!([
                { "_id": "a", "publishedAt": "2026-01-05T00:00:00Z" },
                { "_id": "b", "publishedAt": "2026-03-01T00:00:00Z" }
            ]),
        );
        let news = NewsStore::new(NewsService::new(client_with(stub)), Notifier::new());

        news.load_articles().await;
        let ids: Vec<String> = news
            .snapshot()
            .await
            .articles
            .data
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["b".to_owned(), "a".to_owned()]);
    }

    #[tokio::test]
    async fn missing_article_toasts_not_found() {
        let stub = StubTransport::new();
        let notifier = Notifier::new();
        let mut toasts = notifier.subscribe();
        let news = NewsStore::new(NewsService::new(client_with(stub)), notifier);

        let result = news.open("gone").await;
        assert!(!result.success);
        assert_eq!(toasts.try_recv().unwrap().message, "The requested resource was not found.");
    }
}
