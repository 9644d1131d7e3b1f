use super::item_path;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::types::{ItemResponse, ListResponse, NewsArticle};

const NEWS_PATH: &str = "/news";

#[derive(Clone)]
pub struct NewsService {
    http: HttpClient,
}

impl NewsService {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn list(&self) -> Result<Vec<NewsArticle>, ApiError> {
        Ok(self
            .http
            .get::<ListResponse<NewsArticle>>(NEWS_PATH)
            .await?
            .into_vec())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn get(&self, id: &str) -> Result<NewsArticle, ApiError> {
        Ok(self
            .http
            .get::<ItemResponse<NewsArticle>>(&item_path(NEWS_PATH, id))
            .await?
            .into_inner())
    }
}
