use super::item_path;
use crate::error::ApiError;
use crate::http::{ApiRequest, HttpClient};
use crate::types::{ItemResponse, KnowledgeArticle, ListResponse};

const KNOWLEDGE_PATH: &str = "/knowledge";

#[derive(Clone)]
pub struct KnowledgeService {
    http: HttpClient,
}

impl KnowledgeService {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn list(&self) -> Result<Vec<KnowledgeArticle>, ApiError> {
        Ok(self
            .http
            .get::<ListResponse<KnowledgeArticle>>(KNOWLEDGE_PATH)
            .await?
            .into_vec())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn get(&self, id: &str) -> Result<KnowledgeArticle, ApiError> {
        Ok(self
            .http
            .get::<ItemResponse<KnowledgeArticle>>(&item_path(KNOWLEDGE_PATH, id))
            .await?
            .into_inner())
    }

    /// Full-text search; ranking is the backend's.
    ///
    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn search(&self, query: &str) -> Result<Vec<KnowledgeArticle>, ApiError> {
        let request = ApiRequest::get(format!("{KNOWLEDGE_PATH}/search")).query("q", query.trim());
        Ok(self
            .http
            .send::<ListResponse<KnowledgeArticle>>(request)
            .await?
            .into_vec())
    }
}

#[cfg(test)]
#[path = "knowledge_test.rs"]
mod tests;
