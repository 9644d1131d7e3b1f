use crate::error::ApiError;
use crate::http::HttpClient;
use crate::types::{LibraryResource, ListResponse};

#[derive(Clone)]
pub struct LibraryService {
    http: HttpClient,
}

impl LibraryService {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn list(&self) -> Result<Vec<LibraryResource>, ApiError> {
        Ok(self
            .http
            .get::<ListResponse<LibraryResource>>("/library")
            .await?
            .into_vec())
    }
}
