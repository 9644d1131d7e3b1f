use super::item_path;
use crate::error::ApiError;
use crate::http::{ApiRequest, HttpClient};
use crate::types::{Conversation, ItemResponse, ListResponse, Organization, User};

const ORGANIZATIONS_PATH: &str = "/organizations";

#[derive(Clone)]
pub struct OrganizationService {
    http: HttpClient,
}

impl OrganizationService {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn list(&self) -> Result<Vec<Organization>, ApiError> {
        Ok(self
            .http
            .get::<ListResponse<Organization>>(ORGANIZATIONS_PATH)
            .await?
            .into_vec())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn get(&self, id: &str) -> Result<Organization, ApiError> {
        Ok(self
            .http
            .get::<ItemResponse<Organization>>(&item_path(ORGANIZATIONS_PATH, id))
            .await?
            .into_inner())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn users(&self, id: &str) -> Result<Vec<User>, ApiError> {
        let path = format!("{}/users", item_path(ORGANIZATIONS_PATH, id));
        Ok(self
            .http
            .get::<ListResponse<User>>(&path)
            .await?
            .into_vec())
    }

    /// Open (or reuse) a conversation with the organization.
    ///
    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn connect(&self, id: &str) -> Result<Conversation, ApiError> {
        let path = format!("{}/connect", item_path(ORGANIZATIONS_PATH, id));
        Ok(self
            .http
            .send::<ItemResponse<Conversation>>(ApiRequest::post(path))
            .await?
            .into_inner())
    }
}
