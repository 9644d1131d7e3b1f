//! Admin back-office CRUD.
//!
//! Reads go straight to the client. Writes go through the `RequestQueue` so
//! bulk edits are paced and back off after a 429.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::{Ignored, item_path};
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::queue::RequestQueue;
use crate::types::{ItemResponse, ListResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminResource {
    Courses,
    Library,
    News,
    Knowledge,
    Organizations,
}

impl AdminResource {
    pub const ALL: [Self; 5] = [Self::Courses, Self::Library, Self::News, Self::Knowledge, Self::Organizations];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Courses => "courses",
            Self::Library => "library",
            Self::News => "news",
            Self::Knowledge => "knowledge",
            Self::Organizations => "organizations",
        }
    }

    /// Noun for one record, used in toasts.
    #[must_use]
    pub fn singular(self) -> &'static str {
        match self {
            Self::Courses => "course",
            Self::Library => "library",
            Self::News => "news",
            Self::Knowledge => "knowledge",
            Self::Organizations => "organization",
        }
    }

    #[must_use]
    pub fn path(self) -> String {
        format!("/admin/{}", self.as_str())
    }
}

impl fmt::Display for AdminResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminResource {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ApiError::Validation(format!("unknown admin resource: {s}")))
    }
}

/// Records are passed through as raw JSON; each resource has its own shape
/// and the back-office edits whatever the backend returns.
#[derive(Clone)]
pub struct AdminService {
    http: HttpClient,
    queue: RequestQueue,
}

impl AdminService {
    #[must_use]
    pub fn new(http: HttpClient, queue: RequestQueue) -> Self {
        Self { http, queue }
    }

    #[must_use]
    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn list(&self, resource: AdminResource) -> Result<Vec<Value>, ApiError> {
        Ok(self
            .http
            .get::<ListResponse<Value>>(&resource.path())
            .await?
            .into_vec())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`, or `ApiError::QueueClosed`.
    pub async fn create(&self, resource: AdminResource, record: Value) -> Result<Value, ApiError> {
        let http = self.http.clone();
        let path = resource.path();
        self.queue
            .enqueue(move || async move {
                Ok(http
                    .post::<_, ItemResponse<Value>>(&path, &record)
                    .await?
                    .into_inner())
            })
            .await
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`, or `ApiError::QueueClosed`.
    pub async fn update(&self, resource: AdminResource, id: &str, record: Value) -> Result<Value, ApiError> {
        let http = self.http.clone();
        let path = item_path(&resource.path(), id);
        self.queue
            .enqueue(move || async move {
                Ok(http
                    .put::<_, ItemResponse<Value>>(&path, &record)
                    .await?
                    .into_inner())
            })
            .await
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`, or `ApiError::QueueClosed`.
    pub async fn delete(&self, resource: AdminResource, id: &str) -> Result<(), ApiError> {
        let http = self.http.clone();
        let path = item_path(&resource.path(), id);
        self.queue
            .enqueue(move || async move {
                http.delete::<Ignored>(&path).await?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
