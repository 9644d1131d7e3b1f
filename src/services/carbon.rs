use super::{Ignored, item_path};
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::types::{
    CarbonEntry, CarbonEntryInput, Dashboard, EmissionFactor, Goal, GoalInput, ItemResponse, ListResponse, Roadmap,
};

const ENTRIES_PATH: &str = "/carbon/entries";

/// Carbon entries, dashboard, roadmap, goals and emission factors.
#[derive(Clone)]
pub struct CarbonService {
    http: HttpClient,
}

impl CarbonService {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn list_entries(&self) -> Result<Vec<CarbonEntry>, ApiError> {
        Ok(self
            .http
            .get::<ListResponse<CarbonEntry>>(ENTRIES_PATH)
            .await?
            .into_vec())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn create_entry(&self, input: &CarbonEntryInput) -> Result<CarbonEntry, ApiError> {
        Ok(self
            .http
            .post::<_, ItemResponse<CarbonEntry>>(ENTRIES_PATH, input)
            .await?
            .into_inner())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn update_entry(&self, id: &str, input: &CarbonEntryInput) -> Result<CarbonEntry, ApiError> {
        Ok(self
            .http
            .put::<_, ItemResponse<CarbonEntry>>(&item_path(ENTRIES_PATH, id), input)
            .await?
            .into_inner())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn delete_entry(&self, id: &str) -> Result<(), ApiError> {
        self.http
            .delete::<Ignored>(&item_path(ENTRIES_PATH, id))
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn dashboard(&self) -> Result<Dashboard, ApiError> {
        Ok(self
            .http
            .get::<ItemResponse<Dashboard>>("/carbon/dashboard")
            .await?
            .into_inner())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn roadmap(&self) -> Result<Roadmap, ApiError> {
        Ok(self
            .http
            .get::<ItemResponse<Roadmap>>("/carbon/roadmap")
            .await?
            .into_inner())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn goals(&self) -> Result<Vec<Goal>, ApiError> {
        Ok(self
            .http
            .get::<ListResponse<Goal>>("/carbon/goals")
            .await?
            .into_vec())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn create_goal(&self, input: &GoalInput) -> Result<Goal, ApiError> {
        Ok(self
            .http
            .post::<_, ItemResponse<Goal>>("/carbon/goals", input)
            .await?
            .into_inner())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn emission_factors(&self) -> Result<Vec<EmissionFactor>, ApiError> {
        Ok(self
            .http
            .get::<ListResponse<EmissionFactor>>("/carbon/emission-factors")
            .await?
            .into_vec())
    }
}

#[cfg(test)]
#[path = "carbon_test.rs"]
mod tests;
