use serde_json::json;

use super::item_path;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::types::{Course, ItemResponse, LeaderboardEntry, LearningProgress, ListResponse};

const COURSES_PATH: &str = "/courses";

#[derive(Clone)]
pub struct CourseService {
    http: HttpClient,
}

impl CourseService {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn list(&self) -> Result<Vec<Course>, ApiError> {
        Ok(self
            .http
            .get::<ListResponse<Course>>(COURSES_PATH)
            .await?
            .into_vec())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn get(&self, id: &str) -> Result<Course, ApiError> {
        Ok(self
            .http
            .get::<ItemResponse<Course>>(&item_path(COURSES_PATH, id))
            .await?
            .into_inner())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn progress(&self, course_id: &str) -> Result<LearningProgress, ApiError> {
        let path = format!("{}/progress", item_path(COURSES_PATH, course_id));
        Ok(self
            .http
            .get::<ItemResponse<LearningProgress>>(&path)
            .await?
            .into_inner())
    }

    /// Mark one module complete.
    ///
    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn complete_module(&self, course_id: &str, module_id: &str) -> Result<LearningProgress, ApiError> {
        let path = format!("{}/progress", item_path(COURSES_PATH, course_id));
        Ok(self
            .http
            .post::<_, ItemResponse<LearningProgress>>(&path, &json!({ "moduleId": module_id }))
            .await?
            .into_inner())
    }

    /// # Errors
    ///
    /// Returns the request's `ApiError`.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ApiError> {
        Ok(self
            .http
            .get::<ListResponse<LeaderboardEntry>>(&format!("{COURSES_PATH}/leaderboard"))
            .await?
            .into_vec())
    }
}
