//! Learning hub: courses, per-course progress and the leaderboard.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use super::{ActionResult, Feedback, Resource, load, report, succeed};
use crate::notify::Notifier;
use crate::services::courses::CourseService;
use crate::types::{Course, LeaderboardEntry, LearningProgress};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CourseState {
    pub courses: Resource<Vec<Course>>,
    pub selected: Resource<Option<Course>>,
    /// Keyed by course id.
    pub progress: HashMap<String, LearningProgress>,
    pub leaderboard: Resource<Vec<LeaderboardEntry>>,
}

#[derive(Clone)]
pub struct CourseStore {
    service: CourseService,
    notifier: Notifier,
    state: Arc<RwLock<CourseState>>,
}

impl CourseStore {
    #[must_use]
    pub fn new(service: CourseService, notifier: Notifier) -> Self {
        Self { service, notifier, state: Arc::default() }
    }

    pub async fn snapshot(&self) -> CourseState {
        self.state.read().await.clone()
    }

    pub async fn load_courses(&self) -> ActionResult {
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.courses, self.service.list()).await
    }

    pub async fn open(&self, id: &str) -> ActionResult {
        let fetch = async { self.service.get(id).await.map(Some) };
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.selected, fetch).await
    }

    pub async fn load_progress(&self, course_id: &str) -> ActionResult {
        match self.service.progress(course_id).await {
            Ok(progress) => {
                self.record(course_id, progress).await;
                ActionResult::ok()
            }
            Err(e) => report(&self.notifier, &e),
        }
    }

    /// Mark a module complete. Finishing the last module earns an extra toast.
    pub async fn complete_module(&self, course_id: &str, module_id: &str) -> ActionResult {
        let was_complete = self
            .state
            .read()
            .await
            .progress
            .get(course_id)
            .is_some_and(|p| p.completed);

        match self.service.complete_module(course_id, module_id).await {
            Ok(progress) => {
                let finished = progress.completed && !was_complete;
                let points = progress.points;
                self.record(course_id, progress).await;
                if finished {
                    succeed(&self.notifier, format!("Course completed! You now have {points} points."))
                } else {
                    succeed(&self.notifier, "Module completed.")
                }
            }
            Err(e) => report(&self.notifier, &e),
        }
    }

    pub async fn load_leaderboard(&self) -> ActionResult {
        load(&self.state, &self.notifier, Feedback::Toast, |s| &mut s.leaderboard, self.service.leaderboard()).await
    }

    async fn record(&self, course_id: &str, mut progress: LearningProgress) {
        if progress.course_id.is_empty() {
            course_id.clone_into(&mut progress.course_id);
        }
        self.state
            .write()
            .await
            .progress
            .insert(course_id.to_owned(), progress);
    }
}

#[cfg(test)]
#[path = "courses_test.rs"]
mod tests;
