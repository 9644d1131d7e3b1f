use reqwest::Method;
use serde_json::json;

use super::*;
use crate::test_helpers::{StubTransport, client_with};

const PROGRESS: &str = "/courses/c1/progress";

#[tokio::test]
async fn completing_last_module_announces_course_completion() {
    let stub = StubTransport::new();
    stub.respond(Method::GET, PROGRESS, 200, json!({ "completedModules": ["m1"], "percentComplete": 50 }));
    stub.respond(
        Method::POST,
        PROGRESS,
        200,
        json!({ "data": { "completedModules": ["m1", "m2"], "percentComplete": 100, "completed": true, "points": 120 } }),
    );
    let notifier = Notifier::new();
    let courses = CourseStore::new(CourseService::new(client_with(stub.clone())), notifier.clone());

    assert!(courses.load_progress("c1").await.success);
    let result = courses.complete_module("c1", "m2").await;
    assert_eq!(result.message.as_deref(), Some("Course completed! You now have 120 points."));
    assert_eq!(stub.last_request().body.unwrap(), json!({ "moduleId": "m2" }));

    let state = courses.snapshot().await;
    let progress = &state.progress["c1"];
    assert_eq!(progress.course_id, "c1");
    assert_eq!(progress.completed_modules.len(), 2);
}

#[tokio::test]
async fn open_and_leaderboard_populate_resources() {
    let stub = StubTransport::new();
    stub.respond(
        Method::GET,
        "/courses/c1",
        200,
        json!({ "_id": "c1", "title": "Carbon 101", "level": "efficiency", "modules": [{ "_id": "m1" }] }),
    );
    stub.respond(Method::GET, "/courses/leaderboard", 200, json!([{ "name": "Ada", "points": 300, "rank": 1 }]));
    let courses = CourseStore::new(CourseService::new(client_with(stub)), Notifier::new());

    courses.open("c1").await;
    courses.load_leaderboard().await;

    let state = courses.snapshot().await;
    let course = state.selected.data.unwrap();
    assert_eq!(course.level.tier(), 2);
    assert_eq!(course.modules.len(), 1);
    assert_eq!(state.leaderboard.data[0].rank, 1);
}
