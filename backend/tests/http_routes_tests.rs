//! End-to-end tests for the REST API against the in-memory repository.
#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use course_shifts::db::repositories::LocalRepository;
use course_shifts::db::repository::{CourseRepository, FullRepository};
use course_shifts::http::{create_router, AppState};
use course_shifts::models::FixedClock;
use serde_json::{json, Value};
use support::{date, COURSE};
use tower::ServiceExt;

// Course keys contain reserved characters; `+` and `:` are fine in a path
// segment.
const COURSE_PATH: &str = "/v1/courses/course-v1:org+num+run";

fn app(repo: &LocalRepository) -> Router {
    let repo = Arc::new(repo.clone()) as Arc<dyn FullRepository>;
    let clock = Arc::new(FixedClock::new(date(2026, 3, 15)));
    create_router(AppState::with_clock(repo, clock))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let repo = LocalRepository::new();
    let app = app(&repo);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");

    repo.set_healthy(false);
    let (_, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_shift_lifecycle() {
    let repo = LocalRepository::new();
    let app = app(&repo);
    let shifts = format!("{}/shifts", COURSE_PATH);

    let (status, body) = send(&app, Method::POST, &shifts, Some(json!({"name": "spring"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], true);
    assert_eq!(body["shift"]["course_key"], COURSE);
    assert_eq!(body["shift"]["start_date"], "2026-03-15");
    let id = body["shift"]["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::POST, &shifts, Some(json!({"name": "spring"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);

    let (status, body) = send(&app, Method::POST, &shifts, Some(json!({"name": "other"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("already exists"));

    let (_, body) = send(&app, Method::GET, &shifts, None).await;
    assert_eq!(body["total"], 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/v1/shifts/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, Method::DELETE, &format!("/v1/shifts/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_transfer_and_membership() {
    let repo = LocalRepository::new();
    let app = app(&repo);
    let shifts = format!("{}/shifts", COURSE_PATH);

    let (_, a) = send(&app, Method::POST, &shifts, Some(json!({"name": "a"}))).await;
    let (_, b) = send(
        &app,
        Method::POST,
        &shifts,
        Some(json!({"name": "b", "start_date": "2026-03-22"})),
    )
    .await;
    let a_id = a["shift"]["id"].as_i64().unwrap();
    let b_id = b["shift"]["id"].as_i64().unwrap();
    let transfer = format!("{}/users/alice/transfer", COURSE_PATH);

    let (status, body) = send(
        &app,
        Method::POST,
        &transfer,
        Some(json!({"from_group": null, "to_group": a_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["membership"]["shift_group_id"], a_id);

    let (status, body) = send(
        &app,
        Method::POST,
        &transfer,
        Some(json!({"from_group": b_id, "to_group": a_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "MEMBERSHIP_MISMATCH");

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("{}/users/alice/membership", COURSE_PATH),
        None,
    )
    .await;
    assert_eq!(body["shift"]["name"], "a");

    let (_, body) = send(&app, Method::GET, &format!("/v1/shifts/{}/members", a_id), None).await;
    assert_eq!(body["members"], json!(["alice"]));
}

#[tokio::test]
async fn test_transfer_rejects_group_of_other_course() {
    let repo = LocalRepository::new();
    let app = app(&repo);

    let (_, other) = send(
        &app,
        Method::POST,
        "/v1/courses/org+other+run/shifts",
        Some(json!({"name": "x"})),
    )
    .await;
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("{}/users/alice/transfer", COURSE_PATH),
        Some(json!({"to_group": other["shift"]["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Course groups have different course_key"));
    assert_eq!(repo.membership_count(), 0);
}

#[tokio::test]
async fn test_settings_plans_and_update() {
    let repo = LocalRepository::new();
    let app = app(&repo);
    let settings = format!("{}/settings", COURSE_PATH);

    let (_, body) = send(&app, Method::GET, &settings, None).await;
    assert_eq!(body["is_shift_enabled"], false);
    assert_eq!(body["autostart_period_days"], 28);

    let (status, _) = send(
        &app,
        Method::PUT,
        &settings,
        Some(json!({"autostart_period_days": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        &settings,
        Some(json!({"is_shift_enabled": true, "is_autostart": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_autostart"], false);
    assert_eq!(body["autostart_period_days"], 28);

    let plans = format!("{}/plans", COURSE_PATH);
    for start_date in ["2026-03-10", "2026-04-01"] {
        let (status, _) = send(&app, Method::POST, &plans, Some(json!({"start_date": start_date}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, _) = send(&app, Method::POST, &plans, Some(json!({"start_date": "2026-03-10"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, Method::GET, &plans, None).await;
    assert_eq!(body["plans"].as_array().unwrap().len(), 2);
    assert_eq!(body["next"]["start_date"], "2026-03-10");

    let (status, report) = send(
        &app,
        Method::POST,
        &format!("{}/update-shifts", COURSE_PATH),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["created"][0]["name"], "shift_2026-03-10");
    assert_eq!(report["consumed_plans"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_launch_plan() {
    let repo = LocalRepository::new();
    repo.register_course(&support::course(), date(2026, 1, 1))
        .await
        .unwrap();
    let app = app(&repo);

    let (_, plan) = send(
        &app,
        Method::POST,
        &format!("{}/plans", COURSE_PATH),
        Some(json!({"start_date": "2026-03-01"})),
    )
    .await;
    assert!(plan["name"].is_null());
    let launch = format!("/v1/plans/{}/launch", plan["id"]);

    let (status, shift) = send(
        &app,
        Method::POST,
        &launch,
        Some(json!({"name": "launched", "days_add": 7})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(shift["start_date"], "2026-03-08");

    let (status, _) = send(&app, Method::POST, &launch, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
