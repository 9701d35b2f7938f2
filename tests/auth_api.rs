mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, build_test_app, get, post_json, send};
use social_task_planner::auth::create_jwt;
use serde_json::json;

async fn register_and_login(app: &axum::Router, username: &str) -> String {
    let response = post_json(
        app,
        "/api/register",
        json!({"username": username, "password": "hunter22"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        app,
        "/api/login",
        json!({"username": username, "password": "hunter22"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["username"], username);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = build_test_app();
    register_and_login(&app, "alice").await;

    let response = post_json(
        &app,
        "/api/register",
        json!({"username": "alice", "password": "another1"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = build_test_app();
    let response = post_json(
        &app,
        "/api/register",
        json!({"username": "bob", "password": "123"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = build_test_app();
    register_and_login(&app, "carol").await;

    let response = post_json(
        &app,
        "/api/login",
        json!({"username": "carol", "password": "wrong-one"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(
        &app,
        "/api/login",
        json!({"username": "demo-user", "password": ""}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn projects_are_private_to_their_owner() {
    let app = build_test_app();
    let token = register_and_login(&app, "dave").await;

    let response = send(
        &app,
        Method::POST,
        "/api/projects",
        Some(json!({"name": "Dave's Gym", "tier": 2, "startDate": "2024-05-01"})),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    let id = created["project"]["id"].as_str().unwrap();
    let uri = format!("/api/projects/{id}");

    // 所有者可见
    let response = send(&app, Method::GET, &uri, None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let mine = body_json(send(&app, Method::GET, "/api/projects", None, Some(&token)).await).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    // 匿名 (演示用户) 不可见
    assert_eq!(get(&app, &uri).await.status(), StatusCode::NOT_FOUND);
    let anonymous = body_json(get(&app, "/api/projects").await).await;
    assert!(anonymous.as_array().unwrap().is_empty());

    // 也不能改别人的任务
    let body = body_json(send(&app, Method::GET, &uri, None, Some(&token)).await).await;
    let task_uri = format!("/api/tasks/{}", body["tasks"][0]["id"].as_str().unwrap());
    let response = send(
        &app,
        Method::PATCH,
        &task_uri,
        Some(json!({"isCompleted": true})),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_token_is_rejected_instead_of_falling_back() {
    let app = build_test_app();
    let forged = create_jwt(uuid::Uuid::new_v4(), "mallory", "not-the-server-secret").unwrap();

    for token in ["garbage.expired.token", forged.as_str()] {
        let response = send(
            &app,
            Method::POST,
            "/api/projects",
            Some(json!({"name": "Private", "tier": 1, "startDate": "2024-05-01"})),
            Some(token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{token}");

        let response = send(&app, Method::GET, "/api/projects", None, Some(token)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{token}");
    }

    // 演示用户名下没有多出项目
    let anonymous = body_json(get(&app, "/api/projects").await).await;
    assert!(anonymous.as_array().unwrap().is_empty());
}
