mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = common::test_app().await?;

    let (status, body) = common::request(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn signup_then_login_round_trip() -> Result<()> {
    let app = common::test_app().await?;

    let (status, body) = common::request(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({
            "email": "Director@School.Test",
            "password": "secret123",
            "name": "Fatou",
            "surname": "Ndiaye",
            "role": "admin",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    // Email is stored case-normalized and the hash never leaves the server
    assert_eq!(body["data"]["email"], "director@school.test");
    assert!(body["data"].get("password_hash").is_none());

    let token = common::login(&app, "director@school.test", "secret123").await?;

    let (status, body) =
        common::request(&app, Method::GET, "/api/auth/whoami", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "director@school.test");
    assert_eq!(body["data"]["role"], "admin");
    Ok(())
}

#[tokio::test]
async fn email_uniqueness_is_case_insensitive() -> Result<()> {
    let app = common::test_app().await?;

    common::signup_and_login(&app, "staff@school.test", "accountant").await?;

    let (status, body) = common::request(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({
            "email": "STAFF@School.TEST",
            "password": "other123",
            "name": "Other",
            "surname": "Person",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn invalid_credentials_do_not_reveal_which_part_failed() -> Result<()> {
    let app = common::test_app().await?;
    common::signup_and_login(&app, "known@school.test", "teacher").await?;

    let (status_unknown, body_unknown) = common::request(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@school.test", "password": "secret123" })),
    )
    .await?;
    let (status_wrong, body_wrong) = common::request(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "known@school.test", "password": "wrong-password" })),
    )
    .await?;

    assert_eq!(status_unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(status_wrong, StatusCode::UNAUTHORIZED);
    assert_eq!(body_unknown["error"], body_wrong["error"]);
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_or_garbage_tokens() -> Result<()> {
    let app = common::test_app().await?;

    let (status, body) = common::request(&app, Method::GET, "/api/students", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) =
        common::request(&app, Method::GET, "/api/students", Some("not-a-jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn own_password_change_requires_the_old_one() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::signup_and_login(&app, "bursar@school.test", "accountant").await?;

    let (status, _) = common::request(
        &app,
        Method::PUT,
        "/api/auth/password",
        Some(&token),
        Some(json!({ "old_password": "not-it", "new_password": "changed456" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::request(
        &app,
        Method::PUT,
        "/api/auth/password",
        Some(&token),
        Some(json!({ "old_password": "secret123", "new_password": "changed456" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works, new one does
    let (status, _) = common::request(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "bursar@school.test", "password": "secret123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    common::login(&app, "bursar@school.test", "changed456").await?;
    Ok(())
}

#[tokio::test]
async fn administrative_reset_is_role_gated() -> Result<()> {
    let app = common::test_app().await?;
    let teacher_token = common::signup_and_login(&app, "teacher@school.test", "teacher").await?;
    let admin_token = common::admin_token(&app).await?;

    // whoami to find the teacher's account id
    let (_, body) =
        common::request(&app, Method::GET, "/api/auth/whoami", Some(&teacher_token), None).await?;
    let teacher_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = common::request(
        &app,
        Method::PUT,
        &format!("/api/auth/accounts/{}/password", teacher_id),
        Some(&teacher_token),
        Some(json!({ "new_password": "hijacked1" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = common::request(
        &app,
        Method::PUT,
        &format!("/api/auth/accounts/{}/password", teacher_id),
        Some(&admin_token),
        Some(json!({ "new_password": "reset789x" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    common::login(&app, "teacher@school.test", "reset789x").await?;
    Ok(())
}

#[tokio::test]
async fn signup_reports_every_missing_field() -> Result<()> {
    let app = common::test_app().await?;

    let (status, body) = common::request(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "email": "x@y.test" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"].get("password").is_some());
    assert!(body["field_errors"].get("name").is_some());
    assert!(body["field_errors"].get("surname").is_some());
    Ok(())
}
