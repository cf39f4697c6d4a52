mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

async fn parent_total(app: &axum::Router, token: &str) -> Result<i64> {
    let (status, body) = common::request(app, Method::GET, "/api/parents", Some(token), None).await?;
    anyhow::ensure!(status == StatusCode::OK);
    Ok(body["data"]["total"].as_i64().unwrap())
}

async fn student_total(app: &axum::Router, token: &str) -> Result<i64> {
    let (status, body) =
        common::request(app, Method::GET, "/api/students", Some(token), None).await?;
    anyhow::ensure!(status == StatusCode::OK);
    Ok(body["data"]["total"].as_i64().unwrap())
}

#[tokio::test]
async fn enrollment_creates_student_account_and_guardian() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let class_id = common::create_class(&app, &token, "6th A").await?;

    common::enroll_student(&app, &token, class_id, "MAT-001", "699111111").await?;

    assert_eq!(parent_total(&app, &token).await?, 1);
    assert_eq!(student_total(&app, &token).await?, 1);

    // Both synthetic accounts exist with their role default passwords
    common::login(&app, "mat-001@student.school", "student1234").await?;
    common::login(&app, "699111111@parent.school", "parent123").await?;
    Ok(())
}

#[tokio::test]
async fn sibling_enrollment_reuses_the_guardian_account() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let class_id = common::create_class(&app, &token, "6th A").await?;

    common::enroll_student(&app, &token, class_id, "MAT-001", "699111111").await?;
    common::enroll_student(&app, &token, class_id, "MAT-002", "699111111").await?;

    // One guardian guarding two children
    assert_eq!(parent_total(&app, &token).await?, 1);
    assert_eq!(student_total(&app, &token).await?, 2);

    let (_, body) =
        common::request(&app, Method::GET, "/api/parents", Some(&token), None).await?;
    let parent_id = body["data"]["items"][0]["id"].as_i64().unwrap();

    let (status, body) = common::request(
        &app,
        Method::GET,
        &format!("/api/parents/{}/children", parent_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["children"].as_array().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn enrollment_against_missing_class_writes_nothing() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;

    let (status, body) = common::request(
        &app,
        Method::POST,
        "/api/students",
        Some(&token),
        Some(json!({
            "name": "Awa",
            "surname": "Diallo",
            "sex": "F",
            "matricule": "MAT-404",
            "class_id": 12345,
            "guardian_name": "Mamadou",
            "guardian_surname": "Diallo",
            "guardian_phone": "699404404",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Class"));

    assert_eq!(student_total(&app, &token).await?, 0);
    assert_eq!(parent_total(&app, &token).await?, 0);
    Ok(())
}

#[tokio::test]
async fn failed_enrollment_rolls_back_a_created_guardian() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let class_id = common::create_class(&app, &token, "6th A").await?;

    // Occupy the student's synthetic email slot ahead of time
    let (status, _) = common::request(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({
            "email": "mat-007@student.school",
            "password": "whatever1",
            "name": "Squatter",
            "surname": "Account",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::request(
        &app,
        Method::POST,
        "/api/students",
        Some(&token),
        Some(json!({
            "name": "Sept",
            "surname": "Agent",
            "sex": "M",
            "matricule": "MAT-007",
            "class_id": class_id,
            "guardian_name": "New",
            "guardian_surname": "Guardian",
            "guardian_phone": "699777777",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // The guardian created earlier in the same transaction is gone too
    assert_eq!(parent_total(&app, &token).await?, 0);
    assert_eq!(student_total(&app, &token).await?, 0);
    Ok(())
}

#[tokio::test]
async fn invalid_sex_is_a_field_level_validation_error() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let class_id = common::create_class(&app, &token, "6th A").await?;

    let (status, body) = common::request(
        &app,
        Method::POST,
        "/api/students",
        Some(&token),
        Some(json!({
            "name": "Awa",
            "surname": "Diallo",
            "sex": "X",
            "matricule": "MAT-009",
            "class_id": class_id,
            "guardian_name": "Mamadou",
            "guardian_surname": "Diallo",
            "guardian_phone": "699000009",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"].get("sex").is_some());
    Ok(())
}

#[tokio::test]
async fn duplicate_matricule_is_a_conflict() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let class_id = common::create_class(&app, &token, "6th A").await?;

    common::enroll_student(&app, &token, class_id, "MAT-001", "699111111").await?;

    let (status, _) = common::request(
        &app,
        Method::POST,
        "/api/students",
        Some(&token),
        Some(json!({
            "name": "Another",
            "surname": "Student",
            "sex": "M",
            "matricule": "MAT-001",
            "class_id": class_id,
            "guardian_name": "Other",
            "guardian_surname": "Parent",
            "guardian_phone": "699222222",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn student_round_trips_through_create_and_get() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let class_id = common::create_class(&app, &token, "6th A").await?;

    let student_id = common::enroll_student(&app, &token, class_id, "MAT-001", "699111111").await?;

    let (status, body) = common::request(
        &app,
        Method::GET,
        &format!("/api/students/{}", student_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["name"], "Awa");
    assert_eq!(data["surname"], "Diallo");
    assert_eq!(data["sex"], "F");
    assert_eq!(data["matricule"], "MAT-001");
    assert_eq!(data["birth_date"], "2012-03-14");
    assert_eq!(data["address"], "12 Main Street");
    assert_eq!(data["class"], "6th A");
    assert_eq!(data["guardian"]["phone"], "699111111");
    Ok(())
}

#[tokio::test]
async fn matricule_change_rederives_the_account_email() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let class_id = common::create_class(&app, &token, "6th A").await?;
    let student_id = common::enroll_student(&app, &token, class_id, "MAT-001", "699111111").await?;

    let (status, _) = common::request(
        &app,
        Method::PUT,
        &format!("/api/students/{}", student_id),
        Some(&token),
        Some(json!({ "matricule": "MAT-900", "name": "Aminata" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    // Old synthetic address is dead, the new one logs in
    let (status, _) = common::request(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "mat-001@student.school", "password": "student1234" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    common::login(&app, "mat-900@student.school", "student1234").await?;
    Ok(())
}

#[tokio::test]
async fn guardian_phone_change_syncs_the_guardian_account() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let class_id = common::create_class(&app, &token, "6th A").await?;
    let student_id = common::enroll_student(&app, &token, class_id, "MAT-001", "699111111").await?;

    let (status, body) = common::request(
        &app,
        Method::PUT,
        &format!("/api/students/{}", student_id),
        Some(&token),
        Some(json!({ "guardian_phone": "699999999" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["guardian"]["email"], "699999999@parent.school");

    common::login(&app, "699999999@parent.school", "parent123").await?;
    Ok(())
}

#[tokio::test]
async fn deleting_a_student_removes_only_its_own_account() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let class_id = common::create_class(&app, &token, "6th A").await?;

    let first = common::enroll_student(&app, &token, class_id, "MAT-001", "699111111").await?;
    let second = common::enroll_student(&app, &token, class_id, "MAT-002", "699111111").await?;

    let (status, _) = common::request(
        &app,
        Method::DELETE,
        &format!("/api/students/{}", first),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    // Student account gone, sibling and shared guardian untouched
    let (status, _) = common::request(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "mat-001@student.school", "password": "student1234" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::login(&app, "699111111@parent.school", "parent123").await?;
    let (status, _) = common::request(
        &app,
        Method::GET,
        &format!("/api/students/{}", second),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(student_total(&app, &token).await?, 1);
    assert_eq!(parent_total(&app, &token).await?, 1);
    Ok(())
}

#[tokio::test]
async fn parent_deletion_is_blocked_while_children_remain() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let class_id = common::create_class(&app, &token, "6th A").await?;
    let student_id = common::enroll_student(&app, &token, class_id, "MAT-001", "699111111").await?;

    let (_, body) = common::request(&app, Method::GET, "/api/parents", Some(&token), None).await?;
    let parent_id = body["data"]["items"][0]["id"].as_i64().unwrap();

    let (status, body) = common::request(
        &app,
        Method::DELETE,
        &format!("/api/parents/{}", parent_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // After the child leaves, the guardian account can go
    common::request(
        &app,
        Method::DELETE,
        &format!("/api/students/{}", student_id),
        Some(&token),
        None,
    )
    .await?;
    let (status, _) = common::request(
        &app,
        Method::DELETE,
        &format!("/api/parents/{}", parent_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn student_lists_paginate() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let class_id = common::create_class(&app, &token, "6th A").await?;

    for i in 0..5 {
        common::enroll_student(
            &app,
            &token,
            class_id,
            &format!("MAT-{:03}", i),
            &format!("69900{:04}", i),
        )
        .await?;
    }

    let (status, body) = common::request(
        &app,
        Method::GET,
        "/api/students?page=2&per_page=2",
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 5);
    assert_eq!(body["data"]["pages"], 3);
    assert_eq!(body["data"]["page"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    Ok(())
}
