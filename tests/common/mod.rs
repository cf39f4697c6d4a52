use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use school_api::app::app;
use school_api::database::manager::DatabaseManager;

/// Fresh application over its own in-memory database
pub async fn test_app() -> Result<Router> {
    let pool = DatabaseManager::connect_in_memory().await?;
    Ok(app(pool))
}

/// Drive one request through the router and decode the JSON body
pub async fn request(
    app: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, value))
}

/// Create an account and return a bearer token for it
pub async fn signup_and_login(app: &Router, email: &str, role: &str) -> Result<String> {
    let (status, body) = request(
        app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({
            "email": email,
            "password": "secret123",
            "name": "Test",
            "surname": "User",
            "role": role,
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "signup failed: {} {}", status, body);

    login(app, email, "secret123").await
}

pub async fn login(app: &Router, email: &str, password: &str) -> Result<String> {
    let (status, body) = request(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);

    let token = body["data"]["token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("missing token in login response"))?;
    Ok(token.to_string())
}

/// Admin token for tests that drive the protected API
pub async fn admin_token(app: &Router) -> Result<String> {
    signup_and_login(app, "admin@school.test", "admin").await
}

/// Create a class and return its id
pub async fn create_class(app: &Router, token: &str, name: &str) -> Result<i64> {
    let (status, body) = request(
        app,
        Method::POST,
        "/api/classes",
        Some(token),
        Some(json!({
            "name": name,
            "room": "B12",
            "level": "6th grade",
            "school_year": "2025-2026",
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "class creation failed: {} {}", status, body);

    body["data"]["id"].as_i64().ok_or_else(|| anyhow::anyhow!("missing class id"))
}

/// Enroll a student and return its id
pub async fn enroll_student(
    app: &Router,
    token: &str,
    class_id: i64,
    matricule: &str,
    guardian_phone: &str,
) -> Result<i64> {
    let (status, body) = request(
        app,
        Method::POST,
        "/api/students",
        Some(token),
        Some(json!({
            "name": "Awa",
            "surname": "Diallo",
            "sex": "F",
            "matricule": matricule,
            "birth_date": "2012-03-14",
            "address": "12 Main Street",
            "class_id": class_id,
            "guardian_name": "Mamadou",
            "guardian_surname": "Diallo",
            "guardian_phone": guardian_phone,
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "enrollment failed: {} {}", status, body);

    body["data"]["id"].as_i64().ok_or_else(|| anyhow::anyhow!("missing student id"))
}
