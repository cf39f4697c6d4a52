mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::json;

use school_api::database::manager::DatabaseManager;
use school_api::error::ApiError;

async fn setup_student(app: &Router, token: &str) -> Result<i64> {
    let class_id = common::create_class(app, token, "6th A").await?;
    common::enroll_student(app, token, class_id, "MAT-001", "699111111").await
}

#[tokio::test]
async fn payment_round_trips_and_embeds_the_payer() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let student_id = setup_student(&app, &token).await?;

    let (status, body) = common::request(
        &app,
        Method::POST,
        "/api/payments",
        Some(&token),
        Some(json!({
            "student_id": student_id,
            "amount": 55000.0,
            "period": "October 2025",
            "method": "mobile money",
            "receipt_number": "RCP-0001",
            "paid_on": "2025-10-03",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let payment_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = common::request(
        &app,
        Method::GET,
        &format!("/api/payments/{}", payment_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["amount"], 55000.0);
    assert_eq!(data["period"], "October 2025");
    assert_eq!(data["method"], "mobile money");
    assert_eq!(data["status"], "paid");
    assert_eq!(data["receipt_number"], "RCP-0001");
    assert_eq!(data["paid_on"], "2025-10-03");
    assert_eq!(data["student"]["matricule"], "MAT-001");
    Ok(())
}

#[tokio::test]
async fn payment_requires_an_existing_student() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;

    let (status, body) = common::request(
        &app,
        Method::POST,
        "/api/payments",
        Some(&token),
        Some(json!({
            "student_id": 999,
            "amount": 1000.0,
            "period": "October 2025",
            "receipt_number": "RCP-0404",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Student"));
    Ok(())
}

#[tokio::test]
async fn receipt_numbers_are_globally_unique() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let student_id = setup_student(&app, &token).await?;

    let payload = json!({
        "student_id": student_id,
        "amount": 1000.0,
        "period": "October 2025",
        "receipt_number": "RCP-0007",
    });

    let (status, _) = common::request(
        &app,
        Method::POST,
        "/api/payments",
        Some(&token),
        Some(payload.clone()),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        common::request(&app, Method::POST, "/api/payments", Some(&token), Some(payload)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

/// Two writers that both passed the application-level probe: the UNIQUE
/// index decides, and the loser surfaces as a Conflict.
#[tokio::test]
async fn receipt_unique_index_backstops_concurrent_inserts() -> Result<()> {
    use school_api::database::models::payment::{self, NewPayment, PaymentStatus};

    let pool = DatabaseManager::connect_in_memory().await?;
    let mut conn = pool.acquire().await?;

    // Minimal rows to satisfy the student foreign key
    sqlx::query(
        "INSERT INTO accounts (email, password_hash, name, surname, role, created_at, updated_at)
         VALUES ('g@parent.school', 'x', 'G', 'P', 'parent', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z'),
                ('s@student.school', 'x', 'S', 'P', 'student', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
    )
    .execute(&mut *conn)
    .await?;
    sqlx::query(
        "INSERT INTO classes (name, room, level, school_year) VALUES ('6th A', 'B1', '6th', '2025')",
    )
    .execute(&mut *conn)
    .await?;
    sqlx::query(
        "INSERT INTO students (account_id, guardian_id, class_id, name, surname, sex, matricule)
         VALUES (2, 1, 1, 'S', 'P', 'M', 'MAT-001')",
    )
    .execute(&mut *conn)
    .await?;

    let new_payment = |receipt: &str| NewPayment {
        student_id: 1,
        amount: 1000.0,
        paid_on: chrono::NaiveDate::from_ymd_opt(2025, 10, 3).unwrap(),
        period: "October 2025".to_string(),
        method: None,
        status: PaymentStatus::Paid,
        receipt_number: receipt.to_string(),
    };

    payment::insert(&mut conn, &new_payment("RCP-0042")).await?;
    let err = payment::insert(&mut conn, &new_payment("RCP-0042")).await.unwrap_err();

    match ApiError::from(err) {
        ApiError::Conflict(_) => {}
        other => panic!("expected Conflict, got {:?}", other),
    }

    // Exactly one row survived
    let count = payment::count(&mut conn).await?;
    assert_eq!(count, 1);
    Ok(())
}

#[tokio::test]
async fn expenses_need_no_references_and_default_their_date() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;

    let (status, body) = common::request(
        &app,
        Method::POST,
        "/api/expenses",
        Some(&token),
        Some(json!({
            "label": "Chalk boxes",
            "amount": 1500.0,
            "category": "supplies",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["label"], "Chalk boxes");
    assert!(body["data"]["date"].is_string());

    let (status, body) = common::request(
        &app,
        Method::POST,
        "/api/expenses",
        Some(&token),
        Some(json!({ "label": "No amount" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"].get("amount").is_some());
    assert!(body["field_errors"].get("category").is_some());
    Ok(())
}

#[tokio::test]
async fn stats_aggregate_the_ledger() -> Result<()> {
    let app = common::test_app().await?;
    let token = common::admin_token(&app).await?;
    let student_id = setup_student(&app, &token).await?;

    common::request(
        &app,
        Method::POST,
        "/api/payments",
        Some(&token),
        Some(json!({
            "student_id": student_id,
            "amount": 20000.0,
            "period": "October 2025",
            "receipt_number": "RCP-1",
        })),
    )
    .await?;
    common::request(
        &app,
        Method::POST,
        "/api/payments",
        Some(&token),
        Some(json!({
            "student_id": student_id,
            "amount": 5000.0,
            "period": "November 2025",
            "status": "pending",
            "receipt_number": "RCP-2",
        })),
    )
    .await?;
    common::request(
        &app,
        Method::POST,
        "/api/expenses",
        Some(&token),
        Some(json!({ "label": "Chalk", "amount": 1500.0, "category": "supplies" })),
    )
    .await?;

    let (status, body) = common::request(&app, Method::GET, "/api/stats", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total_students"], 1);
    assert_eq!(data["total_girls"], 1);
    assert_eq!(data["total_boys"], 0);
    assert_eq!(data["total_payments"], 25000.0);
    assert_eq!(data["pending_payments"], 1);
    assert_eq!(data["total_expenses"], 1500.0);
    Ok(())
}
