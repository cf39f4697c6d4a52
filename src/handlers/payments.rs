use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::pagination::{PageQuery, Paginated};
use crate::api::response::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::payment::{self, NewPayment, PaymentStatus, PaymentView};
use crate::database::models::student;
use crate::error::ApiError;
use crate::validation::{parse_date, parse_enum, present, require_fields};

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub student_id: Option<i64>,
    pub amount: Option<f64>,
    pub period: Option<String>,
    pub method: Option<String>,
    pub status: Option<String>,
    pub receipt_number: Option<String>,
    pub paid_on: Option<String>,
}

/// POST /api/payments - receipt number is required and globally unique
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreatePaymentRequest>,
) -> ApiResult<PaymentView> {
    require_fields(&[
        ("student_id", body.student_id.is_some()),
        ("amount", body.amount.is_some()),
        ("period", present(&body.period)),
        ("receipt_number", present(&body.receipt_number)),
    ])?;

    let status = match body.status.as_deref() {
        Some(value) => parse_enum::<PaymentStatus>("status", value)?,
        None => PaymentStatus::Paid,
    };
    let paid_on = match body.paid_on.as_deref() {
        Some(value) => parse_date("paid_on", value)?,
        None => Utc::now().date_naive(),
    };

    let student_id = body.student_id.unwrap();
    let receipt_number = body.receipt_number.unwrap();

    let mut tx = state.pool.begin().await?;
    student::find(&mut tx, student_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Student {} not found", student_id)))?;

    // App-level probe for a friendly message; the UNIQUE index is the backstop
    // that decides between two concurrent inserts of the same receipt.
    if payment::receipt_taken(&mut tx, &receipt_number, None).await? {
        return Err(ApiError::conflict(format!(
            "Receipt number '{}' has already been issued",
            receipt_number
        )));
    }

    let created = payment::insert(
        &mut tx,
        &NewPayment {
            student_id,
            amount: body.amount.unwrap(),
            paid_on,
            period: body.period.unwrap(),
            method: body.method,
            status,
            receipt_number,
        },
    )
    .await?;
    let view = created.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(view))
}

/// GET /api/payments - most recent first
pub async fn list(
    State(state): State<AppState>,
    Query(page_query): Query<PageQuery>,
) -> ApiResult<Paginated<PaymentView>> {
    let (page, per_page) = page_query.resolve();
    let offset = PageQuery::offset(page, per_page);

    let mut conn = state.pool.acquire().await?;
    let total = payment::count(&mut conn).await?;
    let payments = payment::list(&mut conn, per_page, offset).await?;

    let mut items = Vec::with_capacity(payments.len());
    for p in payments {
        items.push(p.into_view(&mut conn).await?);
    }

    Ok(ApiResponse::success(Paginated::new(items, total, page, per_page)))
}

/// GET /api/payments/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<PaymentView> {
    let mut conn = state.pool.acquire().await?;
    let found = payment::find(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Payment {} not found", id)))?;
    Ok(ApiResponse::success(found.into_view(&mut conn).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub amount: Option<f64>,
    pub period: Option<String>,
    pub method: Option<String>,
    pub status: Option<String>,
    pub receipt_number: Option<String>,
    pub paid_on: Option<String>,
}

/// PUT /api/payments/:id - the paying student never changes
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePaymentRequest>,
) -> ApiResult<PaymentView> {
    let mut tx = state.pool.begin().await?;
    let mut found = payment::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Payment {} not found", id)))?;

    if let Some(amount) = body.amount {
        found.amount = amount;
    }
    if let Some(period) = body.period {
        found.period = period;
    }
    if let Some(method) = body.method {
        found.method = Some(method);
    }
    if let Some(status) = body.status.as_deref() {
        found.status = parse_enum::<PaymentStatus>("status", status)?;
    }
    if let Some(receipt_number) = body.receipt_number {
        if payment::receipt_taken(&mut tx, &receipt_number, Some(found.id)).await? {
            return Err(ApiError::conflict(format!(
                "Receipt number '{}' has already been issued",
                receipt_number
            )));
        }
        found.receipt_number = receipt_number;
    }
    if let Some(paid_on) = body.paid_on.as_deref() {
        found.paid_on = parse_date("paid_on", paid_on)?;
    }

    payment::update(&mut tx, &found).await?;
    let view = found.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(view))
}

/// DELETE /api/payments/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut tx = state.pool.begin().await?;
    payment::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Payment {} not found", id)))?;

    payment::delete(&mut tx, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Payment deleted" })))
}
