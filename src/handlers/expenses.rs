use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::pagination::{PageQuery, Paginated};
use crate::api::response::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::expense::{self, Expense, NewExpense};
use crate::error::ApiError;
use crate::validation::{parse_date, present, require_fields};

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub label: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

/// POST /api/expenses - standalone fact, no cross-entity references
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateExpenseRequest>,
) -> ApiResult<Expense> {
    require_fields(&[
        ("label", present(&body.label)),
        ("amount", body.amount.is_some()),
        ("category", present(&body.category)),
    ])?;

    let date = match body.date.as_deref() {
        Some(value) => parse_date("date", value)?,
        None => Utc::now().date_naive(),
    };

    let mut tx = state.pool.begin().await?;
    let created = expense::insert(
        &mut tx,
        &NewExpense {
            label: body.label.unwrap(),
            amount: body.amount.unwrap(),
            category: body.category.unwrap(),
            description: body.description,
            date,
        },
    )
    .await?;
    tx.commit().await?;

    Ok(ApiResponse::created(created))
}

/// GET /api/expenses - most recent first
pub async fn list(
    State(state): State<AppState>,
    Query(page_query): Query<PageQuery>,
) -> ApiResult<Paginated<Expense>> {
    let (page, per_page) = page_query.resolve();
    let offset = PageQuery::offset(page, per_page);

    let mut conn = state.pool.acquire().await?;
    let total = expense::count(&mut conn).await?;
    let items = expense::list(&mut conn, per_page, offset).await?;

    Ok(ApiResponse::success(Paginated::new(items, total, page, per_page)))
}

/// GET /api/expenses/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Expense> {
    let mut conn = state.pool.acquire().await?;
    let found = expense::find(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Expense {} not found", id)))?;
    Ok(ApiResponse::success(found))
}

#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    pub label: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

/// PUT /api/expenses/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateExpenseRequest>,
) -> ApiResult<Expense> {
    let mut tx = state.pool.begin().await?;
    let mut found = expense::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Expense {} not found", id)))?;

    if let Some(label) = body.label {
        found.label = label;
    }
    if let Some(amount) = body.amount {
        found.amount = amount;
    }
    if let Some(category) = body.category {
        found.category = category;
    }
    if let Some(description) = body.description {
        found.description = Some(description);
    }
    if let Some(date) = body.date.as_deref() {
        found.date = parse_date("date", date)?;
    }

    expense::update(&mut tx, &found).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(found))
}

/// DELETE /api/expenses/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut tx = state.pool.begin().await?;
    expense::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Expense {} not found", id)))?;

    expense::delete(&mut tx, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Expense deleted" })))
}
