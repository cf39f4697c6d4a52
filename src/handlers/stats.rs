use axum::extract::State;
use serde_json::{json, Value};

use crate::api::response::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::expense;
use crate::database::models::payment;
use crate::database::models::student::{self, Sex};

/// GET /api/stats - headline counters for the dashboard
pub async fn overview(State(state): State<AppState>) -> ApiResult<Value> {
    let mut conn = state.pool.acquire().await?;

    let total_students = student::count(&mut conn).await?;
    let total_boys = student::count_by_sex(&mut conn, Sex::M).await?;
    let total_girls = student::count_by_sex(&mut conn, Sex::F).await?;
    let total_payments = payment::total_amount(&mut conn).await?;
    let pending_payments = payment::count_pending(&mut conn).await?;
    let total_expenses = expense::total_amount(&mut conn).await?;

    Ok(ApiResponse::success(json!({
        "total_students": total_students,
        "total_boys": total_boys,
        "total_girls": total_girls,
        "total_payments": total_payments,
        "pending_payments": pending_payments,
        "total_expenses": total_expenses,
    })))
}
