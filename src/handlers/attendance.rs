use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::pagination::{PageQuery, Paginated};
use crate::api::response::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::attendance::{
    self, AttendanceFilter, AttendanceStatus, AttendanceView, NewAttendanceRecord,
};
use crate::database::models::class;
use crate::database::models::student;
use crate::database::models::teacher;
use crate::error::ApiError;
use crate::validation::{parse_date, parse_enum, present, require_fields};

#[derive(Debug, Deserialize)]
pub struct CreateAttendanceRequest {
    pub student_id: Option<i64>,
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub justified: Option<bool>,
    pub reason: Option<String>,
    pub comment: Option<String>,
}

/// POST /api/attendance - date defaults to today
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateAttendanceRequest>,
) -> ApiResult<AttendanceView> {
    require_fields(&[
        ("student_id", body.student_id.is_some()),
        ("class_id", body.class_id.is_some()),
        ("teacher_id", body.teacher_id.is_some()),
        ("status", present(&body.status)),
    ])?;

    let status = parse_enum::<AttendanceStatus>("status", body.status.as_deref().unwrap())?;
    let date = match body.date.as_deref() {
        Some(value) => parse_date("date", value)?,
        None => Utc::now().date_naive(),
    };

    let student_id = body.student_id.unwrap();
    let class_id = body.class_id.unwrap();
    let teacher_id = body.teacher_id.unwrap();

    let mut tx = state.pool.begin().await?;
    student::find(&mut tx, student_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Student {} not found", student_id)))?;
    class::find(&mut tx, class_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Class {} not found", class_id)))?;
    teacher::find(&mut tx, teacher_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Teacher {} not found", teacher_id)))?;

    let created = attendance::insert(
        &mut tx,
        &NewAttendanceRecord {
            date,
            status,
            justified: body.justified.unwrap_or(false),
            reason: body.reason,
            comment: body.comment,
            student_id,
            class_id,
            teacher_id,
        },
    )
    .await?;
    let view = created.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(view))
}

#[derive(Debug, Deserialize)]
pub struct AttendanceListQuery {
    pub student_id: Option<i64>,
    pub class_id: Option<i64>,
    pub date: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// GET /api/attendance - optional student/class/date filters
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<AttendanceListQuery>,
) -> ApiResult<Paginated<AttendanceView>> {
    let date = match query.date.as_deref() {
        Some(value) => Some(parse_date("date", value)?),
        None => None,
    };
    let filter =
        AttendanceFilter { student_id: query.student_id, class_id: query.class_id, date };

    let page_query = PageQuery { page: query.page, per_page: query.per_page };
    let (page, per_page) = page_query.resolve();
    let offset = PageQuery::offset(page, per_page);

    let mut conn = state.pool.acquire().await?;
    let total = attendance::count(&mut conn, &filter).await?;
    let records = attendance::list(&mut conn, &filter, per_page, offset).await?;

    let mut items = Vec::with_capacity(records.len());
    for record in records {
        items.push(record.into_view(&mut conn).await?);
    }

    Ok(ApiResponse::success(Paginated::new(items, total, page, per_page)))
}

/// GET /api/attendance/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<AttendanceView> {
    let mut conn = state.pool.acquire().await?;
    let found = attendance::find(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Attendance record {} not found", id)))?;
    Ok(ApiResponse::success(found.into_view(&mut conn).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAttendanceRequest {
    pub status: Option<String>,
    pub date: Option<String>,
    pub justified: Option<bool>,
    pub reason: Option<String>,
    pub comment: Option<String>,
}

/// PUT /api/attendance/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateAttendanceRequest>,
) -> ApiResult<AttendanceView> {
    let mut tx = state.pool.begin().await?;
    let mut found = attendance::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Attendance record {} not found", id)))?;

    if let Some(status) = body.status.as_deref() {
        found.status = parse_enum::<AttendanceStatus>("status", status)?;
    }
    if let Some(date) = body.date.as_deref() {
        found.date = parse_date("date", date)?;
    }
    if let Some(justified) = body.justified {
        found.justified = justified;
    }
    if let Some(reason) = body.reason {
        found.reason = Some(reason);
    }
    if let Some(comment) = body.comment {
        found.comment = Some(comment);
    }

    attendance::update(&mut tx, &found).await?;
    let view = found.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(view))
}

/// DELETE /api/attendance/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut tx = state.pool.begin().await?;
    attendance::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Attendance record {} not found", id)))?;

    attendance::delete(&mut tx, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Attendance record deleted" })))
}
