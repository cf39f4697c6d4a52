use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqliteConnection;

use crate::api::response::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::class;
use crate::database::models::schedule::{self, NewScheduleSlot, ScheduleSlotView, Weekday};
use crate::database::models::subject;
use crate::database::models::teacher;
use crate::error::ApiError;
use crate::validation::{
    check_time_order, parse_enum, parse_time, parse_time_range, present, require_fields,
};

#[derive(Debug, Deserialize)]
pub struct CreateSlotRequest {
    pub weekday: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Legacy single-field form "HH:MM-HH:MM"
    pub time_range: Option<String>,
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub subject_id: Option<i64>,
}

/// Accepts either start_time + end_time or the combined time_range form
fn resolve_times(
    start_time: &Option<String>,
    end_time: &Option<String>,
    time_range: &Option<String>,
) -> Result<(String, String), ApiError> {
    let (start, end) = if present(time_range) {
        parse_time_range("time_range", time_range.as_deref().unwrap())?
    } else {
        require_fields(&[
            ("start_time", present(start_time)),
            ("end_time", present(end_time)),
        ])?;
        (
            parse_time("start_time", start_time.as_deref().unwrap())?,
            parse_time("end_time", end_time.as_deref().unwrap())?,
        )
    };

    check_time_order(&start, &end)?;
    Ok((start, end))
}

async fn ensure_slot_references(
    conn: &mut SqliteConnection,
    class_id: i64,
    teacher_id: i64,
    subject_id: i64,
) -> Result<(), ApiError> {
    class::find(conn, class_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Class {} not found", class_id)))?;
    teacher::find(conn, teacher_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Teacher {} not found", teacher_id)))?;
    subject::find(conn, subject_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Subject {} not found", subject_id)))?;
    Ok(())
}

/// POST /api/schedule - no overlap detection, identical slots are permitted
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateSlotRequest>,
) -> ApiResult<ScheduleSlotView> {
    require_fields(&[
        ("weekday", present(&body.weekday)),
        ("class_id", body.class_id.is_some()),
        ("teacher_id", body.teacher_id.is_some()),
        ("subject_id", body.subject_id.is_some()),
    ])?;

    let weekday = parse_enum::<Weekday>("weekday", body.weekday.as_deref().unwrap())?;
    let (start_time, end_time) = resolve_times(&body.start_time, &body.end_time, &body.time_range)?;

    let class_id = body.class_id.unwrap();
    let teacher_id = body.teacher_id.unwrap();
    let subject_id = body.subject_id.unwrap();

    let mut tx = state.pool.begin().await?;
    ensure_slot_references(&mut tx, class_id, teacher_id, subject_id).await?;

    let created = schedule::insert(
        &mut tx,
        &NewScheduleSlot { weekday, start_time, end_time, class_id, teacher_id, subject_id },
    )
    .await?;
    let view = created.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(view))
}

/// GET /api/schedule
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<ScheduleSlotView>> {
    let mut conn = state.pool.acquire().await?;
    let slots = schedule::list(&mut conn).await?;

    let mut views = Vec::with_capacity(slots.len());
    for slot in slots {
        views.push(slot.into_view(&mut conn).await?);
    }

    Ok(ApiResponse::success(views))
}

/// GET /api/schedule/class/:class_id - one class's timetable
pub async fn list_by_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> ApiResult<Vec<ScheduleSlotView>> {
    let mut conn = state.pool.acquire().await?;
    class::find(&mut conn, class_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Class {} not found", class_id)))?;

    let slots = schedule::list_by_class(&mut conn, class_id).await?;
    let mut views = Vec::with_capacity(slots.len());
    for slot in slots {
        views.push(slot.into_view(&mut conn).await?);
    }

    Ok(ApiResponse::success(views))
}

/// GET /api/schedule/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ScheduleSlotView> {
    let mut conn = state.pool.acquire().await?;
    let found = schedule::find(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Schedule slot {} not found", id)))?;
    Ok(ApiResponse::success(found.into_view(&mut conn).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSlotRequest {
    pub weekday: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_range: Option<String>,
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub subject_id: Option<i64>,
}

/// PUT /api/schedule/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSlotRequest>,
) -> ApiResult<ScheduleSlotView> {
    let mut tx = state.pool.begin().await?;
    let mut found = schedule::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Schedule slot {} not found", id)))?;

    if let Some(weekday) = body.weekday.as_deref() {
        found.weekday = parse_enum::<Weekday>("weekday", weekday)?;
    }

    if present(&body.time_range) || present(&body.start_time) || present(&body.end_time) {
        let (start, end) = if present(&body.time_range) {
            parse_time_range("time_range", body.time_range.as_deref().unwrap())?
        } else {
            let start = match body.start_time.as_deref() {
                Some(value) => parse_time("start_time", value)?,
                None => found.start_time.clone(),
            };
            let end = match body.end_time.as_deref() {
                Some(value) => parse_time("end_time", value)?,
                None => found.end_time.clone(),
            };
            (start, end)
        };
        check_time_order(&start, &end)?;
        found.start_time = start;
        found.end_time = end;
    }

    if let Some(class_id) = body.class_id {
        class::find(&mut tx, class_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Class {} not found", class_id)))?;
        found.class_id = class_id;
    }
    if let Some(teacher_id) = body.teacher_id {
        teacher::find(&mut tx, teacher_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Teacher {} not found", teacher_id)))?;
        found.teacher_id = teacher_id;
    }
    if let Some(subject_id) = body.subject_id {
        subject::find(&mut tx, subject_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Subject {} not found", subject_id)))?;
        found.subject_id = subject_id;
    }

    schedule::update(&mut tx, &found).await?;
    let view = found.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(view))
}

/// DELETE /api/schedule/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut tx = state.pool.begin().await?;
    schedule::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Schedule slot {} not found", id)))?;

    schedule::delete(&mut tx, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Schedule slot deleted" })))
}
