use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::pagination::{PageQuery, Paginated};
use crate::api::response::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::grade::{self, GradeKind, GradeView, NewGrade};
use crate::database::models::student;
use crate::database::models::subject;
use crate::database::models::teacher;
use crate::error::ApiError;
use crate::validation::{parse_enum, present, require_fields};

#[derive(Debug, Deserialize)]
pub struct CreateGradeRequest {
    pub value: Option<f64>,
    pub kind: Option<String>,
    pub period: Option<String>,
    pub student_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

/// POST /api/grades
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateGradeRequest>,
) -> ApiResult<GradeView> {
    require_fields(&[
        ("value", body.value.is_some()),
        ("kind", present(&body.kind)),
        ("period", present(&body.period)),
        ("student_id", body.student_id.is_some()),
        ("subject_id", body.subject_id.is_some()),
    ])?;

    let kind = parse_enum::<GradeKind>("kind", body.kind.as_deref().unwrap())?;
    let student_id = body.student_id.unwrap();
    let subject_id = body.subject_id.unwrap();

    let mut tx = state.pool.begin().await?;
    student::find(&mut tx, student_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Student {} not found", student_id)))?;
    subject::find(&mut tx, subject_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Subject {} not found", subject_id)))?;
    if let Some(teacher_id) = body.teacher_id {
        teacher::find(&mut tx, teacher_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Teacher {} not found", teacher_id)))?;
    }

    let created = grade::insert(
        &mut tx,
        &NewGrade {
            value: body.value.unwrap(),
            kind,
            period: body.period.unwrap(),
            student_id,
            subject_id,
            teacher_id: body.teacher_id,
        },
    )
    .await?;
    let view = created.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(view))
}

/// GET /api/grades
pub async fn list(
    State(state): State<AppState>,
    Query(page_query): Query<PageQuery>,
) -> ApiResult<Paginated<GradeView>> {
    let (page, per_page) = page_query.resolve();
    let offset = PageQuery::offset(page, per_page);

    let mut conn = state.pool.acquire().await?;
    let total = grade::count(&mut conn).await?;
    let grades = grade::list(&mut conn, per_page, offset).await?;

    let mut items = Vec::with_capacity(grades.len());
    for g in grades {
        items.push(g.into_view(&mut conn).await?);
    }

    Ok(ApiResponse::success(Paginated::new(items, total, page, per_page)))
}

/// GET /api/grades/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<GradeView> {
    let mut conn = state.pool.acquire().await?;
    let found = grade::find(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Grade {} not found", id)))?;
    Ok(ApiResponse::success(found.into_view(&mut conn).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateGradeRequest {
    pub value: Option<f64>,
    pub kind: Option<String>,
    pub period: Option<String>,
    pub subject_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

/// PUT /api/grades/:id - the graded student never changes
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateGradeRequest>,
) -> ApiResult<GradeView> {
    let mut tx = state.pool.begin().await?;
    let mut found = grade::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Grade {} not found", id)))?;

    if let Some(value) = body.value {
        found.value = value;
    }
    if let Some(kind) = body.kind.as_deref() {
        found.kind = parse_enum::<GradeKind>("kind", kind)?;
    }
    if let Some(period) = body.period {
        found.period = period;
    }
    if let Some(subject_id) = body.subject_id {
        subject::find(&mut tx, subject_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Subject {} not found", subject_id)))?;
        found.subject_id = subject_id;
    }
    if let Some(teacher_id) = body.teacher_id {
        teacher::find(&mut tx, teacher_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Teacher {} not found", teacher_id)))?;
        found.teacher_id = Some(teacher_id);
    }

    grade::update(&mut tx, &found).await?;
    let view = found.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(view))
}

/// DELETE /api/grades/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut tx = state.pool.begin().await?;
    grade::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Grade {} not found", id)))?;

    grade::delete(&mut tx, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Grade deleted" })))
}
