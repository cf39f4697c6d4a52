use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::response::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::class::{self, ClassView, NewClass};
use crate::database::models::teacher;
use crate::error::ApiError;
use crate::validation::{present, require_fields};

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub name: Option<String>,
    pub room: Option<String>,
    pub level: Option<String>,
    pub school_year: Option<String>,
    pub head_teacher_id: Option<i64>,
}

/// POST /api/classes
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateClassRequest>,
) -> ApiResult<ClassView> {
    require_fields(&[
        ("name", present(&body.name)),
        ("room", present(&body.room)),
        ("level", present(&body.level)),
        ("school_year", present(&body.school_year)),
    ])?;

    let mut tx = state.pool.begin().await?;

    if let Some(teacher_id) = body.head_teacher_id {
        teacher::find(&mut tx, teacher_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Teacher {} not found", teacher_id)))?;
    }

    let name = body.name.unwrap();
    if class::name_taken(&mut tx, &name, None).await? {
        return Err(ApiError::conflict(format!("Class '{}' already exists", name)));
    }

    let created = class::insert(
        &mut tx,
        &NewClass {
            name,
            room: body.room.unwrap(),
            level: body.level.unwrap(),
            school_year: body.school_year.unwrap(),
            head_teacher_id: body.head_teacher_id,
        },
    )
    .await?;
    let view = created.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(view))
}

/// GET /api/classes
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<ClassView>> {
    let mut conn = state.pool.acquire().await?;
    let classes = class::list(&mut conn).await?;

    let mut views = Vec::with_capacity(classes.len());
    for c in classes {
        views.push(c.into_view(&mut conn).await?);
    }

    Ok(ApiResponse::success(views))
}

/// GET /api/classes/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<ClassView> {
    let mut conn = state.pool.acquire().await?;
    let found = class::find(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Class {} not found", id)))?;
    Ok(ApiResponse::success(found.into_view(&mut conn).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub room: Option<String>,
    pub level: Option<String>,
    pub school_year: Option<String>,
    pub head_teacher_id: Option<i64>,
}

/// PUT /api/classes/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateClassRequest>,
) -> ApiResult<ClassView> {
    let mut tx = state.pool.begin().await?;
    let mut found = class::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Class {} not found", id)))?;

    if let Some(name) = body.name {
        if class::name_taken(&mut tx, &name, Some(found.id)).await? {
            return Err(ApiError::conflict(format!("Class '{}' already exists", name)));
        }
        found.name = name;
    }
    if let Some(room) = body.room {
        found.room = room;
    }
    if let Some(level) = body.level {
        found.level = level;
    }
    if let Some(school_year) = body.school_year {
        found.school_year = school_year;
    }
    if let Some(teacher_id) = body.head_teacher_id {
        teacher::find(&mut tx, teacher_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Teacher {} not found", teacher_id)))?;
        found.head_teacher_id = Some(teacher_id);
    }

    class::update(&mut tx, &found).await?;
    let view = found.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(view))
}

/// DELETE /api/classes/:id - blocked while anything references the class
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut tx = state.pool.begin().await?;
    let found = class::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Class {} not found", id)))?;

    if class::reference_count(&mut tx, found.id).await? > 0 {
        return Err(ApiError::conflict(
            "Class is still referenced by students, schedule slots or attendance records",
        ));
    }

    class::delete(&mut tx, found.id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Class deleted" })))
}
