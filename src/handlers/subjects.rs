use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::response::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::subject::{self, Subject};
use crate::error::ApiError;
use crate::validation::{present, require_fields};

#[derive(Debug, Deserialize)]
pub struct SubjectRequest {
    pub name: Option<String>,
    pub code: Option<String>,
}

/// POST /api/subjects
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<SubjectRequest>,
) -> ApiResult<Subject> {
    require_fields(&[("name", present(&body.name)), ("code", present(&body.code))])?;

    let name = body.name.unwrap();
    let code = body.code.unwrap();

    let mut tx = state.pool.begin().await?;
    if subject::name_taken(&mut tx, &name, None).await? {
        return Err(ApiError::conflict(format!("Subject '{}' already exists", name)));
    }
    if subject::code_taken(&mut tx, &code, None).await? {
        return Err(ApiError::conflict(format!("Subject code '{}' already exists", code)));
    }

    let created = subject::insert(&mut tx, &name, &code).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(created))
}

/// GET /api/subjects
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Subject>> {
    let mut conn = state.pool.acquire().await?;
    Ok(ApiResponse::success(subject::list(&mut conn).await?))
}

/// GET /api/subjects/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Subject> {
    let mut conn = state.pool.acquire().await?;
    let found = subject::find(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Subject {} not found", id)))?;
    Ok(ApiResponse::success(found))
}

/// PUT /api/subjects/:id - both fields required, uniqueness excludes self
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SubjectRequest>,
) -> ApiResult<Subject> {
    require_fields(&[("name", present(&body.name)), ("code", present(&body.code))])?;

    let mut tx = state.pool.begin().await?;
    let mut found = subject::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Subject {} not found", id)))?;

    let name = body.name.unwrap();
    let code = body.code.unwrap();

    if subject::name_taken(&mut tx, &name, Some(found.id)).await? {
        return Err(ApiError::conflict(format!("Subject '{}' already exists", name)));
    }
    if subject::code_taken(&mut tx, &code, Some(found.id)).await? {
        return Err(ApiError::conflict(format!("Subject code '{}' already exists", code)));
    }

    found.name = name;
    found.code = code;
    subject::update(&mut tx, &found).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(found))
}

/// DELETE /api/subjects/:id - blocked while anything references the subject
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut tx = state.pool.begin().await?;
    let found = subject::find(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Subject {} not found", id)))?;

    if subject::reference_count(&mut tx, found.id).await? > 0 {
        return Err(ApiError::conflict(
            "Subject is still referenced by teachers, schedule slots or grades",
        ));
    }

    subject::delete(&mut tx, found.id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Subject deleted" })))
}
