use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::response::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::teacher::{self, TeacherView};
use crate::error::ApiError;
use crate::services::enrollment::{self, NewTeacherProfile, TeacherPatch};
use crate::validation::{present, require_fields};

#[derive(Debug, Deserialize)]
pub struct CreateTeacherRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub matricule: Option<String>,
    #[serde(default)]
    pub subject_ids: Vec<i64>,
}

/// POST /api/teachers - teacher profile plus account with the default password
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateTeacherRequest>,
) -> ApiResult<TeacherView> {
    require_fields(&[
        ("email", present(&body.email)),
        ("name", present(&body.name)),
        ("surname", present(&body.surname)),
        ("phone", present(&body.phone)),
        ("matricule", present(&body.matricule)),
    ])?;

    let mut tx = state.pool.begin().await?;
    let created = enrollment::create_teacher(
        &mut tx,
        NewTeacherProfile {
            email: body.email.unwrap(),
            name: body.name.unwrap(),
            surname: body.surname.unwrap(),
            phone: body.phone.unwrap(),
            matricule: body.matricule.unwrap(),
            subject_ids: body.subject_ids,
        },
    )
    .await?;
    let view = created.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(view))
}

/// GET /api/teachers
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<TeacherView>> {
    let mut conn = state.pool.acquire().await?;
    let teachers = teacher::list(&mut conn).await?;

    let mut views = Vec::with_capacity(teachers.len());
    for t in teachers {
        views.push(t.into_view(&mut conn).await?);
    }

    Ok(ApiResponse::success(views))
}

/// GET /api/teachers/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<TeacherView> {
    let mut conn = state.pool.acquire().await?;
    let found = teacher::find(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Teacher {} not found", id)))?;
    Ok(ApiResponse::success(found.into_view(&mut conn).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTeacherRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub matricule: Option<String>,
    pub subject_ids: Option<Vec<i64>>,
}

/// PUT /api/teachers/:id - subject list, when given, replaces the whole set
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTeacherRequest>,
) -> ApiResult<TeacherView> {
    let mut tx = state.pool.begin().await?;
    let updated = enrollment::update_teacher(
        &mut tx,
        id,
        TeacherPatch {
            email: body.email,
            name: body.name,
            surname: body.surname,
            phone: body.phone,
            matricule: body.matricule,
            subject_ids: body.subject_ids,
        },
    )
    .await?;
    let view = updated.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(view))
}

/// DELETE /api/teachers/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut tx = state.pool.begin().await?;
    enrollment::delete_teacher(&mut tx, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Teacher and linked account deleted" })))
}
