use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::pagination::{PageQuery, Paginated};
use crate::api::response::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::student::{self, Sex, StudentView};
use crate::error::ApiError;
use crate::services::enrollment::{self, EnrollStudent, StudentPatch};
use crate::validation::{parse_date, parse_enum, present, require_fields};

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub sex: Option<String>,
    pub matricule: Option<String>,
    pub birth_date: Option<String>,
    pub address: Option<String>,
    pub class_id: Option<i64>,
    pub guardian_name: Option<String>,
    pub guardian_surname: Option<String>,
    pub guardian_phone: Option<String>,
}

/// POST /api/students - enroll a student (creates guardian + student accounts)
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateStudentRequest>,
) -> ApiResult<StudentView> {
    require_fields(&[
        ("name", present(&body.name)),
        ("surname", present(&body.surname)),
        ("sex", present(&body.sex)),
        ("matricule", present(&body.matricule)),
        ("class_id", body.class_id.is_some()),
        ("guardian_name", present(&body.guardian_name)),
        ("guardian_surname", present(&body.guardian_surname)),
        ("guardian_phone", present(&body.guardian_phone)),
    ])?;

    let sex = parse_enum::<Sex>("sex", body.sex.as_deref().unwrap())?;
    let birth_date = match body.birth_date.as_deref() {
        Some(value) => Some(parse_date("birth_date", value)?),
        None => None,
    };

    let mut tx = state.pool.begin().await?;
    let created = enrollment::enroll_student(
        &mut tx,
        EnrollStudent {
            name: body.name.unwrap(),
            surname: body.surname.unwrap(),
            sex,
            matricule: body.matricule.unwrap(),
            birth_date,
            address: body.address,
            class_id: body.class_id.unwrap(),
            guardian_name: body.guardian_name.unwrap(),
            guardian_surname: body.guardian_surname.unwrap(),
            guardian_phone: body.guardian_phone.unwrap(),
        },
    )
    .await?;
    let view = created.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(view))
}

/// GET /api/students - paginated listing
pub async fn list(
    State(state): State<AppState>,
    Query(page_query): Query<PageQuery>,
) -> ApiResult<Paginated<StudentView>> {
    let (page, per_page) = page_query.resolve();
    let offset = PageQuery::offset(page, per_page);

    let mut conn = state.pool.acquire().await?;
    let total = student::count(&mut conn).await?;
    let students = student::list(&mut conn, per_page, offset).await?;

    let mut items = Vec::with_capacity(students.len());
    for s in students {
        items.push(s.into_view(&mut conn).await?);
    }

    Ok(ApiResponse::success(Paginated::new(items, total, page, per_page)))
}

/// GET /api/students/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StudentView> {
    let mut conn = state.pool.acquire().await?;
    let found = student::find(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Student {} not found", id)))?;
    Ok(ApiResponse::success(found.into_view(&mut conn).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub sex: Option<String>,
    pub matricule: Option<String>,
    pub birth_date: Option<String>,
    pub address: Option<String>,
    pub class_id: Option<i64>,
    pub guardian_name: Option<String>,
    pub guardian_surname: Option<String>,
    pub guardian_phone: Option<String>,
}

/// PUT /api/students/:id - partial update, synced into linked accounts
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStudentRequest>,
) -> ApiResult<StudentView> {
    let sex = match body.sex.as_deref() {
        Some(value) => Some(parse_enum::<Sex>("sex", value)?),
        None => None,
    };
    let birth_date = match body.birth_date.as_deref() {
        Some(value) => Some(parse_date("birth_date", value)?),
        None => None,
    };

    let mut tx = state.pool.begin().await?;
    let updated = enrollment::update_student(
        &mut tx,
        id,
        StudentPatch {
            name: body.name,
            surname: body.surname,
            sex,
            matricule: body.matricule,
            birth_date,
            address: body.address,
            class_id: body.class_id,
            guardian_name: body.guardian_name,
            guardian_surname: body.guardian_surname,
            guardian_phone: body.guardian_phone,
        },
    )
    .await?;
    let view = updated.into_view(&mut tx).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(view))
}

/// DELETE /api/students/:id - removes the student and its own account
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut tx = state.pool.begin().await?;
    enrollment::delete_student(&mut tx, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Student and linked account deleted" })))
}
