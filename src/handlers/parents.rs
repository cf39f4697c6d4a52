use axum::extract::{Path, Query, State};
use serde_json::{json, Value};

use crate::api::pagination::{PageQuery, Paginated};
use crate::api::response::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::account::{self, Account, Role};
use crate::database::models::student;
use crate::error::ApiError;
use crate::services::enrollment;

/// GET /api/parents - paginated guardian accounts
pub async fn list(
    State(state): State<AppState>,
    Query(page_query): Query<PageQuery>,
) -> ApiResult<Paginated<Account>> {
    let (page, per_page) = page_query.resolve();
    let offset = PageQuery::offset(page, per_page);

    let mut conn = state.pool.acquire().await?;
    let total = account::count_by_role(&mut conn, Role::Parent).await?;
    let items = account::list_by_role(&mut conn, Role::Parent, per_page, offset).await?;

    Ok(ApiResponse::success(Paginated::new(items, total, page, per_page)))
}

/// GET /api/parents/:id/children - students guarded by this parent
pub async fn children(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut conn = state.pool.acquire().await?;
    let parent = account::find(&mut conn, id)
        .await?
        .filter(|a| a.role == Role::Parent)
        .ok_or_else(|| ApiError::not_found(format!("Parent account {} not found", id)))?;

    let students = student::list_by_guardian(&mut conn, parent.id).await?;
    let mut views = Vec::with_capacity(students.len());
    for s in students {
        views.push(s.into_view(&mut conn).await?);
    }

    Ok(ApiResponse::success(json!({
        "parent": parent,
        "children": views,
    })))
}

/// DELETE /api/parents/:id - blocked while the parent still guards students
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let mut tx = state.pool.begin().await?;
    enrollment::delete_parent(&mut tx, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Parent account deleted" })))
}
