use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::response::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::auth::{generate_jwt, Claims};
use crate::config;
use crate::database::models::account::{self, Account, Role};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::identity::{self, CreateAccount};
use crate::validation::{parse_enum, present, require_fields};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

/// POST /api/auth/signup - create an account directly (admin/back-office)
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> ApiResult<Account> {
    require_fields(&[
        ("email", present(&body.email)),
        ("password", present(&body.password)),
        ("name", present(&body.name)),
        ("surname", present(&body.surname)),
    ])?;

    let role = match body.role.as_deref() {
        Some(value) => parse_enum::<Role>("role", value)?,
        None => Role::Student,
    };

    let mut tx = state.pool.begin().await?;
    let created = identity::create_account(
        &mut tx,
        CreateAccount {
            email: body.email.unwrap(),
            password: body.password.unwrap(),
            name: body.name.unwrap(),
            surname: body.surname.unwrap(),
            phone: body.phone,
            role,
        },
    )
    .await?;
    tx.commit().await?;

    Ok(ApiResponse::created(created))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/login - verify credentials and issue a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Value> {
    require_fields(&[
        ("email", present(&body.email)),
        ("password", present(&body.password)),
    ])?;

    let mut conn = state.pool.acquire().await?;
    let found =
        identity::verify_credentials(&mut conn, &body.email.unwrap(), &body.password.unwrap())
            .await?;

    let claims = Claims::new(found.id, found.email.clone(), found.role);
    let token = generate_jwt(claims).map_err(|e| {
        tracing::error!("Token generation failed: {}", e);
        ApiError::internal_server_error("Failed to issue token")
    })?;

    let expires_in = config::config().security.jwt_expiry_hours * 3600;
    Ok(ApiResponse::success(json!({
        "token": token,
        "account": found,
        "expires_in": expires_in,
    })))
}

/// GET /api/auth/whoami - account behind the presented token
pub async fn whoami(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Account> {
    let mut conn = state.pool.acquire().await?;
    let found = account::find(&mut conn, auth.account_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account {} not found", auth.account_id)))?;
    Ok(ApiResponse::success(found))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// PUT /api/auth/password - change own password, old password required
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<Value> {
    require_fields(&[
        ("old_password", present(&body.old_password)),
        ("new_password", present(&body.new_password)),
    ])?;

    let mut tx = state.pool.begin().await?;
    identity::change_own_password(
        &mut tx,
        auth.account_id,
        &body.old_password.unwrap(),
        &body.new_password.unwrap(),
    )
    .await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Password updated" })))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: Option<String>,
}

/// PUT /api/auth/accounts/:id/password - administrative reset
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(body): Json<ResetPasswordRequest>,
) -> ApiResult<Value> {
    auth.require_role(Role::Admin)?;
    require_fields(&[("new_password", present(&body.new_password))])?;

    let mut tx = state.pool.begin().await?;
    identity::update_password(&mut tx, id, &body.new_password.unwrap()).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(json!({ "message": "Password updated" })))
}
