//! Identity store: account lifecycle and credential verification.
//!
//! Every function takes the caller's transaction handle so that multi-entity
//! flows (enrollment, teacher creation) commit or roll back as one unit.

use bcrypt::{hash, verify, DEFAULT_COST};
use sqlx::SqliteConnection;

use crate::database::models::account::{self, Account, NewAccount, Role};
use crate::error::ApiError;

/// Both unknown email and wrong password map to this message; the caller
/// must not learn which one it was.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Emails are compared and stored trimmed + lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(raw: &str) -> Result<String, ApiError> {
    hash(raw, DEFAULT_COST).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal_server_error("Failed to process credentials")
    })
}

pub fn verify_password(raw: &str, password_hash: &str) -> Result<bool, ApiError> {
    verify(raw, password_hash).map_err(|e| {
        tracing::error!("Password verification failed: {}", e);
        ApiError::internal_server_error("Failed to process credentials")
    })
}

pub struct CreateAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub role: Role,
}

pub async fn create_account(
    conn: &mut SqliteConnection,
    req: CreateAccount,
) -> Result<Account, ApiError> {
    let email = normalize_email(&req.email);

    if account::email_taken(conn, &email, None).await? {
        return Err(ApiError::conflict(format!("Email '{}' is already in use", email)));
    }

    let password_hash = hash_password(&req.password)?;
    let created = account::insert(
        conn,
        &NewAccount {
            email,
            password_hash,
            name: req.name,
            surname: req.surname,
            phone: req.phone,
            role: req.role,
        },
    )
    .await?;

    Ok(created)
}

pub async fn verify_credentials(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
) -> Result<Account, ApiError> {
    let email = normalize_email(email);

    let found = account::find_by_email(conn, &email)
        .await?
        .ok_or_else(|| ApiError::unauthorized(INVALID_CREDENTIALS))?;

    if verify_password(password, &found.password_hash)? {
        Ok(found)
    } else {
        Err(ApiError::unauthorized(INVALID_CREDENTIALS))
    }
}

/// Administrative reset, no old-password proof required
pub async fn update_password(
    conn: &mut SqliteConnection,
    account_id: i64,
    new_password: &str,
) -> Result<(), ApiError> {
    let found = account::find(conn, account_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account {} not found", account_id)))?;

    let password_hash = hash_password(new_password)?;
    account::set_password_hash(conn, found.id, &password_hash).await?;
    Ok(())
}

pub async fn change_own_password(
    conn: &mut SqliteConnection,
    account_id: i64,
    old_password: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let found = account::find(conn, account_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account {} not found", account_id)))?;

    if !verify_password(old_password, &found.password_hash)? {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let password_hash = hash_password(new_password)?;
    account::set_password_hash(conn, found.id, &password_hash).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_case_normalized() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn hash_round_trips_and_rejects_wrong_password() {
        let hashed = hash_password("secret123").unwrap();
        assert_ne!(hashed, "secret123");
        assert!(verify_password("secret123", &hashed).unwrap());
        assert!(!verify_password("secret124", &hashed).unwrap());
    }
}
