use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

/// Closed set of roles an authentication identity can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Parent,
    Accountant,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            "accountant" => Ok(Role::Accountant),
            _ => Err("must be one of: admin, teacher, student, parent, accountant".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub role: Role,
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = ?")
        .bind(email)
        .fetch_optional(conn)
        .await
}

/// Uniqueness probe; `exclude` skips the record itself on edit
pub async fn email_taken(
    conn: &mut SqliteConnection,
    email: &str,
    exclude: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM accounts WHERE email = ? AND id != ?",
    )
    .bind(email)
    .bind(exclude.unwrap_or(-1))
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewAccount,
) -> Result<Account, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO accounts (email, password_hash, name, surname, phone, role, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(&new.name)
    .bind(&new.surname)
    .bind(&new.phone)
    .bind(new.role)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    find(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_identity(
    conn: &mut SqliteConnection,
    id: i64,
    email: &str,
    name: &str,
    surname: &str,
    phone: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE accounts SET email = ?, name = ?, surname = ?, phone = ?, updated_at = ? WHERE id = ?",
    )
    .bind(email)
    .bind(name)
    .bind(surname)
    .bind(phone)
    .bind(Utc::now())
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn set_password_hash(
    conn: &mut SqliteConnection,
    id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE accounts SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Accounts carrying a given role, paginated
pub async fn list_by_role(
    conn: &mut SqliteConnection,
    role: Role,
    limit: i64,
    offset: i64,
) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT * FROM accounts WHERE role = ? ORDER BY id LIMIT ? OFFSET ?",
    )
    .bind(role)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await
}

pub async fn count_by_role(conn: &mut SqliteConnection, role: Role) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE role = ?")
        .bind(role)
        .fetch_one(conn)
        .await
}
