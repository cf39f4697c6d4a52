use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct SubjectRef {
    pub id: i64,
    pub name: String,
}

impl Subject {
    pub fn as_ref_view(&self) -> SubjectRef {
        SubjectRef { id: self.id, name: self.name.clone() }
    }
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>("SELECT * FROM subjects ORDER BY id")
        .fetch_all(conn)
        .await
}

pub async fn name_taken(
    conn: &mut SqliteConnection,
    name: &str,
    exclude: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects WHERE name = ? AND id != ?")
        .bind(name)
        .bind(exclude.unwrap_or(-1))
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

pub async fn code_taken(
    conn: &mut SqliteConnection,
    code: &str,
    exclude: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects WHERE code = ? AND id != ?")
        .bind(code)
        .bind(exclude.unwrap_or(-1))
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    name: &str,
    code: &str,
) -> Result<Subject, sqlx::Error> {
    let result = sqlx::query("INSERT INTO subjects (name, code) VALUES (?, ?)")
        .bind(name)
        .bind(code)
        .execute(&mut *conn)
        .await?;

    let id = result.last_insert_rowid();
    find(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update(conn: &mut SqliteConnection, subject: &Subject) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE subjects SET name = ?, code = ? WHERE id = ?")
        .bind(&subject.name)
        .bind(&subject.code)
        .bind(subject.id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Rows in other tables that still reference this subject
pub async fn reference_count(
    conn: &mut SqliteConnection,
    subject_id: i64,
) -> Result<i64, sqlx::Error> {
    let assignments: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM teacher_subjects WHERE subject_id = ?")
            .bind(subject_id)
            .fetch_one(&mut *conn)
            .await?;
    let slots: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schedule_slots WHERE subject_id = ?")
        .bind(subject_id)
        .fetch_one(&mut *conn)
        .await?;
    let grades: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM grades WHERE subject_id = ?")
        .bind(subject_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(assignments + slots + grades)
}
