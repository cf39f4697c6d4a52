use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::database::models::account;
use crate::database::models::subject::Subject;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Teacher {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub matricule: String,
}

/// Public projection with the account email and taught subjects embedded
#[derive(Debug, Serialize)]
pub struct TeacherView {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub matricule: String,
    pub email: String,
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Serialize)]
pub struct TeacherRef {
    pub id: i64,
    pub name: String,
    pub surname: String,
}

impl Teacher {
    pub fn as_ref_view(&self) -> TeacherRef {
        TeacherRef { id: self.id, name: self.name.clone(), surname: self.surname.clone() }
    }

    pub async fn into_view(self, conn: &mut SqliteConnection) -> Result<TeacherView, sqlx::Error> {
        let email = account::find(conn, self.account_id)
            .await?
            .map(|a| a.email)
            .ok_or(sqlx::Error::RowNotFound)?;
        let subjects = subjects_for(conn, self.id).await?;

        Ok(TeacherView {
            id: self.id,
            name: self.name,
            surname: self.surname,
            phone: self.phone,
            matricule: self.matricule,
            email,
            subjects,
        })
    }
}

pub struct NewTeacher {
    pub account_id: i64,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub matricule: String,
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Teacher>, sqlx::Error> {
    sqlx::query_as::<_, Teacher>("SELECT * FROM teachers WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Teacher>, sqlx::Error> {
    sqlx::query_as::<_, Teacher>("SELECT * FROM teachers ORDER BY id")
        .fetch_all(conn)
        .await
}

pub async fn matricule_taken(
    conn: &mut SqliteConnection,
    matricule: &str,
    exclude: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM teachers WHERE matricule = ? AND id != ?")
            .bind(matricule)
            .bind(exclude.unwrap_or(-1))
            .fetch_one(conn)
            .await?;
    Ok(count > 0)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewTeacher,
) -> Result<Teacher, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO teachers (account_id, name, surname, phone, matricule) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(new.account_id)
    .bind(&new.name)
    .bind(&new.surname)
    .bind(&new.phone)
    .bind(&new.matricule)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    find(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update(conn: &mut SqliteConnection, teacher: &Teacher) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE teachers SET name = ?, surname = ?, phone = ?, matricule = ? WHERE id = ?",
    )
    .bind(&teacher.name)
    .bind(&teacher.surname)
    .bind(&teacher.phone)
    .bind(&teacher.matricule)
    .bind(teacher.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM teachers WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn subjects_for(
    conn: &mut SqliteConnection,
    teacher_id: i64,
) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(
        "SELECT s.* FROM subjects s
         JOIN teacher_subjects ts ON ts.subject_id = s.id
         WHERE ts.teacher_id = ?
         ORDER BY s.id",
    )
    .bind(teacher_id)
    .fetch_all(conn)
    .await
}

/// Full-replacement semantics: the new set is the whole association
pub async fn replace_subjects(
    conn: &mut SqliteConnection,
    teacher_id: i64,
    subject_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM teacher_subjects WHERE teacher_id = ?")
        .bind(teacher_id)
        .execute(&mut *conn)
        .await?;

    for subject_id in subject_ids {
        sqlx::query("INSERT INTO teacher_subjects (teacher_id, subject_id) VALUES (?, ?)")
            .bind(teacher_id)
            .bind(subject_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Rows in other tables that still reference this teacher, by table
pub async fn reference_count(
    conn: &mut SqliteConnection,
    teacher_id: i64,
) -> Result<i64, sqlx::Error> {
    let slots: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schedule_slots WHERE teacher_id = ?")
        .bind(teacher_id)
        .fetch_one(&mut *conn)
        .await?;
    let attendance: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance WHERE teacher_id = ?")
        .bind(teacher_id)
        .fetch_one(&mut *conn)
        .await?;
    let head_of: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM classes WHERE head_teacher_id = ?")
        .bind(teacher_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(slots + attendance + head_of)
}
