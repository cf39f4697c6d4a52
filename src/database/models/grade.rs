use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::database::models::student::{self, StudentRef};
use crate::database::models::subject::{self, SubjectRef};
use crate::database::models::teacher::{self, TeacherRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum GradeKind {
    Homework,
    Quiz,
    Exam,
}

impl std::str::FromStr for GradeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "homework" => Ok(GradeKind::Homework),
            "quiz" => Ok(GradeKind::Quiz),
            "exam" => Ok(GradeKind::Exam),
            _ => Err("must be one of: homework, quiz, exam".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Grade {
    pub id: i64,
    pub value: f64,
    pub kind: GradeKind,
    pub period: String,
    pub student_id: i64,
    pub subject_id: i64,
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GradeView {
    pub id: i64,
    pub value: f64,
    pub kind: GradeKind,
    pub period: String,
    pub student: StudentRef,
    pub subject: SubjectRef,
    pub teacher: Option<TeacherRef>,
}

impl Grade {
    pub async fn into_view(self, conn: &mut SqliteConnection) -> Result<GradeView, sqlx::Error> {
        let student = student::find(conn, self.student_id)
            .await?
            .map(|s| s.as_ref_view())
            .ok_or(sqlx::Error::RowNotFound)?;
        let subject = subject::find(conn, self.subject_id)
            .await?
            .map(|s| s.as_ref_view())
            .ok_or(sqlx::Error::RowNotFound)?;
        let teacher = match self.teacher_id {
            Some(id) => teacher::find(conn, id).await?.map(|t| t.as_ref_view()),
            None => None,
        };

        Ok(GradeView {
            id: self.id,
            value: self.value,
            kind: self.kind,
            period: self.period,
            student,
            subject,
            teacher,
        })
    }
}

pub struct NewGrade {
    pub value: f64,
    pub kind: GradeKind,
    pub period: String,
    pub student_id: i64,
    pub subject_id: i64,
    pub teacher_id: Option<i64>,
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Grade>, sqlx::Error> {
    sqlx::query_as::<_, Grade>("SELECT * FROM grades WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn list(
    conn: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Grade>, sqlx::Error> {
    sqlx::query_as::<_, Grade>("SELECT * FROM grades ORDER BY id LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM grades").fetch_one(conn).await
}

pub async fn insert(conn: &mut SqliteConnection, new: &NewGrade) -> Result<Grade, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO grades (value, kind, period, student_id, subject_id, teacher_id)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(new.value)
    .bind(new.kind)
    .bind(&new.period)
    .bind(new.student_id)
    .bind(new.subject_id)
    .bind(new.teacher_id)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    find(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update(conn: &mut SqliteConnection, grade: &Grade) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE grades SET value = ?, kind = ?, period = ?, subject_id = ?, teacher_id = ? WHERE id = ?",
    )
    .bind(grade.value)
    .bind(grade.kind)
    .bind(&grade.period)
    .bind(grade.subject_id)
    .bind(grade.teacher_id)
    .bind(grade.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM grades WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
