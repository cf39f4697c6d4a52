use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::database::models::class::{self, ClassRef};
use crate::database::models::student::{self, StudentRef};
use crate::database::models::teacher::{self, TeacherRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Expelled,
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            "expelled" => Ok(AttendanceStatus::Expelled),
            _ => Err("must be one of: present, absent, late, expelled".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub justified: bool,
    pub reason: Option<String>,
    pub comment: Option<String>,
    pub student_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
}

#[derive(Debug, Serialize)]
pub struct AttendanceView {
    pub id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub justified: bool,
    pub reason: Option<String>,
    pub comment: Option<String>,
    pub student: StudentRef,
    pub class: ClassRef,
    pub teacher: TeacherRef,
}

impl AttendanceRecord {
    pub async fn into_view(
        self,
        conn: &mut SqliteConnection,
    ) -> Result<AttendanceView, sqlx::Error> {
        let student = student::find(conn, self.student_id)
            .await?
            .map(|s| s.as_ref_view())
            .ok_or(sqlx::Error::RowNotFound)?;
        let class = class::find(conn, self.class_id)
            .await?
            .map(|c| c.as_ref_view())
            .ok_or(sqlx::Error::RowNotFound)?;
        let teacher = teacher::find(conn, self.teacher_id)
            .await?
            .map(|t| t.as_ref_view())
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(AttendanceView {
            id: self.id,
            date: self.date,
            status: self.status,
            justified: self.justified,
            reason: self.reason,
            comment: self.comment,
            student,
            class,
            teacher,
        })
    }
}

pub struct NewAttendanceRecord {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub justified: bool,
    pub reason: Option<String>,
    pub comment: Option<String>,
    pub student_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
}

/// Optional list filters, combined with AND
#[derive(Debug, Default)]
pub struct AttendanceFilter {
    pub student_id: Option<i64>,
    pub class_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

pub async fn find(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>("SELECT * FROM attendance WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn list(
    conn: &mut SqliteConnection,
    filter: &AttendanceFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        "SELECT * FROM attendance
         WHERE (? IS NULL OR student_id = ?)
           AND (? IS NULL OR class_id = ?)
           AND (? IS NULL OR date = ?)
         ORDER BY id LIMIT ? OFFSET ?",
    )
    .bind(filter.student_id)
    .bind(filter.student_id)
    .bind(filter.class_id)
    .bind(filter.class_id)
    .bind(filter.date)
    .bind(filter.date)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await
}

pub async fn count(
    conn: &mut SqliteConnection,
    filter: &AttendanceFilter,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM attendance
         WHERE (? IS NULL OR student_id = ?)
           AND (? IS NULL OR class_id = ?)
           AND (? IS NULL OR date = ?)",
    )
    .bind(filter.student_id)
    .bind(filter.student_id)
    .bind(filter.class_id)
    .bind(filter.class_id)
    .bind(filter.date)
    .bind(filter.date)
    .fetch_one(conn)
    .await
}

pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewAttendanceRecord,
) -> Result<AttendanceRecord, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO attendance (date, status, justified, reason, comment, student_id, class_id, teacher_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.date)
    .bind(new.status)
    .bind(new.justified)
    .bind(&new.reason)
    .bind(&new.comment)
    .bind(new.student_id)
    .bind(new.class_id)
    .bind(new.teacher_id)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    find(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update(
    conn: &mut SqliteConnection,
    record: &AttendanceRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE attendance SET date = ?, status = ?, justified = ?, reason = ?, comment = ? WHERE id = ?",
    )
    .bind(record.date)
    .bind(record.status)
    .bind(record.justified)
    .bind(&record.reason)
    .bind(&record.comment)
    .bind(record.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM attendance WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
