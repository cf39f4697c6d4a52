use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::database::models::class::{self, ClassRef};
use crate::database::models::subject::{self, SubjectRef};
use crate::database::models::teacher::{self, TeacherRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl std::str::FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monday" => Ok(Weekday::Monday),
            "tuesday" => Ok(Weekday::Tuesday),
            "wednesday" => Ok(Weekday::Wednesday),
            "thursday" => Ok(Weekday::Thursday),
            "friday" => Ok(Weekday::Friday),
            "saturday" => Ok(Weekday::Saturday),
            "sunday" => Ok(Weekday::Sunday),
            _ => Err("must be a lowercase weekday name (monday..sunday)".to_string()),
        }
    }
}

/// Timetable entry. Times are stored as "HH:MM" text, validated at the edge.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduleSlot {
    pub id: i64,
    pub weekday: Weekday,
    pub start_time: String,
    pub end_time: String,
    pub class_id: i64,
    pub teacher_id: i64,
    pub subject_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ScheduleSlotView {
    pub id: i64,
    pub weekday: Weekday,
    pub start_time: String,
    pub end_time: String,
    pub class: ClassRef,
    pub teacher: TeacherRef,
    pub subject: SubjectRef,
}

impl ScheduleSlot {
    pub async fn into_view(
        self,
        conn: &mut SqliteConnection,
    ) -> Result<ScheduleSlotView, sqlx::Error> {
        let class = class::find(conn, self.class_id)
            .await?
            .map(|c| c.as_ref_view())
            .ok_or(sqlx::Error::RowNotFound)?;
        let teacher = teacher::find(conn, self.teacher_id)
            .await?
            .map(|t| t.as_ref_view())
            .ok_or(sqlx::Error::RowNotFound)?;
        let subject = subject::find(conn, self.subject_id)
            .await?
            .map(|s| s.as_ref_view())
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(ScheduleSlotView {
            id: self.id,
            weekday: self.weekday,
            start_time: self.start_time,
            end_time: self.end_time,
            class,
            teacher,
            subject,
        })
    }
}

pub struct NewScheduleSlot {
    pub weekday: Weekday,
    pub start_time: String,
    pub end_time: String,
    pub class_id: i64,
    pub teacher_id: i64,
    pub subject_id: i64,
}

pub async fn find(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<ScheduleSlot>, sqlx::Error> {
    sqlx::query_as::<_, ScheduleSlot>("SELECT * FROM schedule_slots WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<ScheduleSlot>, sqlx::Error> {
    sqlx::query_as::<_, ScheduleSlot>("SELECT * FROM schedule_slots ORDER BY id")
        .fetch_all(conn)
        .await
}

pub async fn list_by_class(
    conn: &mut SqliteConnection,
    class_id: i64,
) -> Result<Vec<ScheduleSlot>, sqlx::Error> {
    sqlx::query_as::<_, ScheduleSlot>(
        "SELECT * FROM schedule_slots WHERE class_id = ? ORDER BY id",
    )
    .bind(class_id)
    .fetch_all(conn)
    .await
}

pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewScheduleSlot,
) -> Result<ScheduleSlot, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO schedule_slots (weekday, start_time, end_time, class_id, teacher_id, subject_id)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(new.weekday)
    .bind(&new.start_time)
    .bind(&new.end_time)
    .bind(new.class_id)
    .bind(new.teacher_id)
    .bind(new.subject_id)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    find(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update(
    conn: &mut SqliteConnection,
    slot: &ScheduleSlot,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE schedule_slots
         SET weekday = ?, start_time = ?, end_time = ?, class_id = ?, teacher_id = ?, subject_id = ?
         WHERE id = ?",
    )
    .bind(slot.weekday)
    .bind(&slot.start_time)
    .bind(&slot.end_time)
    .bind(slot.class_id)
    .bind(slot.teacher_id)
    .bind(slot.subject_id)
    .bind(slot.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM schedule_slots WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
