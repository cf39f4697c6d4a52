use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::database::models::teacher::{self, TeacherRef};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub room: String,
    pub level: String,
    pub school_year: String,
    pub head_teacher_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ClassView {
    pub id: i64,
    pub name: String,
    pub room: String,
    pub level: String,
    pub school_year: String,
    pub head_teacher: Option<TeacherRef>,
}

#[derive(Debug, Serialize)]
pub struct ClassRef {
    pub id: i64,
    pub name: String,
}

impl Class {
    pub fn as_ref_view(&self) -> ClassRef {
        ClassRef { id: self.id, name: self.name.clone() }
    }

    pub async fn into_view(self, conn: &mut SqliteConnection) -> Result<ClassView, sqlx::Error> {
        let head_teacher = match self.head_teacher_id {
            Some(id) => teacher::find(conn, id).await?.map(|t| t.as_ref_view()),
            None => None,
        };

        Ok(ClassView {
            id: self.id,
            name: self.name,
            room: self.room,
            level: self.level,
            school_year: self.school_year,
            head_teacher,
        })
    }
}

pub struct NewClass {
    pub name: String,
    pub room: String,
    pub level: String,
    pub school_year: String,
    pub head_teacher_id: Option<i64>,
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>("SELECT * FROM classes ORDER BY id")
        .fetch_all(conn)
        .await
}

pub async fn name_taken(
    conn: &mut SqliteConnection,
    name: &str,
    exclude: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM classes WHERE name = ? AND id != ?")
        .bind(name)
        .bind(exclude.unwrap_or(-1))
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

pub async fn insert(conn: &mut SqliteConnection, new: &NewClass) -> Result<Class, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO classes (name, room, level, school_year, head_teacher_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&new.name)
    .bind(&new.room)
    .bind(&new.level)
    .bind(&new.school_year)
    .bind(new.head_teacher_id)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    find(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update(conn: &mut SqliteConnection, class: &Class) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE classes SET name = ?, room = ?, level = ?, school_year = ?, head_teacher_id = ? WHERE id = ?",
    )
    .bind(&class.name)
    .bind(&class.room)
    .bind(&class.level)
    .bind(&class.school_year)
    .bind(class.head_teacher_id)
    .bind(class.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM classes WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Rows in other tables that still reference this class
pub async fn reference_count(
    conn: &mut SqliteConnection,
    class_id: i64,
) -> Result<i64, sqlx::Error> {
    let students: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE class_id = ?")
        .bind(class_id)
        .fetch_one(&mut *conn)
        .await?;
    let slots: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schedule_slots WHERE class_id = ?")
        .bind(class_id)
        .fetch_one(&mut *conn)
        .await?;
    let attendance: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance WHERE class_id = ?")
        .bind(class_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(students + slots + attendance)
}
