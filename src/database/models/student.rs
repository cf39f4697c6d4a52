use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::database::models::account::{self, Account};
use crate::database::models::class;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Sex {
    M,
    F,
}

impl std::str::FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Sex::M),
            "F" => Ok(Sex::F),
            _ => Err("must be 'M' or 'F'".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub account_id: i64,
    pub guardian_id: i64,
    pub class_id: i64,
    pub name: String,
    pub surname: String,
    pub sex: Sex,
    pub matricule: String,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
}

/// Public projection with the class name and guardian contact embedded
#[derive(Debug, Serialize)]
pub struct StudentView {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub sex: Sex,
    pub matricule: String,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub class_id: i64,
    pub class: Option<String>,
    pub guardian: GuardianRef,
}

#[derive(Debug, Serialize)]
pub struct GuardianRef {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub email: String,
}

/// Minimal reference embedded by grades, attendance and payments
#[derive(Debug, Serialize)]
pub struct StudentRef {
    pub id: i64,
    pub name: String,
    pub surname: String,
}

impl Student {
    pub fn as_ref_view(&self) -> StudentRef {
        StudentRef { id: self.id, name: self.name.clone(), surname: self.surname.clone() }
    }

    pub async fn into_view(self, conn: &mut SqliteConnection) -> Result<StudentView, sqlx::Error> {
        let class_name = class::find(conn, self.class_id).await?.map(|c| c.name);
        let guardian = account::find(conn, self.guardian_id).await?;

        let guardian = match guardian {
            Some(Account { id, name, surname, phone, email, .. }) => {
                GuardianRef { id, name, surname, phone, email }
            }
            // FK guarantees the guardian row; treat a miss as a torn read
            None => return Err(sqlx::Error::RowNotFound),
        };

        Ok(StudentView {
            id: self.id,
            name: self.name,
            surname: self.surname,
            sex: self.sex,
            matricule: self.matricule,
            birth_date: self.birth_date,
            address: self.address,
            class_id: self.class_id,
            class: class_name,
            guardian,
        })
    }
}

pub struct NewStudent {
    pub account_id: i64,
    pub guardian_id: i64,
    pub class_id: i64,
    pub name: String,
    pub surname: String,
    pub sex: Sex,
    pub matricule: String,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn list(
    conn: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>("SELECT * FROM students ORDER BY id LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM students").fetch_one(conn).await
}

pub async fn count_by_sex(conn: &mut SqliteConnection, sex: Sex) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE sex = ?")
        .bind(sex)
        .fetch_one(conn)
        .await
}

pub async fn matricule_taken(
    conn: &mut SqliteConnection,
    matricule: &str,
    exclude: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE matricule = ? AND id != ?")
            .bind(matricule)
            .bind(exclude.unwrap_or(-1))
            .fetch_one(conn)
            .await?;
    Ok(count > 0)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewStudent,
) -> Result<Student, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO students (account_id, guardian_id, class_id, name, surname, sex, matricule, birth_date, address)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.account_id)
    .bind(new.guardian_id)
    .bind(new.class_id)
    .bind(&new.name)
    .bind(&new.surname)
    .bind(new.sex)
    .bind(&new.matricule)
    .bind(new.birth_date)
    .bind(&new.address)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    find(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update(conn: &mut SqliteConnection, student: &Student) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE students
         SET class_id = ?, name = ?, surname = ?, sex = ?, matricule = ?, birth_date = ?, address = ?
         WHERE id = ?",
    )
    .bind(student.class_id)
    .bind(&student.name)
    .bind(&student.surname)
    .bind(student.sex)
    .bind(&student.matricule)
    .bind(student.birth_date)
    .bind(&student.address)
    .bind(student.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn list_by_guardian(
    conn: &mut SqliteConnection,
    guardian_id: i64,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>("SELECT * FROM students WHERE guardian_id = ? ORDER BY id")
        .bind(guardian_id)
        .fetch_all(conn)
        .await
}

pub async fn count_by_guardian(
    conn: &mut SqliteConnection,
    guardian_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE guardian_id = ?")
        .bind(guardian_id)
        .fetch_one(conn)
        .await
}

pub async fn count_by_class(
    conn: &mut SqliteConnection,
    class_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE class_id = ?")
        .bind(class_id)
        .fetch_one(conn)
        .await
}
