use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::database::models::student;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Pending,
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "partial" => Ok(PaymentStatus::Partial),
            "pending" => Ok(PaymentStatus::Pending),
            _ => Err("must be one of: paid, partial, pending".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub student_id: i64,
    pub amount: f64,
    pub paid_on: NaiveDate,
    pub period: String,
    pub method: Option<String>,
    pub status: PaymentStatus,
    pub receipt_number: String,
}

/// Projection embedding the payer, as the receipt shows it
#[derive(Debug, Serialize)]
pub struct PaymentView {
    pub id: i64,
    pub student_id: i64,
    pub student: PayerRef,
    pub amount: f64,
    pub paid_on: NaiveDate,
    pub period: String,
    pub method: Option<String>,
    pub status: PaymentStatus,
    pub receipt_number: String,
}

#[derive(Debug, Serialize)]
pub struct PayerRef {
    pub name: String,
    pub surname: String,
    pub matricule: String,
}

impl Payment {
    pub async fn into_view(self, conn: &mut SqliteConnection) -> Result<PaymentView, sqlx::Error> {
        let payer = student::find(conn, self.student_id)
            .await?
            .map(|s| PayerRef { name: s.name, surname: s.surname, matricule: s.matricule })
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(PaymentView {
            id: self.id,
            student_id: self.student_id,
            student: payer,
            amount: self.amount,
            paid_on: self.paid_on,
            period: self.period,
            method: self.method,
            status: self.status,
            receipt_number: self.receipt_number,
        })
    }
}

pub struct NewPayment {
    pub student_id: i64,
    pub amount: f64,
    pub paid_on: NaiveDate,
    pub period: String,
    pub method: Option<String>,
    pub status: PaymentStatus,
    pub receipt_number: String,
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn list(
    conn: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments ORDER BY paid_on DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM payments").fetch_one(conn).await
}

pub async fn receipt_taken(
    conn: &mut SqliteConnection,
    receipt_number: &str,
    exclude: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE receipt_number = ? AND id != ?")
            .bind(receipt_number)
            .bind(exclude.unwrap_or(-1))
            .fetch_one(conn)
            .await?;
    Ok(count > 0)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewPayment,
) -> Result<Payment, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO payments (student_id, amount, paid_on, period, method, status, receipt_number)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.student_id)
    .bind(new.amount)
    .bind(new.paid_on)
    .bind(&new.period)
    .bind(&new.method)
    .bind(new.status)
    .bind(&new.receipt_number)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    find(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update(conn: &mut SqliteConnection, payment: &Payment) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE payments
         SET amount = ?, paid_on = ?, period = ?, method = ?, status = ?, receipt_number = ?
         WHERE id = ?",
    )
    .bind(payment.amount)
    .bind(payment.paid_on)
    .bind(&payment.period)
    .bind(&payment.method)
    .bind(payment.status)
    .bind(&payment.receipt_number)
    .bind(payment.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM payments WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn total_amount(conn: &mut SqliteConnection) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0.0) FROM payments")
        .fetch_one(conn)
        .await
}

pub async fn count_pending(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE status != 'paid'")
        .fetch_one(conn)
        .await
}
