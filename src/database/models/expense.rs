use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: i64,
    pub label: String,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub date: NaiveDate,
}

pub struct NewExpense {
    pub label: String,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub date: NaiveDate,
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Expense>, sqlx::Error> {
    sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn list(
    conn: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Expense>, sqlx::Error> {
    sqlx::query_as::<_, Expense>(
        "SELECT * FROM expenses ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM expenses").fetch_one(conn).await
}

pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewExpense,
) -> Result<Expense, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO expenses (label, amount, category, description, date) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&new.label)
    .bind(new.amount)
    .bind(&new.category)
    .bind(&new.description)
    .bind(new.date)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    find(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update(conn: &mut SqliteConnection, expense: &Expense) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE expenses SET label = ?, amount = ?, category = ?, description = ?, date = ? WHERE id = ?",
    )
    .bind(&expense.label)
    .bind(expense.amount)
    .bind(&expense.category)
    .bind(&expense.description)
    .bind(expense.date)
    .bind(expense.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM expenses WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn total_amount(conn: &mut SqliteConnection) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0.0) FROM expenses")
        .fetch_one(conn)
        .await
}
