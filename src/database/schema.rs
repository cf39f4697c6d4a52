use sqlx::SqlitePool;

use crate::database::manager::DatabaseError;

/// Embedded DDL, applied idempotently at startup.
///
/// Deletion rules follow entity ownership: a student's dependent rows
/// (grades, attendance, payments) go with it, while teachers, classes and
/// subjects are shared references and deletes against them are blocked at
/// the service layer before the RESTRICT constraints would fire.
const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        name          TEXT NOT NULL,
        surname       TEXT NOT NULL,
        phone         TEXT,
        role          TEXT NOT NULL,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS teachers (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL UNIQUE REFERENCES accounts(id),
        name       TEXT NOT NULL,
        surname    TEXT NOT NULL,
        phone      TEXT NOT NULL,
        matricule  TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS subjects (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        code TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS teacher_subjects (
        teacher_id INTEGER NOT NULL REFERENCES teachers(id) ON DELETE CASCADE,
        subject_id INTEGER NOT NULL REFERENCES subjects(id),
        PRIMARY KEY (teacher_id, subject_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS classes (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        name            TEXT NOT NULL UNIQUE,
        room            TEXT NOT NULL,
        level           TEXT NOT NULL,
        school_year     TEXT NOT NULL,
        head_teacher_id INTEGER REFERENCES teachers(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS students (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id  INTEGER NOT NULL UNIQUE REFERENCES accounts(id),
        guardian_id INTEGER NOT NULL REFERENCES accounts(id),
        class_id    INTEGER NOT NULL REFERENCES classes(id),
        name        TEXT NOT NULL,
        surname     TEXT NOT NULL,
        sex         TEXT NOT NULL CHECK (sex IN ('M', 'F')),
        matricule   TEXT NOT NULL UNIQUE,
        birth_date  TEXT,
        address     TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS schedule_slots (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        weekday    TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time   TEXT NOT NULL,
        class_id   INTEGER NOT NULL REFERENCES classes(id),
        teacher_id INTEGER NOT NULL REFERENCES teachers(id),
        subject_id INTEGER NOT NULL REFERENCES subjects(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS grades (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        value      REAL NOT NULL,
        kind       TEXT NOT NULL,
        period     TEXT NOT NULL,
        student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        subject_id INTEGER NOT NULL REFERENCES subjects(id),
        teacher_id INTEGER REFERENCES teachers(id) ON DELETE SET NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        date       TEXT NOT NULL,
        status     TEXT NOT NULL,
        justified  INTEGER NOT NULL DEFAULT 0,
        reason     TEXT,
        comment    TEXT,
        student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        class_id   INTEGER NOT NULL REFERENCES classes(id),
        teacher_id INTEGER NOT NULL REFERENCES teachers(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id     INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        amount         REAL NOT NULL,
        paid_on        TEXT NOT NULL,
        period         TEXT NOT NULL,
        method         TEXT,
        status         TEXT NOT NULL DEFAULT 'paid',
        receipt_number TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expenses (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        label       TEXT NOT NULL,
        amount      REAL NOT NULL,
        category    TEXT NOT NULL,
        description TEXT,
        date        TEXT NOT NULL
    )
    "#,
];

/// Apply the schema to a freshly opened pool
pub async fn migrate(pool: &SqlitePool) -> Result<(), DatabaseError> {
    for ddl in TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
