//! Database access for sproutlink-api
//!
//! Three service-owned tables (students, student_donor_links,
//! notifications) plus the externally managed donors table, all in one
//! SQLite database.

pub mod donors;
pub mod links;
pub mod notifications;
pub mod students;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to the SQLite file at `db_path`, creating it (and its parent
/// directory) if missing, then runs table initialization.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize service tables
///
/// Creates students, student_donor_links, notifications, and donors
/// tables if they don't exist. Also used by tests against in-memory
/// databases.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            student_id TEXT PRIMARY KEY,
            name TEXT,
            age INTEGER,
            location TEXT,
            journal_list TEXT NOT NULL DEFAULT '[]',
            report_list TEXT NOT NULL DEFAULT '[]',
            latest_report TEXT,
            version INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS student_donor_links (
            student_id TEXT PRIMARY KEY,
            donor_id TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            donor_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            learning_report TEXT,
            journal_image TEXT,
            created_at TEXT NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Donors are managed externally; the table exists so the service is
    // self-contained for local development and tests.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS donors (
            id TEXT PRIMARY KEY,
            auth_id TEXT UNIQUE,
            name TEXT,
            email TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!(
        "Database tables initialized (students, student_donor_links, notifications, donors)"
    );

    Ok(())
}
