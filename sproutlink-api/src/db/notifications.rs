//! Notification persistence
//!
//! Append-only log of donor-facing report events. The only mutation is
//! the bulk mark-read for a donor+student pair.

use anyhow::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::models::{Notification, Report};

/// Append a notification for a new report, unread by default
pub async fn insert_notification(
    pool: &SqlitePool,
    donor_id: &str,
    student_id: &str,
    learning_report: &Report,
    journal_image: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (donor_id, student_id, learning_report, journal_image, created_at, is_read)
        VALUES (?, ?, ?, ?, ?, 0)
        "#,
    )
    .bind(donor_id)
    .bind(student_id)
    .bind(serde_json::to_string(learning_report)?)
    .bind(journal_image)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// All notifications for a donor+student pair, newest first
pub async fn list_notifications(
    pool: &SqlitePool,
    donor_id: &str,
    student_id: &str,
) -> Result<Vec<Notification>> {
    let rows = sqlx::query(
        r#"
        SELECT donor_id, student_id, learning_report, journal_image, created_at, is_read
        FROM notifications
        WHERE donor_id = ? AND student_id = ?
        ORDER BY id DESC
        "#,
    )
    .bind(donor_id)
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_notification).collect()
}

/// Most recent notification for a donor+student pair, if any
pub async fn latest_notification(
    pool: &SqlitePool,
    donor_id: &str,
    student_id: &str,
) -> Result<Option<Notification>> {
    let row = sqlx::query(
        r#"
        SELECT donor_id, student_id, learning_report, journal_image, created_at, is_read
        FROM notifications
        WHERE donor_id = ? AND student_id = ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(donor_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_notification).transpose()
}

/// Notification count for a donor+student pair.
///
/// Counts all rows regardless of is_read; the dashboard has always used
/// the total as its unread badge.
pub async fn count_notifications(
    pool: &SqlitePool,
    donor_id: &str,
    student_id: &str,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE donor_id = ? AND student_id = ?",
    )
    .bind(donor_id)
    .bind(student_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Bulk-set is_read on every notification for the pair.
///
/// Returns the number of rows updated.
pub async fn mark_notifications_read(
    pool: &SqlitePool,
    donor_id: &str,
    student_id: &str,
) -> Result<u64> {
    let updated = sqlx::query(
        "UPDATE notifications SET is_read = 1 WHERE donor_id = ? AND student_id = ?",
    )
    .bind(donor_id)
    .bind(student_id)
    .execute(pool)
    .await?;

    Ok(updated.rows_affected())
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> Result<Notification> {
    let report_json: Option<String> = row.get("learning_report");
    let is_read: i64 = row.get("is_read");

    Ok(Notification {
        donor_id: row.get("donor_id"),
        student_id: row.get("student_id"),
        learning_report: report_json
            .map(|json| serde_json::from_str(&json))
            .transpose()?,
        journal_image: row.get("journal_image"),
        created_at: row.get("created_at"),
        is_read: is_read != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn report(summary: &str) -> Report {
        Report {
            scores: BTreeMap::new(),
            overall_score: 3.0,
            progress_update: "progress".to_string(),
            summary: summary.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let pool = test_pool().await;

        insert_notification(&pool, "d1", "s1", &report("first"), None)
            .await
            .unwrap();
        insert_notification(&pool, "d1", "s1", &report("second"), Some("img.png"))
            .await
            .unwrap();

        let all = list_notifications(&pool, "d1", "s1").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].learning_report.as_ref().unwrap().summary, "second");
        assert_eq!(all[0].journal_image.as_deref(), Some("img.png"));
        assert!(!all[0].is_read);

        let latest = latest_notification(&pool, "d1", "s1").await.unwrap().unwrap();
        assert_eq!(latest.learning_report.unwrap().summary, "second");
    }

    #[tokio::test]
    async fn test_count_ignores_read_state() {
        let pool = test_pool().await;

        insert_notification(&pool, "d1", "s1", &report("a"), None).await.unwrap();
        insert_notification(&pool, "d1", "s1", &report("b"), None).await.unwrap();

        mark_notifications_read(&pool, "d1", "s1").await.unwrap();

        // The badge count is the total for the pair, read or not
        assert_eq!(count_notifications(&pool, "d1", "s1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_mark_read_is_scoped_to_pair() {
        let pool = test_pool().await;

        insert_notification(&pool, "d1", "s1", &report("a"), None).await.unwrap();
        insert_notification(&pool, "d1", "s2", &report("b"), None).await.unwrap();

        let updated = mark_notifications_read(&pool, "d1", "s1").await.unwrap();
        assert_eq!(updated, 1);

        let other = list_notifications(&pool, "d1", "s2").await.unwrap();
        assert!(!other[0].is_read);
    }
}
