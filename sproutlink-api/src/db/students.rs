//! Student record persistence
//!
//! History is append-only: each submission pushes one journal entry and
//! one report, keeping the two lists parallel. Updates are conditioned
//! on the record version so overlapping submissions for the same student
//! cannot silently drop an entry; the loser retries against the fresh
//! record.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};

use crate::models::{Report, StudentRecord};

/// Attempts before giving up on a version conflict
const MAX_APPEND_RETRIES: u32 = 3;

/// Load a student record by id
pub async fn get_student(pool: &SqlitePool, student_id: &str) -> Result<Option<StudentRecord>> {
    let row = sqlx::query(
        r#"
        SELECT student_id, name, age, location, journal_list, report_list,
               latest_report, version
        FROM students
        WHERE student_id = ?
        "#,
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let journal_json: String = row.get("journal_list");
            let report_json: String = row.get("report_list");
            let latest_json: Option<String> = row.get("latest_report");

            Ok(Some(StudentRecord {
                student_id: row.get("student_id"),
                name: row.get("name"),
                age: row.get("age"),
                location: row.get("location"),
                journal_list: serde_json::from_str(&journal_json)?,
                report_list: serde_json::from_str(&report_json)?,
                latest_report: latest_json
                    .map(|json| serde_json::from_str(&json))
                    .transpose()?,
                version: row.get("version"),
            }))
        }
        None => Ok(None),
    }
}

/// Append one journal/report pair to a student's history.
///
/// Creates the record on first submission. Returns the updated record.
pub async fn append_submission(
    pool: &SqlitePool,
    student_id: &str,
    journal: &str,
    report: &Report,
) -> Result<StudentRecord> {
    for attempt in 0..MAX_APPEND_RETRIES {
        match get_student(pool, student_id).await? {
            None => {
                if try_insert_first(pool, student_id, journal, report).await? {
                    // Read back through the normal path
                    return get_student(pool, student_id)
                        .await?
                        .ok_or_else(|| anyhow::anyhow!("Record vanished after insert"));
                }
                // Another request created the record first; fall through
                // to the update path on the next attempt.
                tracing::debug!(
                    student_id = student_id,
                    attempt = attempt,
                    "First-submission insert lost the race, retrying as update"
                );
            }
            Some(existing) => {
                let mut journal_list = existing.journal_list.clone();
                let mut report_list = existing.report_list.clone();
                journal_list.push(journal.to_string());
                report_list.push(report.clone());

                let updated = sqlx::query(
                    r#"
                    UPDATE students
                    SET journal_list = ?,
                        report_list = ?,
                        latest_report = ?,
                        version = version + 1,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE student_id = ? AND version = ?
                    "#,
                )
                .bind(serde_json::to_string(&journal_list)?)
                .bind(serde_json::to_string(&report_list)?)
                .bind(serde_json::to_string(report)?)
                .bind(student_id)
                .bind(existing.version)
                .execute(pool)
                .await?;

                if updated.rows_affected() == 1 {
                    return Ok(StudentRecord {
                        journal_list,
                        report_list,
                        latest_report: Some(report.clone()),
                        version: existing.version + 1,
                        ..existing
                    });
                }

                tracing::debug!(
                    student_id = student_id,
                    version = existing.version,
                    attempt = attempt,
                    "Version conflict on student append, retrying"
                );
            }
        }
    }

    bail!(
        "Could not append submission for student {} after {} attempts",
        student_id,
        MAX_APPEND_RETRIES
    )
}

/// Insert the initial record for a first-time student.
///
/// Returns false when a concurrent request inserted the row first.
async fn try_insert_first(
    pool: &SqlitePool,
    student_id: &str,
    journal: &str,
    report: &Report,
) -> Result<bool> {
    let journal_list = vec![journal.to_string()];
    let report_list = vec![report.clone()];

    let inserted = sqlx::query(
        r#"
        INSERT INTO students (student_id, journal_list, report_list, latest_report, version)
        VALUES (?, ?, ?, ?, 1)
        ON CONFLICT(student_id) DO NOTHING
        "#,
    )
    .bind(student_id)
    .bind(serde_json::to_string(&journal_list)?)
    .bind(serde_json::to_string(&report_list)?)
    .bind(serde_json::to_string(report)?)
    .execute(pool)
    .await?;

    Ok(inserted.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn report(overall: f64) -> Report {
        let mut scores = BTreeMap::new();
        scores.insert("Clarity of Expression".to_string(), 4);
        Report {
            scores,
            overall_score: overall,
            progress_update: format!("update {}", overall),
            summary: "summary".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_submission_creates_record() {
        let pool = test_pool().await;

        let record = append_submission(&pool, "s1", "my first journal", &report(3.0))
            .await
            .unwrap();

        assert_eq!(record.journal_list, vec!["my first journal"]);
        assert_eq!(record.report_list.len(), 1);
        assert_eq!(record.latest_report, Some(report(3.0)));
        assert_eq!(record.version, 1);
    }

    #[tokio::test]
    async fn test_repeated_submissions_keep_lists_parallel() {
        let pool = test_pool().await;

        for i in 1..=4 {
            append_submission(&pool, "s1", &format!("journal {}", i), &report(i as f64))
                .await
                .unwrap();
        }

        let record = get_student(&pool, "s1").await.unwrap().unwrap();
        assert_eq!(record.journal_list.len(), 4);
        assert_eq!(record.report_list.len(), 4);
        assert_eq!(record.latest_report.as_ref(), record.report_list.last());
        assert_eq!(record.version, 4);
    }

    #[tokio::test]
    async fn test_missing_student_is_none() {
        let pool = test_pool().await;
        assert!(get_student(&pool, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_version_does_not_clobber() {
        let pool = test_pool().await;

        append_submission(&pool, "s1", "one", &report(1.0)).await.unwrap();

        // Simulate a writer holding a stale version: its conditional
        // update must affect zero rows.
        let stale = sqlx::query(
            "UPDATE students SET journal_list = '[]' WHERE student_id = 's1' AND version = 0",
        )
        .execute(&pool)
        .await
        .unwrap();
        assert_eq!(stale.rows_affected(), 0);

        let record = get_student(&pool, "s1").await.unwrap().unwrap();
        assert_eq!(record.journal_list, vec!["one"]);
    }
}
