//! Student-donor link persistence
//!
//! One link per student, keyed by student_id. Creation is an atomic
//! conditional insert so concurrent first-time calls converge on a
//! single winning donor instead of last-writer-wins.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

/// Donor currently linked to a student, if any
pub async fn get_linked_donor_id(
    pool: &SqlitePool,
    student_id: &str,
) -> Result<Option<String>> {
    let row = sqlx::query("SELECT donor_id FROM student_donor_links WHERE student_id = ?")
        .bind(student_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.get("donor_id")))
}

/// Insert a link if the student has none, then return the winning donor.
///
/// The insert is a no-op when a link already exists, so the returned
/// donor_id may differ from `candidate_donor_id`.
pub async fn ensure_link(
    pool: &SqlitePool,
    student_id: &str,
    candidate_donor_id: &str,
) -> Result<String> {
    sqlx::query(
        r#"
        INSERT INTO student_donor_links (student_id, donor_id)
        VALUES (?, ?)
        ON CONFLICT(student_id) DO NOTHING
        "#,
    )
    .bind(student_id)
    .bind(candidate_donor_id)
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT donor_id FROM student_donor_links WHERE student_id = ?")
        .bind(student_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get("donor_id"))
}

/// Student ids linked to a donor, oldest link first
pub async fn list_student_ids_for_donor(
    pool: &SqlitePool,
    donor_id: &str,
) -> Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT student_id FROM student_donor_links WHERE donor_id = ? ORDER BY created_at",
    )
    .bind(donor_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|r| r.get("student_id")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_ensure_link_is_idempotent() {
        let pool = test_pool().await;

        let first = ensure_link(&pool, "s1", "donor-a").await.unwrap();
        let second = ensure_link(&pool, "s1", "donor-b").await.unwrap();

        assert_eq!(first, "donor-a");
        assert_eq!(second, "donor-a", "existing link must win");

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM student_donor_links WHERE student_id = 's1'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_lookup_without_link() {
        let pool = test_pool().await;
        assert!(get_linked_donor_id(&pool, "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_students_for_donor() {
        let pool = test_pool().await;

        ensure_link(&pool, "s1", "donor-a").await.unwrap();
        ensure_link(&pool, "s2", "donor-a").await.unwrap();
        ensure_link(&pool, "s3", "donor-b").await.unwrap();

        let students = list_student_ids_for_donor(&pool, "donor-a").await.unwrap();
        assert_eq!(students, vec!["s1", "s2"]);
    }
}
