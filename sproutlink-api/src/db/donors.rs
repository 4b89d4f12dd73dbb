//! Donor lookups
//!
//! The donors table is owned by the external account system; this
//! service only reads ids and the auth identity mapping. Inserts exist
//! for local development seeding and tests.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

/// All known donor ids
pub async fn list_donor_ids(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT id FROM donors ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(|r| r.get("id")).collect())
}

/// Resolve a donor id from the external auth identity
pub async fn get_donor_id_by_auth_id(
    pool: &SqlitePool,
    auth_id: &str,
) -> Result<Option<String>> {
    let row = sqlx::query("SELECT id FROM donors WHERE auth_id = ?")
        .bind(auth_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.get("id")))
}

/// Seed a donor row (development/tests only; production rows come from
/// the external account system)
pub async fn insert_donor(
    pool: &SqlitePool,
    id: &str,
    auth_id: Option<&str>,
    name: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO donors (id, auth_id, name)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(auth_id)
    .bind(name)
    .execute(pool)
    .await?;

    Ok(())
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
    async fn test_list_donor_ids() {
        let pool = test_pool().await;

        insert_donor(&pool, "d2", None, Some("Beth")).await.unwrap();
        insert_donor(&pool, "d1", Some("auth-1"), Some("Avi")).await.unwrap();

        let ids = list_donor_ids(&pool).await.unwrap();
        assert_eq!(ids, vec!["d1", "d2"]);
    }

    #[tokio::test]
    async fn test_auth_id_lookup() {
        let pool = test_pool().await;

        insert_donor(&pool, "d1", Some("auth-xyz"), None).await.unwrap();

        let found = get_donor_id_by_auth_id(&pool, "auth-xyz").await.unwrap();
        assert_eq!(found.as_deref(), Some("d1"));

        let missing = get_donor_id_by_auth_id(&pool, "auth-unknown").await.unwrap();
        assert!(missing.is_none());
    }
}
