//! Sauce Repository

use super::{RepoError, RepoResult};
use shared::models::{Sauce, SauceCreate, SauceUpdate};
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Sauce>> {
    let sauces = sqlx::query_as::<_, Sauce>(
        "SELECT id, name, heat_level FROM sauce ORDER BY heat_level, name",
    )
    .fetch_all(pool)
    .await?;
    Ok(sauces)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Sauce>> {
    let sauce = sqlx::query_as::<_, Sauce>("SELECT id, name, heat_level FROM sauce WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(sauce)
}

pub async fn create(pool: &SqlitePool, data: SauceCreate) -> RepoResult<Sauce> {
    let id = shared::util::snowflake_id();
    sqlx::query("INSERT INTO sauce (id, name, heat_level) VALUES (?, ?, ?)")
        .bind(id)
        .bind(&data.name)
        .bind(data.heat_level)
        .execute(pool)
        .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create sauce".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: SauceUpdate) -> RepoResult<Sauce> {
    let rows = sqlx::query(
        "UPDATE sauce SET name = COALESCE(?1, name), heat_level = COALESCE(?2, heat_level) WHERE id = ?3",
    )
    .bind(data.name)
    .bind(data.heat_level)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Sauce {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Sauce {id} not found")))
}

/// Hard delete: line items store sauce names, not ids
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM sauce WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Sauce {id} not found")));
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;

    #[tokio::test]
    async fn test_crud() {
        let pool = test_pool().await;
        let verde = create(
            &pool,
            SauceCreate {
                name: "Verde".into(),
                heat_level: 2,
            },
        )
        .await
        .unwrap();
        let habanero = create(
            &pool,
            SauceCreate {
                name: "Habanero".into(),
                heat_level: 5,
            },
        )
        .await
        .unwrap();

        let names: Vec<String> = find_all(&pool).await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Verde", "Habanero"]);

        let updated = update(
            &pool,
            verde.id,
            SauceUpdate {
                heat_level: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.heat_level, 3);
        assert_eq!(updated.name, "Verde");

        assert!(delete(&pool, habanero.id).await.unwrap());
        assert!(matches!(delete(&pool, habanero.id).await, Err(RepoError::NotFound(_))));
        assert_eq!(find_all(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_heat_level_checked_by_store() {
        let pool = test_pool().await;
        let err = create(
            &pool,
            SauceCreate {
                name: "Imposible".into(),
                heat_level: 9,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Database(_)));
    }
}
