//! Dining Table Repository

use super::{RepoError, RepoResult};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, TableStatus};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, number, capacity, status, is_active";

/// Default seats when none is given
const DEFAULT_CAPACITY: i32 = 4;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<DiningTable>> {
    let sql = format!("SELECT {COLUMNS} FROM dining_table WHERE is_active = 1 ORDER BY number");
    let tables = sqlx::query_as::<_, DiningTable>(&sql).fetch_all(pool).await?;
    Ok(tables)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<DiningTable>> {
    let sql = format!("SELECT {COLUMNS} FROM dining_table WHERE id = ? AND is_active = 1");
    let table = sqlx::query_as::<_, DiningTable>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(table)
}

fn duplicate_number(err: sqlx::Error, number: Option<i32>) -> RepoError {
    match RepoError::from(err) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!(
            "Table number {} already exists",
            number.map(|n| n.to_string()).unwrap_or_default()
        )),
        other => other,
    }
}

pub async fn create(pool: &SqlitePool, data: DiningTableCreate) -> RepoResult<DiningTable> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO dining_table (id, number, capacity, status, is_active) VALUES (?, ?, ?, ?, 1)",
    )
    .bind(id)
    .bind(data.number)
    .bind(data.capacity.unwrap_or(DEFAULT_CAPACITY))
    .bind(TableStatus::Free)
    .execute(pool)
    .await
    .map_err(|e| duplicate_number(e, Some(data.number)))?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create dining table".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: DiningTableUpdate) -> RepoResult<DiningTable> {
    let number = data.number;
    let rows = sqlx::query(
        "UPDATE dining_table SET number = COALESCE(?1, number), capacity = COALESCE(?2, capacity), \
         status = COALESCE(?3, status) WHERE id = ?4 AND is_active = 1",
    )
    .bind(data.number)
    .bind(data.capacity)
    .bind(data.status)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| duplicate_number(e, number))?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Table {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Table {id} not found")))
}

pub async fn set_status(pool: &SqlitePool, id: i64, status: TableStatus) -> RepoResult<DiningTable> {
    update(
        pool,
        id,
        DiningTableUpdate {
            status: Some(status),
            ..Default::default()
        },
    )
    .await
}

/// Soft delete
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE dining_table SET is_active = 0 WHERE id = ? AND is_active = 1")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Table {id} not found")));
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;

    fn table(number: i32) -> DiningTableCreate {
        DiningTableCreate {
            number,
            capacity: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let pool = test_pool().await;
        let t = create(&pool, table(1)).await.unwrap();
        assert_eq!(t.capacity, 4);
        assert_eq!(t.status, TableStatus::Free);
    }

    #[tokio::test]
    async fn test_number_unique() {
        let pool = test_pool().await;
        create(&pool, table(1)).await.unwrap();
        let err = create(&pool, table(1)).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));

        let t2 = create(&pool, table(2)).await.unwrap();
        let err = update(
            &pool,
            t2.id,
            DiningTableUpdate {
                number: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_status_and_delete() {
        let pool = test_pool().await;
        let t = create(&pool, table(3)).await.unwrap();
        let t = set_status(&pool, t.id, TableStatus::Occupied).await.unwrap();
        assert_eq!(t.status, TableStatus::Occupied);

        delete(&pool, t.id).await.unwrap();
        assert!(find_all(&pool).await.unwrap().is_empty());
        assert!(matches!(
            set_status(&pool, t.id, TableStatus::Free).await,
            Err(RepoError::NotFound(_))
        ));
        // Number is free again after soft delete
        create(&pool, table(3)).await.unwrap();
    }
}
