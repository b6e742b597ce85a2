//! Client Repository

use super::{RepoError, RepoResult};
use shared::models::{Client, ClientCreate, ClientUpdate};
use sqlx::SqlitePool;

const COLUMNS: &str =
    "id, name, phone, address, email, is_featured, category, created_at, is_active";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Client>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM client WHERE is_active = 1 ORDER BY created_at DESC, id DESC"
    );
    let clients = sqlx::query_as::<_, Client>(&sql).fetch_all(pool).await?;
    Ok(clients)
}

/// Active client by id
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Client>> {
    let sql = format!("SELECT {COLUMNS} FROM client WHERE id = ? AND is_active = 1");
    let client = sqlx::query_as::<_, Client>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(client)
}

/// Client name, including soft-deleted clients (order history keeps showing it)
pub async fn find_name(pool: &SqlitePool, id: i64) -> RepoResult<Option<String>> {
    let name = sqlx::query_scalar::<_, String>("SELECT name FROM client WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(name)
}

/// Active client by normalized phone
pub async fn find_by_phone(pool: &SqlitePool, phone: &str) -> RepoResult<Option<Client>> {
    let sql = format!("SELECT {COLUMNS} FROM client WHERE phone = ? AND is_active = 1 LIMIT 1");
    let client = sqlx::query_as::<_, Client>(&sql)
        .bind(phone)
        .fetch_optional(pool)
        .await?;
    Ok(client)
}

/// Active clients whose phone starts with `prefix`
pub async fn suggest_by_phone(
    pool: &SqlitePool,
    prefix: &str,
    limit: i64,
) -> RepoResult<Vec<Client>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM client WHERE is_active = 1 AND phone LIKE ? || '%' ORDER BY phone LIMIT ?"
    );
    let clients = sqlx::query_as::<_, Client>(&sql)
        .bind(prefix)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(clients)
}

/// Insert a client. `data.phone` must already be normalized.
pub async fn create(pool: &SqlitePool, data: ClientCreate) -> RepoResult<Client> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO client (id, name, phone, address, email, is_featured, category, created_at, is_active) \
         VALUES (?, ?, ?, ?, ?, 0, ?, ?, 1)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.phone)
    .bind(&data.address)
    .bind(&data.email)
    .bind(data.category)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("Client with phone {} already exists", data.phone))
        }
        other => other,
    })?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create client".into()))
}

/// `None` 字段保持原值; `email = Some("")` 清空邮箱
pub async fn update(pool: &SqlitePool, id: i64, data: ClientUpdate) -> RepoResult<Client> {
    let phone = data.phone.clone();
    let rows = sqlx::query(
        "UPDATE client SET name = COALESCE(?1, name), phone = COALESCE(?2, phone), \
         address = COALESCE(?3, address), \
         email = CASE WHEN ?4 IS NULL THEN email ELSE NULLIF(?4, '') END, \
         is_featured = COALESCE(?5, is_featured), category = COALESCE(?6, category) \
         WHERE id = ?7 AND is_active = 1",
    )
    .bind(data.name)
    .bind(data.phone)
    .bind(data.address)
    .bind(data.email)
    .bind(data.is_featured)
    .bind(data.category)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!(
            "Client with phone {} already exists",
            phone.unwrap_or_default()
        )),
        other => other,
    })?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Client {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Client {id} not found")))
}

/// Flip `is_featured` in one statement; two calls restore the original value
pub async fn toggle_featured(pool: &SqlitePool, id: i64) -> RepoResult<Client> {
    let rows =
        sqlx::query("UPDATE client SET is_featured = NOT is_featured WHERE id = ? AND is_active = 1")
            .bind(id)
            .execute(pool)
            .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Client {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Client {id} not found")))
}

/// Soft delete. Deleting an already deleted client is NotFound.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE client SET is_active = 0 WHERE id = ? AND is_active = 1")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Client {id} not found")));
    }
    Ok(true)
}
