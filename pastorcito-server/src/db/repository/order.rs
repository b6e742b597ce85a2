//! Order Repository
//!
//! 订单头 (`orders`) + 明细 (`order_item`)。写入走单个事务：
//! 分配编号、插入订单头、逐行插入明细，任一步失败整体回滚。

use std::collections::HashMap;

use super::{RepoError, RepoResult};
use shared::models::{Order, OrderDetail, OrderLineItem};
use shared::order::{OrderStatus, PaymentMethod, ServiceType};
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_COLUMNS: &str = "o.id, o.number, o.status, o.payment_method, o.service_type, \
     o.client_id, o.table_id, o.note, o.total, o.created_at, o.updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, unit_price, quantity, sauces, note";

/// Order header to insert
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub payment_method: PaymentMethod,
    pub service_type: ServiceType,
    pub client_id: Option<i64>,
    pub table_id: Option<i64>,
    pub note: Option<String>,
    pub total: f64,
}

/// Line item to insert, already priced and named
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i32,
    pub sauces: Vec<String>,
    pub note: Option<String>,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    #[sqlx(flatten)]
    order: Order,
    client_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct LineItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    product_name: String,
    unit_price: f64,
    quantity: i32,
    sauces: String,
    note: Option<String>,
}

impl TryFrom<LineItemRow> for OrderLineItem {
    type Error = RepoError;

    fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
        let sauces: Vec<String> = serde_json::from_str(&row.sauces).map_err(|e| {
            RepoError::Database(format!("Corrupt sauces on order item {}: {e}", row.id))
        })?;
        Ok(OrderLineItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            unit_price: row.unit_price,
            quantity: row.quantity,
            sauces,
            note: row.note,
        })
    }
}

/// Insert header + lines atomically and return the persisted detail
pub async fn create_with_items(
    pool: &SqlitePool,
    header: NewOrder,
    items: Vec<NewLineItem>,
) -> RepoResult<OrderDetail> {
    let mut tx = pool.begin().await?;

    // 首条语句即写入: 编号在 INSERT 内分配，事务一开始就持有写锁
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    let number: i64 = sqlx::query_scalar(
        "INSERT INTO orders (id, number, status, payment_method, service_type, client_id, \
         table_id, note, total, created_at, updated_at) \
         VALUES (?, (SELECT COALESCE(MAX(number), 0) + 1 FROM orders), ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING number",
    )
    .bind(id)
    .bind(OrderStatus::Pending)
    .bind(header.payment_method)
    .bind(header.service_type)
    .bind(header.client_id)
    .bind(header.table_id)
    .bind(&header.note)
    .bind(header.total)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for item in &items {
        insert_item(&mut *tx, id, item).await?;
    }

    tx.commit().await?;

    tracing::debug!(order_id = id, number, lines = items.len(), "Order persisted");

    find_detail(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database(format!("Order {id} vanished after commit")))
}

async fn insert_item(conn: &mut SqliteConnection, order_id: i64, item: &NewLineItem) -> RepoResult<()> {
    let sauces = serde_json::to_string(&item.sauces)
        .map_err(|e| RepoError::Database(format!("Failed to encode sauces: {e}")))?;
    sqlx::query(
        "INSERT INTO order_item (order_id, product_id, product_name, unit_price, quantity, sauces, note) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(&item.product_name)
    .bind(item.unit_price)
    .bind(item.quantity)
    .bind(sauces)
    .bind(&item.note)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = ?");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(order)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderLineItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM order_item WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, LineItemRow>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(OrderLineItem::try_from).collect()
}

/// Order with lines and client name
pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderDetail>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS}, c.name AS client_name FROM orders o \
         LEFT JOIN client c ON c.id = o.client_id WHERE o.id = ?"
    );
    let Some(row) = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
    else {
        return Ok(None);
    };
    let items = find_items(pool, id).await?;
    Ok(Some(OrderDetail {
        order: row.order,
        client_name: row.client_name,
        items,
    }))
}

/// All orders, newest first
pub async fn find_all_details(pool: &SqlitePool) -> RepoResult<Vec<OrderDetail>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS}, c.name AS client_name FROM orders o \
         LEFT JOIN client c ON c.id = o.client_id ORDER BY o.number DESC"
    );
    let rows = sqlx::query_as::<_, OrderRow>(&sql).fetch_all(pool).await?;

    let item_sql = format!("SELECT {ITEM_COLUMNS} FROM order_item ORDER BY id");
    let items = sqlx::query_as::<_, LineItemRow>(&item_sql)
        .fetch_all(pool)
        .await?;

    attach_items(rows, items)
}

/// Orders of one client, newest first
pub async fn find_details_by_client(
    pool: &SqlitePool,
    client_id: i64,
) -> RepoResult<Vec<OrderDetail>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS}, c.name AS client_name FROM orders o \
         LEFT JOIN client c ON c.id = o.client_id WHERE o.client_id = ? ORDER BY o.number DESC"
    );
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(client_id)
        .fetch_all(pool)
        .await?;

    let item_sql = format!(
        "SELECT {ITEM_COLUMNS} FROM order_item \
         WHERE order_id IN (SELECT id FROM orders WHERE client_id = ?) ORDER BY id"
    );
    let items = sqlx::query_as::<_, LineItemRow>(&item_sql)
        .bind(client_id)
        .fetch_all(pool)
        .await?;

    attach_items(rows, items)
}

fn attach_items(rows: Vec<OrderRow>, items: Vec<LineItemRow>) -> RepoResult<Vec<OrderDetail>> {
    let mut by_order: HashMap<i64, Vec<OrderLineItem>> = HashMap::new();
    for row in items {
        let item = OrderLineItem::try_from(row)?;
        by_order.entry(item.order_id).or_default().push(item);
    }

    Ok(rows
        .into_iter()
        .map(|row| OrderDetail {
            items: by_order.remove(&row.order.id).unwrap_or_default(),
            order: row.order,
            client_name: row.client_name,
        })
        .collect())
}

/// Persist a status change
pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    status: OrderStatus,
    updated_at: i64,
) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }
    Ok(())
}

/// Hard delete, lines go with the header
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM order_item WHERE order_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let rows = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }
    tx.commit().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;
    use crate::db::repository::{client, product};
    use shared::models::{ClientCreate, ProductCategory, ProductCreate};

    async fn seed(pool: &SqlitePool) -> (i64, i64) {
        let c = client::create(
            pool,
            ClientCreate {
                name: "Juan Perez".into(),
                phone: "5512345678".into(),
                address: "Calle 5".into(),
                email: None,
                category: None,
            },
        )
        .await
        .unwrap();
        let p = product::create(
            pool,
            ProductCreate {
                name: "Tacos".into(),
                description: String::new(),
                price: 15.0,
                image: None,
                category: ProductCategory::Dish,
            },
        )
        .await
        .unwrap();
        (c.id, p.id)
    }

    fn header(client_id: i64, total: f64) -> NewOrder {
        NewOrder {
            payment_method: PaymentMethod::Cash,
            service_type: ServiceType::Delivery,
            client_id: Some(client_id),
            table_id: None,
            note: None,
            total,
        }
    }

    fn line(product_id: i64, quantity: i32) -> NewLineItem {
        NewLineItem {
            product_id,
            product_name: "Tacos".into(),
            unit_price: 15.0,
            quantity,
            sauces: vec!["Verde".into(), "Roja".into()],
            note: None,
        }
    }

    #[tokio::test]
    async fn test_create_with_items() {
        let pool = test_pool().await;
        let (client_id, product_id) = seed(&pool).await;

        let detail = create_with_items(&pool, header(client_id, 45.0), vec![line(product_id, 3)])
            .await
            .unwrap();
        assert_eq!(detail.order.number, 1);
        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.order.total, 45.0);
        assert_eq!(detail.client_name.as_deref(), Some("Juan Perez"));
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].unit_price, 15.0);
        assert_eq!(detail.items[0].sauces, vec!["Verde", "Roja"]);
    }

    #[tokio::test]
    async fn test_numbers_are_sequential() {
        let pool = test_pool().await;
        let (client_id, product_id) = seed(&pool).await;
        for expected in 1..=3 {
            let d = create_with_items(&pool, header(client_id, 15.0), vec![line(product_id, 1)])
                .await
                .unwrap();
            assert_eq!(d.order.number, expected);
        }
    }

    #[tokio::test]
    async fn test_failing_line_rolls_back_header() {
        let pool = test_pool().await;
        let (client_id, product_id) = seed(&pool).await;

        // Second line references a product that does not exist
        let result = create_with_items(
            &pool,
            header(client_id, 30.0),
            vec![line(product_id, 1), line(999, 1)],
        )
        .await;
        assert!(result.is_err());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_item")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(items, 0);
    }

    #[tokio::test]
    async fn test_list_and_by_client() {
        let pool = test_pool().await;
        let (client_id, product_id) = seed(&pool).await;
        create_with_items(&pool, header(client_id, 15.0), vec![line(product_id, 1)])
            .await
            .unwrap();
        create_with_items(
            &pool,
            NewOrder {
                client_id: None,
                service_type: ServiceType::DineIn,
                ..header(client_id, 30.0)
            },
            vec![line(product_id, 2)],
        )
        .await
        .unwrap();

        let all = find_all_details(&pool).await.unwrap();
        assert_eq!(all.len(), 2);
        // Newest first
        assert_eq!(all[0].order.number, 2);
        assert!(all.iter().all(|d| d.items.len() == 1));

        let mine = find_details_by_client(&pool, client_id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].order.number, 1);
    }

    #[tokio::test]
    async fn test_update_status_and_delete() {
        let pool = test_pool().await;
        let (client_id, product_id) = seed(&pool).await;
        let d = create_with_items(&pool, header(client_id, 15.0), vec![line(product_id, 1)])
            .await
            .unwrap();

        update_status(&pool, d.order.id, OrderStatus::EnRoute, 99)
            .await
            .unwrap();
        let o = find_by_id(&pool, d.order.id).await.unwrap().unwrap();
        assert_eq!(o.status, OrderStatus::EnRoute);
        assert_eq!(o.updated_at, 99);

        assert!(delete(&pool, d.order.id).await.unwrap());
        assert!(find_detail(&pool, d.order.id).await.unwrap().is_none());
        assert!(find_items(&pool, d.order.id).await.unwrap().is_empty());
        assert!(matches!(
            delete(&pool, d.order.id).await,
            Err(RepoError::NotFound(_))
        ));
    }
}
