//! Order submission
//!
//! 1. 结构校验 (不访问数据库)
//! 2. 解析引用：客户、桌台、商品名快照
//! 3. 计算总价，单事务写入订单头 + 明细

use std::collections::HashMap;

use shared::models::OrderDetail;
use shared::order::{LineItemInput, MAX_QUANTITY, OrderSubmission, ServiceType, order_total};
use sqlx::SqlitePool;

use crate::db::repository::{self, order::NewLineItem, order::NewOrder};
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_SAUCES_PER_LINE, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_price, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

/// 校验单行，`prefix` 用于错误信息中的字段路径 (如 `items[2]`)
pub(crate) fn validate_line(prefix: &str, line: &LineItemInput) -> AppResult<()> {
    let field = |name: &str| format!("{prefix}.{name}");

    if line.quantity <= 0 || line.quantity > MAX_QUANTITY {
        let name = field("quantity");
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{name} must be between 1 and {MAX_QUANTITY}"),
        )
        .with_detail("field", name));
    }
    validate_price(line.unit_price, &field("unit_price"))?;

    if line.sauces.len() > MAX_SAUCES_PER_LINE {
        let name = field("sauces");
        return Err(AppError::invalid_field(
            &name,
            format!("{name} allows at most {MAX_SAUCES_PER_LINE} sauces"),
        ));
    }
    for sauce in &line.sauces {
        validate_required_text(sauce, &field("sauces"), MAX_SHORT_TEXT_LEN)?;
    }
    validate_optional_text(&line.note, &field("note"), MAX_NOTE_LEN)
}

/// 结构校验，任何写入之前执行
pub fn validate_submission(submission: &OrderSubmission) -> AppResult<()> {
    if submission.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    for (index, line) in submission.items.iter().enumerate() {
        validate_line(&format!("items[{index}]"), line)?;
    }
    validate_optional_text(&submission.note, "note", MAX_NOTE_LEN)?;

    match submission.service_type {
        ServiceType::Delivery if submission.client_id.is_none() => Err(AppError::with_message(
            ErrorCode::RequiredField,
            "client_id is required for delivery orders",
        )
        .with_detail("field", "client_id")),
        ServiceType::Delivery if submission.table_id.is_some() => Err(AppError::invalid_field(
            "table_id",
            "table_id only applies to dine-in orders",
        )),
        _ => Ok(()),
    }
}

/// 解析引用并生成待写入的订单头和明细
async fn resolve(
    pool: &SqlitePool,
    submission: OrderSubmission,
) -> AppResult<(NewOrder, Vec<NewLineItem>)> {
    if let Some(client_id) = submission.client_id
        && repository::client::find_by_id(pool, client_id).await?.is_none()
    {
        return Err(AppError::with_message(
            ErrorCode::ClientNotFound,
            format!("Client {client_id} not found"),
        ));
    }

    if let Some(table_id) = submission.table_id
        && repository::dining_table::find_by_id(pool, table_id).await?.is_none()
    {
        return Err(AppError::with_message(
            ErrorCode::TableNotFound,
            format!("Table {table_id} not found"),
        ));
    }

    // 商品名快照；下架商品也接受，价格以提交的 unit_price 为准
    let mut names: HashMap<i64, String> = HashMap::new();
    for line in &submission.items {
        if names.contains_key(&line.product_id) {
            continue;
        }
        let product = repository::product::find_by_id(pool, line.product_id)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ProductNotFound,
                    format!("Product {} not found", line.product_id),
                )
            })?;
        names.insert(product.id, product.name);
    }

    let total = order_total(&submission.items);

    let lines = submission
        .items
        .into_iter()
        .map(|line| NewLineItem {
            product_name: names.get(&line.product_id).cloned().unwrap_or_default(),
            product_id: line.product_id,
            unit_price: line.unit_price,
            quantity: line.quantity,
            sauces: line.sauces,
            note: line.note,
        })
        .collect();

    let header = NewOrder {
        payment_method: submission.payment_method,
        service_type: submission.service_type,
        client_id: submission.client_id,
        table_id: submission.table_id,
        note: submission.note,
        total,
    };

    Ok((header, lines))
}

/// 提交订单，返回持久化后的订单详情
///
/// 校验失败时不产生任何写入；写入阶段任一步失败整体回滚。
pub async fn submit_order(pool: &SqlitePool, submission: OrderSubmission) -> AppResult<OrderDetail> {
    validate_submission(&submission)?;

    let (header, lines) = resolve(pool, submission).await?;
    let detail = repository::order::create_with_items(pool, header, lines).await?;

    tracing::info!(
        order_id = detail.order.id,
        number = detail.order.number,
        service_type = %detail.order.service_type.as_str(),
        items = detail.items.len(),
        total = detail.order.total,
        "Order submitted"
    );
    Ok(detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;
    use shared::models::{ClientCreate, DiningTableCreate, ProductCategory, ProductCreate};
    use shared::order::{OrderStatus, PaymentMethod};

    fn line(product_id: i64, quantity: i32, unit_price: f64) -> LineItemInput {
        LineItemInput {
            product_id,
            quantity,
            unit_price,
            sauces: vec![],
            note: None,
        }
    }

    fn delivery(client_id: Option<i64>, items: Vec<LineItemInput>) -> OrderSubmission {
        OrderSubmission {
            client_id,
            table_id: None,
            service_type: ServiceType::Delivery,
            payment_method: PaymentMethod::Cash,
            items,
            note: None,
        }
    }

    async fn seed(pool: &SqlitePool) -> (i64, i64) {
        let client = repository::client::create(
            pool,
            ClientCreate {
                name: "Juan Perez".into(),
                phone: "5551234".into(),
                address: "Calle 1".into(),
                email: None,
                category: None,
            },
        )
        .await
        .unwrap();
        let product = repository::product::create(
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
        (client.id, product.id)
    }

    #[test]
    fn test_empty_order_rejected() {
        let err = validate_submission(&delivery(Some(1), vec![])).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
    }

    #[test]
    fn test_quantity_bounds() {
        let err = validate_submission(&delivery(Some(1), vec![line(1, 0, 10.0)])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);

        let err =
            validate_submission(&delivery(Some(1), vec![line(1, MAX_QUANTITY + 1, 10.0)])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);

        assert!(validate_submission(&delivery(Some(1), vec![line(1, MAX_QUANTITY, 10.0)])).is_ok());
    }

    #[test]
    fn test_price_must_be_finite() {
        let err = validate_submission(&delivery(Some(1), vec![line(1, 1, f64::NAN)])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);

        let err = validate_submission(&delivery(Some(1), vec![line(1, 1, -1.0)])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);
    }

    #[test]
    fn test_delivery_requires_client() {
        let err = validate_submission(&delivery(None, vec![line(1, 1, 10.0)])).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);

        let mut dine_in = delivery(None, vec![line(1, 1, 10.0)]);
        dine_in.service_type = ServiceType::DineIn;
        assert!(validate_submission(&dine_in).is_ok());
    }

    #[test]
    fn test_empty_sauce_name_rejected() {
        let mut item = line(1, 1, 10.0);
        item.sauces = vec!["Verde".into(), "  ".into()];
        let err = validate_submission(&delivery(Some(1), vec![item])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_submit_persists_order_and_items() {
        let pool = test_pool().await;
        let (client_id, product_id) = seed(&pool).await;

        let mut item = line(product_id, 3, 15.0);
        item.sauces = vec!["Verde".into()];
        let detail = submit_order(&pool, delivery(Some(client_id), vec![item]))
            .await
            .unwrap();

        assert_eq!(detail.order.number, 1);
        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.order.total, 45.0);
        assert_eq!(detail.client_name.as_deref(), Some("Juan Perez"));
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].product_name, "Tacos");
        assert_eq!(detail.items[0].unit_price, 15.0);
        assert_eq!(detail.items[0].sauces, vec!["Verde".to_string()]);
    }

    #[tokio::test]
    async fn test_submitted_price_wins_over_catalog() {
        let pool = test_pool().await;
        let (client_id, product_id) = seed(&pool).await;

        let detail = submit_order(&pool, delivery(Some(client_id), vec![line(product_id, 2, 12.5)]))
            .await
            .unwrap();
        assert_eq!(detail.items[0].unit_price, 12.5);
        assert_eq!(detail.order.total, 25.0);
    }

    #[tokio::test]
    async fn test_unknown_references_write_nothing() {
        let pool = test_pool().await;
        let (client_id, product_id) = seed(&pool).await;

        let err = submit_order(&pool, delivery(Some(999), vec![line(product_id, 1, 15.0)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ClientNotFound);

        let err = submit_order(
            &pool,
            delivery(Some(client_id), vec![line(product_id, 1, 15.0), line(999, 1, 5.0)]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);

        let mut dine_in = delivery(None, vec![line(product_id, 1, 15.0)]);
        dine_in.service_type = ServiceType::DineIn;
        dine_in.table_id = Some(999);
        let err = submit_order(&pool, dine_in).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotFound);

        assert!(repository::order::find_all_details(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dine_in_with_table() {
        let pool = test_pool().await;
        let (_, product_id) = seed(&pool).await;
        let table = repository::dining_table::create(
            &pool,
            DiningTableCreate {
                number: 4,
                capacity: None,
            },
        )
        .await
        .unwrap();

        let mut submission = delivery(None, vec![line(product_id, 2, 15.0)]);
        submission.service_type = ServiceType::DineIn;
        submission.table_id = Some(table.id);
        let detail = submit_order(&pool, submission).await.unwrap();

        assert_eq!(detail.order.service_type, ServiceType::DineIn);
        assert_eq!(detail.order.table_id, Some(table.id));
        assert_eq!(detail.order.client_id, None);
        assert!(detail.client_name.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("orders.db");
        let db = crate::db::DbService::new(db_path.to_str().unwrap())
            .await
            .unwrap();
        let (client_id, product_id) = seed(&db.pool).await;

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let pool = db.pool.clone();
                tokio::spawn(async move {
                    submit_order(&pool, delivery(Some(client_id), vec![line(product_id, 3, 15.0)]))
                        .await
                })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            let detail = handle.await.unwrap().unwrap();
            assert_eq!(detail.order.total, 45.0);
            numbers.push(detail.order.number);
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=20).collect::<Vec<i64>>());

        let stored = repository::order::find_all_details(&db.pool).await.unwrap();
        assert_eq!(stored.len(), 20);
        assert!(stored.iter().all(|d| d.items.len() == 1));
    }
}
