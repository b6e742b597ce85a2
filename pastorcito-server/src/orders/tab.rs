//! 桌台账单 (仅内存)
//!
//! 堂食点单先记在桌台账单上，结账时整单转成一笔 dine_in 订单。
//! 账单保存在 `ServerState::tabs`，重启后丢失。

use shared::models::{DiningTable, OrderDetail, TabCheckout, TabItem, TableStatus, TableTab};
use shared::order::{LineItemInput, OrderSubmission, ServiceType, order_total};

use super::RESOURCE_ORDER;
use super::submission::{submit_order, validate_line};
use crate::core::ServerState;
use crate::db::repository::{dining_table, product};
use crate::utils::{AppError, AppResult, ErrorCode};

pub const RESOURCE_TABLE: &str = "dining_table";
pub const RESOURCE_TAB: &str = "table_tab";

fn empty_tab(table_id: i64) -> TableTab {
    TableTab {
        table_id,
        ..Default::default()
    }
}

fn already_empty(table_id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::TableAlreadyEmpty,
        format!("Table {table_id} has no open tab"),
    )
}

/// 活跃桌台，不存在时返回 TableNotFound
pub async fn require_table(state: &ServerState, table_id: i64) -> AppResult<DiningTable> {
    dining_table::find_by_id(&state.pool, table_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::TableNotFound, format!("Table {table_id} not found"))
        })
}

/// 账单是否有未结项目
pub fn has_open_tab(state: &ServerState, table_id: i64) -> bool {
    state
        .tabs
        .get(&table_id)
        .is_some_and(|tab| !tab.items.is_empty())
}

async fn set_table_status(state: &ServerState, table: &DiningTable, status: TableStatus) -> AppResult<()> {
    if table.status == status {
        return Ok(());
    }
    let updated = dining_table::set_status(&state.pool, table.id, status).await?;
    state.broadcast_sync(RESOURCE_TABLE, "updated", &updated.id.to_string(), Some(&updated));
    Ok(())
}

/// 当前账单，没有时返回空账单
pub async fn get_tab(state: &ServerState, table_id: i64) -> AppResult<TableTab> {
    require_table(state, table_id).await?;
    Ok(state
        .tabs
        .get(&table_id)
        .map(|tab| tab.clone())
        .unwrap_or_else(|| empty_tab(table_id)))
}

/// 向账单追加一行，桌台随之变为 occupied
pub async fn add_item(state: &ServerState, table_id: i64, line: LineItemInput) -> AppResult<TableTab> {
    let table = require_table(state, table_id).await?;
    validate_line("item", &line)?;
    let product = product::find_by_id(&state.pool, line.product_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("Product {} not found", line.product_id),
            )
        })?;

    // guard 不能跨 await
    let tab = {
        let mut entry = state
            .tabs
            .entry(table_id)
            .or_insert_with(|| empty_tab(table_id));
        entry.items.push(TabItem {
            line,
            product_name: product.name,
        });
        entry.total = order_total(&entry.items);
        entry.clone()
    };

    set_table_status(state, &table, TableStatus::Occupied).await?;
    state.broadcast_sync(RESOURCE_TAB, "updated", &table_id.to_string(), Some(&tab));
    Ok(tab)
}

/// 清空账单 (不生成订单)，桌台变为 free
pub async fn clear_tab(state: &ServerState, table_id: i64) -> AppResult<()> {
    let table = require_table(state, table_id).await?;
    match state.tabs.remove(&table_id) {
        Some((_, tab)) if !tab.items.is_empty() => {}
        _ => return Err(already_empty(table_id)),
    }

    set_table_status(state, &table, TableStatus::Free).await?;
    state.broadcast_sync::<()>(RESOURCE_TAB, "cleared", &table_id.to_string(), None);
    tracing::info!(table_id, "Table tab cleared");
    Ok(())
}

/// 把失败的结账放回账单，保留期间新加的行
fn restore_tab(state: &ServerState, tab: TableTab) {
    let mut entry = state
        .tabs
        .entry(tab.table_id)
        .or_insert_with(|| empty_tab(tab.table_id));
    let mut items = tab.items;
    items.append(&mut entry.items);
    entry.items = items;
    entry.total = order_total(&entry.items);
}

/// 结账：账单整单下成 dine_in 订单，清空账单并释放桌台
pub async fn checkout(
    state: &ServerState,
    table_id: i64,
    request: TabCheckout,
) -> AppResult<OrderDetail> {
    let table = require_table(state, table_id).await?;
    let tab = match state.tabs.remove(&table_id) {
        Some((_, tab)) if !tab.items.is_empty() => tab,
        _ => return Err(already_empty(table_id)),
    };

    let submission = OrderSubmission {
        client_id: request.client_id,
        table_id: Some(table_id),
        service_type: ServiceType::DineIn,
        payment_method: request.payment_method,
        items: tab.items.iter().map(|item| item.line.clone()).collect(),
        note: request.note,
    };

    let detail = match submit_order(&state.pool, submission).await {
        Ok(detail) => detail,
        Err(e) => {
            restore_tab(state, tab);
            return Err(e);
        }
    };

    set_table_status(state, &table, TableStatus::Free).await?;
    state.broadcast_sync(
        RESOURCE_ORDER,
        "created",
        &detail.order.id.to_string(),
        Some(&detail),
    );
    state.broadcast_sync::<()>(RESOURCE_TAB, "cleared", &table_id.to_string(), None);
    tracing::info!(
        table_id,
        order_id = detail.order.id,
        total = detail.order.total,
        "Table checked out"
    );
    Ok(detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_state;
    use shared::models::{DiningTableCreate, ProductCategory, ProductCreate};
    use shared::order::{OrderStatus, PaymentMethod};

    async fn seed(state: &ServerState) -> (i64, i64, i64) {
        let table = dining_table::create(
            &state.pool,
            DiningTableCreate {
                number: 7,
                capacity: Some(2),
            },
        )
        .await
        .unwrap();
        let tacos = product::create(
            &state.pool,
            ProductCreate {
                name: "Tacos al pastor".into(),
                description: String::new(),
                price: 15.0,
                image: None,
                category: ProductCategory::Dish,
            },
        )
        .await
        .unwrap();
        let soda = product::create(
            &state.pool,
            ProductCreate {
                name: "Jarritos".into(),
                description: String::new(),
                price: 2.5,
                image: None,
                category: ProductCategory::Drink,
            },
        )
        .await
        .unwrap();
        (table.id, tacos.id, soda.id)
    }

    fn line(product_id: i64, quantity: i32, unit_price: f64) -> LineItemInput {
        LineItemInput {
            product_id,
            quantity,
            unit_price,
            sauces: vec![],
            note: None,
        }
    }

    #[tokio::test]
    async fn test_tab_total_tracks_items() {
        let state = test_state().await;
        let (table_id, tacos, soda) = seed(&state).await;

        add_item(&state, table_id, line(tacos, 3, 15.0)).await.unwrap();
        let tab = add_item(&state, table_id, line(soda, 3, 2.5)).await.unwrap();

        assert_eq!(tab.items.len(), 2);
        assert_eq!(tab.items[1].product_name, "Jarritos");
        assert_eq!(tab.total, 52.5);
        assert_eq!(tab.total, order_total(&tab.items));

        let table = require_table(&state, table_id).await.unwrap();
        assert_eq!(table.status, TableStatus::Occupied);
        assert!(has_open_tab(&state, table_id));
    }

    #[tokio::test]
    async fn test_empty_tab_for_unused_table() {
        let state = test_state().await;
        let (table_id, _, _) = seed(&state).await;

        let tab = get_tab(&state, table_id).await.unwrap();
        assert_eq!(tab.table_id, table_id);
        assert!(tab.items.is_empty());
        assert_eq!(tab.total, 0.0);

        let err = get_tab(&state, 999).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotFound);
    }

    #[tokio::test]
    async fn test_checkout_creates_dine_in_order_and_frees_table() {
        let state = test_state().await;
        let (table_id, tacos, _) = seed(&state).await;
        add_item(&state, table_id, line(tacos, 2, 15.0)).await.unwrap();

        let detail = checkout(
            &state,
            table_id,
            TabCheckout {
                payment_method: PaymentMethod::Cash,
                client_id: None,
                note: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(detail.order.service_type, ServiceType::DineIn);
        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.order.table_id, Some(table_id));
        assert_eq!(detail.order.total, 30.0);
        assert_eq!(detail.items[0].product_name, "Tacos al pastor");

        assert!(!has_open_tab(&state, table_id));
        let table = require_table(&state, table_id).await.unwrap();
        assert_eq!(table.status, TableStatus::Free);
    }

    #[tokio::test]
    async fn test_checkout_empty_tab_rejected() {
        let state = test_state().await;
        let (table_id, _, _) = seed(&state).await;

        let err = checkout(
            &state,
            table_id,
            TabCheckout {
                payment_method: PaymentMethod::Card,
                client_id: None,
                note: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::TableAlreadyEmpty);

        let err = clear_tab(&state, table_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TableAlreadyEmpty);
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_tab() {
        let state = test_state().await;
        let (table_id, tacos, _) = seed(&state).await;
        add_item(&state, table_id, line(tacos, 1, 15.0)).await.unwrap();

        let err = checkout(
            &state,
            table_id,
            TabCheckout {
                payment_method: PaymentMethod::Cash,
                client_id: Some(404),
                note: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ClientNotFound);

        let tab = get_tab(&state, table_id).await.unwrap();
        assert_eq!(tab.items.len(), 1);
        assert_eq!(tab.total, 15.0);
    }

    #[tokio::test]
    async fn test_clear_tab_frees_table() {
        let state = test_state().await;
        let (table_id, tacos, _) = seed(&state).await;
        add_item(&state, table_id, line(tacos, 1, 15.0)).await.unwrap();

        clear_tab(&state, table_id).await.unwrap();
        assert!(!has_open_tab(&state, table_id));
        let table = require_table(&state, table_id).await.unwrap();
        assert_eq!(table.status, TableStatus::Free);
    }

    #[tokio::test]
    async fn test_add_item_validates_line() {
        let state = test_state().await;
        let (table_id, tacos, _) = seed(&state).await;

        let err = add_item(&state, table_id, line(tacos, 0, 15.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);

        let err = add_item(&state, table_id, line(999, 1, 15.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
        assert!(!has_open_tab(&state, table_id));
    }
}
