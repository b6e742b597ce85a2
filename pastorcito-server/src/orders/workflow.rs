//! Order status workflow
//!
//! 状态校验逻辑在 `shared::order::status`，这里负责加载、持久化和通知。

use shared::models::{Order, TransitionOptions};
use shared::order::{OrderStatus, TransitionError, apply_transition, next_allowed_states};

use super::RESOURCE_ORDER;
use crate::core::ServerState;
use crate::db::repository;
use crate::utils::{AppError, AppResult, ErrorCode};

fn rejected(err: TransitionError) -> AppError {
    let target = match &err {
        TransitionError::NotInVocabulary { status, .. } => *status,
        TransitionError::NotAllowed { to, .. } => *to,
    };
    AppError::with_message(ErrorCode::InvalidStatusTransition, err.to_string())
        .with_detail("status", target.as_str())
}

async fn load(state: &ServerState, order_id: i64) -> AppResult<Order> {
    repository::order::find_by_id(&state.pool, order_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::OrderNotFound, format!("Order {order_id} not found"))
        })
}

/// 变更订单状态
///
/// 目标状态与当前相同时直接返回，不写库也不广播。
pub async fn change_status(
    state: &ServerState,
    order_id: i64,
    target: OrderStatus,
) -> AppResult<Order> {
    let mut order = load(state, order_id).await?;
    let from = order.status;

    let changed = apply_transition(
        &mut order,
        target,
        state.config.transition_policy,
        shared::util::now_millis(),
    )
    .map_err(rejected)?;
    if !changed {
        return Ok(order);
    }

    repository::order::update_status(&state.pool, order.id, order.status, order.updated_at).await?;

    tracing::info!(
        order_id = order.id,
        number = order.number,
        from = %from.as_str(),
        to = %order.status.as_str(),
        "Order status changed"
    );
    state.broadcast_sync(RESOURCE_ORDER, "status_changed", &order.id.to_string(), Some(&order));
    Ok(order)
}

/// 查询可选的下一状态 (供管理端渲染按钮)
pub async fn transition_options(state: &ServerState, order_id: i64) -> AppResult<TransitionOptions> {
    let order = load(state, order_id).await?;
    let policy = state.config.transition_policy;
    Ok(TransitionOptions {
        order_id: order.id,
        service_type: order.service_type,
        current: order.status,
        policy,
        allowed: next_allowed_states(order.service_type, order.status, policy),
    })
}
