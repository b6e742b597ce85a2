//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{Order, OrderDetail, OrderStatusUpdate, TransitionOptions};
use shared::order::OrderSubmission;
use shared::{ApiResponse, ListQuery, apply_list_query};

use crate::api::convert::{missing, repo_error};
use crate::core::ServerState;
use crate::db::repository::order;
use crate::orders::{self, RESOURCE_ORDER};
use crate::utils::{AppResult, ErrorCode, ok};

/// POST /api/orders - 顾客下单
pub async fn submit(
    State(state): State<ServerState>,
    Json(payload): Json<OrderSubmission>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let detail = orders::submit_order(&state.pool, payload).await?;
    state.broadcast_sync(
        RESOURCE_ORDER,
        "created",
        &detail.order.id.to_string(),
        Some(&detail),
    );
    Ok(ok(detail))
}

/// GET /api/orders/{id} - 订单详情 (顾客跟踪页也使用)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let detail = order::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| missing(ErrorCode::OrderNotFound, "Order", id))?;
    Ok(ok(detail))
}

/// GET /api/orders - 订单列表，默认按编号倒序
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<OrderDetail>>>> {
    let details = order::find_all_details(&state.pool).await?;
    Ok(ok(apply_list_query(details, &query)?))
}

/// GET /api/orders/by-client/{client_id} - 客户历史订单
pub async fn list_by_client(
    State(state): State<ServerState>,
    Path(client_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<OrderDetail>>>> {
    let details = order::find_details_by_client(&state.pool, client_id).await?;
    Ok(ok(apply_list_query(details, &query)?))
}

/// PUT /api/orders/{id}/status - 变更状态
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = orders::change_status(&state, id, payload.status).await?;
    Ok(ok(order))
}

/// GET /api/orders/{id}/transitions - 当前策略下可选的目标状态
pub async fn transitions(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<TransitionOptions>>> {
    Ok(ok(orders::transition_options(&state, id).await?))
}

/// DELETE /api/orders/{id} - 删除订单及其明细
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<bool>>> {
    let deleted = order::delete(&state.pool, id)
        .await
        .map_err(|e| repo_error(e, ErrorCode::OrderNotFound, ErrorCode::AlreadyExists))?;

    tracing::info!(order_id = id, "Order deleted");
    state.broadcast_sync::<()>(RESOURCE_ORDER, "deleted", &id.to_string(), None);
    Ok(ok(deleted))
}
