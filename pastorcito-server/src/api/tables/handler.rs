//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, OrderDetail, TabCheckout, TableStatusUpdate,
    TableTab,
};
use shared::order::LineItemInput;
use shared::{ApiResponse, ListQuery, apply_list_query};

use crate::api::convert::{missing, repo_error};
use crate::core::ServerState;
use crate::db::repository::{RepoError, dining_table};
use crate::orders::tab::{self, RESOURCE_TABLE};
use crate::utils::{AppError, AppResult, ErrorCode, ok};

fn table_error(err: RepoError) -> AppError {
    repo_error(err, ErrorCode::TableNotFound, ErrorCode::TableNumberExists)
}

fn validate_positive(value: Option<i32>, field: &str) -> AppResult<()> {
    match value {
        Some(v) if v <= 0 => Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} must be greater than 0"),
        )
        .with_detail("field", field)),
        _ => Ok(()),
    }
}

/// GET /api/tables - 桌台列表，默认按桌号排序
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<DiningTable>>>> {
    let tables = dining_table::find_all(&state.pool).await?;
    Ok(ok(apply_list_query(tables, &query)?))
}

/// GET /api/tables/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    let table = dining_table::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| missing(ErrorCode::TableNotFound, "Table", id))?;
    Ok(ok(table))
}

/// POST /api/tables
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    validate_positive(Some(payload.number), "number")?;
    validate_positive(payload.capacity, "capacity")?;

    let table = dining_table::create(&state.pool, payload)
        .await
        .map_err(table_error)?;
    state.broadcast_sync(RESOURCE_TABLE, "created", &table.id.to_string(), Some(&table));
    Ok(ok(table))
}

/// PUT /api/tables/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    validate_positive(payload.number, "number")?;
    validate_positive(payload.capacity, "capacity")?;

    let table = dining_table::update(&state.pool, id, payload)
        .await
        .map_err(table_error)?;
    state.broadcast_sync(RESOURCE_TABLE, "updated", &table.id.to_string(), Some(&table));
    Ok(ok(table))
}

/// PUT /api/tables/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TableStatusUpdate>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    let table = dining_table::set_status(&state.pool, id, payload.status)
        .await
        .map_err(table_error)?;
    state.broadcast_sync(RESOURCE_TABLE, "updated", &table.id.to_string(), Some(&table));
    Ok(ok(table))
}

/// DELETE /api/tables/{id} - 有未结账单时拒绝
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<bool>>> {
    if tab::has_open_tab(&state, id) {
        return Err(AppError::with_message(
            ErrorCode::TableOccupied,
            format!("Table {id} has an open tab"),
        ));
    }
    let deleted = dining_table::delete(&state.pool, id)
        .await
        .map_err(table_error)?;
    state.tabs.remove(&id);
    state.broadcast_sync::<()>(RESOURCE_TABLE, "deleted", &id.to_string(), None);
    Ok(ok(deleted))
}

/// GET /api/tables/{id}/tab
pub async fn get_tab(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<TableTab>>> {
    Ok(ok(tab::get_tab(&state, id).await?))
}

/// POST /api/tables/{id}/tab/items
pub async fn add_tab_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(line): Json<LineItemInput>,
) -> AppResult<Json<ApiResponse<TableTab>>> {
    Ok(ok(tab::add_item(&state, id, line).await?))
}

/// DELETE /api/tables/{id}/tab - 清空账单
pub async fn clear_tab(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<bool>>> {
    tab::clear_tab(&state, id).await?;
    Ok(ok(true))
}

/// POST /api/tables/{id}/tab/checkout
pub async fn checkout(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TabCheckout>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    Ok(ok(tab::checkout(&state, id, payload).await?))
}
