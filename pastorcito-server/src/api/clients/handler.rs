//! Client API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{Client, ClientCreate, ClientUpdate};
use shared::{ApiResponse, ListQuery, apply_list_query};

use crate::api::convert::{missing, repo_error};
use crate::core::ServerState;
use crate::db::repository::{RepoError, client};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, validate_email, validate_phone, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode, ok};

const RESOURCE_CLIENT: &str = "client";

/// 电话建议最多返回条数
const SUGGEST_LIMIT: i64 = 8;

fn client_error(err: RepoError) -> AppError {
    repo_error(err, ErrorCode::ClientNotFound, ErrorCode::ClientPhoneExists)
}

fn validate_create(data: &mut ClientCreate) -> AppResult<()> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&data.address, "address", MAX_ADDRESS_LEN)?;
    data.name = data.name.trim().to_string();
    data.address = data.address.trim().to_string();
    data.phone = validate_phone(&data.phone)?;
    data.email = validate_email(&data.email)?;
    Ok(())
}

fn validate_update(data: &mut ClientUpdate) -> AppResult<()> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(address) = &data.address {
        validate_required_text(address, "address", MAX_ADDRESS_LEN)?;
    }
    if let Some(phone) = &data.phone {
        data.phone = Some(validate_phone(phone)?);
    }
    // 空字符串 = 清空邮箱
    if let Some(email) = data.email.take() {
        data.email = if email.trim().is_empty() {
            Some(String::new())
        } else {
            validate_email(&Some(email))?
        };
    }
    Ok(())
}

/// GET /api/clients - 客户列表 (支持搜索、过滤、排序)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Client>>>> {
    let clients = client::find_all(&state.pool).await?;
    Ok(ok(apply_list_query(clients, &query)?))
}

/// GET /api/clients/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Client>>> {
    let client = client::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| missing(ErrorCode::ClientNotFound, "Client", id))?;
    Ok(ok(client))
}

/// GET /api/clients/by-phone/{phone} - 回头客识别
pub async fn get_by_phone(
    State(state): State<ServerState>,
    Path(phone): Path<String>,
) -> AppResult<Json<ApiResponse<Client>>> {
    let phone = validate_phone(&phone)?;
    let client = client::find_by_phone(&state.pool, &phone)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::ClientNotFound,
                format!("No client with phone {phone}"),
            )
        })?;
    Ok(ok(client))
}

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub phone: String,
}

/// GET /api/clients/suggest?phone= - 电话前缀建议
///
/// 输入不是合法的电话前缀时返回空列表
pub async fn suggest(
    State(state): State<ServerState>,
    Query(query): Query<SuggestQuery>,
) -> AppResult<Json<ApiResponse<Vec<Client>>>> {
    let prefix = match shared::util::normalize_phone(&query.phone) {
        Some(digits) if !digits.is_empty() => digits,
        _ => return Ok(ok(Vec::new())),
    };
    let clients = client::suggest_by_phone(&state.pool, &prefix, SUGGEST_LIMIT).await?;
    Ok(ok(clients))
}

/// POST /api/clients - 注册新客户
pub async fn create(
    State(state): State<ServerState>,
    Json(mut payload): Json<ClientCreate>,
) -> AppResult<Json<ApiResponse<Client>>> {
    validate_create(&mut payload)?;
    let client = client::create(&state.pool, payload)
        .await
        .map_err(client_error)?;

    tracing::info!(client_id = client.id, phone = %client.phone, "Client registered");
    state.broadcast_sync(RESOURCE_CLIENT, "created", &client.id.to_string(), Some(&client));
    Ok(ok(client))
}

/// PUT /api/clients/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(mut payload): Json<ClientUpdate>,
) -> AppResult<Json<ApiResponse<Client>>> {
    validate_update(&mut payload)?;
    let client = client::update(&state.pool, id, payload)
        .await
        .map_err(client_error)?;

    state.broadcast_sync(RESOURCE_CLIENT, "updated", &client.id.to_string(), Some(&client));
    Ok(ok(client))
}

/// POST /api/clients/{id}/toggle-featured - 切换重点客户标记
pub async fn toggle_featured(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Client>>> {
    let client = client::toggle_featured(&state.pool, id)
        .await
        .map_err(client_error)?;

    tracing::info!(client_id = id, is_featured = client.is_featured, "Client featured flag toggled");
    state.broadcast_sync(RESOURCE_CLIENT, "updated", &client.id.to_string(), Some(&client));
    Ok(ok(client))
}

/// DELETE /api/clients/{id} - 软删除，历史订单保留
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<bool>>> {
    let deleted = client::delete(&state.pool, id)
        .await
        .map_err(client_error)?;

    state.broadcast_sync::<()>(RESOURCE_CLIENT, "deleted", &id.to_string(), None);
    Ok(ok(deleted))
}
