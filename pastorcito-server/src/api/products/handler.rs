//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::{ApiResponse, ListQuery, apply_list_query};

use crate::api::convert::{missing, repo_error};
use crate::core::ServerState;
use crate::db::repository::{RepoError, product};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_price,
    validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode, ok};

const RESOURCE_PRODUCT: &str = "product";

fn product_error(err: RepoError) -> AppError {
    repo_error(err, ErrorCode::ProductNotFound, ErrorCode::AlreadyExists)
}

/// GET /api/products - 在售商品 (顾客菜单)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let products = product::find_all(&state.pool).await?;
    Ok(ok(products))
}

/// GET /api/products/all - 全部商品，含下架 (支持搜索、过滤、排序)
pub async fn list_all(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let products = product::find_all_with_inactive(&state.pool).await?;
    Ok(ok(apply_list_query(products, &query)?))
}

/// GET /api/products/{id} - 单个在售商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = product::find_by_id(&state.pool, id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| missing(ErrorCode::ProductNotFound, "Product", id))?;
    Ok(ok(product))
}

/// POST /api/products
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<ApiResponse<Product>>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&Some(payload.description.clone()), "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.image, "image", MAX_URL_LEN)?;
    validate_price(payload.price, "price")?;

    let product = product::create(&state.pool, payload).await?;

    tracing::info!(product_id = product.id, name = %product.name, "Product created");
    state.broadcast_sync(RESOURCE_PRODUCT, "created", &product.id.to_string(), Some(&product));
    Ok(ok(product))
}

/// PUT /api/products/{id} - 部分更新，`is_active` 可用于重新上架
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<ApiResponse<Product>>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.image, "image", MAX_URL_LEN)?;
    if let Some(price) = payload.price {
        validate_price(price, "price")?;
    }

    let product = product::update(&state.pool, id, payload)
        .await
        .map_err(product_error)?;

    state.broadcast_sync(RESOURCE_PRODUCT, "updated", &product.id.to_string(), Some(&product));
    Ok(ok(product))
}

/// DELETE /api/products/{id} - 下架 (软删除)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<bool>>> {
    let deleted = product::delete(&state.pool, id)
        .await
        .map_err(product_error)?;

    state.broadcast_sync::<()>(RESOURCE_PRODUCT, "deleted", &id.to_string(), None);
    Ok(ok(deleted))
}
