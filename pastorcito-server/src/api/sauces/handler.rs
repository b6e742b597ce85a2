//! Sauce API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::ApiResponse;
use shared::models::{MAX_HEAT_LEVEL, Sauce, SauceCreate, SauceUpdate};

use crate::api::convert::{missing, repo_error};
use crate::core::ServerState;
use crate::db::repository::{RepoError, sauce};
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode, ok};

const RESOURCE_SAUCE: &str = "sauce";

fn sauce_error(err: RepoError) -> AppError {
    repo_error(err, ErrorCode::SauceNotFound, ErrorCode::AlreadyExists)
}

fn validate_heat_level(level: i32) -> AppResult<()> {
    if !(0..=MAX_HEAT_LEVEL).contains(&level) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("heat_level must be between 0 and {MAX_HEAT_LEVEL}"),
        )
        .with_detail("field", "heat_level"));
    }
    Ok(())
}

/// GET /api/sauces - 按辣度排序
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<Vec<Sauce>>>> {
    let sauces = sauce::find_all(&state.pool).await?;
    Ok(ok(sauces))
}

/// GET /api/sauces/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Sauce>>> {
    let sauce = sauce::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| missing(ErrorCode::SauceNotFound, "Sauce", id))?;
    Ok(ok(sauce))
}

/// POST /api/sauces
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<SauceCreate>,
) -> AppResult<Json<ApiResponse<Sauce>>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_heat_level(payload.heat_level)?;

    let sauce = sauce::create(&state.pool, payload).await?;
    state.broadcast_sync(RESOURCE_SAUCE, "created", &sauce.id.to_string(), Some(&sauce));
    Ok(ok(sauce))
}

/// PUT /api/sauces/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<SauceUpdate>,
) -> AppResult<Json<ApiResponse<Sauce>>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(level) = payload.heat_level {
        validate_heat_level(level)?;
    }

    let sauce = sauce::update(&state.pool, id, payload)
        .await
        .map_err(sauce_error)?;
    state.broadcast_sync(RESOURCE_SAUCE, "updated", &sauce.id.to_string(), Some(&sauce));
    Ok(ok(sauce))
}

/// DELETE /api/sauces/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<bool>>> {
    let deleted = sauce::delete(&state.pool, id).await.map_err(sauce_error)?;
    state.broadcast_sync::<()>(RESOURCE_SAUCE, "deleted", &id.to_string(), None);
    Ok(ok(deleted))
}
