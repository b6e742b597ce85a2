//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 管理员登录、会话
//! - [`clients`] - 客户 (注册、按电话查找、后台管理)
//! - [`products`] - 菜品和饮品
//! - [`sauces`] - 酱料
//! - [`orders`] - 下单、跟踪、状态流转
//! - [`tables`] - 桌台和桌台账单
//! - [`events`] - 变更通知 (SSE)

pub mod convert;
pub mod middleware;

pub mod auth;
pub mod clients;
pub mod events;
pub mod health;
pub mod orders;
pub mod products;
pub mod sauces;
pub mod tables;

use axum::Router;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult, ok};

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Health API - public route
        .merge(health::router())
        .merge(auth::router())
        .merge(clients::router())
        .merge(products::router())
        .merge(sauces::router())
        .merge(orders::router())
        .merge(tables::router())
        .merge(events::router())
}
