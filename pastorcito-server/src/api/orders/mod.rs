//! Order API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/orders | POST | 下单 | 无 |
//! | /api/orders/{id} | GET | 订单跟踪 | 无 |
//! | /api/orders | GET | 列表 (q/field/value/sort/dir) | 管理员 |
//! | /api/orders/by-client/{id} | GET | 客户历史订单 | 管理员 |
//! | /api/orders/{id}/status | PUT | 变更状态 | 管理员 |
//! | /api/orders/{id}/transitions | GET | 可选下一状态 | 管理员 |
//! | /api/orders/{id} | DELETE | 删除订单 | 管理员 |

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::submit))
        .route("/by-client/{client_id}", get(handler::list_by_client))
        .route("/{id}", get(handler::get_by_id).delete(handler::delete))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/transitions", get(handler::transitions))
}
