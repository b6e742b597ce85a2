//! Dining Table API 模块 (管理员)
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/tables | GET/POST | 列表 / 新建 |
//! | /api/tables/{id} | GET/PUT/DELETE | 单个桌台 |
//! | /api/tables/{id}/status | PUT | 变更桌台状态 |
//! | /api/tables/{id}/tab | GET/DELETE | 查看 / 清空账单 |
//! | /api/tables/{id}/tab/items | POST | 账单加菜 |
//! | /api/tables/{id}/tab/checkout | POST | 结账转订单 |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", table_routes())
}

fn table_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/tab", get(handler::get_tab).delete(handler::clear_tab))
        .route("/{id}/tab/items", post(handler::add_tab_item))
        .route("/{id}/tab/checkout", post(handler::checkout))
}
