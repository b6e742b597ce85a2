//! Client API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/clients | POST | 注册 | 无 |
//! | /api/clients/by-phone/{phone} | GET | 按电话查找 | 无 |
//! | /api/clients/suggest?phone= | GET | 电话前缀建议 | 无 |
//! | /api/clients | GET | 列表 (q/field/value/sort/dir) | 管理员 |
//! | /api/clients/{id} | GET/PUT/DELETE | 单个客户 | 管理员 |
//! | /api/clients/{id}/toggle-featured | POST | 切换重点客户 | 管理员 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/clients", client_routes())
}

fn client_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/by-phone/{phone}", get(handler::get_by_phone))
        .route("/suggest", get(handler::suggest))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/toggle-featured", post(handler::toggle_featured))
}
