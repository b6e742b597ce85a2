//! El Pastorcito Server - 餐厅点餐与后台管理服务
//!
//! # 架构概述
//!
//! - **HTTP API** (`api`): 顾客端公共接口 + 管理端 REST 接口
//! - **认证** (`auth`): JWT + Argon2，Bearer 或会话 cookie
//! - **数据库** (`db`): SQLite (sqlx)，嵌入式迁移
//! - **订单** (`orders`): 下单校验与事务写入、状态流转
//!
//! # 模块结构
//!
//! ```text
//! pastorcito-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── auth/          # JWT 认证、密码哈希、中间件
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 连接池和 repository
//! ├── orders/        # 下单流程、状态流转
//! └── utils/         # 日志、校验、响应封装
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState, build_app};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 加载 `.env` 并初始化日志
///
/// 日志级别和目录来自 `LOG_LEVEL` / `LOG_DIR`，需要在 [`Config::from_env`]
/// 之前调用，这样配置解析时的告警也能输出。
pub fn setup_environment() -> Result<(), core::ServerError> {
    if let Err(e) = dotenv::dotenv()
        && !e.not_found()
    {
        return Err(core::ServerError::Config(format!("Failed to load .env: {e}")));
    }

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty());
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____  __   ____  ___   _____ ______ ____  ____   ______ ____ ______ ____
   / __/ / /  / __ \/   | / ___//_  __// __ \/ __ \ / ____//  _//_  __// __ \
  / _/  / /  / /_/ / /| | \__ \  / /  / / / / /_/ // /     / /   / /  / / / /
 / /___/ /__/ ____/ ___ |___/ / / /  / /_/ / _, _// /___ _/ /   / /  / /_/ /
/_____/____/_/   /_/  |_/____/ /_/   \____/_/ |_| \____//___/  /_/   \____/
    "#
    );
}
