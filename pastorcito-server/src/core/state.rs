use std::sync::Arc;

use dashmap::DashMap;
use shared::message::SyncPayload;
use shared::models::TableTab;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::auth::JwtService;
use crate::auth::password::hash_password;
use crate::core::{Config, ServerError};
use crate::db::DbService;

/// 通知通道容量，慢订阅者超出后会收到 Lagged
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// 资源版本管理器
///
/// 使用 DashMap 实现无锁并发的版本号管理。
/// 每种资源类型维护独立的版本号，支持原子递增。
///
/// 用于 broadcast_sync 时自动生成递增的版本号，
/// 确保订阅方可以通过版本号判断数据新旧。
#[derive(Debug, Default)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    /// 创建空的版本管理器
    pub fn new() -> Self {
        Self::default()
    }

    /// 递增指定资源的版本号并返回新值
    ///
    /// 如果资源不存在，从 0 开始递增（返回 1）
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取指定资源的当前版本号
    ///
    /// 如果资源不存在，返回 0
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

/// 管理员账号 (单账号，来自配置)
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub email: String,
    /// argon2 PHC 字符串
    pub password_hash: String,
}

impl AdminAccount {
    /// 从配置解析管理员凭据
    ///
    /// 优先级：`ADMIN_PASSWORD_HASH` > `ADMIN_PASSWORD` > 开发环境随机密码
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        let email = config.admin_email.trim().to_lowercase();

        if let Some(hash) = &config.admin_password_hash {
            argon2::PasswordHash::new(hash)
                .map_err(|e| ServerError::Config(format!("ADMIN_PASSWORD_HASH is not a PHC string: {e}")))?;
            return Ok(Self {
                email,
                password_hash: hash.clone(),
            });
        }

        let password = match &config.admin_password {
            Some(p) => p.clone(),
            None if config.is_production() => {
                return Err(ServerError::Config(
                    "ADMIN_PASSWORD or ADMIN_PASSWORD_HASH must be set in production".into(),
                ));
            }
            None => {
                let generated: String = crate::auth::jwt::generate_secure_printable_jwt_secret()
                    .chars()
                    .take(16)
                    .collect();
                tracing::warn!(
                    email = %email,
                    password = %generated,
                    "ADMIN_PASSWORD not set, generated a temporary admin password"
                );
                generated
            }
        };

        let password_hash = hash_password(&password)
            .map_err(|e| ServerError::Config(format!("Failed to hash admin password: {e}")))?;
        Ok(Self {
            email,
            password_hash,
        })
    }
}

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | 数据库连接池 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | admin | Arc<AdminAccount> | 管理员凭据 |
/// | resource_versions | Arc<ResourceVersions> | 资源版本管理 |
/// | events | broadcast::Sender | 变更通知总线 |
/// | tabs | Arc<DashMap> | 桌台账单 (仅内存) |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
    /// 管理员凭据
    pub admin: Arc<AdminAccount>,
    /// 资源版本管理器 (用于 broadcast_sync 自动递增版本号)
    pub resource_versions: Arc<ResourceVersions>,
    /// 变更通知
    pub events: broadcast::Sender<SyncPayload>,
    /// 桌台当前账单，key 为 table id，重启后丢失
    pub tabs: Arc<DashMap<i64, TableTab>>,
}

impl ServerState {
    /// 用已打开的连接池构造状态 (测试中配合 `DbService::in_memory`)
    pub fn with_pool(config: Config, pool: SqlitePool) -> Result<Self, ServerError> {
        let admin = AdminAccount::from_config(&config)?;
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            pool,
            jwt_service,
            admin: Arc::new(admin),
            resource_versions: Arc::new(ResourceVersions::new()),
            events,
            tabs: Arc::new(DashMap::new()),
        })
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (DATABASE_PATH，默认 work_dir/database/pastorcito.db) 和迁移
    /// 3. 管理员凭据、JWT、通知总线
    pub async fn initialize(config: &Config) -> Result<Self, ServerError> {
        config.ensure_work_dir_structure()?;

        let db = DbService::new(&config.database_path).await?;
        Self::with_pool(config.clone(), db.pool)
    }

    /// 订阅变更通知
    pub fn subscribe(&self) -> broadcast::Receiver<SyncPayload> {
        self.events.subscribe()
    }

    /// 广播同步消息
    ///
    /// 版本号由 ResourceVersions 自动递增管理。
    ///
    /// # 参数
    /// - `resource`: 资源类型 (如 "client", "order", "product")
    /// - `action`: 变更类型 ("created", "updated", "deleted", "status_changed" ...)
    /// - `id`: 资源 ID
    /// - `data`: 资源数据 (deleted 时为 None)
    pub fn broadcast_sync<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: &str,
        data: Option<&T>,
    ) {
        let version = self.resource_versions.increment(resource);
        let payload = SyncPayload {
            resource: resource.to_string(),
            version,
            action: action.to_string(),
            id: id.to_string(),
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };
        // 没有订阅者时 send 返回 Err，忽略即可
        if self.events.send(payload).is_err() {
            tracing::trace!(resource, action, id, "No event subscribers");
        }
    }
}
