use std::path::PathBuf;

use shared::order::TransitionPolicy;

use crate::auth::JwtConfig;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖 (启动时先加载 `.env`)：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | DATABASE_PATH | {WORK_DIR}/database/pastorcito.db | SQLite 文件 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志目录，设置后按天滚动写文件 |
/// | ADMIN_EMAIL | admin@pastorcito.local | 管理员账号 |
/// | ADMIN_PASSWORD | (无) | 管理员明文密码，启动时哈希 |
/// | ADMIN_PASSWORD_HASH | (无) | 管理员 argon2 PHC 哈希，优先于明文 |
/// | JWT_SECRET | 随机 | JWT 密钥 (至少 32 字符) |
/// | JWT_EXPIRATION_MINUTES | 480 | 会话有效期 |
/// | LOGIN_DELAY_MS | 500 | 登录固定延迟 |
/// | ORDER_TRANSITION_POLICY | unrestricted | 订单状态流转策略 (unrestricted / forward) |
/// | COOKIE_SECURE | false (production 为 true) | 会话 cookie 是否加 Secure |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 优雅关闭超时(毫秒) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/pastorcito HTTP_PORT=8080 cargo run -p pastorcito-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// SQLite 数据库路径
    pub database_path: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志级别
    pub log_level: String,
    /// 日志目录
    pub log_dir: Option<String>,
    /// 管理员账号
    pub admin_email: String,
    /// 管理员明文密码 (仅在没有哈希时使用)
    pub admin_password: Option<String>,
    /// 管理员密码哈希
    pub admin_password_hash: Option<String>,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 登录固定延迟 (毫秒)
    pub login_delay_ms: u64,
    /// 订单状态流转策略
    pub transition_policy: TransitionPolicy,
    /// 会话 cookie 是否带 Secure
    pub cookie_secure: bool,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let database_path = env_non_empty("DATABASE_PATH").unwrap_or_else(|| {
            PathBuf::from(&work_dir)
                .join("database")
                .join("pastorcito.db")
                .to_string_lossy()
                .into_owned()
        });

        let transition_policy = match std::env::var("ORDER_TRANSITION_POLICY") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to unrestricted", e);
                TransitionPolicy::Unrestricted
            }),
            Err(_) => TransitionPolicy::default(),
        };

        let cookie_secure = env_parse("COOKIE_SECURE").unwrap_or(environment == "production");

        Self {
            http_port: env_parse("HTTP_PORT").unwrap_or(3000),
            database_path,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: env_non_empty("LOG_DIR"),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@pastorcito.local".into()),
            admin_password: env_non_empty("ADMIN_PASSWORD"),
            admin_password_hash: env_non_empty("ADMIN_PASSWORD_HASH"),
            jwt: JwtConfig::default(),
            login_delay_ms: env_parse("LOGIN_DELAY_MS").unwrap_or(500),
            transition_policy,
            cookie_secure,
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS").unwrap_or(30000),
            shutdown_timeout_ms: env_parse("SHUTDOWN_TIMEOUT_MS").unwrap_or(10000),
            work_dir,
            environment,
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.database_path = PathBuf::from(&config.work_dir)
            .join("database")
            .join("pastorcito.db")
            .to_string_lossy()
            .into_owned();
        config.http_port = http_port;
        config
    }

    /// 数据库目录
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.database_path)
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&self.work_dir))
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        std::fs::create_dir_all(self.database_dir())?;
        if let Some(dir) = &self.log_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
