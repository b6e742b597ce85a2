//! 认证中间件
//!
//! 为管理员 JWT 认证提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::Method;

use crate::AppError;
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// 会话 cookie 名
pub const SESSION_COOKIE: &str = "pastorcito_session";

/// 判断是否为顾客端公共路由 (无需认证)
///
/// | 方法 | 路径 |
/// |------|------|
/// | POST | /api/auth/login |
/// | GET | /api/products, /api/products/{id} |
/// | GET | /api/sauces, /api/sauces/{id} |
/// | GET | /api/clients/by-phone/{phone}, /api/clients/suggest |
/// | POST | /api/clients |
/// | POST | /api/orders |
/// | GET | /api/orders/{id} |
pub fn is_public_route(method: &Method, path: &str) -> bool {
    let segments: Vec<&str> = path
        .trim_end_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let get = method == Method::GET;
    let post = method == Method::POST;

    match segments.as_slice() {
        ["api", "auth", "login"] => post,
        ["api", "products"] | ["api", "sauces"] => get,
        ["api", "products", id] => get && *id != "all",
        ["api", "sauces", _] => get,
        ["api", "clients", "by-phone", _] | ["api", "clients", "suggest"] => get,
        ["api", "clients"] | ["api", "orders"] => post,
        ["api", "orders", _] => get,
        _ => false,
    }
}

/// 从 Cookie 头中取出会话令牌
pub fn token_from_cookie(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// 认证中间件 - 要求管理员登录
///
/// 令牌来源 (按顺序)：
/// 1. `Authorization: Bearer <token>`
/// 2. `Cookie: pastorcito_session=<token>`
///
/// 验证成功后将 [`CurrentUser`] 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径 (health 等)
/// - [`is_public_route`] 列出的顾客端接口
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无令牌 | 401 NotAuthenticated |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 TokenInvalid |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let path = req.uri().path();
    if !path.starts_with("/api/") || is_public_route(req.method(), path) {
        return Ok(next.run(req).await);
    }

    let headers = req.headers();
    let token = match headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?
            .to_string(),
        None => match headers
            .get(http::header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(token_from_cookie)
        {
            Some(token) => token.to_string(),
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
                return Err(AppError::unauthorized());
            }
        },
    };

    match state.jwt_service.validate_token(&token) {
        Ok(claims) => {
            let user = CurrentUser::from(claims);
            if !user.is_admin() {
                security_log!("WARN", "admin_required", email = user.email.clone());
                return Err(AppError::new(shared::ErrorCode::AdminRequired));
            }
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}
