//! Authentication Handlers
//!
//! 单管理员账号：登录签发 JWT，同时写入 HttpOnly 会话 cookie

use std::time::Duration;

use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use http::header::SET_COOKIE;
use shared::client::{AdminInfo, LoginRequest, LoginResponse};

use crate::auth::password::verify_password;
use crate::auth::{CurrentUser, SESSION_COOKIE};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::validation::MAX_PASSWORD_LEN;
use crate::utils::{AppError, AppResult, ok};

/// `Set-Cookie` 值：HttpOnly、SameSite=Lax、与令牌同寿命
pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// 立即过期的会话 cookie
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Login handler
///
/// 邮箱或密码错误统一返回 InvalidCredentials，且无论结果都等待固定延迟
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Response> {
    let email = req.email.trim().to_lowercase();

    // 始终做一次哈希校验，避免通过耗时判断邮箱是否存在
    let password_ok = req.password.chars().count() <= MAX_PASSWORD_LEN
        && verify_password(&req.password, &state.admin.password_hash);
    let valid = password_ok && email == state.admin.email;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(state.config.login_delay_ms)).await;

    if !valid {
        security_log!("WARN", "login_failed", email = email.as_str());
        return Err(AppError::invalid_credentials());
    }

    let (token, expires_at) = state
        .jwt_service
        .generate_token(&email)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(email = %email, "Admin logged in");

    let cookie = session_cookie(
        &token,
        state.jwt_service.max_age_seconds(),
        state.config.cookie_secure,
    );
    let body = LoginResponse {
        token,
        expires_at,
        admin: AdminInfo { email },
    };

    Ok(([(SET_COOKIE, cookie)], ok(body)).into_response())
}

/// GET /api/auth/me - 当前管理员
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<shared::ApiResponse<AdminInfo>> {
    ok(AdminInfo { email: user.email })
}

/// POST /api/auth/logout - 清除会话 cookie
///
/// JWT 无状态，令牌在过期前仍然有效；管理端丢弃即可
pub async fn logout(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    tracing::info!(email = %user.email, "Admin logged out");
    (
        [(SET_COOKIE, clear_session_cookie(state.config.cookie_secure))],
        ok(true),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc.def.ghi", 28800, false);
        assert_eq!(
            cookie,
            "pastorcito_session=abc.def.ghi; Path=/; HttpOnly; SameSite=Lax; Max-Age=28800"
        );
        assert!(session_cookie("t", 60, true).ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(false);
        assert!(cookie.starts_with("pastorcito_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
