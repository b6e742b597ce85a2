//! Repository error -> API error
//!
//! Repository 只知道通用的 NotFound / Duplicate，这里换成资源专属错误码。

use crate::db::repository::RepoError;
use crate::utils::{AppError, ErrorCode};

/// 按资源映射 repository 错误
///
/// - `not_found`: 资源不存在时使用的错误码 (如 `ClientNotFound`)
/// - `duplicate`: 唯一约束冲突时使用的错误码 (如 `ClientPhoneExists`)
pub fn repo_error(err: RepoError, not_found: ErrorCode, duplicate: ErrorCode) -> AppError {
    match err {
        RepoError::NotFound(msg) => AppError::with_message(not_found, msg),
        RepoError::Duplicate(msg) => AppError::with_message(duplicate, msg),
        other => other.into(),
    }
}

/// `{resource} {id} not found` 形式的错误
pub fn missing(code: ErrorCode, resource: &str, id: i64) -> AppError {
    AppError::with_message(code, format!("{resource} {id} not found")).with_detail("id", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_error_mapping() {
        let err = repo_error(
            RepoError::Duplicate("Client with phone 5551234 already exists".into()),
            ErrorCode::ClientNotFound,
            ErrorCode::ClientPhoneExists,
        );
        assert_eq!(err.code, ErrorCode::ClientPhoneExists);
        assert_eq!(err.http_status(), http::StatusCode::CONFLICT);

        let err = repo_error(
            RepoError::NotFound("Client 7 not found".into()),
            ErrorCode::ClientNotFound,
            ErrorCode::ClientPhoneExists,
        );
        assert_eq!(err.code, ErrorCode::ClientNotFound);
        assert_eq!(err.message, "Client 7 not found");

        let err = repo_error(
            RepoError::Database("disk I/O error".into()),
            ErrorCode::ClientNotFound,
            ErrorCode::ClientPhoneExists,
        );
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn test_missing_carries_id() {
        let err = missing(ErrorCode::SauceNotFound, "Sauce", 3);
        assert_eq!(err.message, "Sauce 3 not found");
        assert_eq!(
            err.details.unwrap().get("id"),
            Some(&serde_json::json!(3))
        );
    }
}
