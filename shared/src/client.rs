//! Auth types shared between server and client
//!
//! Request/response types used by the admin login flow.

use serde::{Deserialize, Serialize};

/// Admin login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Unix milliseconds
    pub expires_at: i64,
    pub admin: AdminInfo,
}

/// Authenticated admin identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminInfo {
    pub email: String,
}
