//! Sauce Model

use serde::{Deserialize, Serialize};

/// 最高辣度
pub const MAX_HEAT_LEVEL: i32 = 5;

/// Sauce entity (salsa)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Sauce {
    pub id: i64,
    pub name: String,
    /// 0 (mild) ..= 5 (hottest)
    pub heat_level: i32,
}

/// Create sauce payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SauceCreate {
    pub name: String,
    #[serde(default)]
    pub heat_level: i32,
}

/// Update sauce payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SauceUpdate {
    pub name: Option<String>,
    pub heat_level: Option<i32>,
}
