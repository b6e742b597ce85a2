//! Client Model

use serde::{Deserialize, Serialize};

/// 客户分级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ClientCategory {
    Regular,
    Premium,
    Vip,
}

impl ClientCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Premium => "premium",
            Self::Vip => "vip",
        }
    }
}

/// Client entity (客户)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Client {
    pub id: i64,
    pub name: String,
    /// Digits only, lookup key for returning customers
    pub phone: String,
    pub address: String,
    pub email: Option<String>,
    pub is_featured: bool,
    pub category: Option<ClientCategory>,
    /// Registration time (Unix millis)
    pub created_at: i64,
    pub is_active: bool,
}

/// Register / create client payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCreate {
    pub name: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub category: Option<ClientCategory>,
}

/// Update client payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub is_featured: Option<bool>,
    pub category: Option<ClientCategory>,
}
