//! Dining Table Model

use serde::{Deserialize, Serialize};

use crate::order::{LineItemInput, PaymentMethod};

/// 桌台状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Free,
    Occupied,
    Reserved,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
        }
    }
}

/// Dining table entity (桌台)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    pub number: i32,
    pub capacity: i32,
    pub status: TableStatus,
    pub is_active: bool,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub number: i32,
    pub capacity: Option<i32>,
}

/// Update dining table payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub number: Option<i32>,
    pub capacity: Option<i32>,
    pub status: Option<TableStatus>,
}

/// 桌台当前账单 (仅内存，不持久化)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableTab {
    pub table_id: i64,
    pub items: Vec<TabItem>,
    pub total: f64,
}

/// Tab line: the submitted line plus the product name snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabItem {
    #[serde(flatten)]
    pub line: LineItemInput,
    pub product_name: String,
}

impl crate::order::PricedLine for TabItem {
    fn unit_price(&self) -> f64 {
        self.line.unit_price
    }

    fn quantity(&self) -> i32 {
        self.line.quantity
    }
}

/// Table status change payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TableStatusUpdate {
    pub status: TableStatus,
}

/// Tab checkout payload: the tab becomes a dine-in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabCheckout {
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
