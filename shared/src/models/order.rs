//! Order Model

use serde::{Deserialize, Serialize};

use crate::order::{OrderStatus, PaymentMethod, PricedLine, ServiceType, TransitionPolicy};

/// Order header (订单)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// Sequential human-readable number, starts at 1
    pub number: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub service_type: ServiceType,
    pub client_id: Option<i64>,
    pub table_id: Option<i64>,
    pub note: Option<String>,
    pub total: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Persisted order line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    /// Product name at order time
    pub product_name: String,
    /// Unit price captured at order time, never re-read from the catalog
    pub unit_price: f64,
    pub quantity: i32,
    pub sauces: Vec<String>,
    pub note: Option<String>,
}

impl PricedLine for OrderLineItem {
    fn unit_price(&self) -> f64 {
        self.unit_price
    }

    fn quantity(&self) -> i32 {
        self.quantity
    }
}

/// Order with its line items and, when known, the client name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub client_name: Option<String>,
    pub items: Vec<OrderLineItem>,
}

/// Status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// 当前状态下可选的目标状态 (供管理端渲染按钮)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionOptions {
    pub order_id: i64,
    pub service_type: ServiceType,
    pub current: OrderStatus,
    pub policy: TransitionPolicy,
    pub allowed: Vec<OrderStatus>,
}
