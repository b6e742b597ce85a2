//! Order domain: line items, submissions, totals and the status workflow

pub mod status;
pub mod total;

use serde::{Deserialize, Serialize};

pub use status::{
    OrderStatus, ServiceType, TransitionError, TransitionPolicy, apply_transition,
    check_transition, next_allowed_states,
};
pub use total::{PricedLine, format_money, line_total, order_total};

/// Maximum allowed unit price per item
pub const MAX_UNIT_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per item
pub const MAX_QUANTITY: i32 = 9999;

/// 支付方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum PaymentMethod {
    /// 现金
    #[serde(rename = "efectivo", alias = "cash")]
    #[cfg_attr(feature = "db", sqlx(rename = "efectivo"))]
    Cash,
    /// 刷卡
    #[serde(rename = "tarjeta", alias = "card")]
    #[cfg_attr(feature = "db", sqlx(rename = "tarjeta"))]
    Card,
    /// 转账
    #[serde(rename = "transferencia", alias = "transfer")]
    #[cfg_attr(feature = "db", sqlx(rename = "transferencia"))]
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "efectivo",
            Self::Card => "tarjeta",
            Self::Transfer => "transferencia",
        }
    }
}

/// One submitted line: product, quantity, captured unit price and sauces
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItemInput {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: f64,
    #[serde(default)]
    pub sauces: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PricedLine for LineItemInput {
    fn unit_price(&self) -> f64 {
        self.unit_price
    }

    fn quantity(&self) -> i32 {
        self.quantity
    }
}

/// Order submission payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSubmission {
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub table_id: Option<i64>,
    #[serde(default)]
    pub service_type: ServiceType,
    pub payment_method: PaymentMethod,
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_wire_names() {
        let m: PaymentMethod = serde_json::from_str("\"efectivo\"").unwrap();
        assert_eq!(m, PaymentMethod::Cash);
        let m: PaymentMethod = serde_json::from_str("\"card\"").unwrap();
        assert_eq!(m, PaymentMethod::Card);
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Transfer).unwrap(),
            "\"transferencia\""
        );
        assert!(serde_json::from_str::<PaymentMethod>("\"bitcoin\"").is_err());
    }

    #[test]
    fn test_submission_defaults() {
        let json = r#"{
            "client_id": 1,
            "payment_method": "efectivo",
            "items": [{"product_id": 3, "quantity": 3, "unit_price": 15}]
        }"#;
        let sub: OrderSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(sub.service_type, ServiceType::Delivery);
        assert!(sub.items[0].sauces.is_empty());
        assert_eq!(order_total(&sub.items), 45.0);
    }
}
