//! 订单状态流转
//!
//! 固定的状态词汇表 + 可配置的流转策略：
//!
//! | 服务类型 | 流程 |
//! |----------|------|
//! | delivery | pending → preparing → en_route → delivered |
//! | dine_in  | pending → preparing → ready → completed |
//!
//! 两种流程都可以进入 `cancelled`。`Unrestricted` 策略允许跳到词汇表中的
//! 任意其他状态；`Forward` 策略只允许前进一步或取消，终态不可再变。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Order;

/// 订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    EnRoute,
    Ready,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::EnRoute => "en_route",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "preparing" => Ok(Self::Preparing),
            "en_route" => Ok(Self::EnRoute),
            "ready" => Ok(Self::Ready),
            "delivered" => Ok(Self::Delivered),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// 服务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// 外送
    #[default]
    Delivery,
    /// 堂食
    DineIn,
}

const DELIVERY_FLOW: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Preparing,
    OrderStatus::EnRoute,
    OrderStatus::Delivered,
];

const DINE_IN_FLOW: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Completed,
];

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::DineIn => "dine_in",
        }
    }

    /// 主流程 (不含 cancelled)，按前进顺序排列
    pub fn flow(&self) -> &'static [OrderStatus] {
        match self {
            Self::Delivery => &DELIVERY_FLOW,
            Self::DineIn => &DINE_IN_FLOW,
        }
    }

    /// 该服务类型的完整状态词汇表
    pub fn vocabulary(&self) -> Vec<OrderStatus> {
        let mut states = self.flow().to_vec();
        states.push(OrderStatus::Cancelled);
        states
    }

    pub fn accepts(&self, status: OrderStatus) -> bool {
        status == OrderStatus::Cancelled || self.flow().contains(&status)
    }
}

/// 状态流转策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// 允许跳到任意其他状态
    #[default]
    Unrestricted,
    /// 只能前进一步，非终态可随时取消
    Forward,
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unrestricted" => Ok(Self::Unrestricted),
            "forward" => Ok(Self::Forward),
            other => Err(format!("unknown transition policy: {other}")),
        }
    }
}

/// 状态流转错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("status {status} is not used by {service} orders")]
    NotInVocabulary {
        status: OrderStatus,
        service: &'static str,
    },

    #[error("cannot move order from {from} to {to}")]
    NotAllowed { from: OrderStatus, to: OrderStatus },
}

/// 当前状态下可选的目标状态
pub fn next_allowed_states(
    service: ServiceType,
    current: OrderStatus,
    policy: TransitionPolicy,
) -> Vec<OrderStatus> {
    match policy {
        TransitionPolicy::Unrestricted => service
            .vocabulary()
            .into_iter()
            .filter(|s| *s != current)
            .collect(),
        TransitionPolicy::Forward => {
            if current.is_terminal() {
                return Vec::new();
            }
            let flow = service.flow();
            let mut next = Vec::with_capacity(2);
            if let Some(step) = flow
                .iter()
                .position(|s| *s == current)
                .and_then(|pos| flow.get(pos + 1))
            {
                next.push(*step);
            }
            next.push(OrderStatus::Cancelled);
            next
        }
    }
}

/// 校验一次状态变更；目标等于当前状态时视为幂等成功
pub fn check_transition(
    service: ServiceType,
    current: OrderStatus,
    target: OrderStatus,
    policy: TransitionPolicy,
) -> Result<(), TransitionError> {
    if !service.accepts(target) {
        return Err(TransitionError::NotInVocabulary {
            status: target,
            service: service.as_str(),
        });
    }
    if target == current {
        return Ok(());
    }
    if next_allowed_states(service, current, policy).contains(&target) {
        Ok(())
    } else {
        Err(TransitionError::NotAllowed {
            from: current,
            to: target,
        })
    }
}

/// 应用状态变更，返回状态是否实际发生了变化
pub fn apply_transition(
    order: &mut Order,
    target: OrderStatus,
    policy: TransitionPolicy,
    now_millis: i64,
) -> Result<bool, TransitionError> {
    check_transition(order.service_type, order.status, target, policy)?;
    if order.status == target {
        return Ok(false);
    }
    order.status = target;
    order.updated_at = now_millis;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::PaymentMethod;

    fn order(service_type: ServiceType, status: OrderStatus) -> Order {
        Order {
            id: 1,
            number: 1,
            status,
            payment_method: PaymentMethod::Cash,
            service_type,
            client_id: Some(7),
            table_id: None,
            note: None,
            total: 45.0,
            created_at: 1000,
            updated_at: 1000,
        }
    }

    #[test]
    fn test_unrestricted_offers_every_other_state() {
        let next = next_allowed_states(
            ServiceType::Delivery,
            OrderStatus::Pending,
            TransitionPolicy::Unrestricted,
        );
        assert_eq!(
            next,
            vec![
                OrderStatus::Preparing,
                OrderStatus::EnRoute,
                OrderStatus::Delivered,
                OrderStatus::Cancelled,
            ]
        );

        // Even terminal states can be left
        let from_delivered = next_allowed_states(
            ServiceType::Delivery,
            OrderStatus::Delivered,
            TransitionPolicy::Unrestricted,
        );
        assert!(from_delivered.contains(&OrderStatus::Pending));
        assert!(!from_delivered.contains(&OrderStatus::Delivered));
    }

    #[test]
    fn test_dine_in_vocabulary() {
        let next = next_allowed_states(
            ServiceType::DineIn,
            OrderStatus::Preparing,
            TransitionPolicy::Unrestricted,
        );
        assert!(next.contains(&OrderStatus::Ready));
        assert!(next.contains(&OrderStatus::Completed));
        assert!(!next.contains(&OrderStatus::EnRoute));
        assert!(!next.contains(&OrderStatus::Delivered));
    }

    #[test]
    fn test_forward_graph() {
        let p = TransitionPolicy::Forward;
        assert_eq!(
            next_allowed_states(ServiceType::Delivery, OrderStatus::Pending, p),
            vec![OrderStatus::Preparing, OrderStatus::Cancelled]
        );
        assert_eq!(
            next_allowed_states(ServiceType::Delivery, OrderStatus::EnRoute, p),
            vec![OrderStatus::Delivered, OrderStatus::Cancelled]
        );
        assert_eq!(
            next_allowed_states(ServiceType::DineIn, OrderStatus::Preparing, p),
            vec![OrderStatus::Ready, OrderStatus::Cancelled]
        );
    }

    #[test]
    fn test_forward_cancel_from_every_non_terminal_state() {
        for service in [ServiceType::Delivery, ServiceType::DineIn] {
            for state in service.vocabulary() {
                let next = next_allowed_states(service, state, TransitionPolicy::Forward);
                if state.is_terminal() {
                    assert!(next.is_empty(), "{state} should be terminal");
                } else {
                    assert!(next.contains(&OrderStatus::Cancelled));
                }
            }
        }
    }

    #[test]
    fn test_forward_rejects_skipping() {
        let err = check_transition(
            ServiceType::Delivery,
            OrderStatus::Pending,
            OrderStatus::Delivered,
            TransitionPolicy::Forward,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::NotAllowed {
                from: OrderStatus::Pending,
                to: OrderStatus::Delivered
            }
        );
    }

    #[test]
    fn test_vocabulary_enforced_under_both_policies() {
        for policy in [TransitionPolicy::Unrestricted, TransitionPolicy::Forward] {
            let err = check_transition(
                ServiceType::Delivery,
                OrderStatus::Pending,
                OrderStatus::Ready,
                policy,
            )
            .unwrap_err();
            assert!(matches!(err, TransitionError::NotInVocabulary { .. }));
        }
    }

    #[test]
    fn test_apply_transition_overwrites_status() {
        let mut o = order(ServiceType::Delivery, OrderStatus::Pending);
        let changed =
            apply_transition(&mut o, OrderStatus::EnRoute, TransitionPolicy::Unrestricted, 2000)
                .unwrap();
        assert!(changed);
        assert_eq!(o.status, OrderStatus::EnRoute);
        assert_eq!(o.updated_at, 2000);
    }

    #[test]
    fn test_apply_same_status_is_noop() {
        let mut o = order(ServiceType::DineIn, OrderStatus::Ready);
        let changed =
            apply_transition(&mut o, OrderStatus::Ready, TransitionPolicy::Forward, 2000).unwrap();
        assert!(!changed);
        assert_eq!(o.updated_at, 1000);
    }

    #[test]
    fn test_parse() {
        assert_eq!("en_route".parse::<OrderStatus>(), Ok(OrderStatus::EnRoute));
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert_eq!(
            " Forward ".parse::<TransitionPolicy>(),
            Ok(TransitionPolicy::Forward)
        );
    }
}
