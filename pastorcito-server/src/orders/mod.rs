//! 订单模块
//!
//! - [`submission`] - 下单：校验、引用解析、单事务写入
//! - [`workflow`] - 状态流转：按策略校验后持久化并广播
//! - [`tab`] - 桌台账单：记账、清空、结账转订单

pub mod submission;
pub mod tab;
pub mod workflow;

pub use submission::{submit_order, validate_submission};
pub use workflow::{change_status, transition_options};

/// 订单变更广播用的资源名
pub const RESOURCE_ORDER: &str = "order";
