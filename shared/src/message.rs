//! 变更通知载荷
//!
//! 服务端每次成功的写操作都会广播一条 [`SyncPayload`]，
//! 管理端据此刷新列表或弹出提示。

use serde::{Deserialize, Serialize};

/// 同步信号载荷 (服务端 -> 管理端)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPayload {
    /// 资源类型 (例如: "order", "client", "dining_table")
    pub resource: String,
    /// 版本号 (每种资源独立递增)
    pub version: u64,
    /// 变更类型 (例如: "created", "updated", "deleted", "status_changed")
    pub action: String,
    /// 资源 ID
    pub id: String,
    /// 资源数据 (可选，deleted 时为 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}
