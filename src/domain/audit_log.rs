// ==========================================
// 化妆品生产批次计划系统 - 订单审计日志领域模型
// ==========================================
// 红线: 审计日志只追加，任何场景不得更新或删除已有条目
// 用途: 审计追踪，订单全生命周期可回溯
// ==========================================

use crate::domain::types::AuditAction;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ManufactureOrderAuditLog - 订单审计日志条目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufactureOrderAuditLog {
    pub id: String,                // 条目ID (UUID)
    pub order_id: String,          // 关联订单
    pub timestamp: NaiveDateTime,  // 操作时间戳
    pub user: String,              // 操作人
    pub action: AuditAction,       // 审计动作
    pub details: Option<String>,   // 详细描述
    pub old_value: Option<String>, // 变更前值
    pub new_value: Option<String>, // 变更后值
}

impl ManufactureOrderAuditLog {
    /// 创建新的审计条目
    pub fn new(
        order_id: impl Into<String>,
        timestamp: NaiveDateTime,
        user: impl Into<String>,
        action: AuditAction,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            timestamp,
            user: user.into(),
            action,
            details: None,
            old_value: None,
            new_value: None,
        }
    }

    /// 设置详细描述
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// 设置变更前后值
    pub fn with_change(
        mut self,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        self.old_value = Some(old_value.into());
        self.new_value = Some(new_value.into());
        self
    }
}
