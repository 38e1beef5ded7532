// ==========================================
// 化妆品生产批次计划系统 - 身份层
// ==========================================
// 职责: 提供当前操作人信息，用于审计归属
// 说明: 认证本身是外部协作方，这里只消费其结果
// ==========================================

use serde::{Deserialize, Serialize};

/// 当前用户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
}

impl CurrentUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// 当前用户提供者
///
/// 外部认证层实现该接口；审计日志的 actor 字段由此而来。
pub trait CurrentUserProvider: Send + Sync {
    fn current_user(&self) -> CurrentUser;
}

/// 系统用户提供者（后台任务/测试默认实现）
pub struct SystemUserProvider;

impl CurrentUserProvider for SystemUserProvider {
    fn current_user(&self) -> CurrentUser {
        CurrentUser::new("system", "system")
    }
}

/// 固定用户提供者（测试用）
pub struct FixedUserProvider {
    user: CurrentUser,
}

impl FixedUserProvider {
    pub fn new(user: CurrentUser) -> Self {
        Self { user }
    }
}

impl CurrentUserProvider for FixedUserProvider {
    fn current_user(&self) -> CurrentUser {
        self.user.clone()
    }
}
