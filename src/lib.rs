// ==========================================
// 化妆品生产批次计划系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 生产批次计划 + 生产订单生命周期管理
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 批次计划业务规则
pub mod engine;

// ERP 集成层 - 外部协作方接口
pub mod erp;

// 身份层 - 审计归属
pub mod identity;

// 时钟抽象 - 日期/批号计算全部经由注入时钟
pub mod clock;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AuditAction, BatchControlMode, ErpDocumentType, ManufactureOrderState, ManufactureType,
};

// 领域实体
pub use domain::{
    BatchPlanItem, BatchPlanSummary, ManufactureOrder, ManufactureOrderAuditLog,
    ManufactureOrderNote, ManufactureOrderProduct, ManufactureOrderSemiProduct, OrderStatus,
    ProductSize, Semiproduct,
};

// 引擎
pub use engine::{
    AllocationOptimizer, BatchPlanningService, SalesVelocityEstimator, VolumeBudgetResolver,
};

// API
pub use api::{BatchPlanApi, OrderApi};

// 时钟
pub use clock::{Clock, FixedClock, SystemClock};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "化妆品生产批次计划系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
