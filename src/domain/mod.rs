// ==========================================
// 化妆品生产批次计划系统 - 领域层
// ==========================================
// 红线: 领域层不依赖仓储与 API 层
// ==========================================

pub mod audit_log;
pub mod batch_plan;
pub mod order;
pub mod types;

// 重导出核心领域类型
pub use audit_log::ManufactureOrderAuditLog;
pub use batch_plan::{
    BatchPlan, BatchPlanItem, BatchPlanSummary, ManufactureTemplate, ProductSize, SalesRecord,
    Semiproduct, TemplateIngredient,
};
pub use order::{
    default_lot_number, expiration_from, ManufactureOrder, ManufactureOrderNote,
    ManufactureOrderProduct, ManufactureOrderSemiProduct, OrderDomainError, OrderStatus,
};
