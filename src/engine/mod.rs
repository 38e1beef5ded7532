// ==========================================
// 化妆品生产批次计划系统 - 计划引擎层
// ==========================================
// 依赖方向: engine → domain，不依赖仓储与 API 层
// 红线: 引擎全部无状态、纯计算，可重入
// ==========================================

pub mod allocation;
pub mod batch_planning;
pub mod error;
pub mod sales_velocity;
pub mod volume_budget;

// 重导出核心引擎
pub use allocation::{AllocationOptimizer, AllocationOutcome};
pub use batch_planning::{BatchPlanningService, PlanningInput, ProductConstraint};
pub use error::{PlanningError, PlanningResult};
pub use sales_velocity::SalesVelocityEstimator;
pub use volume_budget::{BudgetParams, VolumeBudgetResolver};
