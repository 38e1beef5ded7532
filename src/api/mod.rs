// ==========================================
// 化妆品生产批次计划系统 - API 层
// ==========================================
// 职责: 面向前端的业务接口；类型化错误，预期失败不抛异常
// ==========================================

pub mod batch_plan_api;
pub mod dto;
pub mod error;
pub mod order_api;

// 重导出核心 API
pub use batch_plan_api::BatchPlanApi;
pub use dto::{
    AddNoteRequest, CalculateBatchPlanRequest, CalculateBatchPlanResponse,
    ConfirmProductCompletionRequest, ConfirmSemiProductRequest, ConfirmSinglePhaseRequest,
    ConfirmSinglePhaseResponse, CreateManufactureOrderRequest, CreateManufactureOrderResponse,
    CreateOrderProductLine, DuplicateOrderResponse, ListOrdersRequest, OrderSummary,
    PlanOrderRequest, ResolveManualActionRequest,
};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use order_api::OrderApi;
