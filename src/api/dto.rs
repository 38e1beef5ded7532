// ==========================================
// 化妆品生产批次计划系统 - API 层 DTO
// ==========================================
// 字段级契约，跨实现保持稳定
// ==========================================

use crate::domain::batch_plan::{BatchPlanItem, BatchPlanSummary, Semiproduct};
use crate::domain::types::{BatchControlMode, ManufactureOrderState, ManufactureType};
use crate::engine::batch_planning::ProductConstraint;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// 批次计划
// ==========================================

/// 批次计划计算请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateBatchPlanRequest {
    pub semiproduct_code: String,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub sales_multiplier: Option<f64>,
    pub control_mode: BatchControlMode,
    pub mmq_multiplier: Option<f64>,
    pub total_weight_to_use: Option<f64>,
    pub target_days_coverage: Option<f64>,
    #[serde(default)]
    pub product_constraints: Vec<ProductConstraint>,
}

/// 批次计划计算响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateBatchPlanResponse {
    pub semiproduct: Semiproduct,
    pub product_sizes: Vec<BatchPlanItem>,
    pub summary: BatchPlanSummary,
    pub target_days_coverage: Option<f64>,
    pub total_volume_used: f64,
    pub total_volume_available: f64,
}

// ==========================================
// 订单创建
// ==========================================

/// 创建订单的成品行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderProductLine {
    pub product_code: String,
    pub product_name: String,
    pub planned_quantity: f64,
    pub expiration_months: u32,
}

/// 创建生产订单请求（来自批次计划结果）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateManufactureOrderRequest {
    pub product_code: String,
    pub product_name: String,
    pub original_batch_size: f64,
    pub new_batch_size: f64,
    pub scale_factor: f64,
    pub products: Vec<CreateOrderProductLine>,
    pub planned_date: Option<NaiveDate>,
    pub responsible_person: Option<String>,
    pub manufacture_type: ManufactureType,
}

/// 创建生产订单响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateManufactureOrderResponse {
    pub id: String,
    pub order_number: String,
}

// ==========================================
// 排产与确认
// ==========================================

/// 排产请求: DRAFT → PLANNED
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOrderRequest {
    pub order_id: String,
    pub planned_date_semiproduct: NaiveDate,
    pub planned_date_product: NaiveDate,
}

/// 单阶段生产确认请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmSinglePhaseRequest {
    pub order_id: String,
    /// 成品行 ID → 实际数量；缺省的行回落到计划数量
    #[serde(default)]
    pub product_actual_quantities: HashMap<String, f64>,
    /// 确认操作的审计署名；缺省回落到当前登录用户
    #[serde(default)]
    pub user_id: Option<String>,
    pub change_reason: Option<String>,
}

/// 单阶段生产确认响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmSinglePhaseResponse {
    pub order_id: String,
    pub completed_at: NaiveDateTime,
}

/// 双阶段 - 半成品阶段确认请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmSemiProductRequest {
    pub order_id: String,
    pub actual_quantity: f64,
    pub lot_number: Option<String>,
    pub change_reason: String,
}

/// 双阶段 - 成品阶段确认请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmProductCompletionRequest {
    pub order_id: String,
    #[serde(default)]
    pub product_actual_quantities: HashMap<String, f64>,
    pub change_reason: String,
    /// 是否申请报废残余半成品
    #[serde(default)]
    pub discard_residual_semiproduct: bool,
}

// ==========================================
// 人工处理 / 备注 / 复制
// ==========================================

/// 人工处理完成请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveManualActionRequest {
    pub order_id: String,
    pub erp_order_number_semiproduct: Option<String>,
    pub erp_order_number_product: Option<String>,
    pub note: Option<String>,
}

/// 添加备注请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddNoteRequest {
    pub order_id: String,
    pub text: String,
}

/// 复制订单响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateOrderResponse {
    pub id: String,
    pub order_number: String,
}

// ==========================================
// 查询
// ==========================================

/// 订单列表查询请求
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListOrdersRequest {
    pub state: Option<ManufactureOrderState>,
    pub manufacture_type: Option<ManufactureType>,
    pub manual_action_required: Option<bool>,
    pub responsible_person: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
}

/// 订单列表条目（订单头摘要）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: String,
    pub order_number: String,
    pub created_date: NaiveDateTime,
    pub responsible_person: Option<String>,
    pub manufacture_type: ManufactureType,
    pub state: ManufactureOrderState,
    pub manual_action_required: bool,
    pub erp_order_number_semiproduct: Option<String>,
    pub erp_order_number_product: Option<String>,
}
