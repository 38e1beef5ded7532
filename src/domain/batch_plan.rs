// ==========================================
// 化妆品生产批次计划系统 - 批次计划领域模型
// ==========================================
// 红线: 计划产物是即时投影，每次请求重新计算，不持久化
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Semiproduct - 半成品主数据
// ==========================================
// 计划的只读参照数据，本核心不修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Semiproduct {
    pub product_code: String,              // 半成品代码
    pub product_name: String,              // 半成品名称
    pub available_stock: f64,              // 可用库存（重量单位）
    pub minimal_manufacture_quantity: f64, // 最小生产量 MMQ（重量单位）
}

// ==========================================
// ProductSize - 成品规格
// ==========================================
// 同一半成品分装出的一个成品 SKU
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSize {
    pub product_code: String,         // 成品代码
    pub product_name: String,         // 成品名称
    pub current_stock: f64,           // 当前库存（件）
    pub daily_sales_rate: f64,        // 日销售速率（件/天）
    pub weight_per_unit: f64,         // 单件消耗半成品重量
    pub expiration_months: u32,       // 有效期（月）
    pub is_fixed: bool,               // 用户固定数量标志
    pub user_fixed_quantity: Option<f64>, // 用户固定数量（is_fixed 时必填）
}

impl ProductSize {
    /// 当前库存覆盖天数（日销为 0 时视为无限覆盖，返回 None）
    pub fn current_days_coverage(&self) -> Option<f64> {
        if self.daily_sales_rate > 0.0 {
            Some(self.current_stock / self.daily_sales_rate)
        } else {
            None
        }
    }
}

// ==========================================
// BatchPlanItem - 批次计划明细（派生，不持久化）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPlanItem {
    pub product_code: String,              // 成品代码
    pub product_name: String,              // 成品名称
    pub current_stock: f64,                // 当前库存
    pub daily_sales_rate: f64,             // 日销售速率
    pub weight_per_unit: f64,              // 单件重量
    pub recommended_units_to_produce: i64, // 建议生产数量（整件）
    pub total_volume_required: f64,        // 所需半成品重量
    pub future_stock: f64,                 // 生产后库存
    pub future_days_coverage: Option<f64>, // 生产后覆盖天数（日销为 0 时为 None）
    pub was_optimized: bool,               // 是否参与优化分配
    pub optimization_note: String,         // 分配说明
}

// ==========================================
// BatchPlanSummary - 批次计划汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPlanSummary {
    pub total_volume_used: f64,          // 已用半成品重量
    pub total_volume_available: f64,     // 可用半成品重量预算
    pub utilization_percentage: f64,     // 预算利用率（%）
    pub achieved_average_coverage: Option<f64>, // 非固定规格达成的平均覆盖天数
    pub fixed_products_count: usize,     // 固定规格数量
    pub optimized_products_count: usize, // 参与优化规格数量
}

// ==========================================
// BatchPlan - 批次计划结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPlan {
    pub semiproduct: Semiproduct,      // 半成品摘要
    pub items: Vec<BatchPlanItem>,     // 每个成品规格一条
    pub summary: BatchPlanSummary,     // 汇总
    pub from_date: NaiveDate,          // 销售回看起始
    pub to_date: NaiveDate,            // 销售回看结束
    pub target_days_coverage: Option<f64>, // 覆盖天数模式的目标值
}

// ==========================================
// SalesRecord - 销售记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRecord {
    pub product_code: String, // 成品代码
    pub sale_date: NaiveDate, // 销售日期
    pub quantity: f64,        // 销量（件）
}

// ==========================================
// ManufactureTemplate - 制造模板
// ==========================================
// ERP 中维护的配方，创建订单时用于批量折算
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufactureTemplate {
    pub product_code: String,                 // 半成品代码
    pub product_name: String,                 // 半成品名称
    pub batch_size: f64,                      // 标准批量
    pub original_amount: f64,                 // 配方基准量
    pub ingredients: Vec<TemplateIngredient>, // 配料清单
}

/// 模板配料
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateIngredient {
    pub product_code: String, // 配料代码
    pub product_name: String, // 配料名称
    pub amount: f64,          // 用量
    pub price: f64,           // 单价
}
