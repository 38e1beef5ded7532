// ==========================================
// 化妆品生产批次计划系统 - 计划引擎错误类型
// ==========================================

use crate::domain::types::BatchControlMode;
use thiserror::Error;

/// 批次计划引擎错误
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("制造模板未找到: {0}")]
    ManufactureTemplateNotFound(String),

    #[error("无效的批量参数 (mode={mode}): {message}")]
    InvalidBatchSize {
        mode: BatchControlMode,
        message: String,
    },

    #[error("固定数量缺失: product_code={0} 标记为固定但未提供数量")]
    MissingFixedQuantity(String),

    #[error("固定数量超出预算: 固定消耗 {required} 已超过可用预算 {available}")]
    FixedQuantityExceedsBudget { required: f64, available: f64 },

    #[error("无成品规格: 半成品 {0} 下没有可计划的成品")]
    NoProductSizes(String),
}

/// Result 类型别名
pub type PlanningResult<T> = Result<T, PlanningError>;
