// ==========================================
// 化妆品生产批次计划系统 - 体积预算解析引擎
// ==========================================
// 职责: 按三种互斥控制模式解析本次计划可用的总生产体积（重量）
// 红线: 模式参数必须存在且为正，否则返回 InvalidBatchSize 类错误
// ==========================================

use crate::domain::batch_plan::{ProductSize, Semiproduct};
use crate::domain::types::BatchControlMode;
use crate::engine::error::{PlanningError, PlanningResult};
use tracing::instrument;

// ==========================================
// BudgetParams - 模式参数
// ==========================================
// 三个参数与三种模式一一对应，只校验选中模式的参数。
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetParams {
    pub mmq_multiplier: Option<f64>,
    pub total_weight_to_use: Option<f64>,
    pub target_days_coverage: Option<f64>,
}

// ==========================================
// VolumeBudgetResolver - 体积预算解析引擎
// ==========================================
pub struct VolumeBudgetResolver {
    // 无状态引擎
}

impl VolumeBudgetResolver {
    pub fn new() -> Self {
        Self {}
    }

    /// 解析总体积预算（重量单位）
    ///
    /// 模式:
    /// 1. MmqMultiplier: budget = MMQ × multiplier
    /// 2. TotalWeight: budget = 调用方直接给定的总重量
    /// 3. TargetDaysCoverage: budget = Σ 非固定规格 max(0, target×rate − stock) × weight_per_unit
    ///    + Σ 固定规格 fixed_qty × weight_per_unit
    #[instrument(skip(self, semiproduct, sizes), fields(
        semiproduct_code = %semiproduct.product_code,
        mode = %mode
    ))]
    pub fn resolve(
        &self,
        semiproduct: &Semiproduct,
        sizes: &[ProductSize],
        mode: BatchControlMode,
        params: BudgetParams,
    ) -> PlanningResult<f64> {
        match mode {
            BatchControlMode::MmqMultiplier => {
                let multiplier = Self::positive_param(mode, "mmq_multiplier", params.mmq_multiplier)?;
                if semiproduct.minimal_manufacture_quantity <= 0.0 {
                    return Err(PlanningError::InvalidBatchSize {
                        mode,
                        message: format!(
                            "半成品 {} 的 MMQ 必须为正: {}",
                            semiproduct.product_code, semiproduct.minimal_manufacture_quantity
                        ),
                    });
                }
                Ok(semiproduct.minimal_manufacture_quantity * multiplier)
            }
            BatchControlMode::TotalWeight => {
                Self::positive_param(mode, "total_weight_to_use", params.total_weight_to_use)
            }
            BatchControlMode::TargetDaysCoverage => {
                let target =
                    Self::positive_param(mode, "target_days_coverage", params.target_days_coverage)?;
                let mut budget = 0.0;
                for size in sizes {
                    if size.is_fixed {
                        let fixed = size.user_fixed_quantity.ok_or_else(|| {
                            PlanningError::MissingFixedQuantity(size.product_code.clone())
                        })?;
                        budget += fixed * size.weight_per_unit;
                    } else {
                        let need = (target * size.daily_sales_rate - size.current_stock).max(0.0);
                        budget += need * size.weight_per_unit;
                    }
                }
                Ok(budget)
            }
        }
    }

    /// 选中模式的参数必须存在且为正
    fn positive_param(
        mode: BatchControlMode,
        name: &str,
        value: Option<f64>,
    ) -> PlanningResult<f64> {
        match value {
            Some(v) if v > 0.0 => Ok(v),
            Some(v) => Err(PlanningError::InvalidBatchSize {
                mode,
                message: format!("{} 必须为正: {}", name, v),
            }),
            None => Err(PlanningError::InvalidBatchSize {
                mode,
                message: format!("{} 缺失", name),
            }),
        }
    }
}

impl Default for VolumeBudgetResolver {
    fn default() -> Self {
        Self::new()
    }
}
