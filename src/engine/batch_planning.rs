// ==========================================
// 化妆品生产批次计划系统 - 批次计划服务
// ==========================================
// 职责: 编排销售速率估算 → 预算解析 → 分配优化，组装计划结果
// 红线: 纯函数，不落库、无副作用，可重入可并发调用
// ==========================================

use crate::domain::batch_plan::{BatchPlan, BatchPlanSummary, ProductSize, SalesRecord, Semiproduct};
use crate::domain::types::BatchControlMode;
use crate::engine::allocation::AllocationOptimizer;
use crate::engine::error::{PlanningError, PlanningResult};
use crate::engine::sales_velocity::SalesVelocityEstimator;
use crate::engine::volume_budget::{BudgetParams, VolumeBudgetResolver};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

// ==========================================
// ProductConstraint - 规格级约束
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConstraint {
    pub product_code: String,
    pub is_fixed: bool,
    pub fixed_quantity: Option<f64>,
}

// ==========================================
// PlanningInput - 计划输入
// ==========================================
// 调用方（API 层）负责加载数据；服务本身只做计算。
#[derive(Debug, Clone)]
pub struct PlanningInput {
    pub semiproduct: Semiproduct,
    pub product_sizes: Vec<ProductSize>,
    pub sales_records: Vec<SalesRecord>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub sales_multiplier: f64,
    pub control_mode: BatchControlMode,
    pub mmq_multiplier: Option<f64>,
    pub total_weight_to_use: Option<f64>,
    pub target_days_coverage: Option<f64>,
    pub constraints: Vec<ProductConstraint>,
}

// ==========================================
// BatchPlanningService - 批次计划服务
// ==========================================
pub struct BatchPlanningService {
    estimator: SalesVelocityEstimator,
    budget_resolver: VolumeBudgetResolver,
    optimizer: AllocationOptimizer,
}

impl BatchPlanningService {
    pub fn new() -> Self {
        Self {
            estimator: SalesVelocityEstimator::new(),
            budget_resolver: VolumeBudgetResolver::new(),
            optimizer: AllocationOptimizer::new(),
        }
    }

    /// 计算批次计划
    ///
    /// 流程:
    /// 1. 套用规格约束（固定标志校验: is_fixed 必须带 fixed_quantity）
    /// 2. 估算日销速率并写到各规格上
    /// 3. 按控制模式解析体积预算
    /// 4. 分配优化 → 明细 + 汇总
    #[instrument(skip(self, input), fields(
        semiproduct_code = %input.semiproduct.product_code,
        mode = %input.control_mode
    ))]
    pub fn calculate(&self, input: &PlanningInput) -> PlanningResult<BatchPlan> {
        if input.product_sizes.is_empty() {
            return Err(PlanningError::NoProductSizes(
                input.semiproduct.product_code.clone(),
            ));
        }

        // ===== 1. 套用约束 =====
        let mut sizes = input.product_sizes.clone();
        for constraint in &input.constraints {
            if let Some(size) = sizes
                .iter_mut()
                .find(|s| s.product_code == constraint.product_code)
            {
                size.is_fixed = constraint.is_fixed;
                size.user_fixed_quantity = constraint.fixed_quantity;
                if size.is_fixed && size.user_fixed_quantity.is_none() {
                    return Err(PlanningError::MissingFixedQuantity(
                        size.product_code.clone(),
                    ));
                }
            }
        }

        // ===== 2. 日销速率 =====
        let rates = self.estimator.daily_rates(
            &input.sales_records,
            input.from_date,
            input.to_date,
            input.sales_multiplier,
        );
        for size in &mut sizes {
            size.daily_sales_rate = rates.get(&size.product_code).copied().unwrap_or(0.0);
        }

        // ===== 3. 预算 =====
        let budget = self.budget_resolver.resolve(
            &input.semiproduct,
            &sizes,
            input.control_mode,
            BudgetParams {
                mmq_multiplier: input.mmq_multiplier,
                total_weight_to_use: input.total_weight_to_use,
                target_days_coverage: input.target_days_coverage,
            },
        )?;

        // ===== 4. 分配 =====
        let target = match input.control_mode {
            BatchControlMode::TargetDaysCoverage => input.target_days_coverage,
            _ => None,
        };
        let outcome = self.optimizer.allocate(&sizes, budget, target)?;

        let utilization = if budget > 0.0 {
            outcome.total_volume_used / budget * 100.0
        } else {
            0.0
        };
        Ok(BatchPlan {
            semiproduct: input.semiproduct.clone(),
            items: outcome.items,
            summary: BatchPlanSummary {
                total_volume_used: outcome.total_volume_used,
                total_volume_available: budget,
                utilization_percentage: utilization,
                achieved_average_coverage: outcome.achieved_average_coverage,
                fixed_products_count: outcome.fixed_products_count,
                optimized_products_count: outcome.optimized_products_count,
            },
            from_date: input.from_date,
            to_date: input.to_date,
            target_days_coverage: target,
        })
    }
}

impl Default for BatchPlanningService {
    fn default() -> Self {
        Self::new()
    }
}
