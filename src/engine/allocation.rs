// ==========================================
// 化妆品生产批次计划系统 - 分配优化引擎
// ==========================================
// 职责: 把体积预算分配到共享同一半成品的各成品规格
// 规则:
// - 固定规格直接消耗 fixed_qty × weight_per_unit，不参与优化
// - 剩余预算在非固定规格间做水位填充，拉平生产后覆盖天数
//   （最低覆盖优先；覆盖相同按 product_code 升序，保证确定性）
// - 建议数量向下取整到整件，余量不结转，总消耗永不超预算
// ==========================================

use crate::domain::batch_plan::{BatchPlanItem, ProductSize};
use crate::engine::error::{PlanningError, PlanningResult};
use tracing::instrument;

// 浮点取整前的容差，避免 99.999999 被截成 98 件一类的边界抖动
const ROUND_EPS: f64 = 1e-9;

// ==========================================
// AllocationOutcome - 分配结果
// ==========================================
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub items: Vec<BatchPlanItem>,
    pub total_volume_used: f64,
    pub fixed_products_count: usize,
    pub optimized_products_count: usize,
    /// 参与优化的规格生产后的平均覆盖天数
    pub achieved_average_coverage: Option<f64>,
}

// ==========================================
// AllocationOptimizer - 分配优化引擎
// ==========================================
pub struct AllocationOptimizer {
    // 无状态引擎
}

impl AllocationOptimizer {
    pub fn new() -> Self {
        Self {}
    }

    /// 在预算内分配各规格的建议生产数量
    ///
    /// # 参数
    /// - `sizes`: 全部成品规格（含固定标志与日销速率）
    /// - `budget`: 总体积预算（重量单位）
    /// - `target_days`: 覆盖天数模式下的目标值，用于分配说明的达成判定
    ///
    /// # 返回
    /// 每个规格一条 BatchPlanItem（保持输入顺序）+ 汇总计数
    #[instrument(skip(self, sizes), fields(sizes_count = sizes.len(), budget = budget))]
    pub fn allocate(
        &self,
        sizes: &[ProductSize],
        budget: f64,
        target_days: Option<f64>,
    ) -> PlanningResult<AllocationOutcome> {
        // ===== 1. 固定规格直接扣预算 =====
        let mut fixed_volume = 0.0;
        for size in sizes.iter().filter(|s| s.is_fixed) {
            let fixed = size
                .user_fixed_quantity
                .ok_or_else(|| PlanningError::MissingFixedQuantity(size.product_code.clone()))?;
            fixed_volume += fixed * size.weight_per_unit;
        }
        if fixed_volume > budget + ROUND_EPS {
            return Err(PlanningError::FixedQuantityExceedsBudget {
                required: fixed_volume,
                available: budget,
            });
        }
        let remaining = (budget - fixed_volume).max(0.0);

        // ===== 2. 非固定且有日销的规格做水位填充 =====
        let level = Self::water_fill_level(sizes, remaining);

        // ===== 3. 组装明细 =====
        let mut items = Vec::with_capacity(sizes.len());
        let mut total_volume_used = 0.0;
        let mut fixed_count = 0;
        let mut optimized_count = 0;
        let mut coverage_sum = 0.0;
        let mut coverage_n = 0usize;

        for size in sizes {
            let item = if size.is_fixed {
                fixed_count += 1;
                // 上面已校验过 Some
                let fixed = size.user_fixed_quantity.unwrap_or(0.0);
                let units = (fixed + ROUND_EPS).floor() as i64;
                Self::build_item(size, units, false, "用户固定数量，不参与优化".to_string())
            } else if size.daily_sales_rate <= 0.0 {
                Self::build_item(size, 0, false, "无日销记录，不分配".to_string())
            } else {
                optimized_count += 1;
                let coverage = size.current_stock / size.daily_sales_rate;
                let units = if level > coverage {
                    ((level - coverage) * size.daily_sales_rate + ROUND_EPS).floor() as i64
                } else {
                    0
                };
                let note = Self::optimization_note(coverage, level, units, size, target_days);
                let item = Self::build_item(size, units, true, note);
                if let Some(fc) = item.future_days_coverage {
                    coverage_sum += fc;
                    coverage_n += 1;
                }
                item
            };
            total_volume_used += item.total_volume_required;
            items.push(item);
        }

        Ok(AllocationOutcome {
            items,
            total_volume_used,
            fixed_products_count: fixed_count,
            optimized_products_count: optimized_count,
            achieved_average_coverage: if coverage_n > 0 {
                Some(coverage_sum / coverage_n as f64)
            } else {
                None
            },
        })
    }

    /// 连续水位填充：求使非固定规格覆盖天数尽量拉平的水位
    ///
    /// 按当前覆盖升序（并以 product_code 打破平局）逐个纳入活动集合；
    /// 预算不足以把活动集合抬到下一个覆盖值时，余量均摊后收尾。
    fn water_fill_level(sizes: &[ProductSize], remaining: f64) -> f64 {
        // (当前覆盖, 抬升 1 天覆盖的重量成本)
        let mut candidates: Vec<(f64, f64, &str)> = sizes
            .iter()
            .filter(|s| !s.is_fixed && s.daily_sales_rate > 0.0)
            .map(|s| {
                (
                    s.current_stock / s.daily_sales_rate,
                    s.daily_sales_rate * s.weight_per_unit,
                    s.product_code.as_str(),
                )
            })
            .collect();
        if candidates.is_empty() || remaining <= 0.0 {
            return 0.0;
        }
        candidates.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.2.cmp(b.2))
        });

        let mut level = candidates[0].0;
        let mut active_weight = 0.0;
        let mut budget_left = remaining;

        for (coverage, weight, _) in &candidates {
            if *coverage > level {
                let cost = (coverage - level) * active_weight;
                if cost <= budget_left {
                    budget_left -= cost;
                    level = *coverage;
                } else {
                    level += budget_left / active_weight;
                    budget_left = 0.0;
                    break;
                }
            }
            active_weight += weight;
        }
        if budget_left > 0.0 && active_weight > 0.0 {
            level += budget_left / active_weight;
        }
        level
    }

    fn build_item(size: &ProductSize, units: i64, was_optimized: bool, note: String) -> BatchPlanItem {
        let future_stock = size.current_stock + units as f64;
        BatchPlanItem {
            product_code: size.product_code.clone(),
            product_name: size.product_name.clone(),
            current_stock: size.current_stock,
            daily_sales_rate: size.daily_sales_rate,
            weight_per_unit: size.weight_per_unit,
            recommended_units_to_produce: units,
            total_volume_required: units as f64 * size.weight_per_unit,
            future_stock,
            future_days_coverage: if size.daily_sales_rate > 0.0 {
                Some(future_stock / size.daily_sales_rate)
            } else {
                None
            },
            was_optimized,
            optimization_note: note,
        }
    }

    /// 分配说明: 固定 / 达成 / 预算受限
    fn optimization_note(
        coverage: f64,
        level: f64,
        units: i64,
        size: &ProductSize,
        target_days: Option<f64>,
    ) -> String {
        let future_coverage = (size.current_stock + units as f64) / size.daily_sales_rate;
        match target_days {
            Some(target) => {
                // 一件以内的取整差距视为达成
                let rounding_unit = 1.0 / size.daily_sales_rate;
                if future_coverage + rounding_unit >= target {
                    format!("达到目标覆盖 {:.1} 天", target)
                } else {
                    format!(
                        "预算受限，覆盖 {:.1} 天未达目标 {:.1} 天",
                        future_coverage, target
                    )
                }
            }
            None => {
                if units == 0 && coverage >= level {
                    "预算受限，当前覆盖已高于分配水位，未分配".to_string()
                } else {
                    format!("优化分配至水位 {:.1} 天覆盖", level)
                }
            }
        }
    }
}

impl Default for AllocationOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn size(code: &str, stock: f64, rate: f64, wpu: f64) -> ProductSize {
        ProductSize {
            product_code: code.to_string(),
            product_name: code.to_string(),
            current_stock: stock,
            daily_sales_rate: rate,
            weight_per_unit: wpu,
            expiration_months: 12,
            is_fixed: false,
            user_fixed_quantity: None,
        }
    }

    fn fixed_size(code: &str, stock: f64, rate: f64, wpu: f64, qty: f64) -> ProductSize {
        let mut s = size(code, stock, rate, wpu);
        s.is_fixed = true;
        s.user_fixed_quantity = Some(qty);
        s
    }

    #[test]
    fn test_worked_example_mmq_budget_1000() {
        // SP001: MMQ=1000g, S100 (100g/件, 库存50, 5件/天), S200 (200g/件, 库存20, 2件/天)
        let optimizer = AllocationOptimizer::new();
        let sizes = vec![size("S100", 50.0, 5.0, 100.0), size("S200", 20.0, 2.0, 200.0)];
        let outcome = optimizer.allocate(&sizes, 1000.0, None).unwrap();

        assert!(outcome.total_volume_used <= 1000.0);
        assert_eq!(outcome.fixed_products_count, 0);
        assert_eq!(outcome.optimized_products_count, 2);
        // 两个规格生产后覆盖天数拉平（一件取整误差以内）
        let c1 = outcome.items[0].future_days_coverage.unwrap();
        let c2 = outcome.items[1].future_days_coverage.unwrap();
        assert!((c1 - c2).abs() <= 1.0, "coverage gap too wide: {} vs {}", c1, c2);
        // 两个规格都拿到了分配
        assert!(outcome.items.iter().all(|i| i.recommended_units_to_produce > 0));
    }

    #[test]
    fn test_lowest_coverage_gets_allocation_first() {
        let optimizer = AllocationOptimizer::new();
        // S200 覆盖 2 天，远低于 S100 的 20 天；小预算应全部给 S200
        let sizes = vec![size("S100", 100.0, 5.0, 100.0), size("S200", 4.0, 2.0, 100.0)];
        let outcome = optimizer.allocate(&sizes, 400.0, None).unwrap();

        assert_eq!(outcome.items[0].recommended_units_to_produce, 0);
        assert!(outcome.items[1].recommended_units_to_produce > 0);
        assert!(outcome.items[0]
            .optimization_note
            .contains("预算受限"));
    }

    #[test]
    fn test_fixed_sizes_consume_budget_verbatim() {
        let optimizer = AllocationOptimizer::new();
        let sizes = vec![
            fixed_size("S050", 10.0, 1.0, 50.0, 8.0),
            size("S100", 0.0, 5.0, 100.0),
        ];
        let outcome = optimizer.allocate(&sizes, 1000.0, None).unwrap();

        let fixed = &outcome.items[0];
        assert_eq!(fixed.recommended_units_to_produce, 8);
        assert!(!fixed.was_optimized);
        assert_eq!(outcome.fixed_products_count, 1);
        // 剩余 600g 给 S100: 6 件
        assert_eq!(outcome.items[1].recommended_units_to_produce, 6);
        assert!((outcome.total_volume_used - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_volume_used_never_exceeds_budget() {
        let optimizer = AllocationOptimizer::new();
        let sizes = vec![
            size("S100", 3.0, 1.3, 73.0),
            size("S200", 17.0, 2.7, 141.0),
            size("S300", 0.0, 0.9, 55.0),
        ];
        for budget in [1.0, 73.0, 500.0, 999.9, 12345.0] {
            let outcome = optimizer.allocate(&sizes, budget, None).unwrap();
            assert!(
                outcome.total_volume_used <= budget + 1e-6,
                "budget={} used={}",
                budget,
                outcome.total_volume_used
            );
        }
    }

    #[test]
    fn test_target_mode_sufficient_budget_reaches_target() {
        let optimizer = AllocationOptimizer::new();
        let sizes = vec![size("S100", 50.0, 5.0, 100.0), size("S200", 20.0, 2.0, 200.0)];
        let target = 30.0;
        // 目标覆盖模式下预算按缺口精确计算: (30×5−50)×100 + (30×2−20)×200 = 18000
        let outcome = optimizer.allocate(&sizes, 18000.0, Some(target)).unwrap();

        for item in &outcome.items {
            let coverage = item.future_days_coverage.unwrap();
            let rounding_unit = 1.0 / item.daily_sales_rate;
            assert!(
                coverage + rounding_unit >= target,
                "{} coverage {} below target",
                item.product_code,
                coverage
            );
            assert!(item.optimization_note.contains("达到目标覆盖"));
        }
    }

    #[test]
    fn test_zero_rate_size_gets_nothing() {
        let optimizer = AllocationOptimizer::new();
        let sizes = vec![size("S100", 10.0, 0.0, 100.0), size("S200", 0.0, 2.0, 100.0)];
        let outcome = optimizer.allocate(&sizes, 1000.0, None).unwrap();

        assert_eq!(outcome.items[0].recommended_units_to_produce, 0);
        assert!(!outcome.items[0].was_optimized);
        assert!(outcome.items[0].future_days_coverage.is_none());
        assert_eq!(outcome.optimized_products_count, 1);
    }

    #[test]
    fn test_missing_fixed_quantity_is_rejected() {
        let optimizer = AllocationOptimizer::new();
        let mut s = size("S100", 0.0, 1.0, 100.0);
        s.is_fixed = true;
        let err = optimizer.allocate(&[s], 1000.0, None).unwrap_err();
        assert!(matches!(err, PlanningError::MissingFixedQuantity(_)));
    }

    #[test]
    fn test_fixed_volume_over_budget_is_rejected() {
        let optimizer = AllocationOptimizer::new();
        let sizes = vec![fixed_size("S100", 0.0, 1.0, 100.0, 20.0)];
        let err = optimizer.allocate(&sizes, 1000.0, None).unwrap_err();
        assert!(matches!(err, PlanningError::FixedQuantityExceedsBudget { .. }));
    }

    #[test]
    fn test_tie_break_is_deterministic_by_product_code() {
        let optimizer = AllocationOptimizer::new();
        // 两个规格覆盖完全相同，多次分配结果必须一致
        let sizes = vec![size("S200", 10.0, 2.0, 100.0), size("S100", 5.0, 1.0, 100.0)];
        let a = optimizer.allocate(&sizes, 333.0, None).unwrap();
        let b = optimizer.allocate(&sizes, 333.0, None).unwrap();
        for (x, y) in a.items.iter().zip(b.items.iter()) {
            assert_eq!(x.recommended_units_to_produce, y.recommended_units_to_produce);
        }
    }
}
