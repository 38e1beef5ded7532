// ==========================================
// 化妆品生产批次计划系统 - 销售速率估算引擎
// ==========================================
// 职责: 由历史销售记录推导每个成品规格的日销售速率
// 输入: 销售记录 + 回看日期范围（闭区间） + 可选倍数
// 输出: product_code → 件/天
// ==========================================

use crate::domain::batch_plan::SalesRecord;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::instrument;

// ==========================================
// SalesVelocityEstimator - 销售速率估算引擎
// ==========================================
pub struct SalesVelocityEstimator {
    // 无状态引擎
}

impl SalesVelocityEstimator {
    pub fn new() -> Self {
        Self {}
    }

    /// 估算日销售速率
    ///
    /// 规则:
    /// - 天数按闭区间计算: max(1, to - from + 1)，避免除零
    /// - 范围外的记录忽略
    /// - multiplier 用于促销/季节性修正，直接乘在速率上
    ///
    /// # 返回
    /// product_code → 日销售速率（件/天）；无记录的规格不出现在结果里
    #[instrument(skip(self, records), fields(records_count = records.len()))]
    pub fn daily_rates(
        &self,
        records: &[SalesRecord],
        from: NaiveDate,
        to: NaiveDate,
        multiplier: f64,
    ) -> HashMap<String, f64> {
        let days = (to - from).num_days() + 1;
        let days = days.max(1) as f64;

        let mut totals: HashMap<String, f64> = HashMap::new();
        for record in records {
            if record.sale_date < from || record.sale_date > to {
                continue;
            }
            *totals.entry(record.product_code.clone()).or_insert(0.0) += record.quantity;
        }

        totals
            .into_iter()
            .map(|(code, total)| (code, total / days * multiplier))
            .collect()
    }
}

impl Default for SalesVelocityEstimator {
    fn default() -> Self {
        Self::new()
    }
}
