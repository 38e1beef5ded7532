// ==========================================
// 化妆品生产批次计划系统 - 批次计划 API
// ==========================================
// 职责: 加载计划所需数据，调用计划服务，组装响应
// 红线: 计算本身无副作用，可重复/并发调用
// ==========================================

use crate::api::dto::{CalculateBatchPlanRequest, CalculateBatchPlanResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::clock::Clock;
use crate::config::PlanningConfig;
use crate::engine::batch_planning::{BatchPlanningService, PlanningInput};
use crate::engine::error::PlanningError;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::RepositoryError;
use chrono::Duration;
use std::sync::Arc;
use tracing::debug;

// ==========================================
// BatchPlanApi - 批次计划 API
// ==========================================
pub struct BatchPlanApi {
    catalog_repo: Arc<CatalogRepository>,
    service: BatchPlanningService,
    clock: Arc<dyn Clock>,
    config: PlanningConfig,
}

impl BatchPlanApi {
    /// 创建新的 BatchPlanApi 实例
    pub fn new(
        catalog_repo: Arc<CatalogRepository>,
        clock: Arc<dyn Clock>,
        config: PlanningConfig,
    ) -> Self {
        Self {
            catalog_repo,
            service: BatchPlanningService::new(),
            clock,
            config,
        }
    }

    /// 计算批次计划
    ///
    /// 前置条件:
    /// - 半成品必须能解析到制造模板，否则 NOT_FOUND
    /// - 选中控制模式的参数必须存在且为正
    /// - is_fixed 的约束必须带 fixed_quantity
    pub fn calculate_batch_plan(
        &self,
        request: &CalculateBatchPlanRequest,
    ) -> ApiResult<CalculateBatchPlanResponse> {
        if request.semiproduct_code.trim().is_empty() {
            return Err(ApiError::InvalidInput("半成品代码不能为空".to_string()));
        }

        // 半成品必须有制造模板（ERP 配方），否则无法下单
        self.catalog_repo
            .get_manufacture_template(&request.semiproduct_code)
            .map_err(|e| match e {
                RepositoryError::NotFound { .. } => ApiError::from(
                    PlanningError::ManufactureTemplateNotFound(request.semiproduct_code.clone()),
                ),
                other => other.into(),
            })?;

        let semiproduct = self.catalog_repo.get_semiproduct(&request.semiproduct_code)?;
        let product_sizes = self
            .catalog_repo
            .get_product_sizes(&request.semiproduct_code)?;

        // 日期范围缺省: 截至今天的默认回看窗口
        let to_date = request.to_date.unwrap_or_else(|| self.clock.today());
        let from_date = request
            .from_date
            .unwrap_or(to_date - Duration::days(self.config.default_sales_window_days - 1));
        if from_date > to_date {
            return Err(ApiError::InvalidInput(format!(
                "日期范围无效: from={} > to={}",
                from_date, to_date
            )));
        }

        let codes: Vec<String> = product_sizes.iter().map(|s| s.product_code.clone()).collect();
        let sales_records = self
            .catalog_repo
            .get_sales_records(&codes, from_date, to_date)?;
        debug!(
            semiproduct_code = %request.semiproduct_code,
            sizes = product_sizes.len(),
            sales_records = sales_records.len(),
            "batch plan input loaded"
        );

        let plan = self.service.calculate(&PlanningInput {
            semiproduct,
            product_sizes,
            sales_records,
            from_date,
            to_date,
            sales_multiplier: request.sales_multiplier.unwrap_or(1.0),
            control_mode: request.control_mode,
            mmq_multiplier: request.mmq_multiplier,
            total_weight_to_use: request.total_weight_to_use,
            target_days_coverage: request.target_days_coverage,
            constraints: request.product_constraints.clone(),
        })?;

        Ok(CalculateBatchPlanResponse {
            total_volume_used: plan.summary.total_volume_used,
            total_volume_available: plan.summary.total_volume_available,
            target_days_coverage: plan.target_days_coverage,
            semiproduct: plan.semiproduct,
            product_sizes: plan.items,
            summary: plan.summary,
        })
    }
}
