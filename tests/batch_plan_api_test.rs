// ==========================================
// 批次计划 API 集成测试
// ==========================================
// 覆盖: 三种控制模式、固定约束、参数校验、模板缺失
// ==========================================

mod test_helpers;

use cosmetics_batch_aps::api::{ApiError, BatchPlanApi, CalculateBatchPlanRequest};
use cosmetics_batch_aps::clock::FixedClock;
use cosmetics_batch_aps::domain::types::BatchControlMode;
use cosmetics_batch_aps::engine::ProductConstraint;
use cosmetics_batch_aps::repository::CatalogRepository;
use chrono::NaiveDate;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn setup() -> (NamedTempFile, BatchPlanApi) {
    let (temp_file, conn) = test_helpers::create_test_db().unwrap();
    let catalog = Arc::new(CatalogRepository::new(conn));
    test_helpers::seed_catalog(&catalog).unwrap();
    let clock = Arc::new(FixedClock::at_date(
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
    ));
    let api = BatchPlanApi::new(catalog, clock, test_helpers::test_config());
    (temp_file, api)
}

fn base_request(mode: BatchControlMode) -> CalculateBatchPlanRequest {
    CalculateBatchPlanRequest {
        semiproduct_code: "SP001".to_string(),
        from_date: Some(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()),
        to_date: Some(NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()),
        sales_multiplier: None,
        control_mode: mode,
        mmq_multiplier: None,
        total_weight_to_use: None,
        target_days_coverage: None,
        product_constraints: vec![],
    }
}

#[test]
fn test_mmq_multiplier_mode_worked_example() {
    let (_db, api) = setup();
    let mut request = base_request(BatchControlMode::MmqMultiplier);
    request.mmq_multiplier = Some(1.0);
    let response = api.calculate_batch_plan(&request).unwrap();

    assert!((response.total_volume_available - 1000.0).abs() < 1e-9);
    assert!(response.total_volume_used <= 1000.0);
    assert_eq!(response.summary.fixed_products_count, 0);
    assert_eq!(response.product_sizes.len(), 2);
    // 两个规格的生产后覆盖天数在一件取整误差内拉平
    let c1 = response.product_sizes[0].future_days_coverage.unwrap();
    let c2 = response.product_sizes[1].future_days_coverage.unwrap();
    assert!((c1 - c2).abs() <= 1.0);
}

#[test]
fn test_total_weight_mode_respects_budget() {
    let (_db, api) = setup();
    let mut request = base_request(BatchControlMode::TotalWeight);
    request.total_weight_to_use = Some(600.0);
    let response = api.calculate_batch_plan(&request).unwrap();

    assert!((response.total_volume_available - 600.0).abs() < 1e-9);
    assert!(response.total_volume_used <= 600.0);
    assert!(response.summary.utilization_percentage <= 100.0);
}

#[test]
fn test_target_days_coverage_mode_converges() {
    let (_db, api) = setup();
    let mut request = base_request(BatchControlMode::TargetDaysCoverage);
    request.target_days_coverage = Some(30.0);
    let response = api.calculate_batch_plan(&request).unwrap();

    for item in &response.product_sizes {
        let coverage = item.future_days_coverage.unwrap();
        let rounding_unit = 1.0 / item.daily_sales_rate;
        assert!(
            coverage + rounding_unit >= 30.0,
            "{} coverage {} below target",
            item.product_code,
            coverage
        );
    }
    assert_eq!(response.target_days_coverage, Some(30.0));
}

#[test]
fn test_fixed_constraint_consumes_budget_verbatim() {
    let (_db, api) = setup();
    let mut request = base_request(BatchControlMode::MmqMultiplier);
    request.mmq_multiplier = Some(1.0);
    request.product_constraints = vec![ProductConstraint {
        product_code: "S200".to_string(),
        is_fixed: true,
        fixed_quantity: Some(3.0),
    }];
    let response = api.calculate_batch_plan(&request).unwrap();

    let s200 = response
        .product_sizes
        .iter()
        .find(|i| i.product_code == "S200")
        .unwrap();
    assert_eq!(s200.recommended_units_to_produce, 3);
    assert!(!s200.was_optimized);
    assert_eq!(response.summary.fixed_products_count, 1);
    assert_eq!(response.summary.optimized_products_count, 1);
    assert!(response.total_volume_used <= response.total_volume_available);
}

#[test]
fn test_fixed_constraint_without_quantity_is_rejected() {
    let (_db, api) = setup();
    let mut request = base_request(BatchControlMode::MmqMultiplier);
    request.mmq_multiplier = Some(1.0);
    request.product_constraints = vec![ProductConstraint {
        product_code: "S100".to_string(),
        is_fixed: true,
        fixed_quantity: None,
    }];
    let err = api.calculate_batch_plan(&request).unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
}

#[test]
fn test_missing_mode_parameter_is_rejected() {
    let (_db, api) = setup();
    let request = base_request(BatchControlMode::MmqMultiplier);
    let err = api.calculate_batch_plan(&request).unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
}

#[test]
fn test_non_positive_parameter_is_rejected() {
    let (_db, api) = setup();
    let mut request = base_request(BatchControlMode::TotalWeight);
    request.total_weight_to_use = Some(-5.0);
    let err = api.calculate_batch_plan(&request).unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
}

#[test]
fn test_unknown_semiproduct_template_is_not_found() {
    let (_db, api) = setup();
    let mut request = base_request(BatchControlMode::MmqMultiplier);
    request.semiproduct_code = "SP999".to_string();
    request.mmq_multiplier = Some(1.0);
    let err = api.calculate_batch_plan(&request).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn test_default_window_used_when_dates_missing() {
    let (_db, api) = setup();
    // 固定时钟在 2025-05-10，默认回看 90 天覆盖整个销售区间
    let mut request = base_request(BatchControlMode::MmqMultiplier);
    request.from_date = None;
    request.to_date = None;
    request.mmq_multiplier = Some(1.0);
    let response = api.calculate_batch_plan(&request).unwrap();

    // 90 天窗口摊薄速率，但速率必须大于 0（窗口包含了销售记录）
    assert!(response.product_sizes.iter().all(|i| i.daily_sales_rate > 0.0));
}

#[test]
fn test_plan_is_pure_and_repeatable() {
    let (_db, api) = setup();
    let mut request = base_request(BatchControlMode::MmqMultiplier);
    request.mmq_multiplier = Some(1.0);
    let a = api.calculate_batch_plan(&request).unwrap();
    let b = api.calculate_batch_plan(&request).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}
