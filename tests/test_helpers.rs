// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化 + 目录测试数据 + API 组装
// ==========================================

use cosmetics_batch_aps::config::PlanningConfig;
use cosmetics_batch_aps::db;
use cosmetics_batch_aps::domain::batch_plan::{
    ManufactureTemplate, ProductSize, SalesRecord, Semiproduct, TemplateIngredient,
};
use cosmetics_batch_aps::repository::CatalogRepository;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - Arc<Mutex<Connection>>: 已配置好的共享连接
pub fn create_test_db() -> Result<(NamedTempFile, Arc<Mutex<Connection>>), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("invalid db path")?.to_string();
    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;
    Ok((temp_file, Arc::new(Mutex::new(conn))))
}

/// 测试用配置（与默认一致，单独拎出来便于用例覆盖）
pub fn test_config() -> PlanningConfig {
    PlanningConfig::default()
}

/// 灌入批次计划用的目录数据
///
/// SP001 (MMQ=1000g, 库存 500g)，规格:
/// - S100: 100g/件, 库存 50, 2025-05-01..05-10 每天卖 5 件
/// - S200: 200g/件, 库存 20, 同期每天卖 2 件
pub fn seed_catalog(catalog: &CatalogRepository) -> Result<(), Box<dyn Error>> {
    catalog.upsert_semiproduct(&Semiproduct {
        product_code: "SP001".to_string(),
        product_name: "基础乳液".to_string(),
        available_stock: 500.0,
        minimal_manufacture_quantity: 1000.0,
    })?;

    let sizes = [
        ("S100", "乳液 100g", 50.0, 100.0),
        ("S200", "乳液 200g", 20.0, 200.0),
    ];
    for (code, name, stock, wpu) in sizes {
        catalog.upsert_product_size(
            "SP001",
            &ProductSize {
                product_code: code.to_string(),
                product_name: name.to_string(),
                current_stock: stock,
                daily_sales_rate: 0.0,
                weight_per_unit: wpu,
                expiration_months: 12,
                is_fixed: false,
                user_fixed_quantity: None,
            },
        )?;
    }

    for day in 1..=10 {
        let date = NaiveDate::from_ymd_opt(2025, 5, day).unwrap();
        catalog.insert_sales_record(&SalesRecord {
            product_code: "S100".to_string(),
            sale_date: date,
            quantity: 5.0,
        })?;
        catalog.insert_sales_record(&SalesRecord {
            product_code: "S200".to_string(),
            sale_date: date,
            quantity: 2.0,
        })?;
    }

    catalog.upsert_manufacture_template(&ManufactureTemplate {
        product_code: "SP001".to_string(),
        product_name: "基础乳液".to_string(),
        batch_size: 1000.0,
        original_amount: 1000.0,
        ingredients: vec![
            TemplateIngredient {
                product_code: "ING-WATER".to_string(),
                product_name: "纯水".to_string(),
                amount: 700.0,
                price: 0.01,
            },
            TemplateIngredient {
                product_code: "ING-OIL".to_string(),
                product_name: "基础油".to_string(),
                amount: 300.0,
                price: 0.35,
            },
        ],
    })?;
    Ok(())
}
