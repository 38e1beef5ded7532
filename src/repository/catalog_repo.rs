// ==========================================
// 化妆品生产批次计划系统 - 目录仓储
// ==========================================
// 职责: 半成品/成品规格主数据、销售记录、制造模板的读取与维护
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::domain::batch_plan::{
    ManufactureTemplate, ProductSize, SalesRecord, Semiproduct, TemplateIngredient,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

const DATE_FMT: &str = "%Y-%m-%d";

// ==========================================
// CatalogRepository - 目录仓储
// ==========================================
pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    /// 创建新的目录仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按代码读取半成品主数据
    pub fn get_semiproduct(&self, product_code: &str) -> RepositoryResult<Semiproduct> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"
            SELECT product_code, product_name, available_stock, minimal_manufacture_quantity
            FROM semiproduct WHERE product_code = ?1
            "#,
            params![product_code],
            |row| {
                Ok(Semiproduct {
                    product_code: row.get(0)?,
                    product_name: row.get(1)?,
                    available_stock: row.get(2)?,
                    minimal_manufacture_quantity: row.get(3)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Semiproduct".to_string(),
                id: product_code.to_string(),
            },
            other => other.into(),
        })
    }

    /// 读取某半成品下的全部成品规格
    ///
    /// 约束标志在计划请求里下发，主数据里只有规格本身，
    /// 这里统一以 is_fixed=false 返回，由计划服务套用约束。
    pub fn get_product_sizes(&self, semiproduct_code: &str) -> RepositoryResult<Vec<ProductSize>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_code, product_name, current_stock, weight_per_unit, expiration_months
            FROM product_size WHERE semiproduct_code = ?1 ORDER BY product_code
            "#,
        )?;
        let sizes = stmt
            .query_map(params![semiproduct_code], |row| {
                Ok(ProductSize {
                    product_code: row.get(0)?,
                    product_name: row.get(1)?,
                    current_stock: row.get(2)?,
                    daily_sales_rate: 0.0,
                    weight_per_unit: row.get(3)?,
                    expiration_months: row.get(4)?,
                    is_fixed: false,
                    user_fixed_quantity: None,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sizes)
    }

    /// 读取日期范围内的销售记录（闭区间）
    pub fn get_sales_records(
        &self,
        product_codes: &[String],
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<SalesRecord>> {
        if product_codes.is_empty() {
            return Ok(vec![]);
        }
        let conn = self.get_conn()?;
        let placeholders = (3..3 + product_codes.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"
            SELECT product_code, sale_date, quantity
            FROM sales_record
            WHERE sale_date >= ?1 AND sale_date <= ?2 AND product_code IN ({})
            ORDER BY sale_date
            "#,
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(from.format(DATE_FMT).to_string()),
            Box::new(to.format(DATE_FMT).to_string()),
        ];
        for code in product_codes {
            args.push(Box::new(code.clone()));
        }
        let params_ref: Vec<&dyn rusqlite::ToSql> = args.iter().map(|p| p.as_ref()).collect();
        let rows = stmt
            .query_map(params_ref.as_slice(), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(product_code, sale_date, quantity)| {
                let sale_date = NaiveDate::parse_from_str(&sale_date, DATE_FMT).map_err(|e| {
                    RepositoryError::FieldValueError {
                        field: "sale_date".to_string(),
                        message: format!("{}: {}", sale_date, e),
                    }
                })?;
                Ok(SalesRecord {
                    product_code,
                    sale_date,
                    quantity,
                })
            })
            .collect()
    }

    /// 读取制造模板（含配料清单）
    pub fn get_manufacture_template(
        &self,
        product_code: &str,
    ) -> RepositoryResult<ManufactureTemplate> {
        let conn = self.get_conn()?;
        let (code, name, batch_size, original_amount) = conn
            .query_row(
                r#"
                SELECT product_code, product_name, batch_size, original_amount
                FROM manufacture_template WHERE product_code = ?1
                "#,
                params![product_code],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                    ))
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                    entity: "ManufactureTemplate".to_string(),
                    id: product_code.to_string(),
                },
                other => other.into(),
            })?;

        let mut stmt = conn.prepare(
            r#"
            SELECT product_code, product_name, amount, price
            FROM template_ingredient WHERE template_code = ?1 ORDER BY product_code
            "#,
        )?;
        let ingredients = stmt
            .query_map(params![product_code], |row| {
                Ok(TemplateIngredient {
                    product_code: row.get(0)?,
                    product_name: row.get(1)?,
                    amount: row.get(2)?,
                    price: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ManufactureTemplate {
            product_code: code,
            product_name: name,
            batch_size,
            original_amount,
            ingredients,
        })
    }

    // ==========================================
    // 维护操作（主数据同步/测试数据）
    // ==========================================

    /// 写入或更新半成品主数据
    pub fn upsert_semiproduct(&self, semiproduct: &Semiproduct) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO semiproduct (product_code, product_name, available_stock, minimal_manufacture_quantity)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(product_code) DO UPDATE SET
                product_name = excluded.product_name,
                available_stock = excluded.available_stock,
                minimal_manufacture_quantity = excluded.minimal_manufacture_quantity
            "#,
            params![
                semiproduct.product_code,
                semiproduct.product_name,
                semiproduct.available_stock,
                semiproduct.minimal_manufacture_quantity,
            ],
        )?;
        Ok(())
    }

    /// 写入或更新成品规格主数据
    pub fn upsert_product_size(
        &self,
        semiproduct_code: &str,
        size: &ProductSize,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO product_size (product_code, semiproduct_code, product_name,
                                      current_stock, weight_per_unit, expiration_months)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(product_code) DO UPDATE SET
                semiproduct_code = excluded.semiproduct_code,
                product_name = excluded.product_name,
                current_stock = excluded.current_stock,
                weight_per_unit = excluded.weight_per_unit,
                expiration_months = excluded.expiration_months
            "#,
            params![
                size.product_code,
                semiproduct_code,
                size.product_name,
                size.current_stock,
                size.weight_per_unit,
                size.expiration_months,
            ],
        )?;
        Ok(())
    }

    /// 追加销售记录
    pub fn insert_sales_record(&self, record: &SalesRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sales_record (id, product_code, sale_date, quantity)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                uuid::Uuid::new_v4().to_string(),
                record.product_code,
                record.sale_date.format(DATE_FMT).to_string(),
                record.quantity,
            ],
        )?;
        Ok(())
    }

    /// 写入或更新制造模板（覆盖配料清单）
    pub fn upsert_manufacture_template(
        &self,
        template: &ManufactureTemplate,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO manufacture_template (product_code, product_name, batch_size, original_amount)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(product_code) DO UPDATE SET
                product_name = excluded.product_name,
                batch_size = excluded.batch_size,
                original_amount = excluded.original_amount
            "#,
            params![
                template.product_code,
                template.product_name,
                template.batch_size,
                template.original_amount,
            ],
        )?;
        tx.execute(
            "DELETE FROM template_ingredient WHERE template_code = ?1",
            params![template.product_code],
        )?;
        for ingredient in &template.ingredients {
            if ingredient.amount <= 0.0 {
                return Err(RepositoryError::ValidationError(format!(
                    "配料用量必须为正: {} amount={}",
                    ingredient.product_code, ingredient.amount
                )));
            }
            tx.execute(
                r#"
                INSERT INTO template_ingredient (template_code, product_code, product_name, amount, price)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    template.product_code,
                    ingredient.product_code,
                    ingredient.product_name,
                    ingredient.amount,
                    ingredient.price,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
