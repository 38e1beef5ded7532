// ==========================================
// 化妆品生产批次计划系统 - 生产订单仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 红线: 审计日志表只 INSERT，任何路径不得 UPDATE/DELETE
// 红线: 订单号取自持久化序列表，进程内不允许静态计数器
// ==========================================

use crate::domain::audit_log::ManufactureOrderAuditLog;
use crate::domain::order::{
    ManufactureOrder, ManufactureOrderNote, ManufactureOrderProduct, ManufactureOrderSemiProduct,
    OrderStatus,
};
use crate::domain::types::{AuditAction, ManufactureOrderState, ManufactureType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// 日期格式
// ==========================================

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

fn fmt_datetime(ts: NaiveDateTime) -> String {
    ts.format(DATETIME_FMT).to_string()
}

fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

fn parse_datetime(s: &str) -> RepositoryResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).map_err(|e| RepositoryError::FieldValueError {
        field: "datetime".to_string(),
        message: format!("{}: {}", s, e),
    })
}

fn parse_date(s: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).map_err(|e| RepositoryError::FieldValueError {
        field: "date".to_string(),
        message: format!("{}: {}", s, e),
    })
}

fn parse_date_opt(s: Option<String>) -> RepositoryResult<Option<NaiveDate>> {
    s.map(|v| parse_date(&v)).transpose()
}

// ==========================================
// OrderFilter - 订单列表查询条件
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub state: Option<ManufactureOrderState>,
    pub manufacture_type: Option<ManufactureType>,
    pub manual_action_required: Option<bool>,
    pub responsible_person: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
}

// ==========================================
// ManufactureOrderRepository - 生产订单仓储
// ==========================================
pub struct ManufactureOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ManufactureOrderRepository {
    /// 创建新的订单仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 订单号序列
    // ==========================================

    /// 生成新订单号
    ///
    /// 格式: <前缀>-<年份>-<5位序列号>，序列按年份在 order_number_seq 表持久化，
    /// 每次调用原子自增，跨进程/重启保持单调。
    pub fn generate_order_number(&self, prefix: &str, year: i32) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO order_number_seq (year, last_seq) VALUES (?1, 1)
            ON CONFLICT(year) DO UPDATE SET last_seq = last_seq + 1
            "#,
            params![year],
        )?;
        let seq: i64 = tx.query_row(
            "SELECT last_seq FROM order_number_seq WHERE year = ?1",
            params![year],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(format!("{}-{}-{:05}", prefix, year, seq))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 新增订单（含半成品行/成品行/备注/审计日志，单事务）
    pub fn add_order(&self, order: &ManufactureOrder) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO manufacture_order (
                id, order_number, created_date, created_by_user, responsible_person,
                planned_date_semiproduct, planned_date_product, manufacture_type,
                state, state_changed_at, state_changed_by_user, manual_action_required,
                erp_order_number_semiproduct, erp_order_date_semiproduct,
                erp_order_number_product, erp_order_date_product,
                original_batch_size, new_batch_size, scale_factor
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                order.id,
                order.order_number,
                fmt_datetime(order.created_date),
                order.created_by_user,
                order.responsible_person,
                order.planned_date_semiproduct.map(fmt_date),
                order.planned_date_product.map(fmt_date),
                order.manufacture_type.to_db_str(),
                order.status.state.to_db_str(),
                fmt_datetime(order.state_changed_at),
                order.state_changed_by_user,
                order.status.manual_action_required as i64,
                order.erp_order_number_semiproduct,
                order.erp_order_date_semiproduct.map(fmt_date),
                order.erp_order_number_product,
                order.erp_order_date_product.map(fmt_date),
                order.original_batch_size,
                order.new_batch_size,
                order.scale_factor,
            ],
        )?;

        Self::insert_semi_product(&tx, &order.id, &order.semi_product)?;
        for product in &order.products {
            Self::insert_product(&tx, &order.id, product)?;
        }
        for note in &order.notes {
            Self::insert_note(&tx, &order.id, note)?;
        }
        for entry in &order.audit_log {
            Self::insert_audit_entry(&tx, entry)?;
        }

        tx.commit()?;
        Ok(order.id.clone())
    }

    /// 更新订单
    ///
    /// 订单头/行项目按主键覆盖写；备注与审计日志采用 INSERT OR IGNORE，
    /// 已落库条目永不改写（审计只追加红线由此保证）。
    pub fn update_order(&self, order: &ManufactureOrder) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let rows = tx.execute(
            r#"
            UPDATE manufacture_order SET
                responsible_person = ?2,
                planned_date_semiproduct = ?3,
                planned_date_product = ?4,
                state = ?5,
                state_changed_at = ?6,
                state_changed_by_user = ?7,
                manual_action_required = ?8,
                erp_order_number_semiproduct = ?9,
                erp_order_date_semiproduct = ?10,
                erp_order_number_product = ?11,
                erp_order_date_product = ?12
            WHERE id = ?1
            "#,
            params![
                order.id,
                order.responsible_person,
                order.planned_date_semiproduct.map(fmt_date),
                order.planned_date_product.map(fmt_date),
                order.status.state.to_db_str(),
                fmt_datetime(order.state_changed_at),
                order.state_changed_by_user,
                order.status.manual_action_required as i64,
                order.erp_order_number_semiproduct,
                order.erp_order_date_semiproduct.map(fmt_date),
                order.erp_order_number_product,
                order.erp_order_date_product.map(fmt_date),
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ManufactureOrder".to_string(),
                id: order.id.clone(),
            });
        }

        tx.execute(
            "DELETE FROM manufacture_order_semiproduct WHERE order_id = ?1",
            params![order.id],
        )?;
        Self::insert_semi_product(&tx, &order.id, &order.semi_product)?;

        tx.execute(
            "DELETE FROM manufacture_order_product WHERE order_id = ?1",
            params![order.id],
        )?;
        for product in &order.products {
            Self::insert_product(&tx, &order.id, product)?;
        }

        for note in &order.notes {
            Self::insert_note(&tx, &order.id, note)?;
        }
        for entry in &order.audit_log {
            Self::insert_audit_entry(&tx, entry)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn insert_semi_product(
        tx: &Transaction,
        order_id: &str,
        line: &ManufactureOrderSemiProduct,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO manufacture_order_semiproduct (
                order_id, product_code, product_name, planned_quantity, actual_quantity,
                lot_number, expiration_date, expiration_months, batch_multiplier
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                order_id,
                line.product_code,
                line.product_name,
                line.planned_quantity,
                line.actual_quantity,
                line.lot_number,
                line.expiration_date.map(fmt_date),
                line.expiration_months,
                line.batch_multiplier,
            ],
        )?;
        Ok(())
    }

    fn insert_product(
        tx: &Transaction,
        order_id: &str,
        line: &ManufactureOrderProduct,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO manufacture_order_product (
                id, order_id, product_code, product_name, planned_quantity, actual_quantity,
                lot_number, expiration_date, expiration_months, batch_multiplier
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                line.id,
                order_id,
                line.product_code,
                line.product_name,
                line.planned_quantity,
                line.actual_quantity,
                line.lot_number,
                line.expiration_date.map(fmt_date),
                line.expiration_months,
                line.batch_multiplier,
            ],
        )?;
        Ok(())
    }

    fn insert_note(
        tx: &Transaction,
        order_id: &str,
        note: &ManufactureOrderNote,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT OR IGNORE INTO manufacture_order_note (
                id, order_id, text, created_at, created_by_user
            ) VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                note.id,
                order_id,
                note.text,
                fmt_datetime(note.created_at),
                note.created_by_user,
            ],
        )?;
        Ok(())
    }

    fn insert_audit_entry(
        tx: &Transaction,
        entry: &ManufactureOrderAuditLog,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT OR IGNORE INTO manufacture_order_audit_log (
                id, order_id, action_ts, actor, action, details, old_value, new_value
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                entry.id,
                entry.order_id,
                fmt_datetime(entry.timestamp),
                entry.user,
                entry.action.as_str(),
                entry.details,
                entry.old_value,
                entry.new_value,
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 ID 加载完整订单聚合
    pub fn get_order_by_id(&self, order_id: &str) -> RepositoryResult<ManufactureOrder> {
        let conn = self.get_conn()?;
        let mut order = conn
            .query_row(
                r#"
                SELECT id, order_number, created_date, created_by_user, responsible_person,
                       planned_date_semiproduct, planned_date_product, manufacture_type,
                       state, state_changed_at, state_changed_by_user, manual_action_required,
                       erp_order_number_semiproduct, erp_order_date_semiproduct,
                       erp_order_number_product, erp_order_date_product,
                       original_batch_size, new_batch_size, scale_factor
                FROM manufacture_order WHERE id = ?1
                "#,
                params![order_id],
                Self::map_order_header,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                    entity: "ManufactureOrder".to_string(),
                    id: order_id.to_string(),
                },
                other => other.into(),
            })??;

        order.semi_product = conn
            .query_row(
                r#"
                SELECT product_code, product_name, planned_quantity, actual_quantity,
                       lot_number, expiration_date, expiration_months, batch_multiplier
                FROM manufacture_order_semiproduct WHERE order_id = ?1
                "#,
                params![order_id],
                Self::map_semi_product,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                    entity: "ManufactureOrderSemiProduct".to_string(),
                    id: order_id.to_string(),
                },
                other => other.into(),
            })??;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, product_code, product_name, planned_quantity, actual_quantity,
                   lot_number, expiration_date, expiration_months, batch_multiplier
            FROM manufacture_order_product WHERE order_id = ?1 ORDER BY product_code
            "#,
        )?;
        order.products = stmt
            .query_map(params![order_id], Self::map_product)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .collect::<RepositoryResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, text, created_at, created_by_user
            FROM manufacture_order_note WHERE order_id = ?1 ORDER BY rowid
            "#,
        )?;
        order.notes = stmt
            .query_map(params![order_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(id, text, created_at, created_by_user)| {
                Ok(ManufactureOrderNote {
                    id,
                    text,
                    created_at: parse_datetime(&created_at)?,
                    created_by_user,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, order_id, action_ts, actor, action, details, old_value, new_value
            -- rowid 保序: 同一时间戳内仍按追加顺序返回
            FROM manufacture_order_audit_log WHERE order_id = ?1 ORDER BY rowid
            "#,
        )?;
        order.audit_log = stmt
            .query_map(params![order_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(id, oid, ts, actor, action, details, old_value, new_value)| {
                let action = AuditAction::from_str(&action).ok_or_else(|| {
                    RepositoryError::FieldValueError {
                        field: "action".to_string(),
                        message: action.clone(),
                    }
                })?;
                Ok(ManufactureOrderAuditLog {
                    id,
                    order_id: oid,
                    timestamp: parse_datetime(&ts)?,
                    user: actor,
                    action,
                    details,
                    old_value,
                    new_value,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(order)
    }

    /// 按条件列出订单（只返回订单头，行项目按需单独加载）
    pub fn list_orders(&self, filter: &OrderFilter) -> RepositoryResult<Vec<ManufactureOrder>> {
        let conn = self.get_conn()?;
        let mut sql = String::from(
            r#"
            SELECT id, order_number, created_date, created_by_user, responsible_person,
                   planned_date_semiproduct, planned_date_product, manufacture_type,
                   state, state_changed_at, state_changed_by_user, manual_action_required,
                   erp_order_number_semiproduct, erp_order_date_semiproduct,
                   erp_order_number_product, erp_order_date_product,
                   original_batch_size, new_batch_size, scale_factor
            FROM manufacture_order WHERE 1=1
            "#,
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(state) = filter.state {
            args.push(Box::new(state.to_db_str().to_string()));
            sql.push_str(&format!(" AND state = ?{}", args.len()));
        }
        if let Some(mt) = filter.manufacture_type {
            args.push(Box::new(mt.to_db_str().to_string()));
            sql.push_str(&format!(" AND manufacture_type = ?{}", args.len()));
        }
        if let Some(flag) = filter.manual_action_required {
            args.push(Box::new(flag as i64));
            sql.push_str(&format!(" AND manual_action_required = ?{}", args.len()));
        }
        if let Some(ref person) = filter.responsible_person {
            args.push(Box::new(person.clone()));
            sql.push_str(&format!(" AND responsible_person = ?{}", args.len()));
        }
        if let Some(from) = filter.created_from {
            args.push(Box::new(fmt_date(from)));
            sql.push_str(&format!(" AND date(created_date) >= ?{}", args.len()));
        }
        if let Some(to) = filter.created_to {
            args.push(Box::new(fmt_date(to)));
            sql.push_str(&format!(" AND date(created_date) <= ?{}", args.len()));
        }
        sql.push_str(" ORDER BY order_number");

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::ToSql> = args.iter().map(|p| p.as_ref()).collect();
        let orders = stmt
            .query_map(params_ref.as_slice(), Self::map_order_header)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .collect::<RepositoryResult<Vec<_>>>()?;
        Ok(orders)
    }

    // ==========================================
    // 行映射
    // ==========================================

    fn map_order_header(row: &Row) -> rusqlite::Result<RepositoryResult<ManufactureOrder>> {
        let created_date: String = row.get(2)?;
        let planned_sp: Option<String> = row.get(5)?;
        let planned_p: Option<String> = row.get(6)?;
        let manufacture_type: String = row.get(7)?;
        let state: String = row.get(8)?;
        let state_changed_at: String = row.get(9)?;
        let erp_date_sp: Option<String> = row.get(13)?;
        let erp_date_p: Option<String> = row.get(15)?;

        let id: String = row.get(0)?;
        let order_number: String = row.get(1)?;
        let created_by_user: String = row.get(3)?;
        let responsible_person: Option<String> = row.get(4)?;
        let state_changed_by_user: String = row.get(10)?;
        let manual_action_required: i64 = row.get(11)?;
        let erp_number_sp: Option<String> = row.get(12)?;
        let erp_number_p: Option<String> = row.get(14)?;
        let original_batch_size: Option<f64> = row.get(16)?;
        let new_batch_size: Option<f64> = row.get(17)?;
        let scale_factor: Option<f64> = row.get(18)?;

        Ok((|| {
            let manufacture_type = ManufactureType::from_str(&manufacture_type).ok_or_else(
                || RepositoryError::FieldValueError {
                    field: "manufacture_type".to_string(),
                    message: manufacture_type.clone(),
                },
            )?;
            let state = ManufactureOrderState::from_str(&state).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "state".to_string(),
                    message: state.clone(),
                }
            })?;
            Ok(ManufactureOrder {
                id,
                order_number,
                created_date: parse_datetime(&created_date)?,
                created_by_user,
                responsible_person,
                planned_date_semiproduct: parse_date_opt(planned_sp)?,
                planned_date_product: parse_date_opt(planned_p)?,
                manufacture_type,
                status: OrderStatus {
                    state,
                    manual_action_required: manual_action_required != 0,
                },
                state_changed_at: parse_datetime(&state_changed_at)?,
                state_changed_by_user,
                erp_order_number_semiproduct: erp_number_sp,
                erp_order_date_semiproduct: parse_date_opt(erp_date_sp)?,
                erp_order_number_product: erp_number_p,
                erp_order_date_product: parse_date_opt(erp_date_p)?,
                original_batch_size,
                new_batch_size,
                scale_factor,
                // 占位，由调用方补齐子实体
                semi_product: ManufactureOrderSemiProduct {
                    product_code: String::new(),
                    product_name: String::new(),
                    planned_quantity: 0.0,
                    actual_quantity: None,
                    lot_number: None,
                    expiration_date: None,
                    expiration_months: 0,
                    batch_multiplier: 1.0,
                },
                products: vec![],
                notes: vec![],
                audit_log: vec![],
            })
        })())
    }

    fn map_semi_product(row: &Row) -> rusqlite::Result<RepositoryResult<ManufactureOrderSemiProduct>> {
        let expiration_date: Option<String> = row.get(5)?;
        let line = ManufactureOrderSemiProduct {
            product_code: row.get(0)?,
            product_name: row.get(1)?,
            planned_quantity: row.get(2)?,
            actual_quantity: row.get(3)?,
            lot_number: row.get(4)?,
            expiration_date: None,
            expiration_months: row.get(6)?,
            batch_multiplier: row.get(7)?,
        };
        Ok((|| {
            let mut line = line;
            line.expiration_date = parse_date_opt(expiration_date)?;
            Ok(line)
        })())
    }

    fn map_product(row: &Row) -> rusqlite::Result<RepositoryResult<ManufactureOrderProduct>> {
        let expiration_date: Option<String> = row.get(6)?;
        let line = ManufactureOrderProduct {
            id: row.get(0)?,
            product_code: row.get(1)?,
            product_name: row.get(2)?,
            planned_quantity: row.get(3)?,
            actual_quantity: row.get(4)?,
            lot_number: row.get(5)?,
            expiration_date: None,
            expiration_months: row.get(7)?,
            batch_multiplier: row.get(8)?,
        };
        Ok((|| {
            let mut line = line;
            line.expiration_date = parse_date_opt(expiration_date)?;
            Ok(line)
        })())
    }
}
