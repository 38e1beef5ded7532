// ==========================================
// 化妆品生产批次计划系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 内置建表脚本，订单/目录/序列号表一处维护
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库表结构
///
/// 幂等：所有表使用 CREATE TABLE IF NOT EXISTS，可在已建库上重复执行。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- ===== 生产订单 =====
        CREATE TABLE IF NOT EXISTS manufacture_order (
            id                              TEXT PRIMARY KEY,
            order_number                    TEXT NOT NULL UNIQUE,
            created_date                    TEXT NOT NULL,
            created_by_user                 TEXT NOT NULL,
            responsible_person              TEXT,
            planned_date_semiproduct        TEXT,
            planned_date_product            TEXT,
            manufacture_type                TEXT NOT NULL,
            state                           TEXT NOT NULL,
            state_changed_at                TEXT NOT NULL,
            state_changed_by_user           TEXT NOT NULL,
            manual_action_required          INTEGER NOT NULL DEFAULT 0,
            erp_order_number_semiproduct    TEXT,
            erp_order_date_semiproduct      TEXT,
            erp_order_number_product        TEXT,
            erp_order_date_product          TEXT,
            original_batch_size             REAL,
            new_batch_size                  REAL,
            scale_factor                    REAL
        );

        -- ===== 订单半成品行（每单一行） =====
        CREATE TABLE IF NOT EXISTS manufacture_order_semiproduct (
            order_id            TEXT PRIMARY KEY REFERENCES manufacture_order(id),
            product_code        TEXT NOT NULL,
            product_name        TEXT NOT NULL,
            planned_quantity    REAL NOT NULL,
            actual_quantity     REAL,
            lot_number          TEXT,
            expiration_date     TEXT,
            expiration_months   INTEGER NOT NULL,
            batch_multiplier    REAL NOT NULL DEFAULT 1.0
        );

        -- ===== 订单成品行 =====
        CREATE TABLE IF NOT EXISTS manufacture_order_product (
            id                  TEXT PRIMARY KEY,
            order_id            TEXT NOT NULL REFERENCES manufacture_order(id),
            product_code        TEXT NOT NULL,
            product_name        TEXT NOT NULL,
            planned_quantity    REAL NOT NULL,
            actual_quantity     REAL,
            lot_number          TEXT,
            expiration_date     TEXT,
            expiration_months   INTEGER NOT NULL,
            batch_multiplier    REAL NOT NULL DEFAULT 1.0
        );
        CREATE INDEX IF NOT EXISTS idx_mo_product_order
            ON manufacture_order_product(order_id);

        -- ===== 订单备注 =====
        CREATE TABLE IF NOT EXISTS manufacture_order_note (
            id                  TEXT PRIMARY KEY,
            order_id            TEXT NOT NULL REFERENCES manufacture_order(id),
            text                TEXT NOT NULL,
            created_at          TEXT NOT NULL,
            created_by_user     TEXT NOT NULL
        );

        -- ===== 订单审计日志（只追加，禁止 UPDATE/DELETE） =====
        CREATE TABLE IF NOT EXISTS manufacture_order_audit_log (
            id                  TEXT PRIMARY KEY,
            order_id            TEXT NOT NULL REFERENCES manufacture_order(id),
            action_ts           TEXT NOT NULL,
            actor               TEXT NOT NULL,
            action              TEXT NOT NULL,
            details             TEXT,
            old_value           TEXT,
            new_value           TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_mo_audit_order
            ON manufacture_order_audit_log(order_id);

        -- ===== 订单号序列（持久化单调序列，进程内不允许静态计数器） =====
        CREATE TABLE IF NOT EXISTS order_number_seq (
            year        INTEGER PRIMARY KEY,
            last_seq    INTEGER NOT NULL
        );

        -- ===== 半成品主数据 =====
        CREATE TABLE IF NOT EXISTS semiproduct (
            product_code                    TEXT PRIMARY KEY,
            product_name                    TEXT NOT NULL,
            available_stock                 REAL NOT NULL DEFAULT 0,
            minimal_manufacture_quantity    REAL NOT NULL DEFAULT 0
        );

        -- ===== 成品规格主数据 =====
        CREATE TABLE IF NOT EXISTS product_size (
            product_code        TEXT PRIMARY KEY,
            semiproduct_code    TEXT NOT NULL REFERENCES semiproduct(product_code),
            product_name        TEXT NOT NULL,
            current_stock       REAL NOT NULL DEFAULT 0,
            weight_per_unit     REAL NOT NULL,
            expiration_months   INTEGER NOT NULL DEFAULT 12
        );
        CREATE INDEX IF NOT EXISTS idx_product_size_semiproduct
            ON product_size(semiproduct_code);

        -- ===== 销售记录 =====
        CREATE TABLE IF NOT EXISTS sales_record (
            id              TEXT PRIMARY KEY,
            product_code    TEXT NOT NULL,
            sale_date       TEXT NOT NULL,
            quantity        REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sales_record_code_date
            ON sales_record(product_code, sale_date);

        -- ===== 制造模板 =====
        CREATE TABLE IF NOT EXISTS manufacture_template (
            product_code    TEXT PRIMARY KEY,
            product_name    TEXT NOT NULL,
            batch_size      REAL NOT NULL,
            original_amount REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS template_ingredient (
            template_code   TEXT NOT NULL REFERENCES manufacture_template(product_code),
            product_code    TEXT NOT NULL,
            product_name    TEXT NOT NULL,
            amount          REAL NOT NULL,
            price           REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (template_code, product_code)
        );
        "#,
    )?;
    Ok(())
}
