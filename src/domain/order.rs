// ==========================================
// 化妆品生产批次计划系统 - 生产订单聚合
// ==========================================
// 职责: 订单生命周期状态机 + 行项目 + 审计日志
// 红线: 状态只能按转换表推进；审计日志只追加；订单永不删除
// ==========================================
// 单阶段: DRAFT → PLANNED → IN_PRODUCTION → COMPLETED（确认时一次推进两步）
// 双阶段: DRAFT → PLANNED → SEMI_PRODUCT_MANUFACTURED → COMPLETED
// manual_action_required 与状态正交，仅 resolve_manual_action 可清除
// ==========================================

use crate::domain::audit_log::ManufactureOrderAuditLog;
use crate::domain::types::{AuditAction, ErpDocumentType, ManufactureOrderState, ManufactureType};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ==========================================
// 领域错误
// ==========================================

/// 订单聚合层错误
#[derive(Error, Debug)]
pub enum OrderDomainError {
    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition {
        from: ManufactureOrderState,
        to: ManufactureOrderState,
    },

    #[error("制造类型不匹配: expected={expected} actual={actual}")]
    WrongManufactureType {
        expected: ManufactureType,
        actual: ManufactureType,
    },

    #[error("订单成品行未找到: {0}")]
    ProductLineNotFound(String),
}

// ==========================================
// OrderStatus - 状态 + 人工处理标志
// ==========================================
// manual_action_required 与 state 放在同一个结构里，
// 转换表按 state 校验，标志位只能通过显式方法翻转。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub state: ManufactureOrderState,
    pub manual_action_required: bool,
}

impl OrderStatus {
    /// 新订单初始状态
    pub fn new_draft() -> Self {
        Self {
            state: ManufactureOrderState::Draft,
            manual_action_required: false,
        }
    }

    /// 状态转换表
    ///
    /// 规则:
    /// - DRAFT → PLANNED（任意制造类型）
    /// - PLANNED → IN_PRODUCTION（仅单阶段）
    /// - IN_PRODUCTION → COMPLETED（仅单阶段）
    /// - PLANNED → SEMI_PRODUCT_MANUFACTURED（仅双阶段）
    /// - SEMI_PRODUCT_MANUFACTURED → COMPLETED（仅双阶段）
    pub fn can_advance(
        &self,
        next: ManufactureOrderState,
        manufacture_type: ManufactureType,
    ) -> bool {
        use ManufactureOrderState::*;
        matches!(
            (self.state, next, manufacture_type),
            (Draft, Planned, _)
                | (Planned, InProduction, ManufactureType::SinglePhase)
                | (InProduction, Completed, ManufactureType::SinglePhase)
                | (Planned, SemiProductManufactured, ManufactureType::MultiPhase)
                | (SemiProductManufactured, Completed, ManufactureType::MultiPhase)
        )
    }

    /// 按转换表推进状态，非法转换返回错误且不改变状态
    pub fn advance(
        &mut self,
        next: ManufactureOrderState,
        manufacture_type: ManufactureType,
    ) -> Result<(), OrderDomainError> {
        if !self.can_advance(next, manufacture_type) {
            return Err(OrderDomainError::InvalidStateTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

// ==========================================
// 行项目
// ==========================================

/// 订单半成品行（每单一行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufactureOrderSemiProduct {
    pub product_code: String,
    pub product_name: String,
    pub planned_quantity: f64,
    pub actual_quantity: Option<f64>, // 仅确认时写入
    pub lot_number: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub expiration_months: u32,
    pub batch_multiplier: f64,
}

/// 订单成品行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufactureOrderProduct {
    pub id: String,
    pub product_code: String,
    pub product_name: String,
    pub planned_quantity: f64,
    pub actual_quantity: Option<f64>, // 仅确认时写入
    pub lot_number: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub expiration_months: u32,
    pub batch_multiplier: f64,
}

/// 订单备注
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufactureOrderNote {
    pub id: String,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub created_by_user: String,
}

// ==========================================
// 批号与有效期
// ==========================================

/// 默认批号
///
/// 格式: <前缀><yyMMdd>-<订单号数字尾段>
/// 订单号尾段保证同日复制出的订单批号互不相同。
pub fn default_lot_number(prefix: &str, today: NaiveDate, order_number: &str) -> String {
    let tail = order_number.rsplit('-').next().unwrap_or(order_number);
    format!("{}{}-{}", prefix, today.format("%y%m%d"), tail)
}

/// 有效期: 当前日期 + 有效月数，归一到所在月最后一天
pub fn expiration_from(today: NaiveDate, months: u32) -> NaiveDate {
    let total = today.year() * 12 + today.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    // 下月 1 日减一天即为当月最后一天
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or(today)
        .pred_opt()
        .unwrap_or(today)
}

// ==========================================
// ManufactureOrder - 生产订单聚合根
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufactureOrder {
    pub id: String,
    pub order_number: String, // 全局唯一
    pub created_date: NaiveDateTime,
    pub created_by_user: String,
    pub responsible_person: Option<String>,
    pub planned_date_semiproduct: Option<NaiveDate>,
    pub planned_date_product: Option<NaiveDate>,
    pub manufacture_type: ManufactureType,
    pub status: OrderStatus,
    pub state_changed_at: NaiveDateTime,
    pub state_changed_by_user: String,

    // ===== ERP 关联字段（按单据类型） =====
    pub erp_order_number_semiproduct: Option<String>,
    pub erp_order_date_semiproduct: Option<NaiveDate>,
    pub erp_order_number_product: Option<String>,
    pub erp_order_date_product: Option<NaiveDate>,

    // ===== 批量折算快照 =====
    pub original_batch_size: Option<f64>,
    pub new_batch_size: Option<f64>,
    pub scale_factor: Option<f64>,

    // ===== 子实体 =====
    pub semi_product: ManufactureOrderSemiProduct,
    pub products: Vec<ManufactureOrderProduct>,
    pub notes: Vec<ManufactureOrderNote>,
    pub audit_log: Vec<ManufactureOrderAuditLog>,
}

impl ManufactureOrder {
    /// 从批次计划结果创建草稿订单
    ///
    /// 不调用 ERP；仅生成聚合并记录 OrderCreated 审计条目（含折算系数）。
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        order_number: String,
        semi_product: ManufactureOrderSemiProduct,
        products: Vec<ManufactureOrderProduct>,
        manufacture_type: ManufactureType,
        responsible_person: Option<String>,
        planned_date: Option<NaiveDate>,
        scale: Option<(f64, f64, f64)>, // (original_batch_size, new_batch_size, scale_factor)
        now: NaiveDateTime,
        user: &str,
    ) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let scale_note = match scale {
            Some((original, new, factor)) => format!(
                "original_batch_size={}, new_batch_size={}, scale_factor={}",
                original, new, factor
            ),
            None => "scale_factor=1".to_string(),
        };
        let audit = ManufactureOrderAuditLog::new(&id, now, user, AuditAction::OrderCreated)
            .with_details(scale_note);

        Self {
            id,
            order_number,
            created_date: now,
            created_by_user: user.to_string(),
            responsible_person,
            planned_date_semiproduct: planned_date,
            planned_date_product: planned_date,
            manufacture_type,
            status: OrderStatus::new_draft(),
            state_changed_at: now,
            state_changed_by_user: user.to_string(),
            erp_order_number_semiproduct: None,
            erp_order_date_semiproduct: None,
            erp_order_number_product: None,
            erp_order_date_product: None,
            original_batch_size: scale.map(|s| s.0),
            new_batch_size: scale.map(|s| s.1),
            scale_factor: scale.map(|s| s.2),
            semi_product,
            products,
            notes: vec![],
            audit_log: vec![audit],
        }
    }

    // ==========================================
    // 生命周期操作
    // ==========================================

    /// 草稿进入排产: DRAFT → PLANNED
    pub fn plan(
        &mut self,
        planned_date_semiproduct: NaiveDate,
        planned_date_product: NaiveDate,
        now: NaiveDateTime,
        user: &str,
    ) -> Result<(), OrderDomainError> {
        let from = self.status.state;
        self.status
            .advance(ManufactureOrderState::Planned, self.manufacture_type)?;
        self.planned_date_semiproduct = Some(planned_date_semiproduct);
        self.planned_date_product = Some(planned_date_product);
        self.touch_state(now, user);
        self.append_audit(
            ManufactureOrderAuditLog::new(&self.id, now, user, AuditAction::OrderPlanned)
                .with_change(from.to_db_str(), self.status.state.to_db_str()),
        );
        Ok(())
    }

    /// 单阶段生产确认: PLANNED → IN_PRODUCTION → COMPLETED（同一调用内）
    ///
    /// 为每个成品行写入实际数量，分配默认批号与有效期。
    /// 前置条件不满足时返回错误，聚合不变。
    pub fn confirm_single_phase(
        &mut self,
        actual_quantities: &HashMap<String, f64>,
        change_reason: Option<&str>,
        lot_prefix: &str,
        now: NaiveDateTime,
        user: &str,
    ) -> Result<(), OrderDomainError> {
        if self.manufacture_type != ManufactureType::SinglePhase {
            return Err(OrderDomainError::WrongManufactureType {
                expected: ManufactureType::SinglePhase,
                actual: self.manufacture_type,
            });
        }
        // 先用副本校验两步转换，避免半途失败留下中间状态
        let mut status = self.status;
        status.advance(ManufactureOrderState::InProduction, self.manufacture_type)?;
        status.advance(ManufactureOrderState::Completed, self.manufacture_type)?;
        self.require_known_product_lines(actual_quantities)?;

        let from = self.status.state;
        let today = now.date();
        let order_number = self.order_number.clone();
        for product in &mut self.products {
            let actual = actual_quantities
                .get(&product.id)
                .copied()
                .unwrap_or(product.planned_quantity);
            product.actual_quantity = Some(actual);
            product.lot_number = Some(default_lot_number(lot_prefix, today, &order_number));
            product.expiration_date = Some(expiration_from(today, product.expiration_months));
        }
        self.semi_product.actual_quantity = Some(self.semi_product.planned_quantity);
        if self.semi_product.lot_number.is_none() {
            self.semi_product.lot_number =
                Some(default_lot_number(lot_prefix, today, &order_number));
            self.semi_product.expiration_date =
                Some(expiration_from(today, self.semi_product.expiration_months));
        }

        self.status = status;
        self.touch_state(now, user);
        self.append_audit(
            ManufactureOrderAuditLog::new(&self.id, now, user, AuditAction::SinglePhaseConfirmed)
                .with_details(change_reason.unwrap_or("single phase confirmed").to_string())
                .with_change(from.to_db_str(), self.status.state.to_db_str()),
        );
        Ok(())
    }

    /// 双阶段 - 半成品阶段确认: PLANNED → SEMI_PRODUCT_MANUFACTURED
    pub fn confirm_semi_product(
        &mut self,
        actual_quantity: f64,
        lot_number: Option<String>,
        change_reason: &str,
        lot_prefix: &str,
        now: NaiveDateTime,
        user: &str,
    ) -> Result<(), OrderDomainError> {
        if self.manufacture_type != ManufactureType::MultiPhase {
            return Err(OrderDomainError::WrongManufactureType {
                expected: ManufactureType::MultiPhase,
                actual: self.manufacture_type,
            });
        }
        let from = self.status.state;
        self.status.advance(
            ManufactureOrderState::SemiProductManufactured,
            self.manufacture_type,
        )?;
        let today = now.date();
        self.semi_product.actual_quantity = Some(actual_quantity);
        self.semi_product.lot_number = lot_number
            .or_else(|| Some(default_lot_number(lot_prefix, today, &self.order_number)));
        self.semi_product.expiration_date =
            Some(expiration_from(today, self.semi_product.expiration_months));
        self.touch_state(now, user);
        self.append_audit(
            ManufactureOrderAuditLog::new(&self.id, now, user, AuditAction::SemiProductConfirmed)
                .with_details(change_reason.to_string())
                .with_change(from.to_db_str(), self.status.state.to_db_str()),
        );
        Ok(())
    }

    /// 双阶段 - 成品阶段确认: SEMI_PRODUCT_MANUFACTURED → COMPLETED
    pub fn confirm_product_completion(
        &mut self,
        actual_quantities: &HashMap<String, f64>,
        change_reason: &str,
        lot_prefix: &str,
        now: NaiveDateTime,
        user: &str,
    ) -> Result<(), OrderDomainError> {
        if self.manufacture_type != ManufactureType::MultiPhase {
            return Err(OrderDomainError::WrongManufactureType {
                expected: ManufactureType::MultiPhase,
                actual: self.manufacture_type,
            });
        }
        self.require_known_product_lines(actual_quantities)?;
        let from = self.status.state;
        self.status
            .advance(ManufactureOrderState::Completed, self.manufacture_type)?;
        let today = now.date();
        let order_number = self.order_number.clone();
        for product in &mut self.products {
            let actual = actual_quantities
                .get(&product.id)
                .copied()
                .unwrap_or(product.planned_quantity);
            product.actual_quantity = Some(actual);
            if product.lot_number.is_none() {
                product.lot_number = Some(default_lot_number(lot_prefix, today, &order_number));
                product.expiration_date =
                    Some(expiration_from(today, product.expiration_months));
            }
        }
        self.touch_state(now, user);
        self.append_audit(
            ManufactureOrderAuditLog::new(&self.id, now, user, AuditAction::ProductCompleted)
                .with_details(change_reason.to_string())
                .with_change(from.to_db_str(), self.status.state.to_db_str()),
        );
        Ok(())
    }

    // ==========================================
    // 人工处理标志
    // ==========================================

    /// 标记需人工处理（典型场景: ERP 提交失败），可在任意状态设置
    pub fn flag_manual_action(&mut self, reason: &str, now: NaiveDateTime, user: &str) {
        let old = self.status.manual_action_required;
        self.status.manual_action_required = true;
        self.append_audit(
            ManufactureOrderAuditLog::new(&self.id, now, user, AuditAction::ManualActionFlagged)
                .with_details(reason.to_string())
                .with_change(old.to_string(), "true"),
        );
    }

    /// 人工处理完成
    ///
    /// - 可选写入 ERP 单号关联
    /// - 清除 manual_action_required
    /// - 可选追加备注
    /// - 总是追加 ManualActionResolved 审计条目 ("true" → "false")
    /// - 不改变 state
    pub fn resolve_manual_action(
        &mut self,
        erp_order_number_semiproduct: Option<String>,
        erp_order_number_product: Option<String>,
        note: Option<String>,
        now: NaiveDateTime,
        user: &str,
    ) {
        if let Some(number) = erp_order_number_semiproduct {
            self.set_erp_order(ErpDocumentType::SemiProductOrder, number, now.date(), now, user);
        }
        if let Some(number) = erp_order_number_product {
            self.set_erp_order(ErpDocumentType::ProductOrder, number, now.date(), now, user);
        }
        self.status.manual_action_required = false;
        if let Some(text) = note {
            self.add_note(text, now, user);
        }
        self.append_audit(
            ManufactureOrderAuditLog::new(&self.id, now, user, AuditAction::ManualActionResolved)
                .with_change("true", "false"),
        );
    }

    /// 写入 ERP 单号关联
    pub fn set_erp_order(
        &mut self,
        document_type: ErpDocumentType,
        order_number: String,
        order_date: NaiveDate,
        now: NaiveDateTime,
        user: &str,
    ) {
        let old = match document_type {
            ErpDocumentType::SemiProductOrder => {
                let old = self.erp_order_number_semiproduct.take();
                self.erp_order_number_semiproduct = Some(order_number.clone());
                self.erp_order_date_semiproduct = Some(order_date);
                old
            }
            ErpDocumentType::ProductOrder => {
                let old = self.erp_order_number_product.take();
                self.erp_order_number_product = Some(order_number.clone());
                self.erp_order_date_product = Some(order_date);
                old
            }
        };
        self.append_audit(
            ManufactureOrderAuditLog::new(&self.id, now, user, AuditAction::ErpOrderLinked)
                .with_details(document_type.to_string())
                .with_change(old.unwrap_or_default(), order_number),
        );
    }

    /// 追加备注
    pub fn add_note(&mut self, text: String, now: NaiveDateTime, user: &str) {
        self.notes.push(ManufactureOrderNote {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.clone(),
            created_at: now,
            created_by_user: user.to_string(),
        });
        self.append_audit(
            ManufactureOrderAuditLog::new(&self.id, now, user, AuditAction::NoteAdded)
                .with_details(text),
        );
    }

    // ==========================================
    // 复制
    // ==========================================

    /// 从现有订单复制出新草稿
    ///
    /// - 任意状态的源订单均可复制
    /// - 实际数量重置为计划数量
    /// - 批号/有效期按当前日期重新生成（与源订单无关）
    pub fn duplicate(
        &self,
        new_order_number: String,
        lot_prefix: &str,
        now: NaiveDateTime,
        user: &str,
    ) -> ManufactureOrder {
        let today = now.date();
        let mut semi_product = self.semi_product.clone();
        semi_product.actual_quantity = Some(semi_product.planned_quantity);
        semi_product.lot_number =
            Some(default_lot_number(lot_prefix, today, &new_order_number));
        semi_product.expiration_date =
            Some(expiration_from(today, semi_product.expiration_months));

        let products = self
            .products
            .iter()
            .map(|p| {
                let mut product = p.clone();
                product.id = uuid::Uuid::new_v4().to_string();
                product.actual_quantity = Some(product.planned_quantity);
                product.lot_number =
                    Some(default_lot_number(lot_prefix, today, &new_order_number));
                product.expiration_date =
                    Some(expiration_from(today, product.expiration_months));
                product
            })
            .collect();

        let mut order = ManufactureOrder::create(
            new_order_number,
            semi_product,
            products,
            self.manufacture_type,
            self.responsible_person.clone(),
            None,
            self.original_batch_size
                .zip(self.new_batch_size)
                .zip(self.scale_factor)
                .map(|((original, new), factor)| (original, new, factor)),
            now,
            user,
        );
        order.append_audit(
            ManufactureOrderAuditLog::new(&order.id, now, user, AuditAction::OrderDuplicated)
                .with_details(format!("duplicated from {}", self.order_number)),
        );
        order
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 实际数量键必须指向已存在的成品行；未知行 ID 在改动聚合前拒绝
    fn require_known_product_lines(
        &self,
        actual_quantities: &HashMap<String, f64>,
    ) -> Result<(), OrderDomainError> {
        for line_id in actual_quantities.keys() {
            if !self.products.iter().any(|p| &p.id == line_id) {
                return Err(OrderDomainError::ProductLineNotFound(line_id.clone()));
            }
        }
        Ok(())
    }

    fn touch_state(&mut self, now: NaiveDateTime, user: &str) {
        self.state_changed_at = now;
        self.state_changed_by_user = user.to_string();
    }

    /// 审计日志只追加；聚合上没有任何移除/修改入口
    fn append_audit(&mut self, entry: ManufactureOrderAuditLog) {
        self.audit_log.push(entry);
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn test_order(manufacture_type: ManufactureType) -> ManufactureOrder {
        let semi_product = ManufactureOrderSemiProduct {
            product_code: "SP001".to_string(),
            product_name: "基础乳液".to_string(),
            planned_quantity: 1000.0,
            actual_quantity: None,
            lot_number: None,
            expiration_date: None,
            expiration_months: 24,
            batch_multiplier: 1.0,
        };
        let products = vec![
            ManufactureOrderProduct {
                id: "p1".to_string(),
                product_code: "S100".to_string(),
                product_name: "乳液 100g".to_string(),
                planned_quantity: 5.0,
                actual_quantity: None,
                lot_number: None,
                expiration_date: None,
                expiration_months: 12,
                batch_multiplier: 1.0,
            },
            ManufactureOrderProduct {
                id: "p2".to_string(),
                product_code: "S200".to_string(),
                product_name: "乳液 200g".to_string(),
                planned_quantity: 2.0,
                actual_quantity: None,
                lot_number: None,
                expiration_date: None,
                expiration_months: 12,
                batch_multiplier: 1.0,
            },
        ];
        ManufactureOrder::create(
            "MO-2025-00001".to_string(),
            semi_product,
            products,
            manufacture_type,
            Some("王工".to_string()),
            Some(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()),
            Some((1000.0, 800.0, 0.8)),
            test_now(),
            "tester",
        )
    }

    #[test]
    fn test_create_starts_in_draft_with_audit() {
        let order = test_order(ManufactureType::SinglePhase);
        assert_eq!(order.status.state, ManufactureOrderState::Draft);
        assert!(!order.status.manual_action_required);
        assert_eq!(order.audit_log.len(), 1);
        assert_eq!(order.audit_log[0].action, AuditAction::OrderCreated);
        assert!(order.audit_log[0]
            .details
            .as_deref()
            .unwrap()
            .contains("scale_factor=0.8"));
    }

    #[test]
    fn test_single_phase_happy_path() {
        let mut order = test_order(ManufactureType::SinglePhase);
        order
            .plan(
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
                test_now(),
                "tester",
            )
            .unwrap();
        assert_eq!(order.status.state, ManufactureOrderState::Planned);

        let mut actuals = HashMap::new();
        actuals.insert("p1".to_string(), 6.0);
        order
            .confirm_single_phase(&actuals, Some("production run ok"), "L", test_now(), "tester")
            .unwrap();

        assert_eq!(order.status.state, ManufactureOrderState::Completed);
        assert_eq!(order.products[0].actual_quantity, Some(6.0));
        // 未提供实际数量的行回落到计划数量
        assert_eq!(order.products[1].actual_quantity, Some(2.0));
        assert!(order.products[0].lot_number.is_some());
        assert!(order.products[0].expiration_date.is_some());
    }

    #[test]
    fn test_single_phase_confirm_outside_planned_fails_unchanged() {
        let mut order = test_order(ManufactureType::SinglePhase);
        let actuals = HashMap::new();
        // 仍在 DRAFT
        let err = order
            .confirm_single_phase(&actuals, None, "L", test_now(), "tester")
            .unwrap_err();
        assert!(matches!(err, OrderDomainError::InvalidStateTransition { .. }));
        assert_eq!(order.status.state, ManufactureOrderState::Draft);
        assert!(order.products.iter().all(|p| p.actual_quantity.is_none()));
        // 失败不追加审计
        assert_eq!(order.audit_log.len(), 1);
    }

    #[test]
    fn test_single_phase_confirm_on_multi_phase_order_fails() {
        let mut order = test_order(ManufactureType::MultiPhase);
        order
            .plan(
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
                test_now(),
                "tester",
            )
            .unwrap();
        let err = order
            .confirm_single_phase(&HashMap::new(), None, "L", test_now(), "tester")
            .unwrap_err();
        assert!(matches!(err, OrderDomainError::WrongManufactureType { .. }));
        assert_eq!(order.status.state, ManufactureOrderState::Planned);
    }

    #[test]
    fn test_single_phase_confirm_rejects_unknown_product_line() {
        let mut order = test_order(ManufactureType::SinglePhase);
        order
            .plan(
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
                test_now(),
                "tester",
            )
            .unwrap();
        let mut actuals = HashMap::new();
        actuals.insert("no-such-line".to_string(), 9.0);
        let err = order
            .confirm_single_phase(&actuals, None, "L", test_now(), "tester")
            .unwrap_err();
        assert!(matches!(
            err,
            OrderDomainError::ProductLineNotFound(ref id) if id == "no-such-line"
        ));
        // 拒绝发生在任何改动之前
        assert_eq!(order.status.state, ManufactureOrderState::Planned);
        assert!(order.products.iter().all(|p| p.actual_quantity.is_none()));
    }

    #[test]
    fn test_product_completion_rejects_unknown_product_line() {
        let mut order = test_order(ManufactureType::MultiPhase);
        order
            .plan(
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
                test_now(),
                "tester",
            )
            .unwrap();
        order
            .confirm_semi_product(980.0, None, "yield 98%", "L", test_now(), "tester")
            .unwrap();
        let mut actuals = HashMap::new();
        actuals.insert("stale-id".to_string(), 3.0);
        let err = order
            .confirm_product_completion(&actuals, "packaging done", "L", test_now(), "tester")
            .unwrap_err();
        assert!(matches!(err, OrderDomainError::ProductLineNotFound(_)));
        assert_eq!(
            order.status.state,
            ManufactureOrderState::SemiProductManufactured
        );
    }

    #[test]
    fn test_multi_phase_two_stage_path() {
        let mut order = test_order(ManufactureType::MultiPhase);
        order
            .plan(
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
                test_now(),
                "tester",
            )
            .unwrap();

        order
            .confirm_semi_product(980.0, None, "yield 98%", "L", test_now(), "tester")
            .unwrap();
        assert_eq!(
            order.status.state,
            ManufactureOrderState::SemiProductManufactured
        );
        assert_eq!(order.semi_product.actual_quantity, Some(980.0));

        order
            .confirm_product_completion(&HashMap::new(), "packaging done", "L", test_now(), "tester")
            .unwrap();
        assert_eq!(order.status.state, ManufactureOrderState::Completed);
    }

    #[test]
    fn test_multi_phase_cannot_skip_semi_product_stage() {
        let mut order = test_order(ManufactureType::MultiPhase);
        order
            .plan(
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
                test_now(),
                "tester",
            )
            .unwrap();
        let err = order
            .confirm_product_completion(&HashMap::new(), "skip", "L", test_now(), "tester")
            .unwrap_err();
        assert!(matches!(err, OrderDomainError::InvalidStateTransition { .. }));
        assert_eq!(order.status.state, ManufactureOrderState::Planned);
    }

    #[test]
    fn test_resolve_manual_action_keeps_state() {
        let mut order = test_order(ManufactureType::MultiPhase);
        order
            .plan(
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
                test_now(),
                "tester",
            )
            .unwrap();
        order.flag_manual_action("erp submission failed", test_now(), "tester");
        assert!(order.status.manual_action_required);

        let before = order.status.state;
        order.resolve_manual_action(
            Some("ERP-SP-42".to_string()),
            None,
            Some("resubmitted by hand".to_string()),
            test_now(),
            "tester",
        );
        assert!(!order.status.manual_action_required);
        assert_eq!(order.status.state, before);
        assert_eq!(
            order.erp_order_number_semiproduct.as_deref(),
            Some("ERP-SP-42")
        );
        assert_eq!(order.notes.len(), 1);
        let last = order.audit_log.last().unwrap();
        assert_eq!(last.action, AuditAction::ManualActionResolved);
        assert_eq!(last.old_value.as_deref(), Some("true"));
        assert_eq!(last.new_value.as_deref(), Some("false"));
    }

    #[test]
    fn test_duplicate_produces_fresh_draft() {
        let mut order = test_order(ManufactureType::SinglePhase);
        order
            .plan(
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
                test_now(),
                "tester",
            )
            .unwrap();
        order
            .confirm_single_phase(&HashMap::new(), None, "L", test_now(), "tester")
            .unwrap();
        let source_lot = order.products[0].lot_number.clone().unwrap();

        let later = NaiveDate::from_ymd_opt(2025, 7, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let copy = order.duplicate("MO-2025-00002".to_string(), "L", later, "tester");

        assert_eq!(copy.status.state, ManufactureOrderState::Draft);
        assert_ne!(copy.order_number, order.order_number);
        assert_ne!(copy.products[0].lot_number.as_deref(), Some(source_lot.as_str()));
        // 实际数量重置为计划数量
        assert_eq!(
            copy.products[0].actual_quantity,
            Some(copy.products[0].planned_quantity)
        );
        assert_eq!(copy.audit_log.len(), 2); // OrderCreated + OrderDuplicated
    }

    #[test]
    fn test_audit_log_grows_monotonically() {
        let mut order = test_order(ManufactureType::MultiPhase);
        let mut last_len = order.audit_log.len();
        let head_id = order.audit_log[0].id.clone();

        order
            .plan(
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
                test_now(),
                "tester",
            )
            .unwrap();
        assert!(order.audit_log.len() > last_len);
        last_len = order.audit_log.len();

        order.flag_manual_action("erp down", test_now(), "tester");
        assert!(order.audit_log.len() > last_len);
        last_len = order.audit_log.len();

        order.resolve_manual_action(None, None, None, test_now(), "tester");
        assert!(order.audit_log.len() > last_len);
        // 首条审计从未被改写
        assert_eq!(order.audit_log[0].id, head_id);
        assert_eq!(order.audit_log[0].action, AuditAction::OrderCreated);
    }

    #[test]
    fn test_expiration_normalized_to_end_of_month() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(
            expiration_from(today, 1),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_eq!(
            expiration_from(today, 12),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
        );
    }

    #[test]
    fn test_default_lot_number_uses_order_tail() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let lot = default_lot_number("L", today, "MO-2025-00042");
        assert_eq!(lot, "L250610-00042");
    }
}
