// ==========================================
// 化妆品生产批次计划系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 生产订单状态 (Manufacture Order State)
// ==========================================
// 单阶段: DRAFT → PLANNED → IN_PRODUCTION → COMPLETED
// 双阶段: DRAFT → PLANNED → SEMI_PRODUCT_MANUFACTURED → COMPLETED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManufactureOrderState {
    Draft,                    // 草稿
    Planned,                  // 已排产
    SemiProductManufactured,  // 半成品已完成（双阶段）
    InProduction,             // 生产中（单阶段过渡态）
    Completed,                // 已完成
}

impl fmt::Display for ManufactureOrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ManufactureOrderState {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(ManufactureOrderState::Draft),
            "PLANNED" => Some(ManufactureOrderState::Planned),
            "SEMI_PRODUCT_MANUFACTURED" => Some(ManufactureOrderState::SemiProductManufactured),
            "IN_PRODUCTION" => Some(ManufactureOrderState::InProduction),
            "COMPLETED" => Some(ManufactureOrderState::Completed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ManufactureOrderState::Draft => "DRAFT",
            ManufactureOrderState::Planned => "PLANNED",
            ManufactureOrderState::SemiProductManufactured => "SEMI_PRODUCT_MANUFACTURED",
            ManufactureOrderState::InProduction => "IN_PRODUCTION",
            ManufactureOrderState::Completed => "COMPLETED",
        }
    }
}

// ==========================================
// 制造类型 (Manufacture Type)
// ==========================================
// 单阶段: 半成品与成品一次性确认
// 双阶段: 半成品与成品分别确认
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManufactureType {
    SinglePhase, // 单阶段
    MultiPhase,  // 双阶段
}

impl fmt::Display for ManufactureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ManufactureType {
    /// 从字符串解析制造类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SINGLE_PHASE" => Some(ManufactureType::SinglePhase),
            "MULTI_PHASE" => Some(ManufactureType::MultiPhase),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ManufactureType::SinglePhase => "SINGLE_PHASE",
            ManufactureType::MultiPhase => "MULTI_PHASE",
        }
    }
}

// ==========================================
// 批次控制模式 (Batch Control Mode)
// ==========================================
// 三种互斥模式，决定本次计划可用的总生产体积（重量）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchControlMode {
    MmqMultiplier,      // MMQ 倍数
    TotalWeight,        // 直接指定总重量
    TargetDaysCoverage, // 目标库存覆盖天数
}

impl fmt::Display for BatchControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl BatchControlMode {
    /// 从字符串解析控制模式
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MMQ_MULTIPLIER" => Some(BatchControlMode::MmqMultiplier),
            "TOTAL_WEIGHT" => Some(BatchControlMode::TotalWeight),
            "TARGET_DAYS_COVERAGE" => Some(BatchControlMode::TargetDaysCoverage),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BatchControlMode::MmqMultiplier => "MMQ_MULTIPLIER",
            BatchControlMode::TotalWeight => "TOTAL_WEIGHT",
            BatchControlMode::TargetDaysCoverage => "TARGET_DAYS_COVERAGE",
        }
    }
}

// ==========================================
// ERP 单据类型 (ERP Document Type)
// ==========================================
// 订单上的 ERP 关联字段按单据类型区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErpDocumentType {
    SemiProductOrder, // 半成品生产单
    ProductOrder,     // 成品生产单
}

impl fmt::Display for ErpDocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErpDocumentType::SemiProductOrder => write!(f, "SEMI_PRODUCT_ORDER"),
            ErpDocumentType::ProductOrder => write!(f, "PRODUCT_ORDER"),
        }
    }
}

// ==========================================
// 审计动作 (Audit Action)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    OrderCreated,          // 订单创建
    OrderPlanned,          // 进入排产
    SinglePhaseConfirmed,  // 单阶段生产确认
    SemiProductConfirmed,  // 半成品阶段确认
    ProductCompleted,      // 成品阶段确认
    ManualActionFlagged,   // 标记需人工处理
    ManualActionResolved,  // 人工处理完成
    NoteAdded,             // 添加备注
    OrderDuplicated,       // 订单复制
    ErpOrderLinked,        // 关联 ERP 单号
}

impl AuditAction {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::OrderCreated => "OrderCreated",
            AuditAction::OrderPlanned => "OrderPlanned",
            AuditAction::SinglePhaseConfirmed => "SinglePhaseConfirmed",
            AuditAction::SemiProductConfirmed => "SemiProductConfirmed",
            AuditAction::ProductCompleted => "ProductCompleted",
            AuditAction::ManualActionFlagged => "ManualActionFlagged",
            AuditAction::ManualActionResolved => "ManualActionResolved",
            AuditAction::NoteAdded => "NoteAdded",
            AuditAction::OrderDuplicated => "OrderDuplicated",
            AuditAction::ErpOrderLinked => "ErpOrderLinked",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "OrderCreated" => Some(AuditAction::OrderCreated),
            "OrderPlanned" => Some(AuditAction::OrderPlanned),
            "SinglePhaseConfirmed" => Some(AuditAction::SinglePhaseConfirmed),
            "SemiProductConfirmed" => Some(AuditAction::SemiProductConfirmed),
            "ProductCompleted" => Some(AuditAction::ProductCompleted),
            "ManualActionFlagged" => Some(AuditAction::ManualActionFlagged),
            "ManualActionResolved" => Some(AuditAction::ManualActionResolved),
            "NoteAdded" => Some(AuditAction::NoteAdded),
            "OrderDuplicated" => Some(AuditAction::OrderDuplicated),
            "ErpOrderLinked" => Some(AuditAction::ErpOrderLinked),
            _ => None,
        }
    }
}
