// ==========================================
// 化妆品生产批次计划系统 - ERP 集成层
// ==========================================
// 职责: 定义对外协作方接口（只有接口，实现属于外部系统）
// 红线: 本核心不做重试/退避；ERP 失败由调用方转成 manual_action_required
// ==========================================

use crate::domain::types::ErpDocumentType;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// 错误类型
// ==========================================

/// ERP 集成错误
#[derive(Error, Debug)]
pub enum ErpError {
    #[error("ERP 不可用: {0}")]
    Unavailable(String),

    #[error("ERP 拒绝提交: {0}")]
    Rejected(String),
}

// ==========================================
// 请求/响应
// ==========================================

/// 生产单提交请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitManufactureRequest {
    pub order_number: String,
    pub document_type: ErpDocumentType,
    pub product_code: String,
    pub product_name: String,
    pub quantity: f64,
    pub lot_number: Option<String>,
    pub planned_date: Option<NaiveDate>,
}

/// 生产单提交结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitManufactureResponse {
    pub erp_order_number: String,
    pub order_date: NaiveDate,
}

/// 残余半成品报废请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscardResidualRequest {
    pub semiproduct_code: String,
    pub lot_number: Option<String>,
    pub quantity_to_discard: f64,
}

/// 残余半成品报废结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscardResidualResponse {
    pub success: bool,
    pub quantity_found: f64,
    pub quantity_discarded: f64,
    pub requires_manual_approval: bool,
    pub stock_movement_reference: Option<String>,
}

// ==========================================
// ManufactureClient - ERP 客户端接口
// ==========================================
#[async_trait]
pub trait ManufactureClient: Send + Sync {
    /// 向 ERP 提交生产单，返回 ERP 侧单号
    async fn submit_manufacture(
        &self,
        request: &SubmitManufactureRequest,
    ) -> Result<SubmitManufactureResponse, ErpError>;

    /// 报废残余半成品
    async fn discard_residual_semiproduct(
        &self,
        request: &DiscardResidualRequest,
    ) -> Result<DiscardResidualResponse, ErpError>;
}

// ==========================================
// NoopManufactureClient - 空实现
// ==========================================
// 本地开发/未接 ERP 环境的默认实现: 提交即成功，报废按申请量全额成功。
pub struct NoopManufactureClient;

#[async_trait]
impl ManufactureClient for NoopManufactureClient {
    async fn submit_manufacture(
        &self,
        request: &SubmitManufactureRequest,
    ) -> Result<SubmitManufactureResponse, ErpError> {
        Ok(SubmitManufactureResponse {
            erp_order_number: format!("NOOP-{}", request.order_number),
            order_date: request
                .planned_date
                .unwrap_or_else(|| chrono::Utc::now().date_naive()),
        })
    }

    async fn discard_residual_semiproduct(
        &self,
        request: &DiscardResidualRequest,
    ) -> Result<DiscardResidualResponse, ErpError> {
        Ok(DiscardResidualResponse {
            success: true,
            quantity_found: request.quantity_to_discard,
            quantity_discarded: request.quantity_to_discard,
            requires_manual_approval: false,
            stock_movement_reference: None,
        })
    }
}
