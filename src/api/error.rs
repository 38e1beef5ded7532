// ==========================================
// 化妆品生产批次计划系统 - API层错误类型
// ==========================================
// 职责: 把仓储/引擎/领域层错误转成带错误码的类型化响应
// 红线: 预期失败不跨 API 边界抛异常，一律返回 ApiError
// ==========================================

use crate::domain::order::OrderDomainError;
use crate::engine::error::PlanningError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 业务规则错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("制造类型不匹配: expected={expected} actual={actual}")]
    WrongManufactureType { expected: String, actual: String },

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ===== 外部集成错误 =====
    #[error("ERP 集成失败: {0}")]
    IntegrationError(String),

    // ===== 数据访问错误 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定的错误代码（返回给前端）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            ApiError::WrongManufactureType { .. } => "WRONG_MANUFACTURE_TYPE",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::IntegrationError(_) => "INTEGRATION_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }
}

/// 错误响应（返回给前端的类型化对象）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        ErrorResponse {
            code: err.code().to_string(),
            message: err.to_string(),
            details: match err {
                ApiError::InvalidStateTransition { from, to } => {
                    Some(serde_json::json!({ "from": from, "to": to }))
                }
                ApiError::WrongManufactureType { expected, actual } => {
                    Some(serde_json::json!({ "expected": expected, "actual": actual }))
                }
                _ => None,
            },
        }
    }
}

// ==========================================
// 下层错误转换
// ==========================================

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationError(format!("字段 {} 值错误: {}", field, message))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::DatabaseError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
        }
    }
}

impl From<PlanningError> for ApiError {
    fn from(err: PlanningError) -> Self {
        match err {
            PlanningError::ManufactureTemplateNotFound(code) => {
                ApiError::NotFound(format!("制造模板不存在: {}", code))
            }
            PlanningError::MissingFixedQuantity(_)
            | PlanningError::InvalidBatchSize { .. }
            | PlanningError::FixedQuantityExceedsBudget { .. }
            | PlanningError::NoProductSizes(_) => ApiError::ValidationError(err.to_string()),
        }
    }
}

impl From<OrderDomainError> for ApiError {
    fn from(err: OrderDomainError) -> Self {
        match err {
            OrderDomainError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition {
                    from: from.to_db_str().to_string(),
                    to: to.to_db_str().to_string(),
                }
            }
            OrderDomainError::WrongManufactureType { expected, actual } => {
                ApiError::WrongManufactureType {
                    expected: expected.to_db_str().to_string(),
                    actual: actual.to_db_str().to_string(),
                }
            }
            OrderDomainError::ProductLineNotFound(id) => {
                ApiError::NotFound(format!("订单成品行不存在: {}", id))
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_carries_transition_details() {
        let err = ApiError::InvalidStateTransition {
            from: "DRAFT".to_string(),
            to: "COMPLETED".to_string(),
        };
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "INVALID_STATE_TRANSITION");
        assert_eq!(
            response.details,
            Some(serde_json::json!({ "from": "DRAFT", "to": "COMPLETED" }))
        );
        assert!(response.message.contains("DRAFT"));
    }

    #[test]
    fn test_error_response_carries_manufacture_type_details() {
        let err = ApiError::WrongManufactureType {
            expected: "SINGLE_PHASE".to_string(),
            actual: "MULTI_PHASE".to_string(),
        };
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "WRONG_MANUFACTURE_TYPE");
        assert_eq!(
            response.details,
            Some(serde_json::json!({ "expected": "SINGLE_PHASE", "actual": "MULTI_PHASE" }))
        );
    }

    #[test]
    fn test_error_response_without_details_serializes_code_and_message() {
        let err = ApiError::NotFound("订单不存在: x".to_string());
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "NOT_FOUND");
        assert!(response.details.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json["message"].as_str().unwrap().contains("订单不存在"));
    }
}
