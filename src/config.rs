// ==========================================
// 化妆品生产批次计划系统 - 配置层
// ==========================================
// 职责: 批次计划与订单生命周期的可调参数
// 说明: 参数不多，采用结构体 + 默认值，序列化后可随配置文件分发
// ==========================================

use serde::{Deserialize, Serialize};

/// 系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// 销售速率估算默认回看窗口（天），请求未给日期范围时使用
    pub default_sales_window_days: i64,

    /// 成品默认有效期（月），主数据缺失时的兜底值
    pub default_expiration_months: u32,

    /// 订单号前缀
    pub order_number_prefix: String,

    /// 批号前缀
    pub lot_number_prefix: String,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            default_sales_window_days: 90,
            default_expiration_months: 12,
            order_number_prefix: "MO".to_string(),
            lot_number_prefix: "L".to_string(),
        }
    }
}

impl PlanningConfig {
    /// 从 JSON 字符串加载配置，解析失败时返回错误
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlanningConfig::default();
        assert_eq!(config.default_sales_window_days, 90);
        assert_eq!(config.order_number_prefix, "MO");
    }

    #[test]
    fn test_from_json_overrides_defaults() {
        let json = r#"{
            "default_sales_window_days": 30,
            "default_expiration_months": 24,
            "order_number_prefix": "VP",
            "lot_number_prefix": "B"
        }"#;
        let config = PlanningConfig::from_json(json).unwrap();
        assert_eq!(config.default_sales_window_days, 30);
        assert_eq!(config.default_expiration_months, 24);
    }
}
