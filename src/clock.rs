// ==========================================
// 化妆品生产批次计划系统 - 时钟抽象
// ==========================================
// 职责: 统一时间来源，日期/批号/有效期计算全部经由注入时钟
// 红线: 业务代码禁止直接调用 Utc::now()
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, Utc};
use std::sync::Arc;

/// 时钟抽象
///
/// 所有日期、批号、有效期计算经由该接口获取"现在"，
/// 测试中用 FixedClock 注入固定时间点即可获得确定性结果。
pub trait Clock: Send + Sync {
    /// 当前时间（UTC, naive）
    fn now(&self) -> NaiveDateTime;

    /// 当前日期
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// 系统时钟（生产环境默认实现）
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// 固定时钟（测试用）
pub struct FixedClock {
    now: NaiveDateTime,
}

impl FixedClock {
    /// 创建固定在指定时间点的时钟
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// 以日期 00:00:00 创建固定时钟
    pub fn at_date(date: NaiveDate) -> Self {
        Self {
            now: date.and_hms_opt(0, 0, 0).unwrap_or_default(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }
}

/// 便捷构造：共享的系统时钟
pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_fixed_clock_returns_injected_time() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let clock = FixedClock::at_date(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.now().time(), chrono::NaiveTime::default());
    }
}
