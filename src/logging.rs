// ==========================================
// 化妆品生产批次计划系统 - 日志初始化
// ==========================================
// 工具: tracing + tracing-subscriber
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志系统
///
/// 级别由 RUST_LOG 控制，缺省 info。
/// 例如: RUST_LOG=cosmetics_batch_aps=debug
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// 初始化测试日志
///
/// debug 级别 + 测试捕获输出；重复调用安全（try_init 吞掉二次初始化）。
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
