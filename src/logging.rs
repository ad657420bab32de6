// ==========================================
// 制造ERP工单树 - 日志初始化
// ==========================================
// 命令行输出约定:
//   stdout: 工单树 / 层级结果的 JSON（可直接重定向或管道处理）
//   stderr: tracing 日志（组装过程、丢弃节点告警、配置回退）
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化命令行日志（写入 stderr）
///
/// RUST_LOG 控制级别,未设置时为 info。
/// 查看组装细节: `RUST_LOG=erp_work_order_tree=debug`
///
/// ```no_run
/// use erp_work_order_tree::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 测试日志: debug 级别,经 libtest 捕获,可重复调用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
