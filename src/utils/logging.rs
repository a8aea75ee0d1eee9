/// 日志工具模块
///
/// 提供日志初始化以及运行横幅、最终统计、失败清单的输出
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::services::{LoginMode, RunSummary};

/// 初始化日志
///
/// 设置了 `RUST_LOG` 时以其为准，否则默认 info，`verbose` 时为 debug
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,checkio_scrape={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, mode: &LoginMode) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("🌐 站点: {}", config.site_root());
    info!("🔑 登录方式: {}", mode.label());
    info!("📁 保存目录: {}", config.dest_dir.display());
    info!(
        "⏱️ 单题超时: {}s, 最多尝试 {} 次",
        config.fetch_timeout_secs, config.fetch_attempts
    );
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary) {
    info!("\n{}", "=".repeat(60));
    info!("📊 下载完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🆕 新增: {}", summary.created());
    info!("🔄 更新: {}", summary.updated());
    info!("= 未变化: {}", summary.unchanged());
    info!("❌ 失败: {}", summary.failed());
    info!("{}", "=".repeat(60));
}

/// 打印失败清单
///
/// 没有失败时明确输出成功
pub fn print_failure_report(summary: &RunSummary) {
    if summary.is_clean() {
        info!("✅ 所有题目均已成功保存");
        return;
    }

    warn!("以下题目未能保存:");
    for (key, reason) in summary.summarize() {
        warn!("  {} - {}", key, reason);
    }
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
