//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info 级别
pub fn init(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 考试组卷");
    info!("🌐 后端地址: {}", config.backend_base_url);
    info!("📄 组卷计划: {}", config.plan_file);
    info!(
        "⏱️ AI 轮询: 每 {} ms，最多 {} 次",
        config.poll_interval_ms, config.max_poll_attempts
    );
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `imported`: 成功导入的来源数
/// - `skipped`: 失败跳过的来源数
/// - `questions`: 提交时的完整题目数
/// - `exam_id`: 保存后的考试 ID（提交失败时为 None）
pub fn print_final_stats(imported: usize, skipped: usize, questions: usize, exam_id: Option<&str>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 组卷完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 导入来源: {}", imported);
    info!("❌ 跳过来源: {}", skipped);
    info!("📝 完整题目: {}", questions);
    match exam_id {
        Some(id) => info!("💾 考试已保存: {}", id),
        None => info!("💾 考试未保存"),
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
