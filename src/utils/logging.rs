//! 日志工具模块
//!
//! 提供运行开始、结束时的横幅和统计输出

use tracing::{info, warn};

use crate::config::Config;
use crate::models::{AssemblyOutcome, DownloadJob, RecordOutcome, RunReport};

/// 记录运行启动信息
///
/// # 参数
/// - `job`: 下载任务
/// - `config`: 配置
pub fn log_run_start(job: &DownloadJob, config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 成绩下载开始 - {}", job.course_name);
    info!(
        "开始时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!(
        "📄 学号区间: {}-{} (共 {} 个)",
        job.from,
        job.to,
        job.total()
    );
    info!(
        "📊 课程值: {} / 成绩类型值: '{}'",
        job.course_selector, job.result_type_selector
    );
    info!("⏱️ 请求间隔: {:?}", config.request_delay());
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `report`: 运行报告
pub fn print_final_stats(report: &RunReport) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计 - {}", report.course_name);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.succeeded(), report.outcomes.len());
    info!("⏭️ 跳过: {}", report.skipped());
    info!("❌ 失败: {}", report.failed());

    for (identifier, outcome) in &report.outcomes {
        if let RecordOutcome::Failed(e) = outcome {
            warn!("  [学号 {}] {}", identifier, truncate_text(&e.to_string(), 120));
        }
    }

    if report.cancelled {
        warn!("⏹️ 运行被取消，区间未处理完");
    }

    match &report.assembly {
        AssemblyOutcome::Merged(archive) => info!(
            "📚 合并文件: {} ({} 个学号, {} 页)",
            archive.path.display(),
            archive.members.len(),
            archive.page_count
        ),
        AssemblyOutcome::Empty => info!("📭 没有可合并的 PDF"),
        AssemblyOutcome::Failed(e) => warn!("⚠️ 合并失败: {}", e),
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
