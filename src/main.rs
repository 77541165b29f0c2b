use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use result_archiver::{logger, Config, DownloadJob, Downloader};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = load_config()?;

    // 初始化日志（VERBOSE_LOGGING 打开 debug 级别）
    logger::init_for(&config);
    let downloader = Downloader::new(config)?;

    // 未指定课程时只列出可选项
    let Some(course_selector) = env_opt("COURSE_VALUE") else {
        print_catalogue(&downloader).await?;
        return Ok(());
    };

    let job = DownloadJob::new(
        env_required("ROLL_FROM")?,
        env_required("ROLL_TO")?,
        course_selector.clone(),
        env_opt("COURSE_NAME").unwrap_or(course_selector),
        env_opt("RESULT_TYPE").unwrap_or_default(),
    )?;

    let report = downloader.download(job).await?;
    if let Some(archive) = report.archive() {
        info!("📦 {}", archive.path.display());
    }

    Ok(())
}

/// `CONFIG_FILE` 指定的 TOML 文件（可选），环境变量优先
fn load_config() -> Result<Config> {
    match env_opt("CONFIG_FILE") {
        Some(path) => {
            let path = PathBuf::from(path);
            Config::from_file(&path)
                .with_context(|| format!("无法加载配置文件 {}", path.display()))
        }
        None => Ok(Config::from_env()),
    }
}

async fn print_catalogue(downloader: &Downloader) -> Result<()> {
    let catalogue = downloader.catalogue().await?;

    info!("课程 (COURSE_VALUE):");
    for course in &catalogue.courses {
        info!("  {:<8} {}", course.value, course.name);
    }
    info!("成绩类型 (RESULT_TYPE):");
    for result_type in &catalogue.result_types {
        info!("  {:<8} {}", format!("'{}'", result_type.value), result_type.name);
    }
    info!("设置 COURSE_VALUE / COURSE_NAME / ROLL_FROM / ROLL_TO 后重新运行以开始下载");
    Ok(())
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_required(name: &str) -> Result<u64> {
    let value = env::var(name).with_context(|| format!("缺少环境变量 {}", name))?;
    value
        .trim()
        .parse()
        .with_context(|| format!("{} 不是有效的学号: {}", name, value))
}
