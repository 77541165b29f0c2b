//! 日志初始化

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则默认 `info`；重复调用不会报错
pub fn init() {
    init_with_level("info");
}

/// 按配置初始化：`verbose_logging` 打开时默认 `debug`
pub fn init_for(config: &Config) {
    init_with_level(default_level(config.verbose_logging));
}

/// 未设置 `RUST_LOG` 时使用的级别
pub fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

pub fn init_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
