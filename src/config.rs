use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// 图片内联失败时的处理策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetFailurePolicy {
    /// 任意一张图片失败，整条记录放弃
    #[default]
    FailRecord,
    /// 失败的图片保留原始引用，其余照常内联
    KeepOriginal,
}

impl AssetFailurePolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail_record" | "fail" => Some(Self::FailRecord),
            "keep_original" | "keep" => Some(Self::KeepOriginal),
            _ => None,
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 成绩查询页面（表单提交端点）
    pub form_url: String,
    /// 相对图片地址的解析基准
    pub asset_origin: String,
    /// 浏览器 User-Agent（远端会根据请求头改变行为）
    pub user_agent: String,
    /// Accept 请求头
    pub accept: String,
    /// 单次网络请求超时（秒）
    pub request_timeout_secs: u64,
    /// 每次查询后的固定等待（毫秒）
    pub request_delay_ms: u64,
    /// 初始页面缓存文件
    pub page_cache_file: PathBuf,
    /// 缓存最大有效期（秒），None 表示永不过期
    pub page_cache_max_age_secs: Option<u64>,
    /// 忽略缓存，强制重新获取初始页面
    pub force_refresh_page: bool,
    /// 判定有效成绩页的标记文本
    pub success_marker: String,
    /// 图片内联失败策略
    pub asset_failure_policy: AssetFailurePolicy,
    /// 输出目录与合并文件所在的工作目录
    pub work_dir: PathBuf,
    /// Chrome/Edge 可执行文件路径（为空则自动探测）
    pub chrome_executable: Option<PathBuf>,
    /// 连接已运行浏览器的调试端口（为空则启动无头浏览器）
    pub browser_debug_port: Option<u16>,
    /// 未设置 RUST_LOG 时使用 debug 级别日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            form_url: "https://exam.bujhansi.ac.in/frmViewCampusCurrentResult.aspx?cd=MwA3ADkA"
                .to_string(),
            asset_origin: "https://exam.bujhansi.ac.in/".to_string(),
            user_agent:
                "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0"
                    .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/png,image/svg+xml,*/*;q=0.8".to_string(),
            request_timeout_secs: 10,
            request_delay_ms: 1000,
            page_cache_file: PathBuf::from("src_page.html"),
            page_cache_max_age_secs: None,
            force_refresh_page: false,
            success_marker: "NAME OF FATHER".to_string(),
            asset_failure_policy: AssetFailurePolicy::FailRecord,
            work_dir: PathBuf::from("."),
            chrome_executable: None,
            browser_debug_port: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载配置，未设置的字段使用默认值
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，环境变量仍然优先
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::file(path, e))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            form_url: env_var("FORM_URL").unwrap_or(self.form_url),
            asset_origin: env_var("ASSET_ORIGIN").unwrap_or(self.asset_origin),
            user_agent: env_var("USER_AGENT").unwrap_or(self.user_agent),
            accept: env_var("ACCEPT_HEADER").unwrap_or(self.accept),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS")
                .unwrap_or(self.request_timeout_secs),
            request_delay_ms: env_parse("REQUEST_DELAY_MS").unwrap_or(self.request_delay_ms),
            page_cache_file: env_var("PAGE_CACHE_FILE")
                .map(PathBuf::from)
                .unwrap_or(self.page_cache_file),
            page_cache_max_age_secs: env_parse("PAGE_CACHE_MAX_AGE_SECS")
                .or(self.page_cache_max_age_secs),
            force_refresh_page: env_parse("FORCE_REFRESH_PAGE").unwrap_or(self.force_refresh_page),
            success_marker: env_var("SUCCESS_MARKER").unwrap_or(self.success_marker),
            asset_failure_policy: env_var("ASSET_FAILURE_POLICY")
                .and_then(|v| AssetFailurePolicy::parse(&v))
                .unwrap_or(self.asset_failure_policy),
            work_dir: env_var("WORK_DIR").map(PathBuf::from).unwrap_or(self.work_dir),
            chrome_executable: env_var("CHROME_EXECUTABLE")
                .map(PathBuf::from)
                .or(self.chrome_executable),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(self.browser_debug_port),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn page_cache_max_age(&self) -> Option<Duration> {
        self.page_cache_max_age_secs.map(Duration::from_secs)
    }

    /// 某门课程的单条 PDF 输出目录
    pub fn output_dir(&self, course_name: &str) -> PathBuf {
        self.work_dir.join(format!("{}_results", course_name))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.parse().ok())
}
