use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 初始页面无法获取，会话令牌无法捕获（致命，整个运行中止）
    #[error("会话令牌捕获失败 ({url}): {source}")]
    TokenCapture {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 单个学号的表单提交失败（超时或传输错误）
    #[error("学号 {identifier} 查询失败: {source}")]
    Fetch {
        identifier: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 图片资源获取失败
    #[error("图片资源获取失败 ({url}): {source}")]
    AssetFetch {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 渲染引擎失败
    #[error("PDF 渲染失败 ({path}): {message}")]
    Render { path: PathBuf, message: String },

    /// 合并阶段某个 PDF 不可读或写出失败
    #[error("PDF 合并失败 ({path}): {source}")]
    Merge {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 浏览器启动/连接失败
    #[error("浏览器错误: {0}")]
    Browser(String),

    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 运行被取消
    #[error("运行已取消")]
    Cancelled,

    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

// ========== 从常见错误类型转换 ==========

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<lopdf::Error> for AppError {
    fn from(err: lopdf::Error) -> Self {
        AppError::Merge {
            path: PathBuf::new(),
            source: Box::new(err),
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建会话令牌捕获错误
    pub fn token_capture(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AppError::TokenCapture {
            url: url.into(),
            source: source.into(),
        }
    }

    /// 创建单条记录查询错误
    pub fn fetch(
        identifier: u64,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AppError::Fetch {
            identifier,
            source: source.into(),
        }
    }

    /// 创建图片资源获取错误
    pub fn asset_fetch(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AppError::AssetFetch {
            url: url.into(),
            source: source.into(),
        }
    }

    /// 创建渲染错误
    pub fn render(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AppError::Render {
            path: path.into(),
            message: message.into(),
        }
    }

    /// 创建合并错误
    pub fn merge(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AppError::Merge {
            path: path.into(),
            source: source.into(),
        }
    }

    /// 创建带路径的文件错误
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }

    /// 是否为超时导致的查询失败
    pub fn is_timeout(&self) -> bool {
        match self {
            AppError::Fetch { source, .. } | AppError::AssetFetch { source, .. } => source
                .downcast_ref::<reqwest::Error>()
                .map(|e| e.is_timeout())
                .unwrap_or(false),
            _ => false,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_names_identifier() {
        let err = AppError::fetch(200, "连接超时");
        assert!(err.to_string().contains("200"));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_io_error_converts_to_file_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::File { .. }));
    }
}
