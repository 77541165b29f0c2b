//! 初始页面缓存
//!
//! 读取时按新鲜度策略判断是否可用，写入时原样保存

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::fs;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 缓存新鲜度策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreshnessPolicy {
    /// 最大有效期，None 表示永不过期
    pub max_age: Option<Duration>,
    /// 忽略已有缓存
    pub force_refresh: bool,
}

impl FreshnessPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_age: config.page_cache_max_age(),
            force_refresh: config.force_refresh_page,
        }
    }

    fn is_fresh(&self, modified: SystemTime) -> bool {
        if self.force_refresh {
            return false;
        }
        match self.max_age {
            None => true,
            Some(max_age) => {
                let age = SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or_default();
                age < max_age
            }
        }
    }
}

/// 页面缓存文件
#[derive(Debug, Clone)]
pub struct PageCache {
    path: PathBuf,
    policy: FreshnessPolicy,
}

impl PageCache {
    pub fn new(path: impl Into<PathBuf>, policy: FreshnessPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.work_dir.join(&config.page_cache_file),
            FreshnessPolicy::from_config(config),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取缓存；文件不存在或已过期时返回 None
    pub async fn load(&self) -> AppResult<Option<String>> {
        let metadata = match fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::file(&self.path, e)),
        };

        let modified = metadata
            .modified()
            .map_err(|e| AppError::file(&self.path, e))?;
        if !self.policy.is_fresh(modified) {
            debug!("缓存已过期或被强制刷新: {}", self.path.display());
            return Ok(None);
        }

        let markup = fs::read_to_string(&self.path)
            .await
            .map_err(|e| AppError::file(&self.path, e))?;
        Ok(Some(markup))
    }

    /// 原样写入页面内容
    pub async fn store(&self, markup: &str) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::file(parent, e))?;
            }
        }
        fs::write(&self.path, markup)
            .await
            .map_err(|e| AppError::file(&self.path, e))
    }
}
