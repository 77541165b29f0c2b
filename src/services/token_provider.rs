//! 会话令牌提供者 - 业务能力层
//!
//! 优先读取缓存的初始页面，没有（或已过期）时获取一次并原样写入缓存

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AppResult;
use crate::infrastructure::{PageCache, RecordSource};
use crate::models::SessionContext;

/// 会话令牌提供者
pub struct SessionTokenProvider {
    cache: PageCache,
    source: Arc<dyn RecordSource>,
}

impl SessionTokenProvider {
    pub fn new(cache: PageCache, source: Arc<dyn RecordSource>) -> Self {
        Self { cache, source }
    }

    /// 获取初始页面 HTML
    pub async fn initial_page(&self) -> AppResult<String> {
        if let Some(markup) = self.cache.load().await? {
            info!("📄 使用缓存的初始页面: {}", self.cache.path().display());
            return Ok(markup);
        }

        info!("🌐 正在获取初始页面...");
        let markup = self.source.fetch_initial_page().await?;
        self.cache.store(&markup).await?;
        info!("✓ 初始页面已缓存: {}", self.cache.path().display());
        Ok(markup)
    }

    /// 捕获会话令牌
    ///
    /// 缺失的字段以空字符串提交，只记录警告
    pub async fn provide(&self) -> AppResult<SessionContext> {
        let markup = self.initial_page().await?;
        let session = SessionContext::from_markup(&markup);

        if !session.is_complete() {
            warn!(
                "⚠️ 初始页面缺少隐藏字段 {:?}，将以空值提交",
                session.missing_fields()
            );
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::infrastructure::FreshnessPolicy;
    use crate::models::{FetchRequest, RawRecordPage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const PAGE: &str = r#"<form>
        <input name="__VIEWSTATE" value="vs-1" />
        <input name="__VIEWSTATEGENERATOR" value="gen-1" />
        <input name="__EVENTVALIDATION" value="ev-1" />
    </form>"#;

    /// 每次返回不同令牌的数据源，用来证明缓存优先
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RecordSource for CountingSource {
        async fn fetch_initial_page(&self) -> AppResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PAGE.replace("vs-1", &format!("fresh-{}", n)))
        }

        async fn fetch_record(
            &self,
            _session: &SessionContext,
            request: &FetchRequest,
        ) -> AppResult<RawRecordPage> {
            Err(AppError::fetch(request.identifier, "unused"))
        }
    }

    struct DownSource;

    #[async_trait]
    impl RecordSource for DownSource {
        async fn fetch_initial_page(&self) -> AppResult<String> {
            Err(AppError::token_capture("http://remote", "connection refused"))
        }

        async fn fetch_record(
            &self,
            _session: &SessionContext,
            request: &FetchRequest,
        ) -> AppResult<RawRecordPage> {
            Err(AppError::fetch(request.identifier, "unused"))
        }
    }

    fn provider(dir: &TempDir, source: Arc<dyn RecordSource>) -> SessionTokenProvider {
        let cache = PageCache::new(dir.path().join("src_page.html"), FreshnessPolicy::default());
        SessionTokenProvider::new(cache, source)
    }

    #[tokio::test]
    async fn test_cache_is_authoritative_over_fetch() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("src_page.html"), PAGE).unwrap();
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let provider = provider(&dir, source.clone());

        let first = provider.provide().await.unwrap();
        let second = provider.provide().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.view_state, "vs-1");
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_fetch_populates_cache() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let provider = provider(&dir, source.clone());

        let first = provider.provide().await.unwrap();
        let second = provider.provide().await.unwrap();

        assert_eq!(first.view_state, "fresh-0");
        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let cached = std::fs::read_to_string(dir.path().join("src_page.html")).unwrap();
        assert!(cached.contains("fresh-0"));
    }

    #[tokio::test]
    async fn test_unreachable_page_is_token_capture_error() {
        let dir = TempDir::new().unwrap();
        let provider = provider(&dir, Arc::new(DownSource));
        let err = provider.provide().await.unwrap_err();
        assert!(matches!(err, AppError::TokenCapture { .. }));
        assert!(!dir.path().join("src_page.html").exists());
    }
}
