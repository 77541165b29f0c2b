//! Chrome 渲染引擎
//!
//! 整个运行期间只启动一次浏览器，由编排层持有并在结束时关闭

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::Browser;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser::{connect_to_browser, launch_headless_browser, PrintTab};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::document_renderer::{EngineLauncher, PdfEngine, PrintLayout};

/// 基于 chromiumoxide 的 PDF 引擎
pub struct ChromeEngine {
    browser: Mutex<Option<Browser>>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
    /// 由本程序启动的浏览器才需要关闭进程
    owned: bool,
}

impl ChromeEngine {
    /// 启动（或连接）浏览器
    pub async fn launch(config: &Config) -> AppResult<Self> {
        let (browser, handler_task, owned) = match config.browser_debug_port {
            Some(port) => {
                let (browser, task) = connect_to_browser(port).await?;
                (browser, task, false)
            }
            None => {
                let (browser, task) = launch_headless_browser(config).await?;
                (browser, task, true)
            }
        };

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler_task: Mutex::new(Some(handler_task)),
            owned,
        })
    }

    async fn open_tab(&self) -> AppResult<PrintTab> {
        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| AppError::Browser("渲染引擎已关闭".to_string()))?;
        let page = browser.new_page("about:blank").await?;
        Ok(PrintTab::new(page))
    }
}

#[async_trait]
impl PdfEngine for ChromeEngine {
    async fn render_pdf(
        &self,
        markup: &str,
        stylesheet: &str,
        layout: &PrintLayout,
    ) -> AppResult<Vec<u8>> {
        let tab = self.open_tab().await?;

        let result = async {
            tab.set_content(markup).await?;
            tab.add_style(stylesheet).await?;
            tab.print_pdf(layout).await
        }
        .await;

        if let Err(e) = tab.close().await {
            warn!("关闭标签页失败: {}", e);
        }

        result
    }

    async fn close(&self) -> AppResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            debug!("渲染引擎已关闭，忽略重复关闭");
            return Ok(());
        };

        if self.owned {
            browser.close().await?;
            if let Err(e) = browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
            info!("✓ 无头浏览器已关闭");
        }
        drop(browser);

        if let Some(task) = self.handler_task.lock().await.take() {
            task.abort();
        }
        Ok(())
    }
}

/// 每次运行启动一个新的 [`ChromeEngine`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeLauncher;

#[async_trait]
impl EngineLauncher for ChromeLauncher {
    async fn launch(&self, config: &Config) -> AppResult<Arc<dyn PdfEngine>> {
        let engine: Arc<dyn PdfEngine> = Arc::new(ChromeEngine::launch(config).await?);
        Ok(engine)
    }
}
