//! 文档渲染服务 - 业务能力层
//!
//! 把内联后的 HTML 交给渲染引擎打印成 PDF，并写入输出目录

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 打印样式：A4 横向、20px 页边距、表格边框、图片限宽
pub const PRINT_STYLESHEET: &str = r#"
@page {
    size: A4 landscape;
    margin: 20px;
}
body {
    word-wrap: break-word;
    overflow-wrap: break-word;
    font-size: 12px;
}
img {
    max-width: 100%;
    display: block;
    margin: 10px auto;
}
table {
    width: 100%;
    border-collapse: collapse;
}
td, th {
    padding: 5px;
    border: 1px solid #ddd;
}
"#;

/// 打印驱动层面的页面布局（单位：英寸）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintLayout {
    pub paper_width_in: f64,
    pub paper_height_in: f64,
    pub landscape: bool,
    pub margin_in: f64,
}

impl PrintLayout {
    /// CSS 像素到英寸（96 px = 1 in）
    pub fn px_to_in(px: f64) -> f64 {
        px / 96.0
    }

    /// A4 横向，四边 20px
    pub fn a4_landscape() -> Self {
        Self {
            paper_width_in: 8.27,
            paper_height_in: 11.69,
            landscape: true,
            margin_in: Self::px_to_in(20.0),
        }
    }
}

impl Default for PrintLayout {
    fn default() -> Self {
        Self::a4_landscape()
    }
}

/// PDF 渲染引擎
///
/// 一次运行只创建一个实例，由编排层持有；`close` 在运行结束时调用且只调用一次
#[async_trait]
pub trait PdfEngine: Send + Sync {
    /// 在新的页面上下文中载入 HTML、注入样式并打印
    async fn render_pdf(
        &self,
        markup: &str,
        stylesheet: &str,
        layout: &PrintLayout,
    ) -> AppResult<Vec<u8>>;

    /// 释放引擎资源
    async fn close(&self) -> AppResult<()>;
}

/// 渲染引擎的获取方式
///
/// 编排层在运行开始时获取一次引擎，运行结束后调用 `close`
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn launch(&self, config: &Config) -> AppResult<Arc<dyn PdfEngine>>;
}

/// 文档渲染服务
pub struct DocumentRenderer {
    stylesheet: String,
    layout: PrintLayout,
}

impl DocumentRenderer {
    pub fn new(stylesheet: impl Into<String>, layout: PrintLayout) -> Self {
        Self {
            stylesheet: stylesheet.into(),
            layout,
        }
    }

    /// 渲染并写入 `output_path`
    ///
    /// 引擎错误统一包装为渲染错误，携带目标路径
    pub async fn render(
        &self,
        engine: &dyn PdfEngine,
        markup: &str,
        output_path: &Path,
    ) -> AppResult<()> {
        let bytes = engine
            .render_pdf(markup, &self.stylesheet, &self.layout)
            .await
            .map_err(|e| match e {
                AppError::Render { .. } => e,
                other => AppError::render(output_path, other.to_string()),
            })?;

        if bytes.is_empty() {
            return Err(AppError::render(output_path, "渲染引擎返回空文档"));
        }

        fs::write(output_path, &bytes)
            .await
            .map_err(|e| AppError::file(output_path, e))?;

        debug!("已写入 {} ({} 字节)", output_path.display(), bytes.len());
        Ok(())
    }
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new(PRINT_STYLESHEET, PrintLayout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// 记录收到的样式和布局
    #[derive(Default)]
    struct RecordingEngine {
        seen: Mutex<Vec<(String, PrintLayout)>>,
        fail: bool,
    }

    #[async_trait]
    impl PdfEngine for RecordingEngine {
        async fn render_pdf(
            &self,
            markup: &str,
            stylesheet: &str,
            layout: &PrintLayout,
        ) -> AppResult<Vec<u8>> {
            if self.fail {
                return Err(AppError::Browser("tab crashed".to_string()));
            }
            self.seen
                .lock()
                .unwrap()
                .push((stylesheet.to_string(), *layout));
            Ok(format!("%PDF-1.4 {}", markup).into_bytes())
        }

        async fn close(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_layout_is_a4_landscape_with_20px_margin() {
        let layout = PrintLayout::default();
        assert!(layout.landscape);
        assert!((layout.margin_in - 0.2083).abs() < 0.001);
        assert!(PRINT_STYLESHEET.contains("size: A4 landscape"));
        assert!(PRINT_STYLESHEET.contains("margin: 20px"));
        assert!(PRINT_STYLESHEET.contains("max-width: 100%"));
    }

    #[tokio::test]
    async fn test_render_writes_engine_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result_100.pdf");
        let engine = RecordingEngine::default();

        DocumentRenderer::default()
            .render(&engine, "<p>ok</p>", &path)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 <p>ok</p>");
        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, PRINT_STYLESHEET);
    }

    #[tokio::test]
    async fn test_engine_failure_is_render_error_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result_101.pdf");
        let engine = RecordingEngine {
            fail: true,
            ..Default::default()
        };

        let err = DocumentRenderer::default()
            .render(&engine, "<p>x</p>", &path)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Render { .. }));
        assert!(!path.exists());
    }
}
