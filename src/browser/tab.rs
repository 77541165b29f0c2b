//! 打印标签页
//!
//! 持有一个 page 资源，只暴露"写入内容 / 注入样式 / 打印 PDF"的能力

use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;

use crate::error::AppResult;
use crate::services::document_renderer::PrintLayout;

/// 单条记录使用的标签页
///
/// - 每条记录一个新标签页，用完即关
/// - 不认识学号和课程
pub struct PrintTab {
    page: Page,
}

impl PrintTab {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 把完整 HTML 写入页面
    pub async fn set_content(&self, markup: &str) -> AppResult<()> {
        self.page.set_content(markup).await?;
        Ok(())
    }

    /// 追加一个 `<style>` 标签
    pub async fn add_style(&self, css: &str) -> AppResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const style = document.createElement('style');
                style.textContent = {};
                (document.head || document.documentElement).appendChild(style);
                return true;
            }})()
            "#,
            serde_json::to_string(css)?
        );
        self.page.evaluate(js_code).await?;
        Ok(())
    }

    /// 按打印布局输出 PDF 字节
    pub async fn print_pdf(&self, layout: &PrintLayout) -> AppResult<Vec<u8>> {
        let params = PrintToPdfParams {
            landscape: Some(layout.landscape),
            print_background: Some(true),
            paper_width: Some(layout.paper_width_in),
            paper_height: Some(layout.paper_height_in),
            margin_top: Some(layout.margin_in),
            margin_bottom: Some(layout.margin_in),
            margin_left: Some(layout.margin_in),
            margin_right: Some(layout.margin_in),
            ..Default::default()
        };
        Ok(self.page.pdf(params).await?)
    }

    /// 关闭标签页
    pub async fn close(self) -> AppResult<()> {
        self.page.close().await?;
        Ok(())
    }
}
