//! 单条记录处理流程 - 流程层
//!
//! 核心职责：定义"一个学号"的完整处理流程
//!
//! 流程顺序：
//! 1. 提交表单获取成绩页
//! 2. 请求间隔
//! 3. 判断页面是否包含成绩
//! 4. 内联图片 → 渲染 PDF

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{AssetSource, RecordSource};
use crate::models::{FetchRequest, RecordOutcome, RenderedDocument, SessionContext, SkipReason};
use crate::services::{AssetInliner, DocumentRenderer, PdfEngine, RecordClassifier};
use crate::utils::CancelToken;
use crate::workflow::record_ctx::RecordCtx;

/// 单条记录处理流程
///
/// - 不持有渲染引擎，由编排层按次传入
/// - 只依赖业务能力（services）和数据源接口
pub struct RecordFlow {
    source: Arc<dyn RecordSource>,
    classifier: Arc<dyn RecordClassifier>,
    inliner: AssetInliner,
    renderer: DocumentRenderer,
    request_delay: Duration,
    output_dir: PathBuf,
}

impl RecordFlow {
    /// 创建新的记录处理流程
    pub fn new(
        config: &Config,
        source: Arc<dyn RecordSource>,
        assets: Arc<dyn AssetSource>,
        classifier: Arc<dyn RecordClassifier>,
        output_dir: PathBuf,
    ) -> AppResult<Self> {
        Ok(Self {
            source,
            classifier,
            inliner: AssetInliner::new(
                assets,
                &config.asset_origin,
                config.asset_failure_policy,
            )?,
            renderer: DocumentRenderer::default(),
            request_delay: config.request_delay(),
            output_dir,
        })
    }

    /// 处理一个学号
    ///
    /// 返回 `Ok` 时只会是成功或跳过；查询、内联和渲染错误通过 `Err` 交给调用方记录
    pub async fn run(
        &self,
        engine: &dyn PdfEngine,
        session: &SessionContext,
        request: &FetchRequest,
        ctx: &RecordCtx,
        cancel: &CancelToken,
    ) -> AppResult<RecordOutcome> {
        // ========== 1. 查询 ==========
        let page = self.source.fetch_record(session, request).await?;
        debug!("{} 响应长度 {} 字节", ctx, page.markup.len());

        // ========== 2. 请求间隔 ==========
        if cancel.sleep(self.request_delay).await {
            debug!("{} 请求间隔被取消打断", ctx);
        }

        // ========== 3. 判断 ==========
        if !self.classifier.is_valid(&page.markup) {
            info!("{} 未找到成绩，跳过", ctx);
            return Ok(RecordOutcome::Skipped(SkipReason::NoData));
        }

        // ========== 4. 内联 + 渲染 ==========
        let markup = self.inliner.inline(&page.markup).await?;
        let document = RenderedDocument::in_dir(&self.output_dir, ctx.identifier);
        self.renderer.render(engine, &markup, &document.path).await?;

        info!("{} ✓ 已保存 {}", ctx, document.path.display());
        Ok(RecordOutcome::Success(document.path))
    }
}
