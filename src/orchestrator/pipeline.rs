//! 学号区间处理器 - 编排层
//!
//! ## 职责
//!
//! 按升序逐个处理区间内的学号，收集每个学号的结果，循环结束后合并一次。
//!
//! ## 核心功能
//!
//! 1. **顺序处理**：一个学号完成（或失败）后才开始下一个
//! 2. **错误隔离**：单个学号的任何错误只记录，不中止运行
//! 3. **取消检查**：每个学号开始前检查取消令牌
//! 4. **进度广播**：通过 watch 通道发布进度快照
//! 5. **合并**：无论成功多少个，循环结束后调用一次 ArchiveAssembler

use std::path::{Path, PathBuf};

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    AssemblyOutcome, DownloadJob, RecordOutcome, RunPhase, RunProgress, RunReport,
    SessionContext,
};
use crate::services::{ArchiveAssembler, PdfEngine};
use crate::utils::CancelToken;
use crate::workflow::{RecordCtx, RecordFlow};

/// 学号区间处理器
pub struct Pipeline {
    flow: RecordFlow,
    assembler: ArchiveAssembler,
    output_dir: PathBuf,
}

impl Pipeline {
    /// # 参数
    /// - `flow`: 单条记录处理流程（输出目录需与 `output_dir` 一致）
    /// - `assembler`: 合并服务
    /// - `output_dir`: 本次运行的单条 PDF 目录
    pub fn new(flow: RecordFlow, assembler: ArchiveAssembler, output_dir: PathBuf) -> Self {
        Self {
            flow,
            assembler,
            output_dir,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 处理整个区间并合并
    ///
    /// 只有输出目录无法创建时返回 `Err`；其余错误都记录在报告里
    pub async fn run(
        &self,
        engine: &dyn PdfEngine,
        session: &SessionContext,
        job: &DownloadJob,
        cancel: &CancelToken,
        progress: &watch::Sender<RunProgress>,
    ) -> AppResult<RunReport> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::file(&self.output_dir, e))?;

        let total = job.total();
        progress.send_modify(|p| {
            p.phase = RunPhase::Processing;
            p.total = total;
        });

        let mut outcomes = Vec::new();
        let mut cancelled = false;

        // ========== 逐个学号处理 ==========
        for (index, identifier) in job.identifiers().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    "⏹️ 运行已取消，剩余 {} 个学号不再处理",
                    total.saturating_sub(index)
                );
                cancelled = true;
                break;
            }

            let ctx = RecordCtx::new(identifier, index + 1, total);
            progress.send_modify(|p| p.current = Some(identifier));

            let outcome = match self
                .flow
                .run(engine, session, &job.request(identifier), &ctx, cancel)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    if e.is_timeout() {
                        error!("{} ⏱️ 请求超时: {}", ctx, e);
                    } else {
                        error!("{} ❌ 处理失败: {}", ctx, e);
                    }
                    RecordOutcome::Failed(e)
                }
            };

            progress.send_modify(|p| p.record(&outcome));
            outcomes.push((identifier, outcome));
        }

        // ========== 合并 ==========
        progress.send_modify(|p| {
            p.phase = RunPhase::Assembling;
            p.current = None;
        });

        let assembler = self.assembler.clone();
        let output_dir = self.output_dir.clone();
        let course_name = job.course_name.clone();
        let merged = tokio::task::spawn_blocking(move || assembler.assemble(&output_dir, &course_name))
            .await
            .unwrap_or_else(|e| Err(AppError::Other(format!("合并任务异常退出: {}", e))));

        let assembly = match merged {
            Ok(Some(archive)) => AssemblyOutcome::Merged(archive),
            Ok(None) => AssemblyOutcome::Empty,
            Err(e) => {
                error!("❌ 合并失败，单条 PDF 保留在 {}: {}", self.output_dir.display(), e);
                AssemblyOutcome::Failed(e)
            }
        };

        progress.send_modify(|p| p.phase = RunPhase::Finished);
        info!("🏁 {} 区间处理结束", job.course_name);

        Ok(RunReport {
            course_name: job.course_name.clone(),
            outcomes,
            assembly,
            cancelled,
        })
    }

    /// 运行并在结束后关闭渲染引擎（无论结果如何，只关闭一次）
    pub async fn run_scoped(
        &self,
        engine: &dyn PdfEngine,
        session: &SessionContext,
        job: &DownloadJob,
        cancel: &CancelToken,
        progress: &watch::Sender<RunProgress>,
    ) -> AppResult<RunReport> {
        let result = self.run(engine, session, job, cancel, progress).await;
        if let Err(e) = engine.close().await {
            warn!("⚠️ 关闭渲染引擎失败: {}", e);
        }
        result
    }
}
