//! 运行句柄
//!
//! `start_download` 立即返回句柄，调用方通过它查询进度、取消运行或等待最终报告

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult};
use crate::models::{RunProgress, RunReport};
use crate::utils::CancelToken;

/// 后台运行的句柄
pub struct RunHandle {
    progress: watch::Receiver<RunProgress>,
    cancel: CancelToken,
    task: JoinHandle<AppResult<RunReport>>,
}

impl RunHandle {
    pub(crate) fn new(
        progress: watch::Receiver<RunProgress>,
        cancel: CancelToken,
        task: JoinHandle<AppResult<RunReport>>,
    ) -> Self {
        Self {
            progress,
            cancel,
            task,
        }
    }

    /// 当前进度快照
    pub fn progress(&self) -> RunProgress {
        self.progress.borrow().clone()
    }

    /// 等待进度发生变化，运行结束后返回 `None`
    pub async fn changed(&mut self) -> Option<RunProgress> {
        self.progress.changed().await.ok()?;
        Some(self.progress.borrow_and_update().clone())
    }

    /// 请求取消：剩余学号不再处理，已生成的 PDF 仍会合并
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// 等待运行结束
    pub async fn wait(self) -> AppResult<RunReport> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(AppError::Cancelled),
            Err(e) => Err(AppError::Other(format!("运行任务异常退出: {}", e))),
        }
    }
}
