//! 成绩下载器 - 编排层
//!
//! ## 职责
//!
//! 本模块是库的入口，负责组装各层组件并管理一次运行的生命周期。
//!
//! ## 核心功能
//!
//! 1. **选项目录**：从初始页面解析课程和成绩类型
//! 2. **启动运行**：在 tokio 上后台执行，立即返回 [`RunHandle`]
//! 3. **资源管理**：运行开始时获取渲染引擎，结束时关闭一次
//! 4. **全局统计**：运行结束后输出统计信息

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use crate::browser::ChromeLauncher;
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{AssetSource, FormClient, PageCache, RecordSource};
use crate::models::{Catalogue, DownloadJob, RunPhase, RunProgress, RunReport};
use crate::orchestrator::pipeline::Pipeline;
use crate::orchestrator::run_handle::RunHandle;
use crate::services::{
    ArchiveAssembler, EngineLauncher, MarkerClassifier, RecordClassifier, SessionTokenProvider,
};
use crate::utils::logging::{log_run_start, print_final_stats};
use crate::utils::CancelToken;
use crate::workflow::RecordFlow;

/// 成绩下载器
#[derive(Clone)]
pub struct Downloader {
    config: Config,
    source: Arc<dyn RecordSource>,
    assets: Arc<dyn AssetSource>,
    classifier: Arc<dyn RecordClassifier>,
    launcher: Arc<dyn EngineLauncher>,
}

impl Downloader {
    /// 使用真实的表单客户端和无头 Chrome
    pub fn new(config: Config) -> AppResult<Self> {
        let client = Arc::new(FormClient::new(&config)?);
        Ok(Self::with_parts(
            config,
            client.clone(),
            client,
            Arc::new(ChromeLauncher),
        ))
    }

    /// 自定义数据源和渲染引擎，记录判断使用配置中的标记文本
    pub fn with_parts(
        config: Config,
        source: Arc<dyn RecordSource>,
        assets: Arc<dyn AssetSource>,
        launcher: Arc<dyn EngineLauncher>,
    ) -> Self {
        let classifier = Arc::new(MarkerClassifier::new(config.success_marker.clone()));
        Self {
            config,
            source,
            assets,
            classifier,
            launcher,
        }
    }

    /// 替换记录判断规则
    pub fn with_classifier(mut self, classifier: Arc<dyn RecordClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn token_provider(&self) -> SessionTokenProvider {
        SessionTokenProvider::new(PageCache::from_config(&self.config), self.source.clone())
    }

    /// 课程和成绩类型选项
    ///
    /// 与下载共用同一个初始页面缓存
    pub async fn catalogue(&self) -> AppResult<Catalogue> {
        let markup = self.token_provider().initial_page().await?;
        let catalogue = Catalogue::from_markup(&markup);
        info!(
            "📋 课程 {} 个，成绩类型 {} 个",
            catalogue.courses.len(),
            catalogue.result_types.len()
        );
        Ok(catalogue)
    }

    /// 在后台启动一次下载，立即返回
    pub fn start_download(&self, job: DownloadJob) -> RunHandle {
        let (progress_tx, progress_rx) = watch::channel(RunProgress {
            total: job.total(),
            ..Default::default()
        });
        let cancel = CancelToken::new();

        let downloader = self.clone();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let result = downloader.execute(&job, &task_cancel, &progress_tx).await;
            if let Err(e) = &result {
                error!("❌ {} 运行中止: {}", job.course_name, e);
            }
            progress_tx.send_modify(|p| p.phase = RunPhase::Finished);
            result
        });

        RunHandle::new(progress_rx, cancel, task)
    }

    /// 前台执行一次下载
    pub async fn download(&self, job: DownloadJob) -> AppResult<RunReport> {
        self.start_download(job).wait().await
    }

    async fn execute(
        &self,
        job: &DownloadJob,
        cancel: &CancelToken,
        progress: &watch::Sender<RunProgress>,
    ) -> AppResult<RunReport> {
        log_run_start(job, &self.config);

        // 令牌捕获失败是致命错误，不处理任何学号
        let session = self.token_provider().provide().await?;

        let output_dir = self.config.output_dir(&job.course_name);
        let flow = RecordFlow::new(
            &self.config,
            self.source.clone(),
            self.assets.clone(),
            self.classifier.clone(),
            output_dir.clone(),
        )?;
        let pipeline = Pipeline::new(
            flow,
            ArchiveAssembler::new(&self.config.work_dir),
            output_dir,
        );

        let engine = self.launcher.launch(&self.config).await?;
        let report = pipeline
            .run_scoped(engine.as_ref(), &session, job, cancel, progress)
            .await?;

        print_final_stats(&report);
        Ok(report)
    }
}
