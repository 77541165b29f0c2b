//! # Result Archiver
//!
//! 从有状态的成绩查询表单逐个下载学号成绩，渲染为 PDF 并合并为一个总档
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 HTTP 客户端和页面缓存，只暴露能力
//! - `FormClient` - 唯一的 reqwest Client，负责表单提交和图片下载
//! - `PageCache` - 初始页面缓存（带有效期策略）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单条记录
//! - `SessionTokenProvider` - 捕获会话令牌
//! - `RecordClassifier` - 判断页面是否包含成绩
//! - `AssetInliner` - 图片内联
//! - `DocumentRenderer` - PDF 渲染
//! - `ArchiveAssembler` - 按学号合并
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个学号"的完整处理流程
//! - `RecordCtx` - 上下文封装（学号 + 序号）
//! - `RecordFlow` - 流程编排（fetch → classify → inline → render）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/downloader` - 组装组件、管理渲染引擎和运行生命周期
//! - `orchestrator/pipeline` - 学号区间处理器，循环结束后合并
//! - `orchestrator/run_handle` - 进度查询、取消和等待
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{AssetFailurePolicy, Config};
pub use error::{AppError, AppResult};
pub use models::{
    AssemblyOutcome, Catalogue, DownloadJob, RecordOutcome, RunPhase, RunProgress, RunReport,
    SelectorOption,
};
pub use orchestrator::{Downloader, RunHandle};
pub use services::{EngineLauncher, PdfEngine, PrintLayout, RecordClassifier};
pub use utils::CancelToken;
