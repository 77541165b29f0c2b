//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责运行生命周期和区间调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `downloader` - 成绩下载器
//! - 组装数据源、判断规则和渲染引擎
//! - 捕获会话令牌（失败即中止）
//! - 在后台启动运行，返回句柄
//! - 获取并关闭渲染引擎
//!
//! ### `pipeline` - 学号区间处理器
//! - 按升序逐个处理学号
//! - 隔离单个学号的错误
//! - 检查取消、发布进度
//! - 循环结束后合并一次
//!
//! ### `run_handle` - 运行句柄
//! - 查询进度、取消、等待报告
//!
//! ## 层次关系
//!
//! ```text
//! downloader (一次运行)
//!     ↓
//! pipeline (处理学号区间)
//!     ↓
//! workflow::RecordFlow (处理单个学号)
//!     ↓
//! services (能力层：令牌 / 判断 / 内联 / 渲染 / 合并)
//!     ↓
//! infrastructure (基础设施：FormClient / PageCache)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有渲染引擎
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod downloader;
pub mod pipeline;
pub mod run_handle;

pub use downloader::Downloader;
pub use pipeline::Pipeline;
pub use run_handle::RunHandle;
