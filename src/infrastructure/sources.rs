//! 远端数据源抽象
//!
//! 流程层只依赖这些 trait，真实实现是 [`FormClient`](super::FormClient)，
//! 测试中替换为内存实现。

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{FetchRequest, RawRecordPage, SessionContext};

/// 成绩表单数据源
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// 获取初始表单页面（用于捕获会话令牌和下拉选项）
    async fn fetch_initial_page(&self) -> AppResult<String>;

    /// 提交一次查询，返回原始响应页面
    async fn fetch_record(
        &self,
        session: &SessionContext,
        request: &FetchRequest,
    ) -> AppResult<RawRecordPage>;
}

/// 下载得到的二进制资源
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    /// 声明的内容类型（不含参数），例如 `image/jpeg`
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// 图片资源数据源
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch_asset(&self, url: &str) -> AppResult<FetchedAsset>;
}
