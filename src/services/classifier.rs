//! 记录分类 - 业务能力层
//!
//! 判断远端响应是一份真实成绩，还是"无此学号数据"的空页面

use scraper::{Html, Selector};

/// 记录分类器
///
/// 任何 `Fn(&str) -> bool` 都可以作为分类器使用
pub trait RecordClassifier: Send + Sync {
    fn is_valid(&self, markup: &str) -> bool;
}

impl<F> RecordClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, markup: &str) -> bool {
        self(markup)
    }
}

/// 基于标记文本的分类器
///
/// 页面正文文本包含标记即视为有效成绩。
/// 这是启发式判断：远端改版可能导致漏判，错误页恰好出现标记也会误判。
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    marker: String,
}

impl MarkerClassifier {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl RecordClassifier for MarkerClassifier {
    fn is_valid(&self, markup: &str) -> bool {
        body_text(markup).contains(&self.marker)
    }
}

/// 提取 `<body>` 的纯文本（文本节点直接拼接）
pub fn body_text(markup: &str) -> String {
    let document = Html::parse_document(markup);
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    document
        .select(&selector)
        .flat_map(|body| body.text())
        .collect()
}
