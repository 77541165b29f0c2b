//! 会话令牌
//!
//! ASP.NET 表单要求每次提交都回传初始页面里的三个隐藏字段

use scraper::{Html, Selector};

/// 表单会话上下文
///
/// 每次运行只捕获一次，之后只读地传给每一次提交。
/// 缺失的字段保留为空字符串并照常提交。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub view_state: String,
    pub view_state_generator: String,
    pub event_validation: String,
}

impl SessionContext {
    pub const VIEW_STATE: &'static str = "__VIEWSTATE";
    pub const VIEW_STATE_GENERATOR: &'static str = "__VIEWSTATEGENERATOR";
    pub const EVENT_VALIDATION: &'static str = "__EVENTVALIDATION";

    /// 从初始页面 HTML 中提取隐藏字段
    pub fn from_markup(markup: &str) -> Self {
        let document = Html::parse_document(markup);
        Self {
            view_state: hidden_value(&document, Self::VIEW_STATE),
            view_state_generator: hidden_value(&document, Self::VIEW_STATE_GENERATOR),
            event_validation: hidden_value(&document, Self::EVENT_VALIDATION),
        }
    }

    /// 三个字段是否都已捕获
    pub fn is_complete(&self) -> bool {
        !self.view_state.is_empty()
            && !self.view_state_generator.is_empty()
            && !self.event_validation.is_empty()
    }

    /// 缺失的字段名
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.view_state.is_empty() {
            missing.push(Self::VIEW_STATE);
        }
        if self.view_state_generator.is_empty() {
            missing.push(Self::VIEW_STATE_GENERATOR);
        }
        if self.event_validation.is_empty() {
            missing.push(Self::EVENT_VALIDATION);
        }
        missing
    }
}

fn hidden_value(document: &Html, name: &str) -> String {
    let Ok(selector) = Selector::parse(&format!(r#"input[name="{}"]"#, name)) else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .unwrap_or_default()
        .to_string()
}
