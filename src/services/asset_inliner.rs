//! 图片内联服务 - 业务能力层
//!
//! 把成绩页中的 `<img src>` 换成 base64 data URI，渲染时不再依赖外部资源

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::{join_all, try_join_all};
use regex::{Captures, Regex};
use reqwest::Url;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::config::AssetFailurePolicy;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{AssetSource, FetchedAsset};
use crate::models::AssetReference;

/// 图片内联服务
///
/// 同一条记录的所有图片并发下载，全部完成后才返回
pub struct AssetInliner {
    source: Arc<dyn AssetSource>,
    origin: Url,
    policy: AssetFailurePolicy,
    /// 注释、原始文本元素（其中的 `<img>` 不是真实元素）或一个完整的 `<img>` 开始标签
    markup_token: Regex,
    /// 开始标签内的单个属性，带引号的值整体匹配
    attribute: Regex,
}

impl AssetInliner {
    /// 创建新的内联服务
    ///
    /// # 参数
    /// - `source`: 图片数据源
    /// - `origin`: 相对地址的解析基准
    /// - `policy`: 图片失败时的处理策略
    pub fn new(
        source: Arc<dyn AssetSource>,
        origin: &str,
        policy: AssetFailurePolicy,
    ) -> AppResult<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| AppError::Config(format!("无效的图片基准地址 '{}': {}", origin, e)))?;

        Ok(Self {
            source,
            origin,
            policy,
            markup_token: Regex::new(
                r#"(?is)(<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>|<textarea\b.*?</textarea\s*>)|<img\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#,
            )?,
            attribute: Regex::new(
                r#"([^\s"'>/=]+)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s"'>]+))?"#,
            )?,
        })
    }

    /// 列出页面中需要内联的图片（去重，保持文档顺序）
    ///
    /// 只认解析后的 `<img>` 元素；空 src 和已经是 data URI 的图片会被忽略
    pub fn references(&self, markup: &str) -> Vec<AssetReference> {
        let Ok(selector) = Selector::parse("img[src]") else {
            return Vec::new();
        };
        let document = Html::parse_document(markup);

        let mut seen: Vec<AssetReference> = Vec::new();
        for src in document
            .select(&selector)
            .filter_map(|img| img.value().attr("src"))
        {
            if src.trim().is_empty() || src.trim_start().starts_with("data:") {
                continue;
            }
            if seen.iter().any(|r| r.original_src == src) {
                continue;
            }
            seen.push(AssetReference {
                original_src: src.to_string(),
                resolved_url: self.resolve(src),
            });
        }
        seen
    }

    /// 相对地址按基准解析，绝对地址保持不变
    pub fn resolve(&self, src: &str) -> String {
        let src = src.trim();
        if let Ok(url) = Url::parse(src) {
            return url.to_string();
        }
        match self.origin.join(src) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.origin, src.trim_start_matches('/')),
        }
    }

    /// 内联页面中的全部图片
    ///
    /// `FailRecord` 策略下任意一张失败即返回错误，不产生部分结果；
    /// `KeepOriginal` 策略下失败的图片保留原始引用
    pub async fn inline(&self, markup: &str) -> AppResult<String> {
        let references = self.references(markup);
        if references.is_empty() {
            return Ok(markup.to_string());
        }
        debug!("需要内联 {} 张图片", references.len());

        let fetches = references
            .iter()
            .map(|r| self.source.fetch_asset(&r.resolved_url));

        let inlined: HashMap<String, String> = match self.policy {
            AssetFailurePolicy::FailRecord => {
                let assets = try_join_all(fetches).await?;
                references
                    .iter()
                    .zip(assets)
                    .map(|(r, asset)| (r.original_src.clone(), data_uri(&asset)))
                    .collect()
            }
            AssetFailurePolicy::KeepOriginal => {
                let results = join_all(fetches).await;
                references
                    .iter()
                    .zip(results)
                    .filter_map(|(r, result)| match result {
                        Ok(asset) => Some((r.original_src.clone(), data_uri(&asset))),
                        Err(e) => {
                            warn!("⚠️ 图片保留原始引用 {}: {}", r.original_src, e);
                            None
                        }
                    })
                    .collect()
            }
        };

        Ok(self.rewrite(markup, &inlined))
    }

    /// 只改写真实 `<img>` 标签的第一个 src 属性，其余文本原样保留
    fn rewrite(&self, markup: &str, inlined: &HashMap<String, String>) -> String {
        self.markup_token
            .replace_all(markup, |token: &Captures| {
                match token.get(2) {
                    Some(attributes) => {
                        format!("<img{}>", self.rewrite_src(attributes.as_str(), inlined))
                    }
                    None => token[0].to_string(),
                }
            })
            .into_owned()
    }

    fn rewrite_src(&self, attributes: &str, inlined: &HashMap<String, String>) -> String {
        let Some(src) = self
            .attribute
            .captures_iter(attributes)
            .find(|attr| attr[1].eq_ignore_ascii_case("src"))
        else {
            return attributes.to_string();
        };
        let Some(value) = src.get(2) else {
            return attributes.to_string();
        };
        match inlined.get(&decode_entities(unquote(value.as_str()))) {
            Some(uri) => format!(
                "{}\"{}\"{}",
                &attributes[..value.start()],
                uri,
                &attributes[value.end()..]
            ),
            None => attributes.to_string(),
        }
    }
}

/// 生成 `data:<type>;base64,<data>`
pub fn data_uri(asset: &FetchedAsset) -> String {
    format!(
        "data:{};base64,{}",
        asset.content_type,
        STANDARD.encode(&asset.bytes)
    )
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

/// 与解析器给出的属性值对齐（只处理属性中常见的实体）
fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
