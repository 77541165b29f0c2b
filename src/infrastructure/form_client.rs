//! 成绩表单 HTTP 客户端 - 基础设施层
//!
//! 持有唯一的 reqwest Client，负责初始页面获取、表单提交和图片下载

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, REFERER, USER_AGENT};
use reqwest::Client;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::sources::{AssetSource, FetchedAsset, RecordSource};
use crate::models::{FetchRequest, RawRecordPage, SessionContext};

/// 提交按钮的固定值
const SUBMIT_BUTTON_VALUE: &str = "View Result";

/// 成绩表单客户端
///
/// 所有请求共用同一组浏览器请求头和超时；不做重试
pub struct FormClient {
    client: Client,
    form_url: String,
}

impl FormClient {
    /// 创建新的表单客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(ACCEPT, header_value(&config.accept)?);
        headers.insert(REFERER, header_value(&config.form_url)?);

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Config(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            form_url: config.form_url.clone(),
        })
    }

    /// 构建表单提交字段
    ///
    /// 字段顺序与浏览器提交保持一致
    pub fn form_fields(
        session: &SessionContext,
        request: &FetchRequest,
    ) -> Vec<(&'static str, String)> {
        vec![
            (SessionContext::VIEW_STATE, session.view_state.clone()),
            (
                SessionContext::VIEW_STATE_GENERATOR,
                session.view_state_generator.clone(),
            ),
            (
                SessionContext::EVENT_VALIDATION,
                session.event_validation.clone(),
            ),
            ("txtUniqueID", request.identifier.to_string()),
            ("ddlCourse", request.course_selector.clone()),
            ("ddlResultType", request.result_type_selector.clone()),
            ("btnGetResult", SUBMIT_BUTTON_VALUE.to_string()),
        ]
    }
}

#[async_trait]
impl RecordSource for FormClient {
    async fn fetch_initial_page(&self) -> AppResult<String> {
        debug!("获取初始页面: {}", self.form_url);
        let response = self
            .client
            .get(&self.form_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::token_capture(&self.form_url, e))?;

        response
            .text()
            .await
            .map_err(|e| AppError::token_capture(&self.form_url, e))
    }

    async fn fetch_record(
        &self,
        session: &SessionContext,
        request: &FetchRequest,
    ) -> AppResult<RawRecordPage> {
        let identifier = request.identifier;
        let fields = Self::form_fields(session, request);

        let response = self
            .client
            .post(&self.form_url)
            .form(&fields)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::fetch(identifier, e))?;

        let markup = response
            .text()
            .await
            .map_err(|e| AppError::fetch(identifier, e))?;

        debug!("学号 {} 响应长度: {} 字节", identifier, markup.len());

        Ok(RawRecordPage { identifier, markup })
    }
}

#[async_trait]
impl AssetSource for FormClient {
    async fn fetch_asset(&self, url: &str) -> AppResult<FetchedAsset> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::asset_fetch(url, e))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(media_type)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::asset_fetch(url, e))?;

        Ok(FetchedAsset {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Config(format!("无效的请求头值 '{}': {}", value, e)))
}

/// 去掉 `; charset=...` 等参数
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_follow_protocol() {
        let session = SessionContext {
            view_state: "vs".to_string(),
            view_state_generator: "gen".to_string(),
            event_validation: "ev".to_string(),
        };
        let request = FetchRequest {
            identifier: 100,
            course_selector: "5".to_string(),
            result_type_selector: String::new(),
        };

        let fields = FormClient::form_fields(&session, &request);
        let names: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            names,
            vec![
                "__VIEWSTATE",
                "__VIEWSTATEGENERATOR",
                "__EVENTVALIDATION",
                "txtUniqueID",
                "ddlCourse",
                "ddlResultType",
                "btnGetResult"
            ]
        );
        assert_eq!(fields[3].1, "100");
        assert_eq!(fields[5].1, "");
        assert_eq!(fields[6].1, "View Result");
    }

    #[test]
    fn test_empty_session_is_submitted_as_is() {
        let fields = FormClient::form_fields(
            &SessionContext::default(),
            &FetchRequest {
                identifier: 1,
                course_selector: "5".to_string(),
                result_type_selector: "6".to_string(),
            },
        );
        assert!(fields[..3].iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn test_media_type_strips_parameters() {
        assert_eq!(media_type("image/JPEG; charset=binary"), "image/jpeg");
        assert_eq!(media_type("image/png"), "image/png");
    }

    #[test]
    fn test_client_builds_from_default_config() {
        tokio_test::assert_ok!(FormClient::new(&Config::default()));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_fetch_error() {
        let config = Config {
            form_url: "http://127.0.0.1:9/form.aspx".to_string(),
            request_timeout_secs: 2,
            ..Config::default()
        };
        let client = FormClient::new(&config).unwrap();
        let request = FetchRequest {
            identifier: 200,
            course_selector: "5".to_string(),
            result_type_selector: String::new(),
        };
        let err = client
            .fetch_record(&SessionContext::default(), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Fetch { identifier: 200, .. }));
    }
}
