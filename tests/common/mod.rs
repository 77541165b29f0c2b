//! 集成测试共用的桩实现：内存中的成绩站点和 PDF 引擎

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lopdf::{dictionary, Document, Object, Stream};
use result_archiver::config::Config;
use result_archiver::infrastructure::{AssetSource, FetchedAsset, RecordSource};
use result_archiver::models::{FetchRequest, RawRecordPage, SessionContext};
use result_archiver::services::{EngineLauncher, PdfEngine, PrintLayout};
use result_archiver::{AppError, AppResult};

pub const INITIAL_PAGE: &str = r#"<html><body><form>
    <input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="vs-token" />
    <input type="hidden" name="__VIEWSTATEGENERATOR" value="gen-token" />
    <input type="hidden" name="__EVENTVALIDATION" value="ev-token" />
    <select name="ddlCourse" id="ddlCourse">
        <option value="0">-Select-</option>
        <option value="5">BCA</option>
        <option value="9">BBA</option>
    </select>
</form></body></html>"#;

/// 单个学号的远端响应
#[derive(Debug, Clone)]
pub enum Reply {
    /// 有成绩的页面
    Valid,
    /// 带一张照片的有成绩页面
    ValidWithPhoto,
    /// "无数据"页面
    NoData,
    /// 请求超时
    Timeout,
}

/// 内存中的成绩站点
#[derive(Default)]
pub struct StubSite {
    replies: HashMap<u64, Reply>,
    photos: HashMap<String, Vec<u8>>,
    /// 初始页面不可达
    unreachable: bool,
    pub initial_fetches: AtomicUsize,
    pub submissions: Mutex<Vec<(u64, String, String, SessionContext)>>,
}

impl StubSite {
    pub fn new(replies: &[(u64, Reply)]) -> Self {
        Self {
            replies: replies.iter().cloned().collect(),
            ..Default::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    pub fn with_photo(mut self, url: &str, bytes: &[u8]) -> Self {
        self.photos.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn submitted_ids(&self) -> Vec<u64> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .map(|(id, ..)| *id)
            .collect()
    }
}

pub fn valid_page(identifier: u64) -> String {
    format!(
        "<html><body><table><tr><td>ROLL:{id}</td></tr>\
         <tr><td>NAME OF FATHER</td><td>Father of {id}</td></tr></table></body></html>",
        id = identifier
    )
}

pub fn no_data_page() -> String {
    "<html><body><span id=\"lblMsg\">Record Not Found</span></body></html>".to_string()
}

#[async_trait]
impl RecordSource for StubSite {
    async fn fetch_initial_page(&self) -> AppResult<String> {
        self.initial_fetches.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(AppError::token_capture("http://stub/form.aspx", "connection refused"));
        }
        Ok(INITIAL_PAGE.to_string())
    }

    async fn fetch_record(
        &self,
        session: &SessionContext,
        request: &FetchRequest,
    ) -> AppResult<RawRecordPage> {
        let identifier = request.identifier;
        self.submissions.lock().unwrap().push((
            identifier,
            request.course_selector.clone(),
            request.result_type_selector.clone(),
            session.clone(),
        ));

        let markup = match self.replies.get(&identifier) {
            Some(Reply::Valid) => valid_page(identifier),
            Some(Reply::ValidWithPhoto) => format!(
                "{}<img src=\"Photos/{}.jpg\">",
                valid_page(identifier),
                identifier
            ),
            Some(Reply::Timeout) => {
                return Err(AppError::fetch(identifier, "operation timed out"))
            }
            Some(Reply::NoData) | None => no_data_page(),
        };
        Ok(RawRecordPage { identifier, markup })
    }
}

#[async_trait]
impl AssetSource for StubSite {
    async fn fetch_asset(&self, url: &str) -> AppResult<FetchedAsset> {
        self.photos
            .get(url)
            .map(|bytes| FetchedAsset {
                content_type: "image/jpeg".to_string(),
                bytes: bytes.clone(),
            })
            .ok_or_else(|| AppError::asset_fetch(url, "404 Not Found"))
    }
}

/// 生成一页 PDF 的桩引擎，页面字典带 `RecordTag`（从 `ROLL:<学号>` 解析）
#[derive(Default)]
pub struct StubEngine {
    pub renders: AtomicUsize,
    pub closes: AtomicUsize,
    pub markups: Mutex<Vec<String>>,
}

impl StubEngine {
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfEngine for StubEngine {
    async fn render_pdf(
        &self,
        markup: &str,
        _stylesheet: &str,
        _layout: &PrintLayout,
    ) -> AppResult<Vec<u8>> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        self.markups.lock().unwrap().push(markup.to_string());
        let tag = roll_tag(markup)
            .ok_or_else(|| AppError::Browser("页面中没有 ROLL 标记".to_string()))?;
        Ok(one_page_pdf(tag))
    }

    async fn close(&self) -> AppResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 每次 `launch` 都返回同一个桩引擎，便于断言关闭次数
pub struct StubLauncher {
    pub engine: Arc<StubEngine>,
    pub launches: AtomicUsize,
}

impl StubLauncher {
    pub fn new() -> Self {
        Self {
            engine: Arc::new(StubEngine::default()),
            launches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EngineLauncher for StubLauncher {
    async fn launch(&self, _config: &Config) -> AppResult<Arc<dyn PdfEngine>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let engine: Arc<dyn PdfEngine> = self.engine.clone();
        Ok(engine)
    }
}

fn roll_tag(markup: &str) -> Option<i64> {
    let start = markup.find("ROLL:")? + "ROLL:".len();
    let digits: String = markup[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn one_page_pdf(tag: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(842),
            Object::Integer(595),
        ],
        "RecordTag" => tag,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// 读取 PDF 每页的 `RecordTag`
pub fn page_tags(path: &Path) -> Vec<i64> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| {
            doc.get_object(id)
                .unwrap()
                .as_dict()
                .unwrap()
                .get(b"RecordTag")
                .unwrap()
                .as_i64()
                .unwrap()
        })
        .collect()
}

/// 工作目录指向临时目录、无请求间隔的配置
pub fn test_config(work_dir: &Path) -> Config {
    Config {
        work_dir: work_dir.to_path_buf(),
        request_delay_ms: 0,
        ..Config::default()
    }
}
