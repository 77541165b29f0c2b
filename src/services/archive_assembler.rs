//! 成绩总档合并服务 - 业务能力层
//!
//! 把输出目录中的单条 PDF 按学号升序合并为一个文件，成功写出后删除单条文件

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, Object, ObjectId};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{Archive, RenderedDocument};

/// 页面可从父节点继承的属性
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// 成绩总档合并服务
///
/// 全部是同步文件操作，异步上下文中应放到阻塞线程池执行
#[derive(Debug, Clone)]
pub struct ArchiveAssembler {
    archive_dir: PathBuf,
}

impl ArchiveAssembler {
    /// # 参数
    /// - `archive_dir`: 合并文件写入的目录
    pub fn new(archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
        }
    }

    /// 合并文件路径：`<课程名>_merged_results.pdf`
    pub fn archive_path(&self, course_name: &str) -> PathBuf {
        self.archive_dir
            .join(format!("{}_merged_results.pdf", course_name))
    }

    /// 列出目录中的单条 PDF，按文件名中的学号升序排列
    ///
    /// 目录不存在时返回空列表；不符合 `result_<学号>.pdf` 的文件被忽略
    pub fn collect(dir: &Path) -> AppResult<Vec<RenderedDocument>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::file(dir, e)),
        };

        let mut documents = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| AppError::file(dir, e))?.path();
            match RenderedDocument::from_path(&path) {
                Some(doc) => documents.push(doc),
                None => debug!("忽略非成绩文件: {}", path.display()),
            }
        }

        documents.sort_by_key(|doc| doc.identifier);
        Ok(documents)
    }

    /// 合并目录中的全部单条 PDF
    ///
    /// # 返回
    /// - `Ok(None)`: 没有可合并的文件，不写任何文件
    /// - `Ok(Some(archive))`: 合并成功，单条文件已删除
    /// - `Err(Merge)`: 某个文件不可读或写出失败，单条文件原样保留
    pub fn assemble(&self, dir: &Path, course_name: &str) -> AppResult<Option<Archive>> {
        let members = Self::collect(dir)?;
        if members.is_empty() {
            info!("📭 没有生成任何 PDF，跳过合并");
            return Ok(None);
        }

        info!("📚 正在合并 {} 个 PDF...", members.len());

        let mut merger = PdfMerger::default();
        for member in &members {
            let document = Document::load(&member.path)
                .map_err(|e| AppError::merge(&member.path, e.to_string()))?;
            let pages = merger.append(document);
            debug!("学号 {} 合并 {} 页", member.identifier, pages);
        }

        // 先写临时文件，成功后再改名，失败时不留下半个合并文件
        let path = self.archive_path(course_name);
        let partial = path.with_extension("pdf.part");
        let page_count = match merger.save(&partial) {
            Ok(count) => count,
            Err(e) => {
                discard(&partial);
                return Err(AppError::merge(&path, e));
            }
        };
        if let Err(e) = fs::rename(&partial, &path) {
            discard(&partial);
            return Err(AppError::merge(&path, e));
        }
        info!("✅ 合并文件已保存: {} (共 {} 页)", path.display(), page_count);

        remove_members(&members);
        info!("🗑️ 已清理 {} 中的单条 PDF", dir.display());

        Ok(Some(Archive {
            course_name: course_name.to_string(),
            path,
            members,
            page_count,
        }))
    }
}

fn discard(partial: &Path) {
    if let Err(e) = fs::remove_file(partial) {
        if e.kind() != ErrorKind::NotFound {
            warn!("⚠️ 无法删除临时文件 {}: {}", partial.display(), e);
        }
    }
}

/// 删除已合并的单条文件，失败只记录警告
fn remove_members(members: &[RenderedDocument]) {
    for member in members {
        if let Err(e) = fs::remove_file(&member.path) {
            warn!("⚠️ 无法删除 {}: {}", member.path.display(), e);
        }
    }
}

/// 页面树合并器
///
/// 每个文档的对象重新编号后并入同一对象表，原有的 Catalog / Pages 节点丢弃，
/// 最后用一个新的 Pages 根节点按追加顺序挂上所有页面
#[derive(Default)]
struct PdfMerger {
    objects: BTreeMap<ObjectId, Object>,
    pages: Vec<ObjectId>,
    max_id: u32,
}

impl PdfMerger {
    /// 追加一个文档的全部页面（保持其内部页序），返回页数
    fn append(&mut self, mut document: Document) -> usize {
        document.renumber_objects_with(self.max_id + 1);

        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        for &page_id in &page_ids {
            inherit_attributes(&mut document, page_id);
        }

        if let Some(max) = document.objects.keys().map(|(id, _)| *id).max() {
            self.max_id = self.max_id.max(max);
        }

        for (id, object) in document.objects {
            if is_tree_node(&object) {
                continue;
            }
            self.objects.insert(id, object);
        }

        let count = page_ids.len();
        self.pages.extend(page_ids);
        count
    }

    /// 生成新的页面树并写出，返回总页数
    fn save(self, path: &Path) -> Result<usize, String> {
        let Self {
            mut objects,
            pages,
            max_id,
        } = self;

        let pages_id = (max_id + 1, 0);
        let catalog_id = (max_id + 2, 0);

        for page_id in &pages {
            if let Some(Object::Dictionary(page)) = objects.get_mut(page_id) {
                page.set("Parent", pages_id);
            }
        }

        let kids: Vec<Object> = pages.iter().map(|&id| Object::Reference(id)).collect();
        objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
            }),
        );
        objects.insert(
            catalog_id,
            Object::Dictionary(dictionary! {
                "Type" => "Catalog",
                "Pages" => pages_id,
            }),
        );

        let mut document = Document::with_version("1.5");
        document.objects = objects;
        document.max_id = catalog_id.0;
        document.trailer.set("Root", catalog_id);
        document.compress();
        document.save(path).map_err(|e| e.to_string())?;

        Ok(pages.len())
    }
}

fn is_tree_node(object: &Object) -> bool {
    object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
        .map(|name| name == b"Catalog" || name == b"Pages")
        .unwrap_or(false)
}

/// 父节点即将被丢弃，先把可继承属性复制到页面本身
fn inherit_attributes(document: &mut Document, page_id: ObjectId) {
    let mut inherited = Vec::new();

    if let Ok(page) = document.get_object(page_id).and_then(Object::as_dict) {
        for key in INHERITABLE {
            if page.has(key) {
                continue;
            }
            let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
            let mut depth = 0;
            while let Some(parent_id) = parent {
                depth += 1;
                if depth > 64 {
                    break;
                }
                let Ok(node) = document.get_object(parent_id).and_then(Object::as_dict) else {
                    break;
                };
                if let Ok(value) = node.get(key) {
                    inherited.push((key, value.clone()));
                    break;
                }
                parent = node.get(b"Parent").and_then(Object::as_reference).ok();
            }
        }
    }

    if let Ok(page) = document
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
    {
        for (key, value) in inherited {
            page.set(key, value);
        }
    }
}
