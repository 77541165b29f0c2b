//! 单条记录相关的数据类型

use std::path::{Path, PathBuf};

/// 单次表单提交请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// 学号
    pub identifier: u64,
    /// 课程选择值（ddlCourse）
    pub course_selector: String,
    /// 成绩类型选择值（ddlResultType）
    pub result_type_selector: String,
}

/// 远端返回的原始页面
#[derive(Debug, Clone)]
pub struct RawRecordPage {
    pub identifier: u64,
    pub markup: String,
}

/// 图片引用：原始 src 与解析后的绝对地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub original_src: String,
    pub resolved_url: String,
}

/// 已渲染的单条 PDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub identifier: u64,
    pub path: PathBuf,
}

impl RenderedDocument {
    const PREFIX: &'static str = "result_";
    const EXTENSION: &'static str = ".pdf";

    /// 学号对应的文件名，例如 `result_100.pdf`
    pub fn file_name(identifier: u64) -> String {
        format!("{}{}{}", Self::PREFIX, identifier, Self::EXTENSION)
    }

    pub fn in_dir(dir: &Path, identifier: u64) -> Self {
        Self {
            identifier,
            path: dir.join(Self::file_name(identifier)),
        }
    }

    /// 从文件名恢复学号，不符合命名规则的文件返回 None
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let identifier = name
            .strip_prefix(Self::PREFIX)?
            .strip_suffix(Self::EXTENSION)?
            .parse()
            .ok()?;
        Some(Self {
            identifier,
            path: path.to_path_buf(),
        })
    }
}

/// 合并后的成绩总档
#[derive(Debug, Clone)]
pub struct Archive {
    pub course_name: String,
    pub path: PathBuf,
    /// 按学号升序排列的成员文档
    pub members: Vec<RenderedDocument>,
    pub page_count: usize,
}

impl Archive {
    pub fn member_ids(&self) -> Vec<u64> {
        self.members.iter().map(|m| m.identifier).collect()
    }
}
