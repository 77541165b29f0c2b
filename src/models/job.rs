//! 下载任务

use std::ops::RangeInclusive;

use crate::error::{AppError, AppResult};
use crate::models::record::FetchRequest;

/// 一次下载任务：学号闭区间 + 课程 + 成绩类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub from: u64,
    pub to: u64,
    /// 课程选择值（ddlCourse）
    pub course_selector: String,
    /// 课程显示名称，用于输出目录和合并文件名
    pub course_name: String,
    /// 成绩类型选择值（ddlResultType），正常考试为空字符串
    pub result_type_selector: String,
}

impl DownloadJob {
    /// 创建任务，`from > to` 视为配置错误
    pub fn new(
        from: u64,
        to: u64,
        course_selector: impl Into<String>,
        course_name: impl Into<String>,
        result_type_selector: impl Into<String>,
    ) -> AppResult<Self> {
        if from > to {
            return Err(AppError::Config(format!(
                "学号区间无效: {} > {}",
                from, to
            )));
        }
        let course_name = course_name.into();
        if course_name.trim().is_empty() {
            return Err(AppError::Config("课程名称不能为空".to_string()));
        }
        Ok(Self {
            from,
            to,
            course_selector: course_selector.into(),
            course_name,
            result_type_selector: result_type_selector.into(),
        })
    }

    /// 升序、闭区间、步长 1
    pub fn identifiers(&self) -> RangeInclusive<u64> {
        self.from..=self.to
    }

    /// 区间内学号个数，超出 `usize` 时取 `usize::MAX`
    pub fn total(&self) -> usize {
        let count = self.to.saturating_sub(self.from).saturating_add(1);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    pub fn request(&self, identifier: u64) -> FetchRequest {
        FetchRequest {
            identifier,
            course_selector: self.course_selector.clone(),
            result_type_selector: self.result_type_selector.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_inclusive_and_ascending() {
        let job = DownloadJob::new(100, 103, "5", "BCA", "").unwrap();
        assert_eq!(job.identifiers().collect::<Vec<_>>(), vec![100, 101, 102, 103]);
        assert_eq!(job.total(), 4);
        assert_eq!(job.request(102).identifier, 102);
        assert_eq!(job.request(102).course_selector, "5");
    }

    #[test]
    fn test_single_identifier_range() {
        let job = DownloadJob::new(200, 200, "5", "BCA", "").unwrap();
        assert_eq!(job.total(), 1);
    }

    #[test]
    fn test_full_u64_range_total_saturates() {
        let job = DownloadJob::new(0, u64::MAX, "5", "BCA", "").unwrap();
        let expected = usize::try_from(u64::MAX).unwrap_or(usize::MAX);
        assert_eq!(job.total(), expected);
        assert_eq!(job.identifiers().next(), Some(0));
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        assert!(matches!(
            DownloadJob::new(10, 9, "5", "BCA", ""),
            Err(AppError::Config(_))
        ));
        assert!(DownloadJob::new(1, 2, "5", "  ", "").is_err());
    }
}
