//! 运行结果与进度

use std::fmt;
use std::path::PathBuf;

use crate::error::AppError;
use crate::models::record::Archive;

/// 跳过原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 远端返回"无数据"页面
    NoData,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "无成绩数据"),
        }
    }
}

/// 单个学号的处理结果
#[derive(Debug)]
pub enum RecordOutcome {
    /// 已生成 PDF
    Success(PathBuf),
    /// 跳过（未找到成绩）
    Skipped(SkipReason),
    /// 查询、内联或渲染失败
    Failed(AppError),
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RecordOutcome::Success(_))
    }
}

/// 合并阶段的结果
#[derive(Debug)]
pub enum AssemblyOutcome {
    Merged(Archive),
    /// 没有可合并的 PDF
    Empty,
    Failed(AppError),
}

/// 一次运行的完整报告
#[derive(Debug)]
pub struct RunReport {
    pub course_name: String,
    /// 按处理顺序记录的每个学号结果
    pub outcomes: Vec<(u64, RecordOutcome)>,
    pub assembly: AssemblyOutcome,
    pub cancelled: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Success(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Failed(_)))
    }

    pub fn outcome(&self, identifier: u64) -> Option<&RecordOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| *id == identifier)
            .map(|(_, outcome)| outcome)
    }

    pub fn archive(&self) -> Option<&Archive> {
        match &self.assembly {
            AssemblyOutcome::Merged(archive) => Some(archive),
            _ => None,
        }
    }

    fn count(&self, pred: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Starting,
    Processing,
    Assembling,
    Finished,
}

/// 运行进度快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProgress {
    pub phase: RunPhase,
    /// 正在处理的学号
    pub current: Option<u64>,
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunProgress {
    pub fn processed(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    /// 记录一个学号的结果
    pub fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Success(_) => self.succeeded += 1,
            RecordOutcome::Skipped(_) => self.skipped += 1,
            RecordOutcome::Failed(_) => self.failed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport {
            course_name: "BCA".to_string(),
            outcomes: vec![
                (100, RecordOutcome::Success(PathBuf::from("BCA_results/result_100.pdf"))),
                (101, RecordOutcome::Skipped(SkipReason::NoData)),
                (102, RecordOutcome::Failed(AppError::fetch(102, "timed out"))),
            ],
            assembly: AssemblyOutcome::Empty,
            cancelled: false,
        }
    }

    #[test]
    fn test_report_counts_each_outcome() {
        let report = report();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.outcome(100).is_some_and(RecordOutcome::is_success));
        assert!(report.outcome(103).is_none());
        assert!(report.archive().is_none());
    }

    #[test]
    fn test_progress_tracks_outcomes() {
        let mut progress = RunProgress {
            total: 3,
            ..Default::default()
        };
        for (_, outcome) in &report().outcomes {
            progress.record(outcome);
        }
        assert_eq!(progress.processed(), 3);
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.phase, RunPhase::Starting);
    }
}
