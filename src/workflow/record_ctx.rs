//! 记录处理上下文
//!
//! 封装"我正在处理本次运行中的第几个学号"这一信息

use std::fmt::Display;

/// 记录处理上下文
#[derive(Debug, Clone)]
pub struct RecordCtx {
    /// 学号
    pub identifier: u64,

    /// 在本次区间中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 区间内学号总数
    pub total: usize,
}

impl RecordCtx {
    pub fn new(identifier: u64, index: usize, total: usize) -> Self {
        Self {
            identifier,
            index,
            total,
        }
    }
}

impl Display for RecordCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[学号 {} {}/{}]", self.identifier, self.index, self.total)
    }
}
