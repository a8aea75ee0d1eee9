//! 题目处理上下文
//!
//! 封装"我正在处理第几个分区的第几道题"这一信息

use std::fmt::Display;

/// 题目处理上下文（仅用于日志）
#[derive(Debug, Clone)]
pub struct SubmissionCtx {
    /// 分区序号（从1开始）
    pub section_index: usize,
    /// 分区总数
    pub section_total: usize,
    /// 题目在分区中的序号（从1开始）
    pub submission_index: usize,
    /// 分区内题目总数
    pub submission_total: usize,
}

impl SubmissionCtx {
    pub fn new(
        section_index: usize,
        section_total: usize,
        submission_index: usize,
        submission_total: usize,
    ) -> Self {
        Self {
            section_index,
            section_total,
            submission_index,
            submission_total,
        }
    }
}

impl Display for SubmissionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[分区 {}/{} 题目 {}/{}]",
            self.section_index, self.section_total, self.submission_index, self.submission_total
        )
    }
}
