//! 运行汇总 - 业务能力层
//!
//! 记录每道没能保存的题目和原因，以及保存结果的统计。
//! 由顶层编排器持有并显式传递，没有全局状态。

use std::collections::HashSet;

use tracing::debug;

use crate::error::FailureReason;
use crate::models::{PersistOutcome, SubmissionKey};

/// 运行汇总
#[derive(Debug, Default)]
pub struct RunSummary {
    failures: Vec<(SubmissionKey, FailureReason)>,
    seen: HashSet<SubmissionKey>,
    created: usize,
    updated: usize,
    unchanged: usize,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次失败
    ///
    /// 同一道题只保留第一次记录的原因，返回是否为新记录
    pub fn record(&mut self, key: SubmissionKey, reason: FailureReason) -> bool {
        if !self.seen.insert(key.clone()) {
            debug!("{} 已经记录过失败，忽略: {}", key, reason);
            return false;
        }
        self.failures.push((key, reason));
        true
    }

    /// 记录一次成功保存
    pub fn record_saved(&mut self, outcome: PersistOutcome) {
        match outcome {
            PersistOutcome::Written { replaced: false } => self.created += 1,
            PersistOutcome::Written { replaced: true } => self.updated += 1,
            PersistOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// 失败清单，按首次记录的顺序
    pub fn summarize(&self) -> Vec<(SubmissionKey, FailureReason)> {
        self.failures.clone()
    }

    pub fn failures(&self) -> &[(SubmissionKey, FailureReason)] {
        &self.failures
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn updated(&self) -> usize {
        self.updated
    }

    pub fn unchanged(&self) -> usize {
        self.unchanged
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// 处理过的题目总数
    pub fn processed(&self) -> usize {
        self.created + self.updated + self.unchanged + self.failures.len()
    }
}
