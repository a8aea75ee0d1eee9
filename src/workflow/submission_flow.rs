//! 题目处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 下载答案（失败时按配置重试，全部失败只算一次失败）
//! 2. 保存到磁盘（内容未变化时跳过）

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::FailureReason;
use crate::infrastructure::PageDriver;
use crate::models::{FetchResult, PersistOutcome, Section, Submission};
use crate::services::{ArtifactFetcher, SolutionStore};
use crate::utils::logging::truncate_text;
use crate::workflow::submission_ctx::SubmissionCtx;

/// 题目处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    /// 已保存（或内容未变化）
    Saved(PersistOutcome),
    /// 失败，原因是最后一次尝试的结果
    Failed(FailureReason),
}

/// 题目处理流程
///
/// - 编排下载 → 保存
/// - 决定是否重试
/// - 不持有浏览器资源
pub struct SubmissionFlow {
    fetcher: ArtifactFetcher,
    store: SolutionStore,
    attempts: usize,
    retry_delay: Duration,
}

impl SubmissionFlow {
    pub fn new(config: &Config) -> Self {
        Self::with_parts(
            ArtifactFetcher::new(config),
            SolutionStore::from_config(config),
            config.fetch_attempts,
            config.retry_delay(),
        )
    }

    pub fn with_parts(
        fetcher: ArtifactFetcher,
        store: SolutionStore,
        attempts: usize,
        retry_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            attempts: attempts.max(1),
            retry_delay,
        }
    }

    pub async fn run(
        &self,
        driver: &dyn PageDriver,
        section: &Section,
        submission: &Submission,
        ctx: &SubmissionCtx,
    ) -> ProcessResult {
        info!("{} ⬇️ {} ({})", ctx, submission.title, submission.name);

        let text = match self.fetch_with_retry(driver, submission, ctx).await {
            Ok(text) => {
                debug!("{} 内容预览: {}", ctx, truncate_text(text.lines().next().unwrap_or(""), 80));
                text
            }
            Err(reason) => {
                warn!("{} ❌ {} 下载失败: {}", ctx, submission.name, reason);
                return ProcessResult::Failed(reason);
            }
        };

        match self.store.persist(section, submission, &text).await {
            Ok(outcome) => {
                match outcome {
                    PersistOutcome::Written { replaced: false } => {
                        info!("{} ✓ 新增: {}", ctx, submission.name)
                    }
                    PersistOutcome::Written { replaced: true } => {
                        info!("{} ✓ 更新: {}", ctx, submission.name)
                    }
                    PersistOutcome::Unchanged => info!("{} = 未变化: {}", ctx, submission.name),
                }
                ProcessResult::Saved(outcome)
            }
            Err(e) => {
                warn!("{} ❌ {} 保存失败: {}", ctx, submission.name, e);
                ProcessResult::Failed(e.into())
            }
        }
    }

    async fn fetch_with_retry(
        &self,
        driver: &dyn PageDriver,
        submission: &Submission,
        ctx: &SubmissionCtx,
    ) -> Result<String, FailureReason> {
        let mut attempt = 1;
        loop {
            match self.fetcher.fetch(driver, submission).await {
                FetchResult::Success(text) => return Ok(text),
                FetchResult::Failure(reason) if attempt >= self.attempts => return Err(reason),
                FetchResult::Failure(reason) => {
                    warn!(
                        "{} 第 {}/{} 次下载失败: {}，{:?} 后重试...",
                        ctx, attempt, self.attempts, reason, self.retry_delay
                    );
                    sleep(self.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
