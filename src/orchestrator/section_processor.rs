//! 单个分区处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **列出题目**：读取分区内的题目列表，失败时整个分区记为一次失败
//! 2. **未命名分区**：无法确定保存目录，其中每道题都记为失败
//! 3. **遍历题目**：按页面顺序逐题委托 `SubmissionFlow`
//! 4. **统计输出**：记录新增 / 更新 / 未变化 / 失败数量

use tracing::{error, info, warn};

use crate::error::FailureReason;
use crate::infrastructure::PageDriver;
use crate::models::{PersistOutcome, Section, SubmissionKey};
use crate::services::{CatalogWalker, RunSummary};
use crate::workflow::{ProcessResult, SubmissionCtx, SubmissionFlow};

/// 分区处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SectionStats {
    pub saved: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// 处理单个分区
///
/// 单题失败只记录到 `summary`，不会中断分区
pub async fn process_section(
    driver: &dyn PageDriver,
    walker: &CatalogWalker<'_>,
    flow: &SubmissionFlow,
    section: &Section,
    section_index: usize,
    section_total: usize,
    summary: &mut RunSummary,
) -> SectionStats {
    let mut stats = SectionStats::default();

    let submissions = match walker.list_submissions(driver, section).await {
        Ok(submissions) => submissions,
        Err(e) => {
            error!(
                "[分区 {}/{}] ❌ 无法读取 '{}' 的题目列表: {}",
                section_index, section_total, section.name, e
            );
            summary.record(SubmissionKey::whole_section(section), e.into());
            stats.failed += 1;
            return stats;
        }
    };

    log_section_start(section_index, section_total, &section.name, submissions.len());

    if section.name.is_empty() {
        warn!("[分区 {}/{}] ⚠️ 分区没有名称，包含以下题目:", section_index, section_total);
        for submission in &submissions {
            warn!("-- {}", submission.title);
            if summary.record(submission.key(), FailureReason::UnnamedSection) {
                stats.failed += 1;
            }
        }
        return stats;
    }

    for (idx, submission) in submissions.iter().enumerate() {
        let ctx = SubmissionCtx::new(section_index, section_total, idx + 1, submissions.len());

        match flow.run(driver, section, submission, &ctx).await {
            ProcessResult::Saved(outcome) => {
                summary.record_saved(outcome);
                if outcome == PersistOutcome::Unchanged {
                    stats.unchanged += 1;
                } else {
                    stats.saved += 1;
                }
            }
            ProcessResult::Failed(reason) => {
                if summary.record(submission.key(), reason) {
                    stats.failed += 1;
                }
            }
        }
    }

    log_section_complete(section_index, section_total, &stats);
    stats
}

// ========== 日志辅助函数 ==========

fn log_section_start(section_index: usize, section_total: usize, name: &str, count: usize) {
    info!("\n{}", "─".repeat(60));
    info!(
        "[分区 {}/{}] 📂 {} ({} 道题目)",
        section_index, section_total, name, count
    );
}

fn log_section_complete(section_index: usize, section_total: usize, stats: &SectionStats) {
    info!(
        "[分区 {}/{}] 统计: 保存 {}, 未变化 {}, 失败 {}",
        section_index, section_total, stats.saved, stats.unchanged, stats.failed
    );
}
