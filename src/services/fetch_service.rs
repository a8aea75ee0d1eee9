//! 答案下载服务 - 业务能力层
//!
//! 只负责"下载一道题的答案"能力：打开答案页、等待渲染完成、读取代码文本。
//! 不做重试，重试由流程层决定。

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::Config;
use crate::error::FailureReason;
use crate::infrastructure::{PageDriver, WaitCondition};
use crate::models::{FetchResult, Submission};

/// 答案下载服务
pub struct ArtifactFetcher {
    solution_selector: String,
    timeout: Duration,
    settle_interval: Duration,
}

impl ArtifactFetcher {
    pub fn new(config: &Config) -> Self {
        Self {
            solution_selector: config.selectors.solution.clone(),
            timeout: config.fetch_timeout(),
            settle_interval: config.settle_interval(),
        }
    }

    /// 下载一道题的答案
    ///
    /// 页面加载后脚本会继续改写编辑器内容，所以要求答案区域非空，
    /// 并且相隔 `settle_interval` 的两次读取结果一致才算渲染完成。
    /// 真正为空的答案无法和"还没渲染完"区分，只能在超时后报告为超时。
    pub async fn fetch(&self, driver: &dyn PageDriver, submission: &Submission) -> FetchResult {
        if let Err(e) = driver.navigate(&submission.locator).await {
            return FetchResult::Failure(FailureReason::NavigationError(e.to_string()));
        }

        let deadline = Instant::now() + self.timeout;
        let condition = WaitCondition::NonEmptyText(self.solution_selector.clone());
        let mut previous: Option<String> = None;
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());

            match driver.wait_until(&condition, remaining).await {
                Ok(true) => match driver.read_text(&self.solution_selector).await {
                    Ok(text) if !text.trim().is_empty() => {
                        if previous.as_deref() == Some(text.as_str()) {
                            debug!(
                                "{} 渲染稳定 (第 {} 次读取, {} 字符)",
                                submission.name,
                                attempt,
                                text.chars().count()
                            );
                            return FetchResult::Success(text);
                        }
                        previous = Some(text);
                    }
                    Ok(_) => previous = None,
                    // 读取途中元素被脚本替换，视为尚未就绪
                    Err(e) => debug!("读取 {} 失败 (第 {} 次): {}", submission.name, attempt, e),
                },
                Ok(false) => return self.timed_out(),
                Err(e) => debug!("等待 {} 渲染时出错 (第 {} 次): {}", submission.name, attempt, e),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return self.timed_out();
            }
            sleep(self.settle_interval.min(remaining)).await;
        }
    }

    fn timed_out(&self) -> FetchResult {
        FetchResult::Failure(FailureReason::TimeoutExceeded {
            waited: self.timeout,
        })
    }
}
