//! 运行控制器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整运行的资源管理。
//!
//! 1. **应用初始化**：启动浏览器、建立登录会话
//! 2. **目录遍历**：列出分区，逐个委托 `section_processor`
//! 3. **资源管理**：唯一持有 `Session`，无论成功、失败还是 Ctrl-C 都会释放
//! 4. **全局统计**：持有 `RunSummary`，运行结束后交给调用方

use std::future::Future;

use anyhow::Result;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::PageDriver;
use crate::orchestrator::section_processor;
use crate::services::{CatalogWalker, LoginMode, RunSummary, Session, SessionEstablisher};
use crate::workflow::SubmissionFlow;

/// 应用主结构
pub struct App {
    config: Config,
    session: Session,
}

impl App {
    /// 启动浏览器并登录
    pub async fn initialize(config: Config, mode: &LoginMode) -> Result<Self> {
        let driver = browser::open_driver(&config).await?;
        let mut operator = BufReader::new(tokio::io::stdin());
        let app = Self::with_driver(config, Box::new(driver), mode, &mut operator).await?;
        Ok(app)
    }

    /// 使用给定的页面驱动登录
    ///
    /// 登录失败时驱动已被关闭
    pub async fn with_driver<R>(
        config: Config,
        driver: Box<dyn PageDriver>,
        mode: &LoginMode,
        operator: &mut R,
    ) -> AppResult<Self>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let session = SessionEstablisher::new(&config)
            .establish(driver, mode, operator)
            .await?;
        Ok(Self { config, session })
    }

    /// 运行到结束或收到 Ctrl-C
    pub async fn run(self) -> AppResult<RunSummary> {
        self.run_until(async {
            // 无法监听信号时不应被当成中断
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// 运行到结束或 `interrupt` 完成，两种情况都会释放会话
    pub async fn run_until<F>(self, interrupt: F) -> AppResult<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let outcome = tokio::select! {
            result = self.walk_catalog() => result,
            _ = interrupt => {
                warn!("⚠️ 收到中断信号，停止下载");
                Err(AppError::Interrupted)
            }
        };

        self.session.release().await;
        outcome
    }

    async fn walk_catalog(&self) -> AppResult<RunSummary> {
        let driver = self.session.driver();
        let walker = CatalogWalker::new(&self.config)?;

        info!("\n📁 正在读取题目目录 ({})...", self.session.mode());
        let sections = walker.list_sections(driver).await?;

        let flow = SubmissionFlow::new(&self.config);
        let mut summary = RunSummary::new();
        let total = sections.len();

        let mut incomplete = 0;

        for (idx, section) in sections.iter().enumerate() {
            let stats = section_processor::process_section(
                driver,
                &walker,
                &flow,
                section,
                idx + 1,
                total,
                &mut summary,
            )
            .await;
            if stats.failed > 0 {
                incomplete += 1;
            }
        }

        info!("✓ 已遍历 {} 个分区，其中 {} 个有失败的题目", total, incomplete);
        Ok(summary)
    }
}
