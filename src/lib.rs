//! # CheckiO Scrape
//!
//! 通过真实浏览器登录 CheckiO，把自己的答案按分区下载到本地
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Browser / Page），只暴露能力
//! - `PageDriver` - 导航、等待、读取、注入 cookie、关闭
//! - `ChromiumDriver` - 基于 chromiumoxide 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个分区 / 单道题
//! - `SessionEstablisher` - 三种登录方式
//! - `CatalogWalker` - 列出分区和题目
//! - `ArtifactFetcher` - 等待渲染并读取答案
//! - `SolutionStore` - 保存答案，内容相同则跳过
//! - `RunSummary` - 失败汇总
//!
//! ### ③ 流程层（Workflow）
//! - `SubmissionFlow` - 一道题的流程（下载 → 重试 → 保存）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/run_controller` - 持有会话，保证释放
//! - `orchestrator/section_processor` - 遍历分区内的题目

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, FailureReason};
pub use infrastructure::{ChromiumDriver, PageDriver};
pub use models::{FetchResult, PersistOutcome, Section, Submission, SubmissionKey};
pub use orchestrator::App;
pub use services::{LoginMode, RunSummary};
