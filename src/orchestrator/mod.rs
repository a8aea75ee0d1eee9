//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! run_controller (持有 Session / RunSummary，遍历 Vec<Section>)
//!     ↓
//! section_processor (遍历 Vec<Submission>)
//!     ↓
//! workflow::SubmissionFlow (处理单道题：下载 → 保存)
//!     ↓
//! services (能力层：session / catalog / fetch / storage / report)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```
//!
//! 只有编排层持有浏览器会话；单题失败在这一层被记录，不向上传播。

pub mod run_controller;
pub mod section_processor;

pub use run_controller::App;
pub use section_processor::process_section;
