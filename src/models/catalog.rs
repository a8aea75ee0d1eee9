//! 目录模型：分区 → 题目

use std::fmt::Display;

/// 分区
///
/// 按页面上的展示顺序枚举，枚举后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// 显示名称，同时是保存目录名（清理后）
    pub name: String,
    /// 分区所在页面
    pub locator: String,
    /// 在页面上的位置（从 0 开始）
    pub position: usize,
}

/// 题目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// 所属分区名称
    pub section: String,
    /// 文件名（通常是题目地址里的短名）
    pub name: String,
    /// 列表中显示的标题
    pub title: String,
    /// 答案页地址
    pub locator: String,
}

impl Submission {
    pub fn key(&self) -> SubmissionKey {
        SubmissionKey {
            section: self.section.clone(),
            name: self.name.clone(),
        }
    }
}

/// 题目标识，用于失败汇总
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionKey {
    pub section: String,
    pub name: String,
}

impl SubmissionKey {
    /// 分区题目列表无法读取时，用整个分区代替其中的题目
    pub fn whole_section(section: &Section) -> Self {
        Self {
            section: section.name.clone(),
            name: "*".to_string(),
        }
    }
}

impl Display for SubmissionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.section.is_empty() {
            write!(f, "(未命名分区): {}", self.name)
        } else {
            write!(f, "{}: {}", self.section, self.name)
        }
    }
}
