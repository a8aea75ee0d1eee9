//! 下载与保存的结果

use crate::error::FailureReason;

/// 单题下载结果，每道题恰好产生一个
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// 渲染完成的答案文本，原样保留空白和换行
    Success(String),
    Failure(FailureReason),
}

/// 保存结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// 写入了新内容；`replaced` 表示覆盖了已有文件
    Written { replaced: bool },
    /// 已有文件内容相同，未写入
    Unchanged,
}
