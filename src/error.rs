use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
///
/// 只有会终止整次运行的错误才出现在这里；单个题目的失败用 [`FailureReason`] 表示，
/// 记录到汇总里后继续处理下一题。
#[derive(Debug, Error)]
pub enum AppError {
    /// 登录失败（致命，遍历开始前终止）
    #[error("登录失败: {0}")]
    Authentication(#[from] AuthError),
    /// 题目目录解析失败（顶层目录失败时致命）
    #[error("目录解析失败: {0}")]
    CatalogParse(#[from] CatalogError),
    /// 浏览器驱动错误
    #[error("浏览器错误: {0}")]
    Driver(#[from] DriverError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 用户中断（Ctrl-C）
    #[error("运行被用户中断")]
    Interrupted,
}

/// 登录相关错误
#[derive(Debug, Error)]
pub enum AuthError {
    /// 登录表单元素不存在
    #[error("登录页缺少表单元素 {selector}: {source}")]
    FormMissing {
        selector: String,
        #[source]
        source: DriverError,
    },
    /// 提交表单后在限定时间内未进入登录状态
    #[error("提交登录表单后 {waited:?} 内仍未登录")]
    NotLoggedIn { waited: Duration },
    /// 等待用户手动登录超时
    #[error("等待手动登录确认超时 ({waited:?})")]
    OperatorTimeout { waited: Duration },
    /// 读取用户确认输入失败
    #[error("读取确认输入失败: {0}")]
    OperatorInput(#[from] std::io::Error),
    /// 标准输入已关闭，无人确认登录
    #[error("标准输入已关闭，无法确认手动登录")]
    OperatorGone,
    /// 会话建立过程中浏览器出错
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// 目录（分区 / 题目列表）解析错误
#[derive(Debug, Error)]
pub enum CatalogError {
    /// 无法从跳转后的地址中解析用户名（通常意味着没有登录）
    #[error("无法从地址 {url} 解析用户名，可能未登录")]
    NotLoggedIn { url: String },
    /// 等待后页面仍没有预期的列表结构
    #[error("页面 {url} 在 {waited:?} 内未出现列表结构 {selector}")]
    StructureMissing {
        url: String,
        selector: String,
        waited: Duration,
    },
    /// 浏览器出错
    #[error("读取页面 {url} 失败: {source}")]
    Driver {
        url: String,
        #[source]
        source: DriverError,
    },
}

/// 浏览器驱动错误
#[derive(Debug, Error)]
pub enum DriverError {
    /// 导航失败（网络错误 / 超时 / HTTP 错误状态）
    #[error("导航到 {url} 失败: {reason}")]
    Navigation { url: String, reason: String },
    /// 页面上找不到元素
    #[error("找不到元素: {selector}")]
    ElementNotFound { selector: String },
    /// 执行脚本失败
    #[error("执行脚本失败: {0}")]
    Script(String),
    /// 设置 cookie 失败
    #[error("设置 cookie {name} 失败: {reason}")]
    Cookie { name: String, reason: String },
    /// 浏览器已关闭
    #[error("浏览器已关闭")]
    Closed,
}

impl From<chromiumoxide::error::CdpError> for DriverError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        DriverError::Script(err.to_string())
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Script(format!("脚本返回值无法解析: {}", err))
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值无效
    #[error("配置项 {field} 无效: {reason}")]
    Invalid { field: String, reason: String },
}

/// 持久化错误
#[derive(Debug, Error)]
pub enum PersistError {
    /// 读取已有文件失败
    #[error("读取文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 创建目录失败
    #[error("创建目录失败 ({}): {source}", path.display())]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 单个题目失败的原因
///
/// 这些错误只影响当前题目：记录到 `RunSummary` 后继续。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// 在限定时间内页面没有渲染出非空且稳定的答案
    #[error("等待页面渲染超时 ({waited:?})")]
    TimeoutExceeded { waited: Duration },
    /// 导航失败
    #[error("页面导航失败: {0}")]
    NavigationError(String),
    /// 文件写入失败
    #[error("文件写入失败: {0}")]
    IoError(String),
    /// 所在分区的题目列表无法解析
    #[error("分区题目列表解析失败: {0}")]
    CatalogParseError(String),
    /// 所在分区没有名称，无法确定保存目录
    #[error("所在分区没有名称")]
    UnnamedSection,
}

impl From<PersistError> for FailureReason {
    fn from(err: PersistError) -> Self {
        FailureReason::IoError(err.to_string())
    }
}

impl From<CatalogError> for FailureReason {
    fn from(err: CatalogError) -> Self {
        FailureReason::CatalogParseError(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl DriverError {
    /// 创建导航错误
    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        DriverError::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// 创建元素不存在错误
    pub fn element_not_found(selector: impl Into<String>) -> Self {
        DriverError::ElementNotFound {
            selector: selector.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 浏览器驱动结果类型
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_error_becomes_io_failure() {
        let err = PersistError::WriteFailed {
            path: PathBuf::from("Easy/Add"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        match FailureReason::from(err) {
            FailureReason::IoError(msg) => {
                assert!(msg.contains("Easy/Add"));
                assert!(msg.contains("denied"));
            }
            other => panic!("应该是 IoError: {:?}", other),
        }
    }

    #[test]
    fn test_auth_error_wraps_into_app_error() {
        let err: AppError = AuthError::NotLoggedIn {
            waited: Duration::from_secs(30),
        }
        .into();

        assert!(matches!(err, AppError::Authentication(_)));
        assert!(err.to_string().starts_with("登录失败"));
    }
}
