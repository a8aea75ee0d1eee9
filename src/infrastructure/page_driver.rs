//! 页面驱动 - 基础设施层
//!
//! 浏览器在这里被抽象成一组最小的能力：导航、等待、读取、注入 cookie、关闭。
//! 上层只依赖 `dyn PageDriver`，不直接接触浏览器。

use std::time::Duration;

use async_trait::async_trait;

use crate::error::DriverResult;

/// 等待条件
///
/// 客户端脚本渲染是异步的，这里的每个条件都由驱动在超时内轮询判断。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// 页面上存在匹配选择器的元素
    ElementPresent(String),
    /// 所有匹配元素的文本拼接后去掉空白仍然非空
    NonEmptyText(String),
    /// 当前地址不再以给定前缀开头（例如已离开登录页）
    UrlLeaves(String),
}

/// 从元素中取值的方式
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extract {
    /// 相对条目元素的子选择器，为空表示条目本身
    pub selector: Option<String>,
    /// 读取的属性，为空表示读取渲染后的文本
    pub attribute: Option<String>,
}

impl Extract {
    /// 读取条目本身（或子元素）的渲染文本
    pub fn text(selector: Option<&str>) -> Self {
        Self {
            selector: selector.map(str::to_string),
            attribute: None,
        }
    }

    /// 读取子元素的属性
    pub fn attr(selector: &str, attribute: &str) -> Self {
        Self {
            selector: Some(selector.to_string()),
            attribute: Some(attribute.to_string()),
        }
    }
}

/// 列表范围：第 `index` 个匹配 `selector` 的元素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub selector: String,
    pub index: usize,
}

/// 结构化列表查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 只在该范围内查找；为空时在整个文档中查找
    pub scope: Option<Scope>,
    /// 条目选择器
    pub items: String,
    /// 条目的显示名称
    pub label: Extract,
    /// 条目的链接
    pub link: Option<Extract>,
}

/// 列表中的一个条目，按文档顺序返回
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListItem {
    pub label: String,
    pub link: Option<String>,
}

/// 页面驱动
///
/// 一个驱动只对应一个浏览器页面，不能被并发使用；所有等待都有上限。
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航到指定地址；网络错误、导航超时或 HTTP 错误状态都返回错误
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// 当前页面地址（跟随跳转后）
    async fn current_url(&self) -> DriverResult<String>;

    /// 向当前站点注入一个 cookie
    async fn inject_cookie(&self, name: &str, value: &str) -> DriverResult<()>;

    /// 在输入框中填入文本
    async fn fill(&self, selector: &str, value: &str) -> DriverResult<()>;

    /// 点击元素
    async fn click(&self, selector: &str) -> DriverResult<()>;

    /// 在 `timeout` 内轮询条件，满足返回 `true`，超时返回 `false`
    async fn wait_until(&self, condition: &WaitCondition, timeout: Duration) -> DriverResult<bool>;

    /// 读取所有匹配元素的渲染文本，按换行拼接；没有匹配元素时返回错误
    async fn read_text(&self, selector: &str) -> DriverResult<String>;

    /// 读取结构化列表；范围元素不存在时返回错误
    async fn read_list(&self, query: &ListQuery) -> DriverResult<Vec<ListItem>>;

    /// 关闭浏览器（或断开连接），释放资源
    async fn shutdown(&self) -> DriverResult<()>;
}
