//! 基础设施层：持有浏览器资源，只暴露页面能力

pub mod chromium_driver;
pub mod page_driver;

pub use chromium_driver::{BrowserOwnership, ChromiumDriver};
pub use page_driver::{Extract, ListItem, ListQuery, PageDriver, Scope, WaitCondition};
