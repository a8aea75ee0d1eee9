//! 浏览器启动 / 连接

pub mod connection;
pub mod headless;

use anyhow::Result;

use crate::config::Config;
use crate::infrastructure::{BrowserOwnership, ChromiumDriver};

pub use connection::connect_to_browser;
pub use headless::launch_browser;

/// 按配置启动或连接浏览器，返回页面驱动
pub async fn open_driver(config: &Config) -> Result<ChromiumDriver> {
    let (browser, page, handler, ownership) = match config.browser_debug_port {
        Some(port) => {
            let (browser, page, handler) = connect_to_browser(port).await?;
            (browser, page, handler, BrowserOwnership::Connected)
        }
        None => {
            let (browser, page, handler) =
                launch_browser(config.headless, config.chrome_executable.as_deref()).await?;
            (browser, page, handler, BrowserOwnership::Launched)
        }
    };

    Ok(ChromiumDriver::new(
        browser,
        page,
        handler,
        ownership,
        config.navigation_timeout(),
        config.poll_interval(),
    ))
}
