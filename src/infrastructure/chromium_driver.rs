//! Chromium 页面驱动 - 基础设施层
//!
//! 持有唯一的 Browser / Page 资源，通过执行 JS 实现 [`PageDriver`] 的各项能力

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::{Browser, Page};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{DriverError, DriverResult};
use crate::infrastructure::page_driver::{
    Extract, ListItem, ListQuery, PageDriver, WaitCondition,
};

/// 浏览器的来源，决定关闭时的行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserOwnership {
    /// 由本程序启动，关闭时结束浏览器进程
    Launched,
    /// 连接到已有浏览器，关闭时只关闭自己创建的页面
    Connected,
}

/// Chromium 页面驱动
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 把导航 / 等待 / 读取翻译成 CDP 调用或页面内 JS
/// - 不认识分区 / 题目
pub struct ChromiumDriver {
    page: Page,
    browser: Mutex<Option<Browser>>,
    handler: std::sync::Mutex<Option<JoinHandle<()>>>,
    ownership: BrowserOwnership,
    navigation_timeout: Duration,
    poll_interval: Duration,
}

impl ChromiumDriver {
    /// 创建新的驱动
    pub fn new(
        browser: Browser,
        page: Page,
        handler: JoinHandle<()>,
        ownership: BrowserOwnership,
        navigation_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            page,
            browser: Mutex::new(Some(browser)),
            handler: std::sync::Mutex::new(Some(handler)),
            ownership,
            navigation_timeout,
            poll_interval,
        }
    }

    /// 执行 JS 代码并返回 JSON 结果
    async fn eval(&self, js_code: impl Into<String>) -> DriverResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> DriverResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 读取主文档的 HTTP 状态码，浏览器不支持时返回 0
    async fn response_status(&self) -> DriverResult<u16> {
        self.eval_as(
            r#"(() => {
                const entry = performance.getEntriesByType('navigation')[0];
                return entry && typeof entry.responseStatus === 'number' ? entry.responseStatus : 0;
            })()"#,
        )
        .await
    }

    /// 单次判断等待条件
    async fn check(&self, condition: &WaitCondition) -> DriverResult<bool> {
        self.eval_as(condition_js(condition)?).await
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        debug!("导航到: {}", url);

        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(DriverError::navigation(url, e)),
            Err(_) => {
                return Err(DriverError::navigation(
                    url,
                    format!("超过 {:?} 未完成", self.navigation_timeout),
                ))
            }
        }

        let status = self.response_status().await.unwrap_or(0);
        if status >= 400 {
            return Err(DriverError::navigation(url, format!("HTTP {}", status)));
        }
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.page.url().await?.ok_or(DriverError::Closed)
    }

    async fn inject_cookie(&self, name: &str, value: &str) -> DriverResult<()> {
        let url = self.current_url().await?;
        let cookie = CookieParam::builder()
            .name(name)
            .value(value)
            .url(url)
            .build()
            .map_err(|reason| DriverError::Cookie {
                name: name.to_string(),
                reason,
            })?;

        self.page
            .set_cookie(cookie)
            .await
            .map_err(|e| DriverError::Cookie {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        debug!("已注入 cookie: {}", name);
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> DriverResult<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::element_not_found(selector))?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> DriverResult<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::element_not_found(selector))?;
        element.click().await?;
        Ok(())
    }

    async fn wait_until(&self, condition: &WaitCondition, timeout: Duration) -> DriverResult<bool> {
        let satisfied = poll_until(timeout, self.poll_interval, || async move {
            self.check(condition).await.unwrap_or_else(|e| {
                // 页面脚本还在跑时执行上下文可能被替换，此时当作"尚未满足"
                debug!("判断条件 {:?} 失败: {}", condition, e);
                false
            })
        })
        .await;

        if satisfied {
            debug!("条件满足 {:?}", condition);
        }
        Ok(satisfied)
    }

    async fn read_text(&self, selector: &str) -> DriverResult<String> {
        let js_code = format!(
            r#"(() => {{
                const els = document.querySelectorAll({});
                if (els.length === 0) return null;
                return Array.from(els).map(el => el.innerText).join('\n');
            }})()"#,
            serde_json::to_string(selector)?
        );

        self.eval_as::<Option<String>>(js_code)
            .await?
            .ok_or_else(|| DriverError::element_not_found(selector))
    }

    async fn read_list(&self, query: &ListQuery) -> DriverResult<Vec<ListItem>> {
        let rows: Option<Vec<RawListItem>> = self.eval_as(list_js(query)?).await?;
        let rows = rows.ok_or_else(|| {
            let selector = query
                .scope
                .as_ref()
                .map(|s| format!("{}[{}]", s.selector, s.index))
                .unwrap_or_else(|| query.items.clone());
            DriverError::element_not_found(selector)
        })?;

        Ok(rows
            .into_iter()
            .map(|row| ListItem {
                label: row.label.unwrap_or_default(),
                link: row.link,
            })
            .collect())
    }

    async fn shutdown(&self) -> DriverResult<()> {
        let browser = self.browser.lock().await.take();

        if let Some(mut browser) = browser {
            match self.ownership {
                BrowserOwnership::Launched => {
                    info!("🛑 正在关闭浏览器...");
                    if let Err(e) = browser.close().await {
                        warn!("关闭浏览器失败: {}", e);
                    }
                    if let Err(e) = browser.wait().await {
                        warn!("等待浏览器进程退出失败: {}", e);
                    }
                }
                BrowserOwnership::Connected => {
                    info!("🛑 正在关闭页面并断开浏览器连接...");
                    if let Err(e) = self.page.clone().close().await {
                        warn!("关闭页面失败: {}", e);
                    }
                }
            }
        }

        if let Ok(mut handler) = self.handler.lock() {
            if let Some(handle) = handler.take() {
                handle.abort();
            }
        }
        Ok(())
    }
}

/// 在 `timeout` 内反复执行 `check`，直到返回 `true`
///
/// 单次检查也受剩余时间限制，卡住的 CDP 调用不会让等待超出期限
async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    loop {
        let remaining = timeout.saturating_sub(start.elapsed());
        if let Ok(true) = tokio::time::timeout(remaining, check()).await {
            return true;
        }

        let remaining = timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            return false;
        }
        sleep(interval.min(remaining)).await;
    }
}

#[derive(Debug, Deserialize)]
struct RawListItem {
    label: Option<String>,
    link: Option<String>,
}

/// 生成判断等待条件的 JS
fn condition_js(condition: &WaitCondition) -> DriverResult<String> {
    let js_code = match condition {
        WaitCondition::ElementPresent(selector) => format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        ),
        WaitCondition::NonEmptyText(selector) => format!(
            r#"Array.from(document.querySelectorAll({})).map(el => el.innerText).join('\n').trim().length > 0"#,
            serde_json::to_string(selector)?
        ),
        WaitCondition::UrlLeaves(prefix) => format!(
            "!window.location.href.startsWith({})",
            serde_json::to_string(prefix)?
        ),
    };
    Ok(js_code)
}

/// 生成读取列表的 JS
///
/// 范围元素不存在时返回 `null`，调用方据此报错
fn list_js(query: &ListQuery) -> DriverResult<String> {
    let (scope_selector, scope_index) = match &query.scope {
        Some(scope) => (serde_json::to_string(&scope.selector)?, scope.index.to_string()),
        None => ("null".to_string(), "0".to_string()),
    };
    let link = match &query.link {
        Some(extract) => extract_js(extract)?,
        None => "null".to_string(),
    };

    Ok(format!(
        r#"(() => {{
            const scopeSelector = {scope_selector};
            let root = document;
            if (scopeSelector !== null) {{
                root = document.querySelectorAll(scopeSelector)[{scope_index}];
                if (!root) return null;
            }}
            const pick = (item, sel, attr) => {{
                const el = sel === null ? item : item.querySelector(sel);
                if (!el) return null;
                if (attr === null) return el.innerText;
                if (attr === 'href' && el.href) return el.href;
                return el.getAttribute(attr);
            }};
            return Array.from(root.querySelectorAll({items})).map(item => ({{
                label: {label},
                link: {link},
            }}));
        }})()"#,
        items = serde_json::to_string(&query.items)?,
        label = extract_js(&query.label)?,
    ))
}

fn extract_js(extract: &Extract) -> DriverResult<String> {
    Ok(format!(
        "pick(item, {}, {})",
        serde_json::to_string(&extract.selector)?,
        serde_json::to_string(&extract.attribute)?
    ))
}
