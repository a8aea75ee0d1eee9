//! 测试用的内存页面驱动
//!
//! 按地址预先写好每个页面的元素、文本和列表，所有等待立即返回当前状态
//! （条件不满足时等同于超时）。

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use checkio_scrape::config::Config;
use checkio_scrape::error::{DriverError, DriverResult};
use checkio_scrape::infrastructure::{ListItem, ListQuery, PageDriver, WaitCondition};

pub const SITE: &str = "https://checkio.org";
pub const USER: &str = "bob";
pub const TOKEN: &str = "valid-session";
pub const SOLUTION: &str = ".ace_line";

/// 测试配置：不等待、不重试
pub fn test_config(dest: &Path) -> Config {
    Config {
        dest_dir: dest.to_path_buf(),
        settle_interval_ms: 0,
        poll_interval_ms: 0,
        fetch_attempts: 1,
        retry_delay_secs: 0,
        ..Config::default()
    }
}

pub fn user_page() -> String {
    format!("{}/user/", SITE)
}

pub fn login_page() -> String {
    format!("{}/profile/login/", SITE)
}

pub fn missions_page() -> String {
    format!("{}/user/{}/list/", SITE, USER)
}

pub fn solve_page(slug: &str) -> String {
    format!("{}/mission/{}/solve/", SITE, slug)
}

#[derive(Debug, Default, Clone)]
pub struct FakePage {
    pub elements: HashSet<String>,
    pub texts: HashMap<String, String>,
    pub lists: HashMap<(Option<usize>, String), Vec<ListItem>>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub pages: HashMap<String, FakePage>,
    pub failing: HashSet<String>,
    pub credentials: Option<(String, String)>,
    pub logged_in: bool,
    pub current_url: String,
    pub cookies: Vec<(String, String)>,
    pub filled: HashMap<String, String>,
    pub navigations: Vec<String>,
    pub text_reads: HashMap<String, usize>,
    /// 每次读取依次返回的文本（用完后回到页面上的固定文本）
    pub scripted_reads: HashMap<String, Vec<DriverResult<String>>>,
    pub shutdowns: usize,
}

/// 内存页面驱动，克隆后共享状态
#[derive(Clone, Default)]
pub struct FakeDriver {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        let driver = Self::default();
        driver.with(|s| {
            s.pages.insert(login_page(), FakePage::default());
            s.pages.insert(format!("{}/user/{}/", SITE, USER), FakePage::default());
        });
        driver
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn boxed(&self) -> Box<dyn PageDriver> {
        Box::new(self.clone())
    }

    /// 设定分区列表：每个分区是 (名称, [(题目短名, 答案)])，答案为 None 表示渲染不出来
    pub fn with_catalog(self, sections: &[(&str, &[(&str, Option<&str>)])]) -> Self {
        self.with(|s| {
            let mut list_page = FakePage::default();
            list_page.elements.insert(".section".to_string());
            list_page.lists.insert(
                (None, ".section".to_string()),
                sections
                    .iter()
                    .map(|(name, _)| ListItem {
                        label: name.to_string(),
                        link: None,
                    })
                    .collect(),
            );

            for (position, (_, missions)) in sections.iter().enumerate() {
                list_page.lists.insert(
                    (Some(position), ".block_progress_main".to_string()),
                    missions
                        .iter()
                        .map(|(slug, _)| ListItem {
                            label: format!("Mission {}", slug),
                            link: Some(format!("{}/mission/{}/", SITE, slug)),
                        })
                        .collect(),
                );

                for (slug, text) in missions.iter() {
                    let mut page = FakePage::default();
                    if let Some(text) = text {
                        page.elements.insert(SOLUTION.to_string());
                        page.texts.insert(SOLUTION.to_string(), text.to_string());
                    }
                    s.pages.insert(solve_page(slug), page);
                }
            }

            s.pages.insert(missions_page(), list_page);
        });
        self
    }

    pub fn logged_in(self) -> Self {
        self.with(|s| s.logged_in = true);
        self
    }

    pub fn accepting(self, username: &str, password: &str) -> Self {
        self.with(|s| s.credentials = Some((username.to_string(), password.to_string())));
        self
    }

    pub fn failing(self, url: &str) -> Self {
        self.with(|s| {
            s.failing.insert(url.to_string());
        });
        self
    }

    pub fn navigations_to(&self, url: &str) -> usize {
        self.with(|s| s.navigations.iter().filter(|u| u.as_str() == url).count())
    }

    pub fn shutdowns(&self) -> usize {
        self.with(|s| s.shutdowns)
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.with(|s| {
            s.navigations.push(url.to_string());
            if s.failing.contains(url) {
                return Err(DriverError::navigation(url, "HTTP 500"));
            }

            s.current_url = if url == user_page() {
                if s.logged_in {
                    format!("{}/user/{}/", SITE, USER)
                } else {
                    format!("{}?next=/user/", login_page())
                }
            } else {
                url.to_string()
            };
            Ok(())
        })
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok(self.with(|s| s.current_url.clone()))
    }

    async fn inject_cookie(&self, name: &str, value: &str) -> DriverResult<()> {
        self.with(|s| {
            s.cookies.push((name.to_string(), value.to_string()));
            s.logged_in = name == "sessionid" && value == TOKEN;
        });
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> DriverResult<()> {
        self.with(|s| {
            if !s.current_url.starts_with(&login_page()) {
                return Err(DriverError::element_not_found(selector));
            }
            s.filled.insert(selector.to_string(), value.to_string());
            Ok(())
        })
    }

    async fn click(&self, selector: &str) -> DriverResult<()> {
        self.with(|s| {
            if !s.current_url.starts_with(&login_page()) {
                return Err(DriverError::element_not_found(selector));
            }
            let user = s.filled.get("#id_username").cloned().unwrap_or_default();
            let pass = s.filled.get("#id_password").cloned().unwrap_or_default();
            if s.credentials.as_ref() == Some(&(user, pass)) {
                s.logged_in = true;
                s.current_url = format!("{}/user/{}/", SITE, USER);
            }
            Ok(())
        })
    }

    async fn wait_until(&self, condition: &WaitCondition, _timeout: Duration) -> DriverResult<bool> {
        Ok(self.with(|s| {
            let page = s.pages.get(&s.current_url);
            match condition {
                WaitCondition::ElementPresent(sel) => page.is_some_and(|p| p.elements.contains(sel)),
                WaitCondition::NonEmptyText(sel) => page
                    .and_then(|p| p.texts.get(sel))
                    .is_some_and(|t| !t.trim().is_empty()),
                WaitCondition::UrlLeaves(prefix) => !s.current_url.starts_with(prefix.as_str()),
            }
        }))
    }

    async fn read_text(&self, selector: &str) -> DriverResult<String> {
        self.with(|s| {
            let url = s.current_url.clone();
            *s.text_reads.entry(url.clone()).or_default() += 1;

            if let Some(script) = s.scripted_reads.get_mut(&url) {
                if !script.is_empty() {
                    return script.remove(0);
                }
            }

            s.pages
                .get(&url)
                .and_then(|p| p.texts.get(selector))
                .cloned()
                .ok_or_else(|| DriverError::element_not_found(selector))
        })
    }

    async fn read_list(&self, query: &ListQuery) -> DriverResult<Vec<ListItem>> {
        self.with(|s| {
            let key = (query.scope.as_ref().map(|scope| scope.index), query.items.clone());
            s.pages
                .get(&s.current_url)
                .and_then(|p| p.lists.get(&key))
                .cloned()
                .ok_or_else(|| DriverError::element_not_found(query.items.clone()))
        })
    }

    async fn shutdown(&self) -> DriverResult<()> {
        self.with(|s| s.shutdowns += 1);
        Ok(())
    }
}
