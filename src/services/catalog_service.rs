//! 目录服务 - 业务能力层
//!
//! 只负责"列出分区和题目"能力：解析用户名、读取分区列表、读取分区内的题目

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{CatalogError, ConfigError, DriverError};
use crate::infrastructure::{Extract, ListItem, ListQuery, PageDriver, Scope, WaitCondition};
use crate::models::{Section, Submission};

/// 目录遍历服务
pub struct CatalogWalker<'a> {
    config: &'a Config,
    username_pattern: Regex,
    mission_pattern: Regex,
}

impl<'a> CatalogWalker<'a> {
    pub fn new(config: &'a Config) -> Result<Self, ConfigError> {
        let host = site_host(config.site_root());
        let username_pattern = build_pattern(&host, r"/user/(?P<username>[^/?#]+)/")?;
        let mission_pattern = build_pattern(&host, r"/mission/(?P<slug>[^/?#]+)/")?;

        Ok(Self {
            config,
            username_pattern,
            mission_pattern,
        })
    }

    /// 打开个人主页，从跳转后的地址中解析用户名
    ///
    /// 没登录时站点会跳到登录页，此时解析失败
    pub async fn resolve_username(&self, driver: &dyn PageDriver) -> Result<String, CatalogError> {
        let user_page = self.config.user_page();
        driver
            .navigate(&user_page)
            .await
            .map_err(|source| CatalogError::Driver {
                url: user_page.clone(),
                source,
            })?;

        let url = driver
            .current_url()
            .await
            .map_err(|source| CatalogError::Driver {
                url: user_page.clone(),
                source,
            })?;

        self.parse_username(&url)
            .ok_or(CatalogError::NotLoggedIn { url })
    }

    /// 列出所有分区（按页面顺序）
    pub async fn list_sections(&self, driver: &dyn PageDriver) -> Result<Vec<Section>, CatalogError> {
        let username = self.resolve_username(driver).await?;
        info!("✓ 当前用户: {}", username);

        let url = self.config.missions_page(&username);
        self.open(driver, &url).await?;

        let selectors = &self.config.selectors;
        let query = ListQuery {
            scope: None,
            items: selectors.section.clone(),
            label: Extract::text(Some(&selectors.section_header)),
            link: None,
        };
        let items = self.read_list(driver, &url, &query).await?;

        let sections: Vec<Section> = items
            .into_iter()
            .enumerate()
            .map(|(position, item)| Section {
                name: item.label.trim().to_string(),
                locator: url.clone(),
                position,
            })
            .collect();

        info!("✓ 找到 {} 个分区", sections.len());
        Ok(sections)
    }

    /// 列出分区内的题目（按页面顺序）
    pub async fn list_submissions(
        &self,
        driver: &dyn PageDriver,
        section: &Section,
    ) -> Result<Vec<Submission>, CatalogError> {
        self.open(driver, &section.locator).await?;

        let selectors = &self.config.selectors;
        let query = ListQuery {
            scope: Some(Scope {
                selector: selectors.section.clone(),
                index: section.position,
            }),
            items: selectors.submission.clone(),
            label: Extract::attr(&selectors.submission_title, &selectors.submission_title_attr),
            link: Some(Extract::attr(&selectors.submission_link, "href")),
        };
        let items = self.read_list(driver, &section.locator, &query).await?;

        let submissions: Vec<Submission> = items
            .into_iter()
            .filter_map(|item| self.to_submission(section, item))
            .collect();

        debug!("分区 '{}' 有 {} 道题目", section.name, submissions.len());
        Ok(submissions)
    }

    /// 从个人主页地址中提取用户名
    pub fn parse_username(&self, url: &str) -> Option<String> {
        self.username_pattern
            .captures(url)
            .and_then(|cap| cap.name("username"))
            .map(|m| m.as_str().to_string())
    }

    /// 从题目链接中提取短名
    pub fn parse_mission_slug(&self, href: &str) -> Option<String> {
        self.mission_pattern
            .captures(href)
            .and_then(|cap| cap.name("slug"))
            .map(|m| m.as_str().to_string())
    }

    fn to_submission(&self, section: &Section, item: ListItem) -> Option<Submission> {
        let title = item.label.trim().to_string();
        let Some(link) = item.link.filter(|l| !l.trim().is_empty()) else {
            warn!("分区 '{}' 中的题目 '{}' 没有链接，已跳过", section.name, title);
            return None;
        };

        let (name, locator) = match self.parse_mission_slug(&link) {
            Some(slug) => {
                let locator = self.config.solution_page(&slug);
                (slug, locator)
            }
            // 不是题目链接时用标题当文件名，直接打开原链接
            None => (title.clone(), link),
        };

        Some(Submission {
            section: section.name.clone(),
            title: if title.is_empty() { name.clone() } else { title },
            name,
            locator,
        })
    }

    /// 打开页面并等待分区结构出现
    async fn open(&self, driver: &dyn PageDriver, url: &str) -> Result<(), CatalogError> {
        driver
            .navigate(url)
            .await
            .map_err(|source| CatalogError::Driver {
                url: url.to_string(),
                source,
            })?;

        let selector = &self.config.selectors.section;
        let waited = self.config.catalog_timeout();
        let ready = driver
            .wait_until(&WaitCondition::ElementPresent(selector.clone()), waited)
            .await
            .map_err(|source| CatalogError::Driver {
                url: url.to_string(),
                source,
            })?;

        if !ready {
            return Err(CatalogError::StructureMissing {
                url: url.to_string(),
                selector: selector.clone(),
                waited,
            });
        }
        Ok(())
    }

    async fn read_list(
        &self,
        driver: &dyn PageDriver,
        url: &str,
        query: &ListQuery,
    ) -> Result<Vec<ListItem>, CatalogError> {
        driver.read_list(query).await.map_err(|source| match source {
            DriverError::ElementNotFound { selector } => CatalogError::StructureMissing {
                url: url.to_string(),
                selector,
                waited: self.config.catalog_timeout(),
            },
            source => CatalogError::Driver {
                url: url.to_string(),
                source,
            },
        })
    }
}

/// 站点主机名（去掉协议和 `www.`）
fn site_host(site_root: &str) -> String {
    let without_scheme = site_root
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(site_root);
    without_scheme
        .trim_start_matches("www.")
        .trim_end_matches('/')
        .to_string()
}

fn build_pattern(host: &str, path: &str) -> Result<Regex, ConfigError> {
    let pattern = format!(r"^https?://(?:www\.)?{}{}", regex::escape(host), path);
    Regex::new(&pattern).map_err(|e| ConfigError::Invalid {
        field: "site_url".to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> Section {
        Section {
            name: "Home".to_string(),
            locator: "https://checkio.org/user/bob/list/".to_string(),
            position: 0,
        }
    }

    #[test]
    fn test_parse_username() {
        let config = Config::default();
        let walker = CatalogWalker::new(&config).unwrap();

        assert_eq!(
            walker.parse_username("https://checkio.org/user/bob/").as_deref(),
            Some("bob")
        );
        assert_eq!(
            walker.parse_username("https://www.checkio.org/user/alice_99/list/").as_deref(),
            Some("alice_99")
        );
        // 未登录时跳转到登录页
        assert_eq!(
            walker.parse_username("https://checkio.org/profile/login/?next=/user/"),
            None
        );
        assert_eq!(walker.parse_username("https://checkio.org/user/"), None);
        assert_eq!(walker.parse_username("https://evil.example/user/bob/"), None);
    }

    #[test]
    fn test_parse_mission_slug() {
        let config = Config::default();
        let walker = CatalogWalker::new(&config).unwrap();

        assert_eq!(
            walker
                .parse_mission_slug("https://checkio.org/mission/fizz-buzz/")
                .as_deref(),
            Some("fizz-buzz")
        );
        assert_eq!(
            walker
                .parse_mission_slug("https://checkio.org/mission/fizz-buzz/solve/")
                .as_deref(),
            Some("fizz-buzz")
        );
        assert_eq!(walker.parse_mission_slug("https://checkio.org/forum/"), None);
    }

    #[test]
    fn test_to_submission_uses_slug_and_solve_page() {
        let config = Config::default();
        let walker = CatalogWalker::new(&config).unwrap();

        let submission = walker
            .to_submission(
                &section(),
                ListItem {
                    label: " Fizz Buzz ".to_string(),
                    link: Some("https://checkio.org/mission/fizz-buzz/".to_string()),
                },
            )
            .unwrap();

        assert_eq!(submission.name, "fizz-buzz");
        assert_eq!(submission.title, "Fizz Buzz");
        assert_eq!(submission.section, "Home");
        assert_eq!(submission.locator, "https://checkio.org/mission/fizz-buzz/solve/");
    }

    #[test]
    fn test_to_submission_falls_back_to_title() {
        let config = Config::default();
        let walker = CatalogWalker::new(&config).unwrap();

        let submission = walker
            .to_submission(
                &section(),
                ListItem {
                    label: "Add".to_string(),
                    link: Some("https://mirror.example/add".to_string()),
                },
            )
            .unwrap();
        assert_eq!(submission.name, "Add");
        assert_eq!(submission.locator, "https://mirror.example/add");

        let no_link = walker.to_submission(
            &section(),
            ListItem {
                label: "Orphan".to_string(),
                link: None,
            },
        );
        assert!(no_link.is_none());
    }

    #[test]
    fn test_site_host() {
        assert_eq!(site_host("https://www.checkio.org"), "checkio.org");
        assert_eq!(site_host("http://localhost:8000/"), "localhost:8000");
    }
}
