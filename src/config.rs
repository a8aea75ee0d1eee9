use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 程序配置
///
/// 加载顺序：默认值 → TOML 配置文件 → 环境变量 → 命令行参数，后者覆盖前者。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 站点根地址（不带结尾的 `/`）
    pub site_url: String,
    /// 下载目录
    pub dest_dir: PathBuf,
    /// 保存文件的扩展名（不含 `.`），为空则不加扩展名
    pub file_extension: Option<String>,
    /// 是否以无头模式启动浏览器
    pub headless: bool,
    /// 浏览器可执行文件路径，为空时由 chromiumoxide 自动查找
    pub chrome_executable: Option<PathBuf>,
    /// 已运行浏览器的调试端口；设置后连接该浏览器而不是启动新的
    pub browser_debug_port: Option<u16>,
    /// 会话 cookie 名称
    pub session_cookie_name: String,
    /// 单题等待渲染的超时（秒）
    pub fetch_timeout_secs: u64,
    /// 目录页面等待列表出现的超时（秒）
    pub catalog_timeout_secs: u64,
    /// 提交登录表单后等待登录成功的超时（秒）
    pub login_timeout_secs: u64,
    /// 单次导航的超时（秒）
    pub navigation_timeout_secs: u64,
    /// 手动登录时等待用户确认的超时（秒）
    pub interactive_timeout_secs: u64,
    /// 轮询页面状态的间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 判断渲染稳定时两次读取之间的间隔（毫秒）
    pub settle_interval_ms: u64,
    /// 每道题最多尝试下载的次数
    pub fetch_attempts: usize,
    /// 两次尝试之间的等待（秒）
    pub retry_delay_secs: u64,
    /// 是否在结束时输出失败清单
    pub report_failures: bool,
    /// 站点的页面选择器
    pub selectors: SiteSelectors,
}

/// 站点页面结构相关的 CSS 选择器
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    pub login_username: String,
    pub login_password: String,
    pub login_submit: String,
    /// 分区容器
    pub section: String,
    /// 分区标题（相对分区容器）
    pub section_header: String,
    /// 题目条目（相对分区容器）
    pub submission: String,
    /// 题目标题所在元素（相对题目条目）
    pub submission_title: String,
    /// 题目标题所在属性
    pub submission_title_attr: String,
    /// 题目链接所在元素（相对题目条目）
    pub submission_link: String,
    /// 答案代码区域
    pub solution: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            login_username: "#id_username".to_string(),
            login_password: "#id_password".to_string(),
            login_submit: ".abuth__btn".to_string(),
            section: ".section".to_string(),
            section_header: ".section-header".to_string(),
            submission: ".block_progress_main".to_string(),
            submission_title: "img".to_string(),
            submission_title_attr: "title".to_string(),
            submission_link: "a".to_string(),
            solution: ".ace_line".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_url: "https://checkio.org".to_string(),
            dest_dir: PathBuf::from("."),
            file_extension: None,
            headless: true,
            chrome_executable: None,
            browser_debug_port: None,
            session_cookie_name: "sessionid".to_string(),
            fetch_timeout_secs: 20,
            catalog_timeout_secs: 20,
            login_timeout_secs: 30,
            navigation_timeout_secs: 30,
            interactive_timeout_secs: 600,
            poll_interval_ms: 250,
            settle_interval_ms: 500,
            fetch_attempts: 3,
            retry_delay_secs: 5,
            report_failures: false,
            selectors: SiteSelectors::default(),
        }
    }
}

impl Config {
    /// 从 TOML 文件加载配置，缺省字段取默认值
    pub async fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 用 `CHECKIO_*` 环境变量覆盖当前配置
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(v) = var("CHECKIO_SITE_URL") {
            self.site_url = v;
        }
        if let Some(v) = var("CHECKIO_DEST_DIR") {
            self.dest_dir = PathBuf::from(v);
        }
        if let Some(v) = var("CHECKIO_CHROME") {
            self.chrome_executable = Some(PathBuf::from(v));
        }
        if let Some(v) = var("CHECKIO_BROWSER_PORT") {
            self.browser_debug_port = Some(parse_var("CHECKIO_BROWSER_PORT", &v, "u16")?);
        }
        if let Some(v) = var("CHECKIO_HEADLESS") {
            self.headless = parse_var("CHECKIO_HEADLESS", &v, "bool")?;
        }
        if let Some(v) = var("CHECKIO_FETCH_TIMEOUT") {
            self.fetch_timeout_secs = parse_var("CHECKIO_FETCH_TIMEOUT", &v, "u64")?;
        }
        if let Some(v) = var("CHECKIO_FETCH_ATTEMPTS") {
            self.fetch_attempts = parse_var("CHECKIO_FETCH_ATTEMPTS", &v, "usize")?;
        }
        if let Some(v) = var("CHECKIO_RETRY_DELAY") {
            self.retry_delay_secs = parse_var("CHECKIO_RETRY_DELAY", &v, "u64")?;
        }
        Ok(self)
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "fetch_attempts".to_string(),
                reason: "至少需要尝试 1 次".to_string(),
            });
        }
        if !self.site_url.starts_with("http://") && !self.site_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "site_url".to_string(),
                reason: format!("'{}' 不是 http(s) 地址", self.site_url),
            });
        }
        Ok(())
    }

    /// 站点根地址（去掉结尾的 `/`）
    pub fn site_root(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }

    /// 个人主页，登录后会跳转到 `/user/{name}/`
    pub fn user_page(&self) -> String {
        format!("{}/user/", self.site_root())
    }

    /// 登录页
    pub fn login_page(&self) -> String {
        format!("{}/profile/login/", self.site_root())
    }

    /// 用户已完成题目的列表页
    pub fn missions_page(&self, username: &str) -> String {
        format!("{}/user/{}/list/", self.site_root(), username)
    }

    /// 题目的答案页
    pub fn solution_page(&self, slug: &str) -> String {
        format!("{}/mission/{}/solve/", self.site_root(), slug)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn interactive_timeout(&self) -> Duration {
        Duration::from_secs(self.interactive_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str, expected: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
        var_name: name.to_string(),
        value: value.to_string(),
        expected_type: expected.to_string(),
    })
}
