//! 会话服务 - 业务能力层
//!
//! 负责"登录"能力：手动登录、账号密码登录、注入会话 cookie 三选一

use std::fmt;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AuthError, DriverError};
use crate::infrastructure::{PageDriver, WaitCondition};

/// 登录方式
#[derive(Clone, PartialEq, Eq)]
pub enum LoginMode {
    /// 在浏览器中手动登录，完成后在终端确认
    Interactive,
    /// 填写登录表单
    Credentials { username: String, password: String },
    /// 直接注入会话 cookie
    Token(String),
}

impl LoginMode {
    pub fn label(&self) -> &'static str {
        match self {
            LoginMode::Interactive => "手动登录",
            LoginMode::Credentials { .. } => "账号密码",
            LoginMode::Token(_) => "会话 cookie",
        }
    }
}

// 不把密码和 cookie 打进日志
impl fmt::Debug for LoginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginMode::Interactive => write!(f, "Interactive"),
            LoginMode::Credentials { username, .. } => f
                .debug_struct("Credentials")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            LoginMode::Token(_) => write!(f, "Token(***)"),
        }
    }
}

/// 已登录的浏览器会话
///
/// 整次运行只有一个，由顶层编排器独占；无论成功失败都要调用 [`Session::release`]
pub struct Session {
    driver: Box<dyn PageDriver>,
    mode: &'static str,
}

impl Session {
    pub fn driver(&self) -> &dyn PageDriver {
        self.driver.as_ref()
    }

    /// 登录方式（仅用于日志）
    pub fn mode(&self) -> &'static str {
        self.mode
    }

    /// 关闭浏览器，释放会话
    pub async fn release(self) {
        if let Err(e) = self.driver.shutdown().await {
            warn!("释放浏览器会话失败: {}", e);
        }
        debug!("浏览器会话已释放");
    }
}

/// 会话建立服务
pub struct SessionEstablisher<'a> {
    config: &'a Config,
}

impl<'a> SessionEstablisher<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// 用指定方式登录并返回会话
    ///
    /// 登录失败时先关闭浏览器再返回错误
    pub async fn establish<R>(
        &self,
        driver: Box<dyn PageDriver>,
        mode: &LoginMode,
        operator: &mut R,
    ) -> Result<Session, AuthError>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        info!("🔑 登录方式: {}", mode.label());

        match self.login(driver.as_ref(), mode, operator).await {
            Ok(()) => Ok(Session {
                driver,
                mode: mode.label(),
            }),
            Err(e) => {
                if let Err(shutdown_err) = driver.shutdown().await {
                    warn!("登录失败后关闭浏览器出错: {}", shutdown_err);
                }
                Err(e)
            }
        }
    }

    async fn login<R>(
        &self,
        driver: &dyn PageDriver,
        mode: &LoginMode,
        operator: &mut R,
    ) -> Result<(), AuthError>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        match mode {
            LoginMode::Token(token) => {
                // cookie 要绑定到站点，先打开站点页面
                driver.navigate(&self.config.user_page()).await?;
                driver
                    .inject_cookie(&self.config.session_cookie_name, token)
                    .await?;
                info!("✓ 已注入会话 cookie ({})", self.config.session_cookie_name);
                Ok(())
            }
            LoginMode::Credentials { username, password } => {
                self.submit_login_form(driver, username, password).await
            }
            LoginMode::Interactive => self.wait_for_operator(driver, operator).await,
        }
    }

    async fn submit_login_form(
        &self,
        driver: &dyn PageDriver,
        username: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let selectors = &self.config.selectors;
        let login_page = self.config.login_page();

        driver.navigate(&login_page).await?;
        driver
            .fill(&selectors.login_username, username)
            .await
            .map_err(|e| form_error(&selectors.login_username, e))?;
        driver
            .fill(&selectors.login_password, password)
            .await
            .map_err(|e| form_error(&selectors.login_password, e))?;
        driver
            .click(&selectors.login_submit)
            .await
            .map_err(|e| form_error(&selectors.login_submit, e))?;
        debug!("登录表单已提交: {}", username);

        let waited = self.config.login_timeout();
        let logged_in = driver
            .wait_until(&WaitCondition::UrlLeaves(login_page), waited)
            .await?;
        if !logged_in {
            return Err(AuthError::NotLoggedIn { waited });
        }

        info!("✓ 账号 {} 登录成功", username);
        Ok(())
    }

    async fn wait_for_operator<R>(&self, driver: &dyn PageDriver, operator: &mut R) -> Result<(), AuthError>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        driver.navigate(&self.config.login_page()).await?;
        info!("👉 请在打开的浏览器中登录，完成后回到这里按回车继续");

        let waited = self.config.interactive_timeout();
        let mut line = String::new();
        match tokio::time::timeout(waited, operator.read_line(&mut line)).await {
            Err(_) => Err(AuthError::OperatorTimeout { waited }),
            Ok(Err(e)) => Err(AuthError::OperatorInput(e)),
            Ok(Ok(0)) => Err(AuthError::OperatorGone),
            Ok(Ok(_)) => {
                info!("✓ 已确认手动登录");
                Ok(())
            }
        }
    }
}

fn form_error(selector: &str, err: DriverError) -> AuthError {
    match err {
        DriverError::ElementNotFound { .. } => AuthError::FormMissing {
            selector: selector.to_string(),
            source: err,
        },
        other => AuthError::Driver(other),
    }
}
