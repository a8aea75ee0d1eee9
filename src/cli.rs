//! 命令行参数
//!
//! 三种登录方式互斥：`--sessionid`、`--login`，两者都不给时进入手动登录。

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::services::LoginMode;

/// Download a user's CheckiO solutions through a real browser.
///
/// You can provide either the sessionid cookie of an already logged-in browser
/// session, or login details for the site. Omit both to log in manually in the
/// opened browser window and confirm in the terminal.
#[derive(Debug, Parser)]
#[command(name = "checkio_scrape", version)]
pub struct Cli {
    /// Folder to download to (defaults to the current directory)
    #[arg(short = 'd', long = "dest-dir", value_name = "PATH")]
    pub dest_dir: Option<PathBuf>,

    /// Log in using the sessionid cookie value (e.g. if you use third-party auth)
    #[arg(short = 's', long = "sessionid", value_name = "COOKIE", conflicts_with = "login")]
    pub session_id: Option<String>,

    /// Username and password to log in with
    #[arg(
        short = 'l',
        long = "login",
        num_args = 2,
        value_names = ["USERNAME", "PASSWORD"]
    )]
    pub login: Option<Vec<String>>,

    /// Print the list of items that could not be downloaded at the end
    #[arg(short = 'r', long)]
    pub report: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// TOML config file
    #[arg(short = 'c', long, value_name = "FILE", env = "CHECKIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show the browser window even when not logging in manually
    #[arg(long)]
    pub show_browser: bool,

    /// Connect to a browser already running with this remote-debugging port
    #[arg(long, value_name = "PORT")]
    pub browser_port: Option<u16>,

    /// File extension for saved solutions, e.g. `py`
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,
}

impl Cli {
    /// 根据参数确定登录方式
    pub fn login_mode(&self) -> LoginMode {
        if let Some(token) = &self.session_id {
            return LoginMode::Token(token.clone());
        }
        match self.login.as_deref() {
            Some([username, password]) => LoginMode::Credentials {
                username: username.clone(),
                password: password.clone(),
            },
            _ => LoginMode::Interactive,
        }
    }

    /// 用命令行参数覆盖配置
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.dest_dir {
            config.dest_dir = dir.clone();
        }
        if let Some(port) = self.browser_port {
            config.browser_debug_port = Some(port);
        }
        if let Some(ext) = &self.extension {
            config.file_extension = Some(ext.trim_start_matches('.').to_string());
        }
        if self.show_browser || matches!(self.login_mode(), LoginMode::Interactive) {
            config.headless = false;
        }
        config.report_failures |= self.report;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("checkio_scrape").chain(args.iter().copied()))
    }

    #[test]
    fn test_login_modes() {
        let token = parse(&["-s", "abc123"]).unwrap();
        assert_eq!(token.login_mode(), LoginMode::Token("abc123".to_string()));

        let creds = parse(&["--login", "bob", "hunter2"]).unwrap();
        assert_eq!(
            creds.login_mode(),
            LoginMode::Credentials {
                username: "bob".to_string(),
                password: "hunter2".to_string(),
            }
        );

        let manual = parse(&[]).unwrap();
        assert_eq!(manual.login_mode(), LoginMode::Interactive);
    }

    #[test]
    fn test_auth_modes_are_exclusive() {
        assert!(parse(&["-s", "abc", "-l", "bob", "pw"]).is_err());
    }

    #[test]
    fn test_login_needs_two_values() {
        assert!(parse(&["--login", "bob"]).is_err());
    }

    #[test]
    fn test_apply_overrides_config() {
        let cli = parse(&["-s", "tok", "-d", "out", "--extension", ".py", "-r"]).unwrap();
        let config = cli.apply(Config::default());

        assert_eq!(config.dest_dir, PathBuf::from("out"));
        assert_eq!(config.file_extension.as_deref(), Some("py"));
        // 重试次数等只能通过配置文件或环境变量修改
        assert_eq!(config.fetch_attempts, 3);
        assert!(config.report_failures);
        assert!(config.headless);
    }

    #[test]
    fn test_tuning_flags_are_not_accepted() {
        assert!(parse(&["--attempts", "1"]).is_err());
        assert!(parse(&["--fetch-timeout", "5"]).is_err());
    }

    #[test]
    fn test_interactive_forces_visible_browser() {
        let config = parse(&[]).unwrap().apply(Config::default());
        assert!(!config.headless);
    }
}
