use std::process::ExitCode;

use anyhow::{Context, Result};
use checkio_scrape::cli::Cli;
use checkio_scrape::utils::logging;
use checkio_scrape::{App, AppError, Config, RunSummary};
use clap::Parser;
use tracing::{error, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 初始化日志
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(summary) if summary.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            error!("❌ {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<RunSummary> {
    // 加载配置
    let config = load_config(&cli).await?;
    let mode = cli.login_mode();
    logging::log_startup(&config, &mode);

    tokio::fs::create_dir_all(&config.dest_dir)
        .await
        .with_context(|| format!("无法创建保存目录: {}", config.dest_dir.display()))?;

    // 启动浏览器并登录；登录阶段被中断时浏览器随 future 一起被丢弃
    let app = tokio::select! {
        app = App::initialize(config.clone(), &mode) => app?,
        _ = tokio::signal::ctrl_c() => return Err(AppError::Interrupted.into()),
    };

    let summary = app.run().await?;

    logging::print_final_stats(&summary);
    if config.report_failures {
        logging::print_failure_report(&summary);
    } else if !summary.is_clean() {
        warn!("有 {} 道题目未能保存，使用 --report 查看清单", summary.failed());
    }

    Ok(summary)
}

async fn load_config(cli: &Cli) -> Result<Config> {
    let base = match &cli.config {
        Some(path) => Config::from_toml_file(path).await?,
        None => Config::default(),
    };
    let config = cli.apply(base.apply_env()?);
    config.validate()?;
    Ok(config)
}
