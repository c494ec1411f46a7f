//! # Tween Host
//!
//! 以固定帧率执行 JSON 过渡场景，并以 JSON 输出执行报告。
//!
//! ## 用法
//!
//! ```bash
//! # 执行内置演示场景
//! cargo run -p tween-host
//!
//! # 执行指定场景
//! cargo run -p tween-host -- --scenario tween-host/scenarios/demo.json --print-events
//! cargo run -p tween-host -- --scenario fade.json --tick-rate 30 --log-level debug
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use tween_host::{AppConfig, ConfigError, Scenario, ScenarioRunner, init_logging};

#[derive(Parser)]
#[command(name = "tween-host")]
#[command(about = "过渡场景执行器 - 以固定帧率驱动过渡调度器")]
#[command(version)]
struct Cli {
    /// 配置文件（默认：config.json）
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 场景文件（省略时执行内置演示场景）
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// 日志级别，覆盖配置文件
    #[arg(long)]
    log_level: Option<String>,

    /// 帧率，覆盖配置文件
    #[arg(long)]
    tick_rate: Option<f32>,

    /// 以 info 级别输出每个过渡事件
    #[arg(long)]
    print_events: bool,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("tween-host error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 日志尚未初始化，先记下加载错误
    let (mut config, load_error) = match AppConfig::try_load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(tick_rate) = cli.tick_rate {
        config.tick_rate = tick_rate;
    }

    init_logging(&config.log_level)?;
    match load_error {
        None => info!(path = %cli.config.display(), "配置文件加载成功"),
        Some(ConfigError::NotFound(_)) => {
            info!(path = %cli.config.display(), "未找到配置文件，使用默认配置");
        }
        Some(e) => warn!(path = %cli.config.display(), error = %e, "配置文件加载失败，使用默认配置"),
    }
    config.validate()?;

    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::demo()?,
    };

    let report = ScenarioRunner::new(config)
        .with_print_events(cli.print_events)
        .run(&scenario)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
