//! # tween-cli - 无窗口宿主
//!
//! 以固定帧步长驱动 `tween-runtime`，把每帧的采样值输出到标准输出。
//!
//! ```text
//! tween-cli --scenario rotate --fps 30
//! tween-cli --config tween.json --scenario chain --log-level debug
//! ```

mod config;
mod scenarios;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tween_runtime::Scheduler;

use config::{AppConfig, ConfigError};
use scenarios::Scenario;

#[derive(Parser)]
#[command(name = "tween-cli")]
#[command(about = "无窗口宿主 - 以固定帧步长运行 tween 演示场景")]
#[command(version)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "tween.json")]
    config: PathBuf,

    /// 要运行的场景
    #[arg(short, long, value_enum, default_value = "fade")]
    scenario: Scenario,

    /// 帧率（覆盖配置文件）
    #[arg(long)]
    fps: Option<u32>,

    /// 最大帧数（覆盖配置文件）
    #[arg(long)]
    max_frames: Option<u32>,

    /// 日志级别（覆盖配置文件）
    #[arg(long)]
    log_level: Option<String>,

    /// 把最终生效的配置写入该路径后退出
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("tween-cli error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 日志级别需要在读取配置后才能确定，读取结果先留着
    let loaded = AppConfig::load(&cli.config);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => AppConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(fps) = cli.fps {
        config.host.fps = fps;
    }
    if let Some(max_frames) = cli.max_frames {
        config.host.max_frames = max_frames;
    }

    let level: tracing::Level = config
        .log_level
        .parse()
        .with_context(|| format!("未知的日志级别: {}", config.log_level))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match loaded {
        Ok(_) => info!(path = ?cli.config, "配置文件加载成功"),
        Err(ConfigError::NotFound(path)) => {
            warn!(?path, "配置文件不存在，使用默认配置");
        }
        Err(e) => warn!(error = %e, "配置文件读取失败，使用默认配置"),
    }

    config.validate().context("配置无效")?;

    if let Some(path) = cli.save_config {
        config
            .save(&path)
            .with_context(|| format!("无法写入配置: {path:?}"))?;
        info!(?path, "配置已保存");
        return Ok(());
    }

    let scheduler = Scheduler::with_config(config.scheduler.clone());
    let probes = cli.scenario.setup(&scheduler);
    info!(
        scenario = ?cli.scenario,
        fps = config.host.fps,
        fault_policy = ?config.scheduler.fault_policy,
        "开始运行"
    );

    let stdout = io::stdout();
    let summary = scenarios::run(&scheduler, &probes, &config.host, &mut stdout.lock())?;
    info!(
        frames = summary.frames,
        completed = summary.completed,
        killed = summary.killed,
        faulted = summary.faulted,
        "运行结束"
    );

    if summary.truncated {
        let killed = scheduler.kill_all();
        warn!(killed, "仍有未结束的 tween，已取消");
    }
    Ok(())
}
