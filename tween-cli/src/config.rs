//! # Config 模块
//!
//! 宿主配置，集中管理调度器与帧循环的配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (tween.json)
//! 3. 默认值（最低）

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tween_runtime::SchedulerConfig;

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 调度器配置
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// 帧循环配置
    #[serde(default)]
    pub host: HostConfig,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// 帧循环配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 固定帧率
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// 最多运行的帧数，防止场景永不结束
    #[serde(default = "default_max_frames")]
    pub max_frames: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fps() -> u32 {
    60
}

fn default_max_frames() -> u32 {
    600
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            host: HostConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            max_frames: default_max_frames(),
        }
    }
}

impl HostConfig {
    /// 固定帧间隔（秒）
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }
}

impl AppConfig {
    /// 读取配置文件
    ///
    /// 文件不存在、无法读取或解析失败都返回错误，由调用方决定是否回退到默认配置。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.fps == 0 {
            return Err(ConfigError::ValidationFailed("fps 必须大于 0".to_string()));
        }
        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::ValidationFailed(format!(
                "未知的日志级别: {}",
                self.log_level
            )));
        }
        self.scheduler.validate()?;
        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {0:?}")]
    NotFound(PathBuf),

    #[error("配置 IO 错误: {0}")]
    Io(#[from] io::Error),

    #[error("配置解析失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("配置验证失败: {0}")]
    ValidationFailed(String),

    #[error(transparent)]
    Scheduler(#[from] tween_runtime::ConfigError),
}
