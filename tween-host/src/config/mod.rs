//! # Config 模块
//!
//! 宿主配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use tween_runtime::SchedulerConfig;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 帧率（Hz）
    #[serde(default = "default_tick_rate")]
    pub tick_rate: f32,

    /// 游戏时间缩放
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,

    /// 场景最长运行时间（秒，真实时间）
    ///
    /// 超时后停止执行并在报告中标记。
    #[serde(default = "default_max_duration")]
    pub max_duration: f32,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 调度器配置
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

fn default_tick_rate() -> f32 {
    60.0
}

fn default_time_scale() -> f32 {
    1.0
}

fn default_max_duration() -> f32 {
    30.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
            time_scale: default_time_scale(),
            max_duration: default_max_duration(),
            log_level: default_log_level(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl AppConfig {
    /// 读取并解析配置文件
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(config) => {
                info!(path = %path.display(), "配置文件加载成功");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "配置文件加载失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 每帧的真实时长（秒）
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.tick_rate
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "帧率必须大于 0，当前为 {}",
                self.tick_rate
            )));
        }

        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "时间缩放不能为负，当前为 {}",
                self.time_scale
            )));
        }

        if !self.max_duration.is_finite() || self.max_duration <= 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "最长运行时间必须大于 0，当前为 {}",
                self.max_duration
            )));
        }

        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::ValidationFailed(format!(
                "无效的日志级别 '{}'",
                self.log_level
            )));
        }

        // 调度器配置
        if self.scheduler.speed_ceiling.is_nan() || self.scheduler.speed_ceiling <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "speed_ceiling 必须大于 0".to_string(),
            ));
        }

        if !self.scheduler.completion_epsilon.is_finite() || self.scheduler.completion_epsilon < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "completion_epsilon 不能为负".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件不存在
    #[error("配置文件不存在: {0:?}")]
    NotFound(PathBuf),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析/序列化失败
    #[error("配置解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
