//! # Config 模块
//!
//! 调度器配置。作为宿主配置文件的一部分从 JSON 加载，所有字段都有默认值。

use serde::{Deserialize, Serialize};

/// 调度器配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 速度上限：速度不低于此值的过渡在启动时立即完成
    #[serde(default = "default_speed_ceiling")]
    pub speed_ceiling: f32,

    /// 完成判定容差（秒）：计时器距边界小于此值时视为到达边界
    #[serde(default = "default_completion_epsilon")]
    pub completion_epsilon: f32,
}

fn default_speed_ceiling() -> f32 {
    100.0
}

fn default_completion_epsilon() -> f32 {
    1e-5
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            speed_ceiling: default_speed_ceiling(),
            completion_epsilon: default_completion_epsilon(),
        }
    }
}

impl SchedulerConfig {
    /// 设置速度上限
    pub fn with_speed_ceiling(mut self, speed_ceiling: f32) -> Self {
        self.speed_ceiling = speed_ceiling;
        self
    }

    /// 设置完成判定容差
    pub fn with_completion_epsilon(mut self, completion_epsilon: f32) -> Self {
        self.completion_epsilon = completion_epsilon;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.speed_ceiling, 100.0);
        assert_eq!(config.completion_epsilon, 1e-5);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SchedulerConfig = serde_json::from_str(r#"{"speed_ceiling": 20.0}"#).unwrap();
        assert_eq!(config.speed_ceiling, 20.0);
        assert_eq!(config.completion_epsilon, 1e-5);

        let config: SchedulerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SchedulerConfig::default());
    }
}
