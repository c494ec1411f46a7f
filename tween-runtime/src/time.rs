//! # Time 模块
//!
//! 每帧时间输入与过渡的时间方向。

use serde::{Deserialize, Serialize};

/// 过渡使用的时间基准
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    /// 受宿主时间缩放影响的游戏时间
    #[default]
    Scaled,
    /// 不受缩放与暂停影响的真实时间
    Real,
}

/// 过渡的播放方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// 从起点播放到终点
    #[default]
    Forward,
    /// 从当前位置倒放回起点
    Rewind,
}

impl Direction {
    /// 计时器推进的符号
    pub fn sign(self) -> f32 {
        match self {
            Self::Forward => 1.0,
            Self::Rewind => -1.0,
        }
    }
}

/// 一帧的时间输入
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tick {
    /// 缩放后的帧间隔（秒）
    pub delta: f32,
    /// 未缩放的帧间隔（秒）
    pub unscaled_delta: f32,
}

impl Tick {
    /// 缩放与未缩放间隔相同的帧
    pub fn new(delta: f32) -> Self {
        Self {
            delta,
            unscaled_delta: delta,
        }
    }

    /// 按时间缩放构造帧
    pub fn scaled(unscaled_delta: f32, time_scale: f32) -> Self {
        Self {
            delta: unscaled_delta * time_scale,
            unscaled_delta,
        }
    }

    /// 按时间基准选择帧间隔
    pub fn delta_for(&self, time_base: TimeBase) -> f32 {
        match time_base {
            TimeBase::Scaled => self.delta,
            TimeBase::Real => self.unscaled_delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_delta_for() {
        let tick = Tick::scaled(0.1, 0.5);
        assert!((tick.delta_for(TimeBase::Scaled) - 0.05).abs() < 1e-6);
        assert_eq!(tick.delta_for(TimeBase::Real), 0.1);

        let paused = Tick::scaled(0.1, 0.0);
        assert_eq!(paused.delta_for(TimeBase::Scaled), 0.0);
        assert_eq!(paused.delta_for(TimeBase::Real), 0.1);
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Forward.sign(), 1.0);
        assert_eq!(Direction::Rewind.sign(), -1.0);
        assert_eq!(Direction::default(), Direction::Forward);
        assert_eq!(TimeBase::default(), TimeBase::Scaled);
    }
}
