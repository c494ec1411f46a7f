//! # Clock 模块
//!
//! 固定步长的帧时钟，为调度器产生 `Tick`。

use tween_runtime::Tick;

/// 固定步长帧时钟
///
/// - `unscaled_delta` 恒为 `1 / tick_rate`
/// - `delta = unscaled_delta * time_scale`，游戏暂停时为 0
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_delta: f32,
    time_scale: f32,
    paused: bool,
    frames: u64,
    real_elapsed: f64,
    game_elapsed: f64,
}

impl FrameClock {
    /// 创建时钟
    pub fn new(tick_rate: f32) -> Self {
        Self {
            frame_delta: 1.0 / tick_rate,
            time_scale: 1.0,
            paused: false,
            frames: 0,
            real_elapsed: 0.0,
            game_elapsed: 0.0,
        }
    }

    /// 设置时间缩放
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// 产生下一帧
    pub fn tick(&mut self) -> Tick {
        let scale = if self.paused { 0.0 } else { self.time_scale };
        let tick = Tick::scaled(self.frame_delta, scale);

        self.frames += 1;
        self.real_elapsed += f64::from(tick.unscaled_delta);
        self.game_elapsed += f64::from(tick.delta);
        tick
    }

    /// 暂停/恢复游戏时间
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// 游戏时间是否暂停
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// 设置时间缩放
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale;
    }

    /// 当前时间缩放
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// 每帧的真实时长（秒）
    pub fn frame_delta(&self) -> f32 {
        self.frame_delta
    }

    /// 已产生的帧数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 累计真实时间（秒）
    pub fn real_elapsed(&self) -> f64 {
        self.real_elapsed
    }

    /// 累计游戏时间（秒）
    pub fn game_elapsed(&self) -> f64 {
        self.game_elapsed
    }
}
