//! # Tween Host
//!
//! 无界面的过渡宿主：加载 JSON 场景，以固定帧率驱动 `tween-runtime` 调度器，
//! 输出执行报告。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 配置加载与日志初始化
//! - 帧时钟（时间缩放、游戏暂停）
//! - 场景对象与属性绑定
//! - 场景步骤的定时触发与顺序执行
//!
//! 过渡的调度、顶替与完成逻辑全部在 `tween-runtime` 中。

pub mod clock;
pub mod config;
pub mod logging;
pub mod runner;
pub mod scenario;
pub mod scene;

pub use clock::FrameClock;
pub use config::{AppConfig, ConfigError};
pub use logging::init_logging;
pub use runner::{EventRecord, RunReport, ScenarioRunner};
pub use scenario::{AnimateStep, Scenario, ScenarioError, Step, TimedStep};
pub use scene::{Scene, SceneObject, SceneObjectData};
