//! # Scenario 模块
//!
//! JSON 场景格式：初始对象 + 按时间触发的步骤。
//!
//! ## 格式示例
//!
//! ```json
//! {
//!   "name": "fade",
//!   "objects": { "alice": { "alpha": 0.0 } },
//!   "steps": [
//!     { "at": 0.0, "action": "animate", "object": "alice", "property": "alpha",
//!       "to": 1.0, "duration": 0.5, "curve": "quad-out" },
//!     { "at": 1.0, "action": "sequence", "steps": [
//!       { "action": "animate", "object": "alice", "property": "position_x", "to": 100, "duration": 0.3 },
//!       { "action": "animate", "object": "alice", "property": "position_x", "to": 0, "duration": 0.3 }
//!     ] }
//!   ]
//! }
//! ```
//!
//! 场景在执行前整体校验：未知对象、属性或曲线名都会立即报错。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tween_runtime::{Curve, CurveError};

use crate::scene::{SceneObject, SceneObjectData};

/// 场景错误
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// 读取场景文件失败
    #[error("读取场景文件失败 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 场景 JSON 解析失败
    #[error("场景解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    /// 引用了未声明的对象
    #[error("未知对象 '{object}'")]
    UnknownObject { object: String },

    /// 引用了对象不支持的属性
    #[error("对象 '{object}' 没有属性 '{property}'")]
    UnknownProperty { object: String, property: String },

    /// 曲线名无效
    #[error("曲线错误: {0}")]
    Curve(#[from] CurveError),

    /// 步骤参数无效
    #[error("无效的步骤: {0}")]
    InvalidStep(String),

    /// 创建过渡失败
    #[error("创建过渡失败: {0}")]
    Transition(#[from] tween_runtime::TransitionError),

    /// 运行时启动失败
    #[error("运行时启动失败: {0}")]
    Runtime(std::io::Error),
}

/// 场景
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// 场景名
    #[serde(default)]
    pub name: String,

    /// 初始对象
    #[serde(default)]
    pub objects: BTreeMap<String, SceneObjectData>,

    /// 按时间触发的步骤
    #[serde(default)]
    pub steps: Vec<TimedStep>,
}

/// 带触发时间的步骤
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedStep {
    /// 触发时间（秒，真实时间）
    #[serde(default)]
    pub at: f32,

    #[serde(flatten)]
    pub step: Step,
}

/// 场景步骤
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// 启动属性过渡
    Animate(AnimateStep),
    /// 暂停某个属性上的过渡
    Pause { object: String, property: String },
    /// 停止某个属性上的过渡（吸附到终值）
    Stop { object: String, property: String },
    /// 暂停所有过渡
    PauseAll,
    /// 停止所有过渡
    StopAll,
    /// 设置游戏时间缩放
    SetTimeScale { scale: f32 },
    /// 暂停/恢复游戏时间
    SetPaused { paused: bool },
    /// 依次执行的子步骤，`animate` 默认等待完成后再继续
    Sequence { steps: Vec<Step> },
}

/// 属性过渡参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimateStep {
    pub object: String,
    pub property: String,

    /// 名义起点；省略时从实时值过渡到 `to`
    #[serde(default)]
    pub from: Option<f32>,

    pub to: f32,

    /// 时长（秒）
    #[serde(default = "default_duration")]
    pub duration: f32,

    /// 曲线名，如 `"quad-out"`
    #[serde(default = "default_curve")]
    pub curve: String,

    #[serde(default = "default_speed")]
    pub speed: f32,

    /// 使用真实时间（不受缩放与暂停影响）
    #[serde(default)]
    pub real_time: bool,

    /// 倒放
    #[serde(default)]
    pub rewind: bool,

    /// 在 `sequence` 中是否等待完成
    #[serde(default = "default_wait")]
    pub wait: bool,
}

fn default_duration() -> f32 {
    1.0
}

fn default_curve() -> String {
    "linear".to_string()
}

fn default_speed() -> f32 {
    1.0
}

fn default_wait() -> bool {
    true
}

impl AnimateStep {
    /// 解析曲线名
    pub fn curve(&self) -> Result<Curve, CurveError> {
        self.curve.parse()
    }
}

impl Scenario {
    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// 内置演示场景
    pub fn demo() -> Result<Self, ScenarioError> {
        Self::from_json(include_str!("../scenarios/demo.json"))
    }

    /// 按触发时间排序的步骤（同一时间保持声明顺序）
    pub fn ordered_steps(&self) -> Vec<&TimedStep> {
        let mut steps: Vec<&TimedStep> = self.steps.iter().collect();
        steps.sort_by(|a, b| a.at.total_cmp(&b.at));
        steps
    }

    /// 校验所有步骤
    pub fn validate(&self) -> Result<(), ScenarioError> {
        for timed in &self.steps {
            if !timed.at.is_finite() || timed.at < 0.0 {
                return Err(ScenarioError::InvalidStep(format!(
                    "触发时间必须是非负数，当前为 {}",
                    timed.at
                )));
            }
            self.validate_step(&timed.step)?;
        }
        Ok(())
    }

    fn validate_step(&self, step: &Step) -> Result<(), ScenarioError> {
        match step {
            Step::Animate(animate) => {
                self.validate_target(&animate.object, &animate.property)?;
                animate.curve()?;
                if !animate.duration.is_finite() || animate.duration < 0.0 {
                    return Err(ScenarioError::InvalidStep(format!(
                        "时长必须是非负数，当前为 {}",
                        animate.duration
                    )));
                }
                if !animate.speed.is_finite() || animate.speed <= 0.0 {
                    return Err(ScenarioError::InvalidStep(format!(
                        "速度必须大于 0，当前为 {}",
                        animate.speed
                    )));
                }
                Ok(())
            }
            Step::Pause { object, property } | Step::Stop { object, property } => {
                self.validate_target(object, property)
            }
            Step::SetTimeScale { scale } => {
                if !scale.is_finite() || *scale < 0.0 {
                    return Err(ScenarioError::InvalidStep(format!(
                        "时间缩放不能为负，当前为 {scale}"
                    )));
                }
                Ok(())
            }
            Step::Sequence { steps } => steps.iter().try_for_each(|s| self.validate_step(s)),
            Step::PauseAll | Step::StopAll | Step::SetPaused { .. } => Ok(()),
        }
    }

    fn validate_target(&self, object: &str, property: &str) -> Result<(), ScenarioError> {
        if !self.objects.contains_key(object) {
            return Err(ScenarioError::UnknownObject {
                object: object.to_string(),
            });
        }
        if !SceneObject::PROPERTIES.contains(&property) {
            return Err(ScenarioError::UnknownProperty {
                object: object.to_string(),
                property: property.to_string(),
            });
        }
        Ok(())
    }
}
