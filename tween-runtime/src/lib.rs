//! # Tween Runtime
//!
//! 按键单飞的数值过渡调度器。
//!
//! ## 核心设计
//!
//! - 每个 `TransitionKey` 同一时刻最多有一个运行中的过渡，
//!   在同一键上启动新过渡会顶替旧过渡
//! - 新过渡启动时读取实时值并重定向，值不会跳变
//! - 调度器由宿主每帧调用 `tick` 推进，纯逻辑，不做 IO
//! - 单线程：所有句柄基于 `Rc`/`RefCell`，不实现 `Send`
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let scheduler = Scheduler::new();
//! let alpha = SharedValue::new(0.0);
//!
//! scheduler
//!     .transition_shared(&alpha)
//!     .modify(0.0, 1.0, 0.5)
//!     .with_ease(EaseFunction::Quadratic, EaseDirection::Out)
//!     .on_complete(|| println!("fade in done"))
//!     .run();
//!
//! // 宿主主循环
//! scheduler.tick(Tick::new(1.0 / 60.0));
//! ```
//!
//! ## 模块结构
//!
//! - `curve`: 缓动曲线（求值与反函数）
//! - `binding`: 值绑定接口
//! - `key`: 过渡键
//! - `registry`: 单飞注册表
//! - `transition`: 过渡状态机
//! - `scheduler`: 调度器与事件
//! - `completion`: 可等待的完成句柄
//! - `time`: 帧时间输入
//! - `config`: 调度器配置
//! - `error`: 错误类型

pub mod binding;
pub mod completion;
pub mod config;
pub mod curve;
pub mod error;
pub mod key;
pub mod registry;
pub mod scheduler;
pub mod time;
pub mod transition;

pub use binding::{Animatable, DelegateBinding, PropertyBinding, SharedValue, ValueBinding};
pub use completion::{Completion, TransitionOutcome};
pub use config::SchedulerConfig;
pub use curve::{Curve, EaseDirection, EaseFunction, inverse_lerp, lerp_unclamped};
pub use error::{BindingError, CurveError, TransitionError, TransitionResult};
pub use key::TransitionKey;
pub use registry::Registry;
pub use scheduler::{Scheduler, TransitionEvent};
pub use time::{Direction, Tick, TimeBase};
pub use transition::{Transition, TransitionState};
