//! # Scheduler 模块
//!
//! 过渡调度器：持有注册表、配置与事件队列，每帧推进所有运行中的过渡。
//!
//! 调度器是显式传递的上下文，不是全局状态；多个调度器互不影响。
//! `Scheduler` 是廉价的克隆句柄，过渡只持有调度器的弱引用，
//! 丢弃最后一个句柄即释放所有过渡。

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, error, warn};

use crate::binding::{Animatable, DelegateBinding, PropertyBinding, SharedValue, ValueBinding};
use crate::completion::TransitionOutcome;
use crate::config::SchedulerConfig;
use crate::error::TransitionResult;
use crate::key::TransitionKey;
use crate::registry::Registry;
use crate::time::Tick;
use crate::transition::Transition;

/// 过渡事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEvent {
    /// 过渡启动
    Started(TransitionKey),
    /// 过渡完成（到达边界或被 stop）
    Completed(TransitionKey),
    /// 过渡被取消
    Cancelled {
        key: TransitionKey,
        outcome: TransitionOutcome,
    },
}

impl TransitionEvent {
    pub(crate) fn finished(key: TransitionKey, outcome: TransitionOutcome) -> Self {
        match outcome {
            TransitionOutcome::Completed => Self::Completed(key),
            outcome => Self::Cancelled { key, outcome },
        }
    }

    /// 事件对应的键
    pub fn key(&self) -> TransitionKey {
        match self {
            Self::Started(key) | Self::Completed(key) | Self::Cancelled { key, .. } => *key,
        }
    }
}

pub(crate) struct SchedulerInner {
    pub(crate) registry: Registry,
    pub(crate) config: SchedulerConfig,
    pub(crate) events: Vec<TransitionEvent>,
    ticks: u64,
}

impl Drop for SchedulerInner {
    fn drop(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        warn!(count = self.registry.len(), "调度器被释放时仍有运行中的过渡");
        for transition in self.registry.drain() {
            transition.abandon();
        }
    }
}

/// 过渡调度器
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("active", &inner.registry.len())
            .field("config", &inner.config)
            .field("ticks", &inner.ticks)
            .finish()
    }
}

impl Scheduler {
    /// 使用默认配置创建调度器
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// 使用指定配置创建调度器
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                registry: Registry::new(),
                config,
                events: Vec::new(),
                ticks: 0,
            })),
        }
    }

    // ========== 工厂 ==========

    fn create(&self, key: TransitionKey, binding: Rc<dyn ValueBinding>) -> Transition {
        Transition::new(Rc::downgrade(&self.inner), key, binding)
    }

    /// 为共享绑定创建过渡，键由绑定的身份派生
    pub fn transition<B: ValueBinding + 'static>(&self, binding: Rc<B>) -> Transition {
        let key = TransitionKey::of_binding(&binding);
        self.create(key, binding)
    }

    /// 为 `SharedValue` 创建过渡，同一个值的所有克隆共享一个键
    pub fn transition_shared(&self, value: &SharedValue) -> Transition {
        self.create(value.key(), Rc::new(value.clone()))
    }

    /// 使用显式键创建过渡
    pub fn transition_keyed(
        &self,
        binding: impl ValueBinding + 'static,
        key: impl Into<TransitionKey>,
    ) -> Transition {
        self.create(key.into(), Rc::new(binding))
    }

    /// 由 getter/setter 闭包创建过渡
    pub fn transition_with(
        &self,
        getter: impl Fn() -> f32 + 'static,
        setter: impl Fn(f32) + 'static,
        key: impl Into<TransitionKey>,
    ) -> Transition {
        self.transition_keyed(DelegateBinding::new(getter, setter), key)
    }

    /// 为对象的某个属性创建过渡，键由对象身份与属性名派生
    ///
    /// 属性不存在时立即返回错误。
    pub fn transition_property<T: Animatable>(
        &self,
        object: &Rc<T>,
        property: &str,
    ) -> TransitionResult<Transition> {
        let binding = PropertyBinding::new(object, property)?;
        let key = TransitionKey::of_property(object, property);
        Ok(self.create(key, Rc::new(binding)))
    }

    // ========== 推进 ==========

    /// 推进一帧，返回并清空事件队列
    ///
    /// 只推进帧开始时已登记、且轮到时仍登记为同一实例的过渡；
    /// 本帧内新启动的过渡从下一帧开始推进。
    pub fn tick(&self, tick: Tick) -> Vec<TransitionEvent> {
        let (transitions, completion_epsilon) = {
            let mut inner = self.inner.borrow_mut();
            inner.ticks += 1;
            (inner.registry.all(), inner.config.completion_epsilon)
        };

        for transition in transitions {
            let key = transition.key();
            let registered = self.inner.borrow().registry.find(key);
            match registered {
                Some(current) if current.ptr_eq(&transition) => {
                    transition.advance(&tick, completion_epsilon);
                }
                _ if transition.is_running() => {
                    error!(key = %key, "运行中的过渡不在注册表中，跳过");
                }
                _ => {}
            }
        }

        self.drain_events()
    }

    // ========== 查询 ==========

    /// 按键查找运行中的过渡
    pub fn find(&self, key: impl Into<TransitionKey>) -> Option<Transition> {
        self.inner.borrow().registry.find(key.into())
    }

    /// 所有运行中的过渡（按启动顺序）
    pub fn all(&self) -> Vec<Transition> {
        self.inner.borrow().registry.all()
    }

    /// 运行中的过渡数量
    pub fn active_count(&self) -> usize {
        self.inner.borrow().registry.len()
    }

    /// 是否没有运行中的过渡
    pub fn is_idle(&self) -> bool {
        self.inner.borrow().registry.is_empty()
    }

    /// 当前配置
    pub fn config(&self) -> SchedulerConfig {
        self.inner.borrow().config
    }

    /// 替换配置
    pub fn set_config(&self, config: SchedulerConfig) {
        self.inner.borrow_mut().config = config;
    }

    /// 已推进的帧数
    pub fn ticks(&self) -> u64 {
        self.inner.borrow().ticks
    }

    /// 取出所有待处理事件
    pub fn drain_events(&self) -> Vec<TransitionEvent> {
        std::mem::take(&mut self.inner.borrow_mut().events)
    }

    // ========== 批量控制 ==========

    /// 暂停所有过渡
    pub fn pause_all(&self) {
        self.clear_all(false, false);
    }

    /// 停止所有过渡（吸附到终值并调用完成回调）
    pub fn stop_all(&self) {
        self.clear_all(true, true);
    }

    /// 结束所有运行中的过渡
    ///
    /// - `snap`: 是否吸附到终值，吸附时结局为 `Completed`，否则为 `Paused`
    /// - `notify`: 是否调用完成回调
    pub fn clear_all(&self, snap: bool, notify: bool) {
        let transitions = self.all();
        if transitions.is_empty() {
            return;
        }

        let outcome = if snap {
            TransitionOutcome::Completed
        } else {
            TransitionOutcome::Paused
        };
        debug!(count = transitions.len(), snap, notify, "结束所有过渡");
        for transition in transitions {
            transition.finish(outcome, snap, notify);
        }
    }
}
