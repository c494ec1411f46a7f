//! # Transition 模块
//!
//! 单个过渡：配置、启动、逐帧推进、暂停/停止。
//!
//! ## 生命周期
//!
//! ```text
//! Configured --run--> Running --到达边界 / stop--> Finished(Completed)
//!                        |
//!                        +--pause / 被顶替 / 读写失败--> Finished(Paused | Superseded | Failed)
//! ```
//!
//! 终止后的过渡不占用注册表槽位，可以再次 `run`，每次运行有独立的 `Completion`。
//!
//! ## 重定向
//!
//! 启动时读取绑定的实时值，反推出 `effective_start` 与计时器位置，
//! 使下一次写入从实时值继续，而不是跳回名义起点。

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error, warn};

use crate::binding::ValueBinding;
use crate::completion::{self, Completion, Resolver, TransitionOutcome};
use crate::curve::{Curve, EaseDirection, EaseFunction, inverse_lerp, lerp_unclamped};
use crate::error::{BindingError, CurveError};
use crate::key::TransitionKey;
use crate::scheduler::{SchedulerInner, TransitionEvent};
use crate::time::{Direction, Tick, TimeBase};

/// 过渡状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    /// 已创建/已配置，尚未启动
    Configured,
    /// 已登记，逐帧推进中
    Running,
    /// 已终止
    Finished(TransitionOutcome),
}

type Callback = Rc<dyn Fn()>;

struct TransitionInner {
    key: TransitionKey,
    binding: Rc<dyn ValueBinding>,
    scheduler: Weak<RefCell<SchedulerInner>>,

    start: f32,
    end: f32,
    duration: f32,
    curve: Curve,
    speed: f32,
    time_base: TimeBase,
    direction: Direction,
    on_complete: Option<Callback>,

    state: TransitionState,
    elapsed: f32,
    effective_start: f32,
    resolver: Option<Resolver>,
}

/// 过渡句柄
///
/// 克隆开销很小，所有克隆共享同一个过渡实例。
/// 通过 `Scheduler` 的工厂方法创建。
#[derive(Clone)]
pub struct Transition {
    inner: Rc<RefCell<TransitionInner>>,
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Transition")
            .field("key", &inner.key)
            .field("state", &inner.state)
            .field("start", &inner.start)
            .field("end", &inner.end)
            .field("duration", &inner.duration)
            .field("curve", &inner.curve)
            .field("elapsed", &inner.elapsed)
            .finish()
    }
}

impl Transition {
    /// 创建过渡，起点终点默认为绑定的当前值
    pub(crate) fn new(
        scheduler: Weak<RefCell<SchedulerInner>>,
        key: TransitionKey,
        binding: Rc<dyn ValueBinding>,
    ) -> Self {
        let current = match binding.read() {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "读取初始值失败，使用 0");
                0.0
            }
        };

        Self {
            inner: Rc::new(RefCell::new(TransitionInner {
                key,
                binding,
                scheduler,
                start: current,
                end: current,
                duration: 0.0,
                curve: Curve::Linear,
                speed: 1.0,
                time_base: TimeBase::Scaled,
                direction: Direction::Forward,
                on_complete: None,
                state: TransitionState::Configured,
                elapsed: 0.0,
                effective_start: current,
                resolver: None,
            })),
        }
    }

    /// 是否是同一个过渡实例
    pub fn ptr_eq(&self, other: &Transition) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn update(&self, f: impl FnOnce(&mut TransitionInner)) -> Self {
        f(&mut self.inner.borrow_mut());
        self.clone()
    }

    // ========== 配置 ==========

    /// 配置起点、终点与时长（秒）
    ///
    /// 重置速度、时间基准、方向与完成回调，保留上一次设置的曲线。
    /// 不会启动计时。
    pub fn modify(&self, start: f32, end: f32, duration: f32) -> Self {
        self.update(|inner| {
            inner.start = start;
            inner.end = end;
            inner.duration = duration;
            inner.speed = 1.0;
            inner.time_base = TimeBase::Scaled;
            inner.direction = Direction::Forward;
            inner.on_complete = None;
        })
    }

    /// 单值形式：从实时值过渡到 `target`
    pub fn modify_to(&self, target: f32, duration: f32) -> Self {
        self.modify(target, target, duration)
    }

    /// 设置曲线
    pub fn with_curve(&self, curve: Curve) -> Self {
        self.update(|inner| inner.curve = curve)
    }

    /// 按缓动函数与方向设置曲线
    pub fn with_ease(&self, function: EaseFunction, direction: EaseDirection) -> Self {
        self.with_curve(Curve::ease(function, direction))
    }

    /// 按曲线名设置曲线（如 `"quad-out"`）
    ///
    /// 名称无效时立即返回错误，过渡保持不变。
    pub fn with_curve_name(&self, name: &str) -> Result<Self, CurveError> {
        let curve: Curve = name.parse()?;
        Ok(self.with_curve(curve))
    }

    /// 设置播放速度
    pub fn with_speed(&self, speed: f32) -> Self {
        self.update(|inner| inner.speed = speed)
    }

    /// 设置时间基准
    pub fn with_time_base(&self, time_base: TimeBase) -> Self {
        self.update(|inner| inner.time_base = time_base)
    }

    /// 使用真实时间
    pub fn real_time(&self) -> Self {
        self.with_time_base(TimeBase::Real)
    }

    /// 设置播放方向
    pub fn with_direction(&self, direction: Direction) -> Self {
        self.update(|inner| inner.direction = direction)
    }

    /// 倒放
    pub fn rewinding(&self) -> Self {
        self.with_direction(Direction::Rewind)
    }

    /// 设置完成回调
    ///
    /// 每次运行最多调用一次；被顶替、暂停或失败的运行不会调用。
    pub fn on_complete(&self, callback: impl Fn() + 'static) -> Self {
        let callback: Callback = Rc::new(callback);
        self.update(|inner| inner.on_complete = Some(callback))
    }

    // ========== 查询 ==========

    /// 过渡键
    pub fn key(&self) -> TransitionKey {
        self.inner.borrow().key
    }

    /// 名义起点
    pub fn start(&self) -> f32 {
        self.inner.borrow().start
    }

    /// 终点
    pub fn end(&self) -> f32 {
        self.inner.borrow().end
    }

    /// 时长（秒）
    pub fn duration(&self) -> f32 {
        self.inner.borrow().duration
    }

    /// 曲线
    pub fn curve(&self) -> Curve {
        self.inner.borrow().curve
    }

    /// 播放速度
    pub fn speed(&self) -> f32 {
        self.inner.borrow().speed
    }

    /// 时间基准
    pub fn time_base(&self) -> TimeBase {
        self.inner.borrow().time_base
    }

    /// 播放方向
    pub fn direction(&self) -> Direction {
        self.inner.borrow().direction
    }

    /// 计时器位置（秒）
    pub fn elapsed(&self) -> f32 {
        self.inner.borrow().elapsed
    }

    /// 重定向修正后的起点
    pub fn effective_start(&self) -> f32 {
        self.inner.borrow().effective_start
    }

    /// 当前状态
    pub fn state(&self) -> TransitionState {
        self.inner.borrow().state
    }

    /// 是否在运行
    pub fn is_running(&self) -> bool {
        self.state() == TransitionState::Running
    }

    /// 读取绑定的实时值
    pub fn value(&self) -> Result<f32, BindingError> {
        let binding = self.inner.borrow().binding.clone();
        binding.read()
    }

    // ========== 控制 ==========

    /// 启动，不等待结果
    pub fn run(&self) {
        self.fire(None);
    }

    /// 启动并返回本次运行的完成句柄
    pub fn run_async(&self) -> Completion {
        let (completion, resolver) = completion::channel();
        self.fire(Some(resolver));
        completion
    }

    /// 暂停：值停留在原处，不调用完成回调，注销
    pub fn pause(&self) {
        self.finish(TransitionOutcome::Paused, false, false);
    }

    /// 停止：吸附到终值（倒放时为 `effective_start`），调用完成回调，注销
    ///
    /// 未在运行时什么也不做。
    pub fn stop(&self) {
        self.finish(TransitionOutcome::Completed, true, true);
    }

    fn fire(&self, resolver: Option<Resolver>) {
        // 同一实例上一次未结束的运行视为被顶替
        self.finish(TransitionOutcome::Superseded, false, false);

        let (key, scheduler) = {
            let inner = self.inner.borrow();
            (inner.key, inner.scheduler.upgrade())
        };
        let Some(scheduler) = scheduler else {
            warn!(key = %key, "调度器已被释放，过渡无法启动");
            self.inner.borrow_mut().state = TransitionState::Finished(TransitionOutcome::Failed);
            if let Some(resolver) = resolver {
                resolver.resolve(TransitionOutcome::Failed);
            }
            return;
        };

        let binding = {
            let mut inner = self.inner.borrow_mut();
            inner.state = TransitionState::Running;
            inner.resolver = resolver;
            inner.elapsed = 0.0;
            inner.effective_start = inner.start;
            inner.binding.clone()
        };

        let (displaced, speed_ceiling) = {
            let mut scheduler = scheduler.borrow_mut();
            let displaced = scheduler.registry.register(key, self.clone());
            (displaced, scheduler.config.speed_ceiling)
        };
        if let Some(displaced) = displaced {
            debug!(key = %key, "顶替运行中的过渡");
            displaced.finish(TransitionOutcome::Superseded, false, false);
        }
        scheduler
            .borrow_mut()
            .events
            .push(TransitionEvent::Started(key));
        drop(scheduler);

        let current = match binding.read() {
            Ok(value) => value,
            Err(e) => {
                error!(
                    key = %key,
                    op = "read",
                    binding = %binding.describe(),
                    error = %e,
                    "读取实时值失败，过渡取消"
                );
                self.finish(TransitionOutcome::Failed, false, false);
                return;
            }
        };

        let complete_now = {
            let mut inner = self.inner.borrow_mut();
            let short_circuit = inner.speed >= speed_ceiling
                || match inner.direction {
                    Direction::Rewind => current == inner.start,
                    Direction::Forward => current == inner.end,
                };

            if short_circuit {
                debug!(key = %key, current, speed = inner.speed, "过渡立即完成");
                true
            } else {
                let (effective_start, elapsed) =
                    retarget(inner.start, inner.end, current, inner.curve, inner.duration);
                inner.effective_start = effective_start;
                inner.elapsed = elapsed;
                debug!(
                    key = %key,
                    current,
                    effective_start,
                    elapsed,
                    end = inner.end,
                    duration = inner.duration,
                    curve = %inner.curve,
                    "过渡启动"
                );
                inner.duration.is_nan() || inner.duration <= 0.0
            }
        };

        if complete_now {
            self.finish(TransitionOutcome::Completed, true, true);
        }
    }

    /// 推进一帧
    pub(crate) fn advance(&self, tick: &Tick, completion_epsilon: f32) {
        let write = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != TransitionState::Running {
                return;
            }

            let duration = inner.duration.max(0.0);
            let delta = tick.delta_for(inner.time_base) * inner.speed * inner.direction.sign();
            let mut elapsed = (inner.elapsed + delta).clamp(0.0, duration);
            if elapsed.is_nan() {
                elapsed = 0.0;
            }
            // 只向行进方向的边界吸附
            let reached = match inner.direction {
                Direction::Forward => {
                    if duration - elapsed <= completion_epsilon {
                        elapsed = duration;
                    }
                    elapsed >= duration
                }
                Direction::Rewind => {
                    if elapsed <= completion_epsilon {
                        elapsed = 0.0;
                    }
                    elapsed <= 0.0
                }
            };
            inner.elapsed = elapsed;
            if reached {
                None
            } else {
                let factor = inner.curve.evaluate(elapsed / duration);
                Some((
                    inner.key,
                    inner.binding.clone(),
                    lerp_unclamped(inner.effective_start, inner.end, factor),
                ))
            }
        };

        match write {
            None => {
                self.finish(TransitionOutcome::Completed, true, true);
            }
            Some((key, binding, value)) => {
                if let Err(e) = binding.write(value) {
                    error!(
                        key = %key,
                        op = "write",
                        binding = %binding.describe(),
                        error = %e,
                        "写入失败，过渡取消"
                    );
                    self.finish(TransitionOutcome::Failed, false, false);
                }
            }
        }
    }

    /// 结束本次运行
    ///
    /// 顺序：注销 → 吸附写入 → 事件 → 完成回调 → 解决 `Completion`。
    /// 调用绑定、回调与唤醒时不持有任何借用。未在运行时返回 `false`。
    pub(crate) fn finish(&self, outcome: TransitionOutcome, snap: bool, notify: bool) -> bool {
        let (key, binding, terminal, callback, resolver, scheduler) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != TransitionState::Running {
                return false;
            }
            inner.state = TransitionState::Finished(outcome);
            let terminal = match inner.direction {
                Direction::Forward => inner.end,
                Direction::Rewind => inner.effective_start,
            };
            let callback = if notify {
                inner.on_complete.clone()
            } else {
                None
            };
            (
                inner.key,
                inner.binding.clone(),
                terminal,
                callback,
                inner.resolver.take(),
                inner.scheduler.clone(),
            )
        };

        if let Some(scheduler) = scheduler.upgrade() {
            scheduler.borrow_mut().registry.unregister(key, self);
        }

        let mut outcome = outcome;
        if snap && let Err(e) = binding.write(terminal) {
            error!(
                key = %key,
                op = "write",
                binding = %binding.describe(),
                error = %e,
                "写入终值失败，过渡取消"
            );
            outcome = TransitionOutcome::Failed;
            self.inner.borrow_mut().state = TransitionState::Finished(outcome);
        }

        if let Some(scheduler) = scheduler.upgrade() {
            scheduler
                .borrow_mut()
                .events
                .push(TransitionEvent::finished(key, outcome));
        }
        debug!(key = %key, outcome = %outcome, "过渡结束");

        if outcome != TransitionOutcome::Failed
            && let Some(callback) = callback
        {
            callback();
        }
        if let Some(resolver) = resolver {
            resolver.resolve(outcome);
        }
        true
    }

    /// 调度器被释放时放弃本次运行
    pub(crate) fn abandon(&self) {
        let resolver = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != TransitionState::Running {
                return;
            }
            inner.state = TransitionState::Finished(TransitionOutcome::Failed);
            inner.resolver.take()
        };
        if let Some(resolver) = resolver {
            resolver.resolve(TransitionOutcome::Failed);
        }
    }
}

/// 重定向：由实时值反推 `(effective_start, elapsed)`
///
/// 实时值越过终点时，把起点反射到 `end + (end - start)` 之外，
/// 保证 `inverse_lerp` 的结果落在 [0, 1] 内。
pub(crate) fn retarget(start: f32, end: f32, current: f32, curve: Curve, duration: f32) -> (f32, f32) {
    let effective_start = if start < end {
        if current > end {
            let mirrored = end + (end - start);
            if current < mirrored { mirrored } else { current }
        } else if current < start {
            current
        } else {
            start
        }
    } else if current < end {
        let mirrored = end - (start - end);
        if current > mirrored { mirrored } else { current }
    } else if current > start {
        current
    } else {
        start
    };

    let factor = inverse_lerp(effective_start, end, current);
    let mut x = curve.inverse(factor);
    if x.is_nan() {
        x = 0.0;
    }
    let elapsed = x.clamp(0.0, 1.0) * duration.max(0.0);
    (effective_start, if elapsed.is_nan() { 0.0 } else { elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::SharedValue;
    use crate::scheduler::Scheduler;

    fn value_after_retarget(start: f32, end: f32, current: f32, curve: Curve) -> f32 {
        let duration = 2.0;
        let (effective_start, elapsed) = retarget(start, end, current, curve, duration);
        lerp_unclamped(effective_start, end, curve.evaluate(elapsed / duration))
    }

    #[test]
    fn test_retarget_from_nominal_start() {
        let (effective_start, elapsed) = retarget(0.0, 1.0, 0.0, Curve::Linear, 1.0);
        assert_eq!(effective_start, 0.0);
        assert_eq!(elapsed, 0.0);

        let (effective_start, elapsed) = retarget(0.5, 1.0, 0.5, Curve::Linear, 1.0);
        assert_eq!(effective_start, 0.5);
        assert_eq!(elapsed, 0.0);
    }

    #[test]
    fn test_retarget_no_jump_for_monotonic_curves() {
        let cases = [
            (0.0, 1.0, 0.3),
            (0.0, 1.0, -0.5),
            (0.0, 1.0, 1.2),
            (0.0, 1.0, 3.0),
            (1.0, 0.0, -0.3),
            (1.0, 0.0, 1.5),
            (1.0, 0.0, 0.25),
            (2.0, 2.0, 5.0),
        ];
        for curve in Curve::ALL.iter().filter(|c| c.is_exact_inverse()) {
            for (start, end, current) in cases {
                let value = value_after_retarget(start, end, current, *curve);
                assert!(
                    (value - current).abs() < 1e-3,
                    "{curve}: retarget({start}, {end}) from {current} resumed at {value}"
                );
            }
        }
    }

    #[test]
    fn test_retarget_overshoot_reflection() {
        // 越过终点：起点反射到 end + (end - start)
        let (effective_start, elapsed) = retarget(0.0, 1.0, 1.2, Curve::Linear, 1.0);
        assert_eq!(effective_start, 2.0);
        assert!((elapsed - 0.8).abs() < 1e-6);

        // 越过得更远：从实时值本身开始
        let (effective_start, elapsed) = retarget(0.0, 1.0, 3.0, Curve::Linear, 1.0);
        assert_eq!(effective_start, 3.0);
        assert_eq!(elapsed, 0.0);

        // 递减方向
        let (effective_start, _) = retarget(1.0, 0.0, -0.3, Curve::Linear, 1.0);
        assert_eq!(effective_start, -1.0);
    }

    #[test]
    fn test_retarget_handles_degenerate_duration() {
        let (_, elapsed) = retarget(0.0, 1.0, 0.5, Curve::Linear, 0.0);
        assert_eq!(elapsed, 0.0);
        let (_, elapsed) = retarget(0.0, 1.0, 0.5, Curve::Linear, f32::NAN);
        assert_eq!(elapsed, 0.0);
    }

    #[test]
    fn test_new_transition_defaults_to_current_value() {
        let scheduler = Scheduler::new();
        let value = SharedValue::new(0.4);
        let t = scheduler.transition_shared(&value);

        assert_eq!(t.start(), 0.4);
        assert_eq!(t.end(), 0.4);
        assert_eq!(t.duration(), 0.0);
        assert_eq!(t.curve(), Curve::Linear);
        assert_eq!(t.state(), TransitionState::Configured);
        assert_eq!(t.key(), value.key());
    }

    #[test]
    fn test_modify_resets_options_but_keeps_curve() {
        let scheduler = Scheduler::new();
        let t = scheduler.transition_shared(&SharedValue::new(0.0));

        t.modify(0.0, 1.0, 1.0)
            .with_ease(EaseFunction::Cubic, EaseDirection::Out)
            .with_speed(2.0)
            .real_time()
            .rewinding()
            .on_complete(|| {});
        assert_eq!(t.speed(), 2.0);
        assert_eq!(t.time_base(), TimeBase::Real);
        assert_eq!(t.direction(), Direction::Rewind);

        t.modify(1.0, 2.0, 3.0);
        assert_eq!((t.start(), t.end(), t.duration()), (1.0, 2.0, 3.0));
        assert_eq!(t.speed(), 1.0);
        assert_eq!(t.time_base(), TimeBase::Scaled);
        assert_eq!(t.direction(), Direction::Forward);
        assert_eq!(t.curve(), Curve::ease(EaseFunction::Cubic, EaseDirection::Out));
        assert!(t.inner.borrow().on_complete.is_none());
    }

    #[test]
    fn test_modify_to_single_value() {
        let scheduler = Scheduler::new();
        let t = scheduler.transition_shared(&SharedValue::new(0.0));
        t.modify_to(5.0, 1.0);
        assert_eq!((t.start(), t.end()), (5.0, 5.0));
    }

    #[test]
    fn test_invalid_curve_name_leaves_transition_unchanged() {
        let scheduler = Scheduler::new();
        let t = scheduler.transition_shared(&SharedValue::new(0.0));
        t.with_curve_name("sine-out").unwrap();

        let err = t.with_curve_name("wobble-out").unwrap_err();
        assert!(matches!(err, CurveError::UnknownFunction { .. }));
        assert_eq!(t.curve(), Curve::ease(EaseFunction::Sine, EaseDirection::Out));
        assert_eq!(t.state(), TransitionState::Configured);
    }

    #[test]
    fn test_stop_and_pause_are_noops_when_idle() {
        let scheduler = Scheduler::new();
        let value = SharedValue::new(0.0);
        let t = scheduler.transition_shared(&value).modify(0.0, 1.0, 1.0);

        t.stop();
        t.pause();
        assert_eq!(value.get(), 0.0);
        assert_eq!(t.state(), TransitionState::Configured);
        assert!(scheduler.drain_events().is_empty());
    }
}
