//! # Runner 模块
//!
//! 场景执行器：在单线程 tokio 运行时 + `LocalSet` 上驱动调度器。
//!
//! ## 每帧流程
//!
//! 1. 触发到时的步骤（`sequence` 作为本地任务启动）
//! 2. 时钟产生 `Tick`，调度器推进一帧
//! 3. 让出执行权，等待完成句柄的任务在帧边界恢复
//!
//! 所有步骤执行完、任务结束且调度器空闲时停止；超过 `max_duration` 时超时停止。

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use serde::Serialize;
use tokio::task::{JoinHandle, LocalSet};
use tracing::{debug, info, warn};
use tween_runtime::{Completion, Scheduler, TransitionEvent, TransitionKey, TransitionOutcome};

use crate::clock::FrameClock;
use crate::config::AppConfig;
use crate::scenario::{AnimateStep, Scenario, ScenarioError, Step};
use crate::scene::Scene;

/// 一条事件记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    /// 事件所在帧
    pub frame: u64,
    /// `对象.属性`
    pub target: String,
    /// started / completed / cancelled
    pub event: String,
    /// 取消原因
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

/// 执行报告
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// 场景名
    pub scenario: String,
    /// 执行的帧数
    pub frames: u64,
    /// 累计真实时间（秒）
    pub real_seconds: f64,
    /// 累计游戏时间（秒）
    pub game_seconds: f64,
    /// 是否因超时停止
    pub timed_out: bool,
    /// 事件记录
    pub events: Vec<EventRecord>,
    /// 对象最终属性值
    pub objects: BTreeMap<String, BTreeMap<String, f32>>,
}

/// 步骤执行上下文
#[derive(Clone)]
struct StepContext {
    scene: Rc<Scene>,
    scheduler: Scheduler,
    clock: Rc<RefCell<FrameClock>>,
    labels: Rc<RefCell<HashMap<TransitionKey, String>>>,
}

type SequenceFuture = Pin<Box<dyn Future<Output = Result<(), ScenarioError>>>>;

impl StepContext {
    fn label(&self, key: TransitionKey) -> String {
        self.labels
            .borrow()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    fn target_key(&self, object: &str, property: &str) -> Result<TransitionKey, ScenarioError> {
        let target = self.scene.get(object).ok_or_else(|| ScenarioError::UnknownObject {
            object: object.to_string(),
        })?;
        Ok(TransitionKey::of_property(&target, property))
    }

    /// 执行单个步骤，`animate` 返回完成句柄
    fn execute(&self, step: &Step) -> Result<Option<Completion>, ScenarioError> {
        match step {
            Step::Animate(animate) => self.animate(animate).map(Some),
            Step::Pause { object, property } => {
                if let Some(transition) = self.scheduler.find(self.target_key(object, property)?) {
                    transition.pause();
                }
                Ok(None)
            }
            Step::Stop { object, property } => {
                if let Some(transition) = self.scheduler.find(self.target_key(object, property)?) {
                    transition.stop();
                }
                Ok(None)
            }
            Step::PauseAll => {
                self.scheduler.pause_all();
                Ok(None)
            }
            Step::StopAll => {
                self.scheduler.stop_all();
                Ok(None)
            }
            Step::SetTimeScale { scale } => {
                self.clock.borrow_mut().set_time_scale(*scale);
                Ok(None)
            }
            Step::SetPaused { paused } => {
                self.clock.borrow_mut().set_paused(*paused);
                Ok(None)
            }
            Step::Sequence { .. } => Err(ScenarioError::InvalidStep(
                "sequence 必须作为任务执行".to_string(),
            )),
        }
    }

    fn animate(&self, animate: &AnimateStep) -> Result<Completion, ScenarioError> {
        let object = self
            .scene
            .get(&animate.object)
            .ok_or_else(|| ScenarioError::UnknownObject {
                object: animate.object.clone(),
            })?;

        let transition = self.scheduler.transition_property(&object, &animate.property)?;
        match animate.from {
            Some(from) => transition.modify(from, animate.to, animate.duration),
            None => transition.modify_to(animate.to, animate.duration),
        };
        transition
            .with_curve(animate.curve()?)
            .with_speed(animate.speed);
        if animate.real_time {
            transition.real_time();
        }
        if animate.rewind {
            transition.rewinding();
        }

        self.labels.borrow_mut().insert(
            transition.key(),
            format!("{}.{}", animate.object, animate.property),
        );
        Ok(transition.run_async())
    }

    /// 依次执行子步骤
    fn run_sequence(self, steps: Vec<Step>) -> SequenceFuture {
        Box::pin(async move {
            for step in steps {
                match &step {
                    Step::Sequence { steps } => self.clone().run_sequence(steps.clone()).await?,
                    Step::Animate(animate) => {
                        let completion = self.animate(animate)?;
                        if animate.wait {
                            let outcome = completion.await;
                            debug!(
                                property = %format!("{}.{}", animate.object, animate.property),
                                outcome = %outcome,
                                "序列步骤结束"
                            );
                        }
                    }
                    other => {
                        self.execute(other)?;
                    }
                }
            }
            Ok(())
        })
    }
}

/// 场景执行器
pub struct ScenarioRunner {
    config: AppConfig,
    print_events: bool,
}

impl ScenarioRunner {
    /// 创建执行器
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            print_events: false,
        }
    }

    /// 以 info 级别输出每个事件
    pub fn with_print_events(mut self, print_events: bool) -> Self {
        self.print_events = print_events;
        self
    }

    /// 校验并执行场景
    pub fn run(&self, scenario: &Scenario) -> Result<RunReport, ScenarioError> {
        scenario.validate()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(ScenarioError::Runtime)?;
        let local = LocalSet::new();
        local.block_on(&runtime, self.drive(scenario))
    }

    async fn drive(&self, scenario: &Scenario) -> Result<RunReport, ScenarioError> {
        let ctx = StepContext {
            scene: Rc::new(Scene::from_objects(&scenario.objects)),
            scheduler: Scheduler::with_config(self.config.scheduler),
            clock: Rc::new(RefCell::new(
                FrameClock::new(self.config.tick_rate).with_time_scale(self.config.time_scale),
            )),
            labels: Rc::new(RefCell::new(HashMap::new())),
        };

        info!(
            scenario = %scenario.name,
            objects = scenario.objects.len(),
            steps = scenario.steps.len(),
            "开始执行场景"
        );

        let mut pending: VecDeque<_> = scenario.ordered_steps().into_iter().collect();
        let mut tasks: Vec<JoinHandle<Result<(), ScenarioError>>> = Vec::new();
        let mut events = Vec::new();
        let max_duration = f64::from(self.config.max_duration);
        let mut timed_out = false;

        loop {
            let now = ctx.clock.borrow().real_elapsed();
            while let Some(timed) = pending.front()
                && f64::from(timed.at) <= now + 1e-6
            {
                debug!(at = timed.at, "触发步骤");
                match &timed.step {
                    Step::Sequence { steps } => {
                        let future = ctx.clone().run_sequence(steps.clone());
                        tasks.push(tokio::task::spawn_local(future));
                    }
                    step => {
                        ctx.execute(step)?;
                    }
                }
                pending.pop_front();
            }

            let tick = ctx.clock.borrow_mut().tick();
            let frame = ctx.clock.borrow().frames();
            let tick_events = ctx.scheduler.tick(tick);
            self.record(&ctx, frame, tick_events, &mut events);

            // 让等待完成句柄的任务在帧边界恢复
            tokio::task::yield_now().await;

            // 任务失败立即报告
            if let Some(index) = tasks.iter().position(|t| t.is_finished()) {
                let handle = tasks.swap_remove(index);
                match handle.await {
                    Ok(result) => result?,
                    Err(e) => {
                        return Err(ScenarioError::InvalidStep(format!("序列任务异常: {e}")));
                    }
                }
                continue;
            }

            let finished = pending.is_empty() && tasks.is_empty() && ctx.scheduler.is_idle();
            if finished {
                break;
            }

            if ctx.clock.borrow().real_elapsed() >= max_duration {
                warn!(
                    max_duration = self.config.max_duration,
                    active = ctx.scheduler.active_count(),
                    "场景超时，停止执行"
                );
                timed_out = true;
                break;
            }
        }

        for task in &tasks {
            task.abort();
        }
        let frame = ctx.clock.borrow().frames();
        let remaining = ctx.scheduler.drain_events();
        self.record(&ctx, frame, remaining, &mut events);

        let clock = ctx.clock.borrow();
        let report = RunReport {
            scenario: scenario.name.clone(),
            frames: clock.frames(),
            real_seconds: clock.real_elapsed(),
            game_seconds: clock.game_elapsed(),
            timed_out,
            events,
            objects: ctx.scene.snapshot(),
        };
        info!(
            frames = report.frames,
            events = report.events.len(),
            timed_out,
            "场景执行结束"
        );
        Ok(report)
    }

    fn record(
        &self,
        ctx: &StepContext,
        frame: u64,
        tick_events: Vec<TransitionEvent>,
        events: &mut Vec<EventRecord>,
    ) {
        for event in tick_events {
            let (name, outcome) = match event {
                TransitionEvent::Started(_) => ("started", None),
                TransitionEvent::Completed(_) => ("completed", None),
                TransitionEvent::Cancelled { outcome, .. } => ("cancelled", Some(outcome)),
            };
            let record = EventRecord {
                frame,
                target: ctx.label(event.key()),
                event: name.to_string(),
                outcome: outcome.map(|o: TransitionOutcome| o.to_string()),
            };

            if self.print_events {
                info!(frame, property = %record.target, event = name, "过渡事件");
            } else {
                debug!(frame, property = %record.target, event = name, "过渡事件");
            }
            events.push(record);
        }
    }
}
