//! # Completion 模块
//!
//! 单次运行的完成通知。`Transition::run_async` 返回 `Completion`，
//! 它在运行进入终止状态时恰好解决一次。
//!
//! 基于 `futures::channel::oneshot`。解决端 (`Resolver`) 未解决就被丢弃时
//! 等待端得到 `Failed`，等待方不会永远挂起。

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::channel::oneshot;

/// 一次运行的结局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionOutcome {
    /// 到达边界或被 `stop` 吸附到终点
    Completed,
    /// 被 `pause` 停止，值停留在原处
    Paused,
    /// 同一键上启动了新的过渡
    Superseded,
    /// 绑定读写失败或调度器已不存在
    Failed,
}

impl TransitionOutcome {
    /// 是否正常完成
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

impl std::fmt::Display for TransitionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Completed => "completed",
            Self::Paused => "paused",
            Self::Superseded => "superseded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 创建一对等待端/解决端
pub(crate) fn channel() -> (Completion, Resolver) {
    let (sender, receiver) = oneshot::channel();
    (
        Completion {
            receiver: RefCell::new(receiver),
            outcome: Cell::new(None),
        },
        Resolver { sender },
    )
}

/// 可等待的完成句柄
#[derive(Debug)]
#[must_use = "Completion 需要 await 或轮询才能观察结局"]
pub struct Completion {
    receiver: RefCell<oneshot::Receiver<TransitionOutcome>>,
    // 接收端只能取出一次结局，取出后缓存在这里
    outcome: Cell<Option<TransitionOutcome>>,
}

impl Completion {
    /// 已经解决的完成句柄
    pub fn resolved(outcome: TransitionOutcome) -> Self {
        let (completion, resolver) = channel();
        resolver.resolve(outcome);
        completion
    }

    /// 非阻塞地查看结局
    pub fn outcome(&self) -> Option<TransitionOutcome> {
        if let Some(outcome) = self.outcome.get() {
            return Some(outcome);
        }
        let outcome = match self.receiver.borrow_mut().try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::Canceled) => Some(TransitionOutcome::Failed),
        };
        self.outcome.set(outcome);
        outcome
    }

    /// 是否已经解决
    pub fn is_resolved(&self) -> bool {
        self.outcome().is_some()
    }
}

impl Future for Completion {
    type Output = TransitionOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.outcome.get() {
            return Poll::Ready(outcome);
        }
        let outcome = match self.receiver.borrow_mut().poll_unpin(cx) {
            Poll::Ready(Ok(outcome)) => outcome,
            Poll::Ready(Err(oneshot::Canceled)) => TransitionOutcome::Failed,
            Poll::Pending => return Poll::Pending,
        };
        self.outcome.set(Some(outcome));
        Poll::Ready(outcome)
    }
}

/// 完成句柄的解决端
///
/// 未解决就被丢弃时，等待端得到 `Failed`。
#[derive(Debug)]
pub(crate) struct Resolver {
    sender: oneshot::Sender<TransitionOutcome>,
}

impl Resolver {
    /// 解决完成句柄，返回等待端是否还在
    pub(crate) fn resolve(self, outcome: TransitionOutcome) -> bool {
        self.sender.send(outcome).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_delivers_outcome() {
        let (completion, resolver) = channel();
        assert!(!completion.is_resolved());

        assert!(resolver.resolve(TransitionOutcome::Paused));
        assert_eq!(completion.outcome(), Some(TransitionOutcome::Paused));
        // 结局被缓存，重复查看不变
        assert_eq!(completion.outcome(), Some(TransitionOutcome::Paused));
        assert_eq!(completion.now_or_never(), Some(TransitionOutcome::Paused));
    }

    #[test]
    fn test_pending_until_resolved() {
        let (mut completion, resolver) = channel();
        assert_eq!((&mut completion).now_or_never(), None);
        assert_eq!(completion.outcome(), None);

        resolver.resolve(TransitionOutcome::Completed);
        assert_eq!(completion.now_or_never(), Some(TransitionOutcome::Completed));
    }

    #[test]
    fn test_outcome_after_poll_is_cached() {
        let (mut completion, resolver) = channel();
        resolver.resolve(TransitionOutcome::Superseded);
        assert_eq!(
            (&mut completion).now_or_never(),
            Some(TransitionOutcome::Superseded)
        );
        assert_eq!(completion.outcome(), Some(TransitionOutcome::Superseded));
    }

    #[test]
    fn test_dropped_resolver_fails() {
        let (completion, resolver) = channel();
        drop(resolver);
        assert_eq!(completion.outcome(), Some(TransitionOutcome::Failed));

        let (completion, resolver) = channel();
        drop(resolver);
        assert_eq!(completion.now_or_never(), Some(TransitionOutcome::Failed));
    }

    #[test]
    fn test_resolve_without_waiter() {
        let (completion, resolver) = channel();
        drop(completion);
        assert!(!resolver.resolve(TransitionOutcome::Completed));
    }

    #[test]
    fn test_resolved_constructor() {
        let completion = Completion::resolved(TransitionOutcome::Superseded);
        assert_eq!(completion.now_or_never(), Some(TransitionOutcome::Superseded));
        assert!(TransitionOutcome::Completed.is_completed());
        assert!(!TransitionOutcome::Failed.is_completed());
    }
}
