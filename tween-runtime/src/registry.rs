//! # Registry 模块
//!
//! 单飞注册表：`TransitionKey -> Transition`，每个键最多登记一个过渡。
//!
//! 注册表属于某个调度器实例，多个调度器互不影响。
//! 枚举顺序为登记顺序，保证同一帧内的推进顺序与事件顺序可复现。

use indexmap::IndexMap;

use crate::key::TransitionKey;
use crate::transition::Transition;

/// 过渡注册表
#[derive(Default)]
pub struct Registry {
    entries: IndexMap<TransitionKey, Transition>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Registry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记过渡，新登记的过渡排在最后
    ///
    /// 返回被顶替的旧过渡（如果有），由调用方负责取消它。
    pub fn register(&mut self, key: TransitionKey, transition: Transition) -> Option<Transition> {
        let displaced = self.entries.shift_remove(&key);
        self.entries.insert(key, transition);
        displaced
    }

    /// 注销过渡
    ///
    /// 只有当键下登记的正是 `transition` 这个实例时才移除，
    /// 迟到的注销不会移走更新的过渡。返回是否移除。
    pub fn unregister(&mut self, key: TransitionKey, transition: &Transition) -> bool {
        let is_same = self
            .entries
            .get(&key)
            .is_some_and(|registered| registered.ptr_eq(transition));
        if is_same {
            self.entries.shift_remove(&key);
        }
        is_same
    }

    /// 按键查找
    pub fn find(&self, key: TransitionKey) -> Option<Transition> {
        self.entries.get(&key).cloned()
    }

    /// 是否有键下的过渡
    pub fn contains(&self, key: TransitionKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// 所有登记中的过渡（按登记顺序）
    pub fn all(&self) -> Vec<Transition> {
        self.entries.values().cloned().collect()
    }

    /// 登记数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 取出所有过渡并清空（按登记顺序）
    pub(crate) fn drain(&mut self) -> Vec<Transition> {
        self.entries.drain(..).map(|(_, transition)| transition).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::SharedValue;
    use crate::scheduler::Scheduler;

    #[test]
    fn test_register_displaces() {
        let scheduler = Scheduler::new();
        let value = SharedValue::new(0.0);
        let key = TransitionKey::new(1);
        let first = scheduler.transition_keyed(value.clone(), key);
        let second = scheduler.transition_keyed(value, key);

        let mut registry = Registry::new();
        assert!(registry.register(key, first.clone()).is_none());
        let displaced = registry.register(key, second.clone());
        assert!(displaced.is_some_and(|t| t.ptr_eq(&first)));
        assert_eq!(registry.len(), 1);
        assert!(registry.find(key).is_some_and(|t| t.ptr_eq(&second)));
    }

    #[test]
    fn test_late_unregister_keeps_newer() {
        let scheduler = Scheduler::new();
        let value = SharedValue::new(0.0);
        let key = TransitionKey::new(7);
        let old = scheduler.transition_keyed(value.clone(), key);
        let new = scheduler.transition_keyed(value, key);

        let mut registry = Registry::new();
        registry.register(key, old.clone());
        registry.register(key, new.clone());

        assert!(!registry.unregister(key, &old));
        assert!(registry.contains(key));
        assert!(registry.unregister(key, &new));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_all_in_registration_order() {
        let scheduler = Scheduler::new();
        let mut registry = Registry::new();
        for id in [30, 10, 20] {
            let key = TransitionKey::new(id);
            registry.register(key, scheduler.transition_keyed(SharedValue::new(0.0), key));
        }

        let keys: Vec<u64> = registry.all().iter().map(|t| t.key().value()).collect();
        assert_eq!(keys, vec![30, 10, 20]);

        let drained = registry.drain();
        assert_eq!(drained.len(), 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reregistered_key_moves_to_end() {
        let scheduler = Scheduler::new();
        let mut registry = Registry::new();
        for id in [1, 2, 3] {
            let key = TransitionKey::new(id);
            registry.register(key, scheduler.transition_keyed(SharedValue::new(0.0), key));
        }

        let key = TransitionKey::new(1);
        registry.register(key, scheduler.transition_keyed(SharedValue::new(0.0), key));
        let key = TransitionKey::new(2);
        let second = registry.find(key).unwrap();
        assert!(registry.unregister(key, &second));

        let keys: Vec<u64> = registry.all().iter().map(|t| t.key().value()).collect();
        assert_eq!(keys, vec![3, 1]);
    }
}
