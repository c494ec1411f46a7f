//! # Key 模块
//!
//! 过渡键：标识一个单飞（single-flight）槽位，同一键同时只能有一个过渡在运行。

use std::hash::{DefaultHasher, Hash, Hasher};
use std::rc::Rc;

/// 过渡键
///
/// 64 位标识符，可以来自：
/// - 显式整数 (`TransitionKey::new`)
/// - 字符串名称的哈希 (`TransitionKey::named`)
/// - 共享绑定的指针身份 (`TransitionKey::of_binding`)
/// - 对象指针身份 + 属性名 (`TransitionKey::of_property`)
///
/// 基于指针身份的键只在对象存活期间有意义。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionKey(u64);

impl TransitionKey {
    /// 从显式整数创建
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// 从字符串名称创建
    pub fn named(name: &str) -> Self {
        Self(hash_of(&("name", name)))
    }

    /// 从共享绑定的身份创建
    pub fn of_binding<B: ?Sized>(binding: &Rc<B>) -> Self {
        Self(hash_of(&("binding", address_of(binding))))
    }

    /// 从对象身份 + 属性名创建
    pub fn of_property<T: ?Sized>(object: &Rc<T>, property: &str) -> Self {
        Self(hash_of(&("property", address_of(object), property)))
    }

    /// 获取内部值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TransitionKey {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<&str> for TransitionKey {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl std::fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key({:016x})", self.0)
    }
}

fn address_of<T: ?Sized>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc).cast::<()>() as usize
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_named_key_is_stable() {
        assert_eq!(TransitionKey::named("fade"), TransitionKey::named("fade"));
        assert_ne!(TransitionKey::named("fade"), TransitionKey::named("move"));
    }

    #[test]
    fn test_binding_identity() {
        let a = Rc::new(Cell::new(0.0_f32));
        let b = Rc::new(Cell::new(0.0_f32));

        assert_eq!(TransitionKey::of_binding(&a), TransitionKey::of_binding(&a.clone()));
        assert_ne!(TransitionKey::of_binding(&a), TransitionKey::of_binding(&b));
    }

    #[test]
    fn test_property_identity() {
        let obj = Rc::new(Cell::new(0.0_f32));
        let other = Rc::new(Cell::new(0.0_f32));

        let alpha = TransitionKey::of_property(&obj, "alpha");
        assert_eq!(alpha, TransitionKey::of_property(&obj, "alpha"));
        assert_ne!(alpha, TransitionKey::of_property(&obj, "scale"));
        assert_ne!(alpha, TransitionKey::of_property(&other, "alpha"));
        // 绑定身份与属性身份不会混淆
        assert_ne!(TransitionKey::of_binding(&obj), alpha);
    }

    #[test]
    fn test_explicit_key() {
        let key: TransitionKey = 42_u64.into();
        assert_eq!(key, TransitionKey::new(42));
        assert_eq!(key.value(), 42);
        assert_eq!(key.to_string(), "Key(000000000000002a)");
        assert_eq!(TransitionKey::from("fade"), TransitionKey::named("fade"));
    }
}
