//! # Binding 模块
//!
//! 值绑定接口：过渡只通过绑定读写宿主的实时值，不关心值属于哪个对象。
//!
//! ## 核心概念
//!
//! - `ValueBinding`: 单个 f32 值的读写访问器
//! - `SharedValue`: `Rc<Cell<f32>>` 包装的简单值
//! - `DelegateBinding`: 由 getter/setter 闭包构成的绑定
//! - `Animatable`: 按属性名暴露多个 f32 属性的对象
//! - `PropertyBinding`: 指向 `Animatable` 某个属性的弱引用绑定
//!
//! ## 设计说明
//!
//! 绑定方法都接收 `&self`，宿主用 `Cell`/`RefCell` 实现内部可变性，
//! 这样同一个对象的多个属性可以同时被不同过渡驱动。

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::BindingError;
use crate::key::TransitionKey;

/// 值绑定接口
///
/// 绑定由调用方拥有，调度器只持有 `Rc<dyn ValueBinding>`。
pub trait ValueBinding {
    /// 读取当前值
    fn read(&self) -> Result<f32, BindingError>;

    /// 写入新值
    fn write(&self, value: f32) -> Result<(), BindingError>;

    /// 绑定描述（仅用于日志）
    fn describe(&self) -> String {
        "binding".to_string()
    }
}

/// 简单的共享 f32 值
///
/// 克隆后共享同一个值。
#[derive(Debug, Clone, Default)]
pub struct SharedValue {
    value: Rc<Cell<f32>>,
}

impl SharedValue {
    /// 创建新的共享值
    pub fn new(initial_value: f32) -> Self {
        Self {
            value: Rc::new(Cell::new(initial_value)),
        }
    }

    /// 获取当前值
    pub fn get(&self) -> f32 {
        self.value.get()
    }

    /// 直接设置值（不经过过渡）
    pub fn set(&self, value: f32) {
        self.value.set(value);
    }

    /// 由共享值身份派生的键，所有克隆得到同一个键
    pub fn key(&self) -> TransitionKey {
        TransitionKey::of_binding(&self.value)
    }
}

impl ValueBinding for SharedValue {
    fn read(&self) -> Result<f32, BindingError> {
        Ok(self.value.get())
    }

    fn write(&self, value: f32) -> Result<(), BindingError> {
        self.value.set(value);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("SharedValue({})", self.value.get())
    }
}

/// 闭包绑定
///
/// getter/setter 都是不可失败的闭包，适合绑定宿主结构体中的字段。
pub struct DelegateBinding {
    name: String,
    getter: Box<dyn Fn() -> f32>,
    setter: Box<dyn Fn(f32)>,
}

impl DelegateBinding {
    /// 从 getter/setter 创建绑定
    pub fn new(getter: impl Fn() -> f32 + 'static, setter: impl Fn(f32) + 'static) -> Self {
        Self::named("delegate", getter, setter)
    }

    /// 创建带名称的绑定（名称出现在日志中）
    pub fn named(
        name: impl Into<String>,
        getter: impl Fn() -> f32 + 'static,
        setter: impl Fn(f32) + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            getter: Box::new(getter),
            setter: Box::new(setter),
        }
    }
}

impl fmt::Debug for DelegateBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateBinding")
            .field("name", &self.name)
            .finish()
    }
}

impl ValueBinding for DelegateBinding {
    fn read(&self) -> Result<f32, BindingError> {
        Ok((self.getter)())
    }

    fn write(&self, value: f32) -> Result<(), BindingError> {
        (self.setter)(value);
        Ok(())
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// 可动画对象接口
///
/// 对象通过实现此 trait 声明自己有哪些属性可以被过渡驱动。
///
/// ## 实现示例
///
/// ```rust,ignore
/// struct Sprite {
///     alpha: Cell<f32>,
/// }
///
/// impl Animatable for Sprite {
///     fn get_property(&self, property: &str) -> Option<f32> {
///         match property {
///             "alpha" => Some(self.alpha.get()),
///             _ => None,
///         }
///     }
///
///     fn set_property(&self, property: &str, value: f32) -> bool {
///         match property {
///             "alpha" => { self.alpha.set(value); true }
///             _ => false,
///         }
///     }
///
///     fn property_list(&self) -> &'static [&'static str] {
///         &["alpha"]
///     }
/// }
/// ```
pub trait Animatable: 'static {
    /// 获取属性的当前值，属性不存在时返回 `None`
    fn get_property(&self, property: &str) -> Option<f32>;

    /// 设置属性的新值，属性不存在时返回 `false`
    fn set_property(&self, property: &str, value: f32) -> bool;

    /// 所有可动画属性的列表
    fn property_list(&self) -> &'static [&'static str];
}

/// 对象属性绑定
///
/// 只持有对象的弱引用：对象被释放后读写返回 `BindingError::TargetDropped`，
/// 对应的过渡会被取消，而不是让对象继续存活。
pub struct PropertyBinding {
    object: Weak<dyn Animatable>,
    property: String,
}

impl PropertyBinding {
    /// 创建属性绑定
    ///
    /// 属性不在 `property_list()` 中时立即返回错误。
    pub fn new<T: Animatable>(object: &Rc<T>, property: &str) -> Result<Self, BindingError> {
        if !object.property_list().contains(&property) {
            return Err(BindingError::UnknownProperty {
                property: property.to_string(),
            });
        }

        let object: Rc<dyn Animatable> = object.clone();
        Ok(Self {
            object: Rc::downgrade(&object),
            property: property.to_string(),
        })
    }

    /// 属性名
    pub fn property(&self) -> &str {
        &self.property
    }

    fn target(&self) -> Result<Rc<dyn Animatable>, BindingError> {
        self.object.upgrade().ok_or(BindingError::TargetDropped)
    }
}

impl fmt::Debug for PropertyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("property", &self.property)
            .field("alive", &(self.object.strong_count() > 0))
            .finish()
    }
}

impl ValueBinding for PropertyBinding {
    fn read(&self) -> Result<f32, BindingError> {
        self.target()?
            .get_property(&self.property)
            .ok_or_else(|| BindingError::UnknownProperty {
                property: self.property.clone(),
            })
    }

    fn write(&self, value: f32) -> Result<(), BindingError> {
        if self.target()?.set_property(&self.property, value) {
            Ok(())
        } else {
            Err(BindingError::UnknownProperty {
                property: self.property.clone(),
            })
        }
    }

    fn describe(&self) -> String {
        format!("property '{}'", self.property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct TestAnimatable {
        alpha: Cell<f32>,
        scale: Cell<f32>,
    }

    impl TestAnimatable {
        fn new() -> Self {
            Self {
                alpha: Cell::new(1.0),
                scale: Cell::new(1.0),
            }
        }
    }

    impl Animatable for TestAnimatable {
        fn get_property(&self, property: &str) -> Option<f32> {
            match property {
                "alpha" => Some(self.alpha.get()),
                "scale" => Some(self.scale.get()),
                _ => None,
            }
        }

        fn set_property(&self, property: &str, value: f32) -> bool {
            match property {
                "alpha" => {
                    self.alpha.set(value);
                    true
                }
                "scale" => {
                    self.scale.set(value);
                    true
                }
                _ => false,
            }
        }

        fn property_list(&self) -> &'static [&'static str] {
            &["alpha", "scale"]
        }
    }

    #[test]
    fn test_shared_value() {
        let value = SharedValue::new(0.5);
        assert_eq!(value.read(), Ok(0.5));

        value.write(0.8).unwrap();
        assert_eq!(value.get(), 0.8);

        // 克隆共享同一个值
        let shared = value.clone();
        value.set(1.0);
        assert_eq!(shared.get(), 1.0);
        assert_eq!(shared.key(), value.key());
        assert_ne!(SharedValue::new(1.0).key(), value.key());
    }

    #[test]
    fn test_delegate_binding() {
        let field = Rc::new(RefCell::new(2.0_f32));
        let reader = field.clone();
        let writer = field.clone();
        let binding = DelegateBinding::named(
            "field",
            move || *reader.borrow(),
            move |v| *writer.borrow_mut() = v,
        );

        assert_eq!(binding.read(), Ok(2.0));
        binding.write(3.0).unwrap();
        assert_eq!(*field.borrow(), 3.0);
        assert_eq!(binding.describe(), "field");
    }

    #[test]
    fn test_property_binding() {
        let obj = Rc::new(TestAnimatable::new());
        let binding = PropertyBinding::new(&obj, "alpha").unwrap();

        assert_eq!(binding.read(), Ok(1.0));
        binding.write(0.25).unwrap();
        assert_eq!(obj.alpha.get(), 0.25);
        assert_eq!(obj.scale.get(), 1.0);
        assert_eq!(binding.property(), "alpha");
    }

    #[test]
    fn test_property_binding_unknown_property() {
        let obj = Rc::new(TestAnimatable::new());
        let result = PropertyBinding::new(&obj, "rotation");
        assert!(matches!(
            result,
            Err(BindingError::UnknownProperty { ref property }) if property == "rotation"
        ));
    }

    #[test]
    fn test_property_binding_target_dropped() {
        let obj = Rc::new(TestAnimatable::new());
        let binding = PropertyBinding::new(&obj, "scale").unwrap();
        drop(obj);

        assert_eq!(binding.read(), Err(BindingError::TargetDropped));
        assert_eq!(binding.write(1.0), Err(BindingError::TargetDropped));
    }
}
