//! # Scene 模块
//!
//! 无界面场景：一组具名的可动画对象。
//!
//! ## 设计说明
//!
//! `SceneObject` 使用 `RefCell` 实现内部可变性，
//! 允许同时对同一对象的多个属性运行过渡。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tween_runtime::Animatable;

/// 场景对象的属性数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneObjectData {
    /// 透明度 (0.0 - 1.0)
    pub alpha: f32,
    /// 位置 X
    pub position_x: f32,
    /// 位置 Y
    pub position_y: f32,
    /// 缩放
    pub scale: f32,
    /// 旋转角度（弧度）
    pub rotation: f32,
    /// 颜色通道
    pub color_r: f32,
    pub color_g: f32,
    pub color_b: f32,
    pub color_a: f32,
}

impl Default for SceneObjectData {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            position_x: 0.0,
            position_y: 0.0,
            scale: 1.0,
            rotation: 0.0,
            color_r: 1.0,
            color_g: 1.0,
            color_b: 1.0,
            color_a: 1.0,
        }
    }
}

/// 场景对象
///
/// ## 支持的属性
///
/// - `"alpha"`: 透明度，写入时裁剪到 0.0 - 1.0
/// - `"position_x"` / `"position_y"`: 位置
/// - `"scale"`: 缩放
/// - `"rotation"`: 旋转角度（弧度）
/// - `"color_r"` / `"color_g"` / `"color_b"` / `"color_a"`: 颜色通道
#[derive(Debug)]
pub struct SceneObject {
    name: String,
    data: RefCell<SceneObjectData>,
}

impl SceneObject {
    /// 支持的属性列表
    pub const PROPERTIES: &'static [&'static str] = &[
        "alpha",
        "position_x",
        "position_y",
        "scale",
        "rotation",
        "color_r",
        "color_g",
        "color_b",
        "color_a",
    ];

    /// 创建场景对象
    pub fn new(name: impl Into<String>, data: SceneObjectData) -> Self {
        Self {
            name: name.into(),
            data: RefCell::new(data),
        }
    }

    /// 对象名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 获取属性值
    pub fn get(&self, property: &str) -> Option<f32> {
        let data = self.data.borrow();
        match property {
            "alpha" => Some(data.alpha),
            "position_x" => Some(data.position_x),
            "position_y" => Some(data.position_y),
            "scale" => Some(data.scale),
            "rotation" => Some(data.rotation),
            "color_r" => Some(data.color_r),
            "color_g" => Some(data.color_g),
            "color_b" => Some(data.color_b),
            "color_a" => Some(data.color_a),
            _ => None,
        }
    }

    /// 设置属性值
    pub fn set(&self, property: &str, value: f32) -> bool {
        let mut data = self.data.borrow_mut();
        let slot = match property {
            "alpha" => {
                data.alpha = value.clamp(0.0, 1.0);
                return true;
            }
            "position_x" => &mut data.position_x,
            "position_y" => &mut data.position_y,
            "scale" => &mut data.scale,
            "rotation" => &mut data.rotation,
            "color_r" => &mut data.color_r,
            "color_g" => &mut data.color_g,
            "color_b" => &mut data.color_b,
            "color_a" => &mut data.color_a,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// 获取完整数据副本
    pub fn snapshot(&self) -> SceneObjectData {
        self.data.borrow().clone()
    }

    /// 所有属性的当前值
    pub fn property_values(&self) -> BTreeMap<String, f32> {
        Self::PROPERTIES
            .iter()
            .filter_map(|p| self.get(p).map(|v| (p.to_string(), v)))
            .collect()
    }
}

impl Animatable for SceneObject {
    fn get_property(&self, property: &str) -> Option<f32> {
        self.get(property)
    }

    fn set_property(&self, property: &str, value: f32) -> bool {
        self.set(property, value)
    }

    fn property_list(&self) -> &'static [&'static str] {
        Self::PROPERTIES
    }
}

/// 场景：名称 → 对象
#[derive(Debug, Default)]
pub struct Scene {
    objects: BTreeMap<String, Rc<SceneObject>>,
}

impl Scene {
    /// 创建空场景
    pub fn new() -> Self {
        Self::default()
    }

    /// 从对象数据表创建场景
    pub fn from_objects(objects: &BTreeMap<String, SceneObjectData>) -> Self {
        let mut scene = Self::new();
        for (name, data) in objects {
            scene.add(name.clone(), data.clone());
        }
        scene
    }

    /// 添加对象（同名对象会被替换）
    pub fn add(&mut self, name: impl Into<String>, data: SceneObjectData) -> Rc<SceneObject> {
        let name = name.into();
        let object = Rc::new(SceneObject::new(name.clone(), data));
        self.objects.insert(name, object.clone());
        object
    }

    /// 按名称获取对象
    pub fn get(&self, name: &str) -> Option<Rc<SceneObject>> {
        self.objects.get(name).cloned()
    }

    /// 移除对象
    pub fn remove(&mut self, name: &str) -> Option<Rc<SceneObject>> {
        self.objects.remove(name)
    }

    /// 对象数量
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// 所有对象的属性快照
    pub fn snapshot(&self) -> BTreeMap<String, BTreeMap<String, f32>> {
        self.objects
            .iter()
            .map(|(name, object)| (name.clone(), object.property_values()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_object_defaults() {
        let object = SceneObject::new("alice", SceneObjectData::default());
        assert_eq!(object.name(), "alice");
        assert_eq!(object.get("alpha"), Some(1.0));
        assert_eq!(object.get("scale"), Some(1.0));
        assert_eq!(object.get("position_x"), Some(0.0));
    }

    #[test]
    fn test_property_access() {
        let object = SceneObject::new("test", SceneObjectData::default());

        for prop in SceneObject::PROPERTIES {
            assert!(object.get(prop).is_some(), "Property {} should exist", prop);
        }
        assert!(object.get("unknown").is_none());
        assert!(!object.set("unknown", 1.0));
    }

    #[test]
    fn test_property_modification() {
        let object = SceneObject::new("test", SceneObjectData::default());

        assert!(object.set("position_x", 100.0));
        assert_eq!(object.snapshot().position_x, 100.0);

        assert!(object.set("color_g", 0.25));
        assert_eq!(object.get("color_g"), Some(0.25));

        // Alpha 应该被 clamp 到 0-1 范围
        object.set("alpha", 1.5);
        assert_eq!(object.get("alpha"), Some(1.0));
    }

    #[test]
    fn test_partial_object_data() {
        let data: SceneObjectData =
            serde_json::from_str(r#"{"alpha": 0.0, "position_x": -200}"#).unwrap();
        assert_eq!(data.alpha, 0.0);
        assert_eq!(data.position_x, -200.0);
        assert_eq!(data.scale, 1.0);
    }

    #[test]
    fn test_scene_snapshot() {
        let mut scene = Scene::new();
        scene.add("bob", SceneObjectData::default());
        scene.add("alice", SceneObjectData::default());
        assert_eq!(scene.len(), 2);

        let names: Vec<String> = scene.snapshot().into_keys().collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(scene.snapshot()["alice"].len(), SceneObject::PROPERTIES.len());
        assert!(scene.get("carol").is_none());
    }
}
