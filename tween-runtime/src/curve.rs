//! # Curve 模块
//!
//! 缓动曲线库。每条曲线是一对纯函数：
//!
//! - `evaluate(x)`：归一化进度 → 插值因子
//! - `inverse(y)`：插值因子 → 近似的归一化进度（用于重定向时反推计时器）
//!
//! 单调族（Quadratic/Cubic/Quartic/Quintic/Sine/Circular）的逆函数是精确闭式解；
//! Exponential/Elastic/Back/Bounce 没有可用的闭式逆，统一借用同方向 Quintic
//! 的逆作为近似，往返结果不保证精确。

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::CurveError;

/// 缓动函数族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EaseFunction {
    /// 线性（匀速）
    Linear,
    /// 二次
    Quadratic,
    /// 三次
    Cubic,
    /// 四次
    Quartic,
    /// 五次
    Quintic,
    /// 正弦
    Sine,
    /// 圆形
    Circular,
    /// 指数
    Exponential,
    /// 弹性
    Elastic,
    /// 回退（越过起点后再前进）
    Back,
    /// 弹跳
    Bounce,
}

impl EaseFunction {
    /// 所有缓动函数族
    pub const ALL: [EaseFunction; 11] = [
        EaseFunction::Linear,
        EaseFunction::Quadratic,
        EaseFunction::Cubic,
        EaseFunction::Quartic,
        EaseFunction::Quintic,
        EaseFunction::Sine,
        EaseFunction::Circular,
        EaseFunction::Exponential,
        EaseFunction::Elastic,
        EaseFunction::Back,
        EaseFunction::Bounce,
    ];

    /// 规范名称（用于曲线名）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Quadratic => "quad",
            Self::Cubic => "cubic",
            Self::Quartic => "quart",
            Self::Quintic => "quint",
            Self::Sine => "sine",
            Self::Circular => "circ",
            Self::Exponential => "expo",
            Self::Elastic => "elastic",
            Self::Back => "back",
            Self::Bounce => "bounce",
        }
    }

    /// 按名称查找，接受简写与全称
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "linear" => Self::Linear,
            "quad" | "quadratic" => Self::Quadratic,
            "cubic" => Self::Cubic,
            "quart" | "quartic" => Self::Quartic,
            "quint" | "quintic" => Self::Quintic,
            "sine" => Self::Sine,
            "circ" | "circular" => Self::Circular,
            "expo" | "exponential" => Self::Exponential,
            "elastic" => Self::Elastic,
            "back" => Self::Back,
            "bounce" => Self::Bounce,
            _ => return None,
        };
        Some(func)
    }
}

/// 缓动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EaseDirection {
    /// 缓入（先慢后快）
    #[default]
    In,
    /// 缓出（先快后慢）
    Out,
    /// 缓入缓出（两头慢中间快）
    InOut,
}

impl EaseDirection {
    /// 所有方向
    pub const ALL: [EaseDirection; 3] = [EaseDirection::In, EaseDirection::Out, EaseDirection::InOut];

    /// 规范名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::InOut => "in-out",
        }
    }

    /// 按名称查找
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            "in-out" | "inout" | "in_out" => Some(Self::InOut),
            _ => None,
        }
    }
}

/// 缓动曲线
///
/// 封闭的曲线集合：`Linear` 加上 10 个缓动族 × 3 个方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Curve {
    /// 线性
    #[default]
    Linear,
    /// 命名缓动
    Ease {
        function: EaseFunction,
        direction: EaseDirection,
    },
}

impl Curve {
    /// 全部 31 条曲线
    pub const ALL: [Curve; 31] = {
        let mut all = [Curve::Linear; 31];
        let mut i = 1;
        while i < EaseFunction::ALL.len() {
            let mut d = 0;
            while d < EaseDirection::ALL.len() {
                all[1 + (i - 1) * 3 + d] = Curve::Ease {
                    function: EaseFunction::ALL[i],
                    direction: EaseDirection::ALL[d],
                };
                d += 1;
            }
            i += 1;
        }
        all
    };

    /// 按函数族和方向选择曲线（`Linear` 忽略方向）
    pub fn ease(function: EaseFunction, direction: EaseDirection) -> Self {
        match function {
            EaseFunction::Linear => Self::Linear,
            function => Self::Ease {
                function,
                direction,
            },
        }
    }

    /// 按名称选择曲线
    ///
    /// `direction` 为空时只允许 `linear`。
    pub fn from_names(function: &str, direction: &str) -> Result<Self, CurveError> {
        let function_name = function.trim().to_ascii_lowercase();
        let direction_name = direction.trim().to_ascii_lowercase();

        let func = EaseFunction::from_name(&function_name).ok_or_else(|| {
            CurveError::UnknownFunction {
                name: function.to_string(),
            }
        })?;

        if func == EaseFunction::Linear && direction_name.is_empty() {
            return Ok(Self::Linear);
        }

        let dir = EaseDirection::from_name(&direction_name).ok_or_else(|| {
            CurveError::UnknownDirection {
                function: function_name.clone(),
                direction: direction.to_string(),
            }
        })?;

        Ok(Self::ease(func, dir))
    }

    /// 缓动函数族
    pub fn function(&self) -> EaseFunction {
        match self {
            Self::Linear => EaseFunction::Linear,
            Self::Ease { function, .. } => *function,
        }
    }

    /// 逆函数是否为精确解
    pub fn is_exact_inverse(&self) -> bool {
        !matches!(
            self.function(),
            EaseFunction::Exponential
                | EaseFunction::Elastic
                | EaseFunction::Back
                | EaseFunction::Bounce
        )
    }

    /// 计算插值因子
    ///
    /// 不做输入裁剪；Elastic/Back/Bounce 的输出可能短暂超出 [0, 1]。
    pub fn evaluate(&self, x: f32) -> f32 {
        use EaseDirection::*;
        use EaseFunction::*;

        let (function, direction) = match self {
            Self::Linear => return x,
            Self::Ease {
                function,
                direction,
            } => (*function, *direction),
        };

        match (function, direction) {
            (Linear, _) => x,

            (Quadratic, In) => x * x,
            (Quadratic, Out) => x * (2.0 - x),
            (Quadratic, InOut) => {
                if x < 0.5 {
                    2.0 * x * x
                } else {
                    -2.0 * x * x + 4.0 * x - 1.0
                }
            }

            (Cubic, In) => x * x * x,
            (Cubic, Out) => (x - 1.0).powi(3) + 1.0,
            (Cubic, InOut) => {
                if x < 0.5 {
                    4.0 * x * x * x
                } else {
                    0.5 * (2.0 * x - 2.0).powi(3) + 1.0
                }
            }

            (Quartic, In) => x.powi(4),
            (Quartic, Out) => 1.0 - (x - 1.0).powi(4),
            (Quartic, InOut) => {
                if x < 0.5 {
                    8.0 * x.powi(4)
                } else {
                    1.0 - 8.0 * (x - 1.0).powi(4)
                }
            }

            (Quintic, In) => x.powi(5),
            (Quintic, Out) => (x - 1.0).powi(5) + 1.0,
            (Quintic, InOut) => {
                if x < 0.5 {
                    16.0 * x.powi(5)
                } else {
                    0.5 * (2.0 * x - 2.0).powi(5) + 1.0
                }
            }

            (Sine, In) => ((x - 1.0) * (PI / 2.0)).sin() + 1.0,
            (Sine, Out) => (x * (PI / 2.0)).sin(),
            (Sine, InOut) => 0.5 * (1.0 - (x * PI).cos()),

            (Circular, In) => 1.0 - (1.0 - x * x).sqrt(),
            (Circular, Out) => ((2.0 - x) * x).sqrt(),
            (Circular, InOut) => {
                if x < 0.5 {
                    0.5 * (1.0 - (1.0 - 4.0 * x * x).sqrt())
                } else {
                    0.5 * ((-(2.0 * x - 3.0) * (2.0 * x - 1.0)).sqrt() + 1.0)
                }
            }

            (Exponential, In) => {
                if x == 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * (x - 1.0))
                }
            }
            (Exponential, Out) => {
                if x == 1.0 {
                    1.0
                } else {
                    1.0 - 2.0_f32.powf(-10.0 * x)
                }
            }
            (Exponential, InOut) => {
                if x == 0.0 || x == 1.0 {
                    x
                } else if x < 0.5 {
                    0.5 * 2.0_f32.powf(20.0 * x - 10.0)
                } else {
                    -0.5 * 2.0_f32.powf(-20.0 * x + 10.0) + 1.0
                }
            }

            (Elastic, In) => (13.0 * (PI / 2.0) * x).sin() * 2.0_f32.powf(10.0 * (x - 1.0)),
            (Elastic, Out) => {
                (-13.0 * (PI / 2.0) * (x + 1.0)).sin() * 2.0_f32.powf(-10.0 * x) + 1.0
            }
            (Elastic, InOut) => {
                if x < 0.5 {
                    0.5 * (13.0 * (PI / 2.0) * (2.0 * x)).sin()
                        * 2.0_f32.powf(10.0 * (2.0 * x - 1.0))
                } else {
                    0.5 * ((-13.0 * (PI / 2.0) * (2.0 * x)).sin()
                        * 2.0_f32.powf(-10.0 * (2.0 * x - 1.0))
                        + 2.0)
                }
            }

            (Back, In) => back_in(x),
            (Back, Out) => 1.0 - back_in(1.0 - x),
            (Back, InOut) => {
                let x = x * 2.0;
                if x < 1.0 {
                    0.5 * back_in(x)
                } else {
                    0.5 * (1.0 - back_in(2.0 - x)) + 0.5
                }
            }

            (Bounce, In) => 1.0 - bounce_out(1.0 - x),
            (Bounce, Out) => bounce_out(x),
            (Bounce, InOut) => {
                if x < 0.5 {
                    0.5 * (1.0 - bounce_out(1.0 - x * 2.0))
                } else {
                    0.5 * bounce_out(x * 2.0 - 1.0) + 0.5
                }
            }
        }
    }

    /// 计算逆函数（插值因子 → 归一化进度）
    pub fn inverse(&self, y: f32) -> f32 {
        use EaseDirection::*;
        use EaseFunction::*;

        let (function, direction) = match self {
            Self::Linear => return y,
            Self::Ease {
                function,
                direction,
            } => (*function, *direction),
        };

        match (function, direction) {
            (Linear, _) => y,

            (Quadratic, In) => y.sqrt(),
            (Quadratic, Out) => 1.0 - (1.0 - y).sqrt(),
            (Quadratic, InOut) => {
                if y < 0.5 {
                    (y / 2.0).sqrt()
                } else {
                    1.0 - (8.0 * (1.0 - y)).sqrt() / 4.0
                }
            }

            (Cubic, In) => y.cbrt(),
            (Cubic, Out) => 1.0 - (1.0 - y).cbrt(),
            (Cubic, InOut) => {
                if y < 0.5 {
                    (y / 4.0).cbrt()
                } else {
                    1.0 - 0.5 * (2.0 * (1.0 - y)).cbrt()
                }
            }

            (Quartic, In) => y.powf(0.25),
            (Quartic, Out) => 1.0 - (1.0 - y).powf(0.25),
            (Quartic, InOut) => {
                if y < 0.5 {
                    (y / 8.0).powf(0.25)
                } else {
                    1.0 - ((1.0 - y) / 8.0).powf(0.25)
                }
            }

            (Sine, In) => (2.0 / PI) * (y - 1.0).asin() + 1.0,
            (Sine, Out) => (2.0 / PI) * y.asin(),
            (Sine, InOut) => (1.0 - 2.0 * y).acos() / PI,

            (Circular, In) => (y * (2.0 - y)).sqrt(),
            (Circular, Out) => 1.0 - (1.0 - y * y).sqrt(),
            (Circular, InOut) => {
                if y < 0.5 {
                    (y * (1.0 - y)).sqrt()
                } else {
                    1.0 - (y * (1.0 - y)).sqrt()
                }
            }

            // Quintic 精确解；Exponential/Elastic/Back/Bounce 借用它作为近似
            (Quintic | Exponential | Elastic | Back | Bounce, In) => y.powf(0.2),
            (Quintic | Exponential | Elastic | Back | Bounce, Out) => 1.0 - (1.0 - y).powf(0.2),
            (Quintic | Exponential | Elastic | Back | Bounce, InOut) => {
                if y < 0.5 {
                    (y / 16.0).powf(0.2)
                } else {
                    1.0 - 0.5 * (2.0 * (1.0 - y)).powf(0.2)
                }
            }
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Ease {
                function,
                direction,
            } => write!(f, "{}-{}", function.name(), direction.name()),
        }
    }
}

impl FromStr for Curve {
    type Err = CurveError;

    /// 解析形如 `"linear"`、`"quad-out"`、`"cubic-in-out"` 的曲线名
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(CurveError::MalformedName {
                name: s.to_string(),
            });
        }

        match name.split_once('-') {
            Some((function, direction)) => {
                if direction.is_empty() {
                    return Err(CurveError::MalformedName {
                        name: s.to_string(),
                    });
                }
                Self::from_names(function, direction)
            }
            None if name == "linear" => Ok(Self::Linear),
            None if EaseFunction::from_name(&name).is_some() => Err(CurveError::MalformedName {
                name: s.to_string(),
            }),
            None => Err(CurveError::UnknownFunction {
                name: s.to_string(),
            }),
        }
    }
}

fn back_in(x: f32) -> f32 {
    x * x * x - x * (x * PI).sin()
}

/// 分段二次多项式拟合的弹跳
fn bounce_out(x: f32) -> f32 {
    if x < 0.3636 {
        (121.0 * x * x) / 16.0
    } else if x < 0.7272 {
        (9.075 * x * x) - (9.9 * x) + 3.4
    } else if x < 0.9 {
        (12.0665 * x * x) - (19.6355 * x) + 8.8981
    } else {
        (10.8 * x * x) - (20.52 * x) + 10.72
    }
}

/// 不裁剪的线性插值
#[inline]
pub fn lerp_unclamped(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// 反向线性插值，结果裁剪到 [0, 1]；`a == b` 时返回 0
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        0.0
    } else {
        ((value - a) / (b - a)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONOTONIC: [EaseFunction; 6] = [
        EaseFunction::Quadratic,
        EaseFunction::Cubic,
        EaseFunction::Quartic,
        EaseFunction::Quintic,
        EaseFunction::Sine,
        EaseFunction::Circular,
    ];

    fn assert_close(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn test_linear() {
        let curve = Curve::Linear;
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(0.5), 0.5);
        assert_eq!(curve.evaluate(1.0), 1.0);
        assert_eq!(curve.inverse(0.25), 0.25);
    }

    #[test]
    fn test_all_curves_hit_endpoints() {
        for curve in Curve::ALL {
            assert_close(curve.evaluate(0.0), 0.0, 1e-3);
            assert_close(curve.evaluate(1.0), 1.0, 1e-3);
        }
    }

    #[test]
    fn test_all_is_complete_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for curve in Curve::ALL {
            assert!(seen.insert(curve), "duplicate curve {curve}");
        }
        assert_eq!(seen.len(), 31);
    }

    #[test]
    fn test_in_out_midpoint() {
        for function in MONOTONIC {
            let curve = Curve::ease(function, EaseDirection::InOut);
            assert_close(curve.evaluate(0.5), 0.5, 1e-5);
        }
    }

    #[test]
    fn test_monotonic_round_trip() {
        for function in MONOTONIC {
            for direction in EaseDirection::ALL {
                let curve = Curve::ease(function, direction);
                assert!(curve.is_exact_inverse());
                for i in 0..=100 {
                    let y = i as f32 / 100.0;
                    let back = curve.evaluate(curve.inverse(y));
                    assert!(
                        (back - y).abs() < 1e-4,
                        "{curve}: evaluate(inverse({y})) = {back}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_overshoot_inverse_is_approximate() {
        // 近似逆：往返误差明显，仅保证方向大致正确
        let back_out = Curve::ease(EaseFunction::Back, EaseDirection::Out);
        assert!(!back_out.is_exact_inverse());
        let x = back_out.inverse(0.5);
        assert_eq!(x, Curve::ease(EaseFunction::Quintic, EaseDirection::Out).inverse(0.5));
        assert!((back_out.evaluate(x) - 0.5).abs() > 1e-3);

        for function in [
            EaseFunction::Exponential,
            EaseFunction::Elastic,
            EaseFunction::Back,
            EaseFunction::Bounce,
        ] {
            for direction in EaseDirection::ALL {
                let curve = Curve::ease(function, direction);
                let x = curve.inverse(0.3);
                assert!((0.0..=1.0).contains(&x));
            }
        }
    }

    #[test]
    fn test_overshoot_families_leave_unit_range() {
        let back_in = Curve::ease(EaseFunction::Back, EaseDirection::In);
        assert!(back_in.evaluate(0.3) < 0.0);

        let elastic_out = Curve::ease(EaseFunction::Elastic, EaseDirection::Out);
        let peak = (1..100)
            .map(|i| elastic_out.evaluate(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_bounce_out_pieces_are_continuous() {
        for boundary in [0.3636_f32, 0.7272, 0.9] {
            let left = bounce_out(boundary - 1e-4);
            let right = bounce_out(boundary + 1e-4);
            assert_close(left, right, 5e-3);
        }
    }

    #[test]
    fn test_linear_ignores_direction() {
        for direction in EaseDirection::ALL {
            assert_eq!(Curve::ease(EaseFunction::Linear, direction), Curve::Linear);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("linear".parse::<Curve>(), Ok(Curve::Linear));
        assert_eq!(
            "quad-out".parse::<Curve>(),
            Ok(Curve::ease(EaseFunction::Quadratic, EaseDirection::Out))
        );
        assert_eq!(
            "Cubic-In-Out".parse::<Curve>(),
            Ok(Curve::ease(EaseFunction::Cubic, EaseDirection::InOut))
        );
        assert_eq!(
            "quadratic-in".parse::<Curve>(),
            Ok(Curve::ease(EaseFunction::Quadratic, EaseDirection::In))
        );
        assert_eq!(
            Curve::from_names("bounce", "inout"),
            Ok(Curve::ease(EaseFunction::Bounce, EaseDirection::InOut))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "wobble-in".parse::<Curve>(),
            Err(CurveError::UnknownFunction { .. })
        ));
        assert!(matches!(
            "bounce-sideways".parse::<Curve>(),
            Err(CurveError::UnknownDirection { .. })
        ));
        assert!(matches!(
            "quad".parse::<Curve>(),
            Err(CurveError::MalformedName { .. })
        ));
        assert!(matches!(
            "quad-".parse::<Curve>(),
            Err(CurveError::MalformedName { .. })
        ));
        assert!(matches!(
            "".parse::<Curve>(),
            Err(CurveError::MalformedName { .. })
        ));
        assert!(matches!(
            Curve::from_names("sine", ""),
            Err(CurveError::UnknownDirection { .. })
        ));
    }

    #[test]
    fn test_display_parse_identity() {
        for curve in Curve::ALL {
            let name = curve.to_string();
            assert_eq!(name.parse::<Curve>(), Ok(curve), "{name}");
        }
    }

    #[test]
    fn test_curve_names_snapshot() {
        let names: Vec<String> = Curve::ALL
            .iter()
            .filter(|c| c.function() == EaseFunction::Elastic || **c == Curve::Linear)
            .map(|c| c.to_string())
            .collect();
        insta::assert_snapshot!(names.join("\n"), @r"
        linear
        elastic-in
        elastic-out
        elastic-in-out
        ");
    }

    #[test]
    fn test_lerp_helpers() {
        assert_eq!(lerp_unclamped(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp_unclamped(0.0, 10.0, 1.5), 15.0);
        assert_eq!(inverse_lerp(0.0, 10.0, 5.0), 0.5);
        assert_eq!(inverse_lerp(0.0, 10.0, 15.0), 1.0);
        assert_eq!(inverse_lerp(10.0, 0.0, 2.5), 0.75);
        assert_eq!(inverse_lerp(3.0, 3.0, 7.0), 0.0);
    }
}
