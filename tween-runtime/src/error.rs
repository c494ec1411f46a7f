//! # Error 模块
//!
//! 定义 tween-runtime 中使用的错误类型。
//!
//! - 配置阶段的错误（曲线名、属性名）直接返回给调用方
//! - 逐帧推进时的绑定错误只记录日志并取消对应过渡，不会向 tick 循环传播

use thiserror::Error;

/// 曲线选择错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    /// 未知的缓动函数名
    #[error("未知的缓动函数 '{name}'")]
    UnknownFunction { name: String },

    /// 未知的缓动方向
    #[error("缓动函数 '{function}' 不支持方向 '{direction}'")]
    UnknownDirection { function: String, direction: String },

    /// 曲线名格式错误
    #[error("无效的曲线名 '{name}'，期望形如 'quad-out' 或 'linear'")]
    MalformedName { name: String },
}

/// 值绑定读写错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// 属性不存在
    #[error("属性 '{property}' 不存在")]
    UnknownProperty { property: String },

    /// 绑定的目标对象已被释放
    #[error("绑定的目标对象已被释放")]
    TargetDropped,

    /// 宿主拒绝读写
    #[error("宿主拒绝读写: {message}")]
    Rejected { message: String },
}

/// tween-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// 曲线错误
    #[error("曲线错误: {0}")]
    Curve(#[from] CurveError),

    /// 绑定错误
    #[error("绑定错误: {0}")]
    Binding(#[from] BindingError),
}

/// Result 类型别名
pub type TransitionResult<T> = Result<T, TransitionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: TransitionError = CurveError::MalformedName {
            name: "quad-".to_string(),
        }
        .into();
        assert!(matches!(err, TransitionError::Curve(_)));

        let err: TransitionError = BindingError::TargetDropped.into();
        assert_eq!(err, TransitionError::Binding(BindingError::TargetDropped));
    }

    #[test]
    fn test_error_display_mentions_name() {
        let err = CurveError::UnknownDirection {
            function: "bounce".to_string(),
            direction: "sideways".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("bounce"));
        assert!(text.contains("sideways"));
    }
}
