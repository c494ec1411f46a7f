//! # Logging 模块
//!
//! 基于 `tracing-subscriber` 的日志初始化。

use tracing::Level;

use crate::config::ConfigError;

/// 解析日志级别
pub fn parse_level(level: &str) -> Result<Level, ConfigError> {
    level
        .parse()
        .map_err(|_| ConfigError::ValidationFailed(format!("无效的日志级别 '{level}'")))
}

/// 初始化全局日志
///
/// 重复初始化时静默忽略。
pub fn init_logging(level: &str) -> Result<(), ConfigError> {
    let level = parse_level(level)?;
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_level("WARN").unwrap(), Level::WARN);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn test_init_twice_is_ok() {
        assert!(init_logging("info").is_ok());
        assert!(init_logging("debug").is_ok());
        assert!(init_logging("nope").is_err());
    }
}
