//! 错误处理模块
//!
//! 提供配置校验错误类型和稳定的错误代码分类

pub mod code;
pub mod config_error;

pub use code::{ErrorCategory, ErrorCode};
pub use config_error::{ConfigError, Result};
