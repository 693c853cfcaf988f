//! 错误代码和错误类别定义
//!
//! 配置校验失败时返回的稳定错误代码，供日志与上层客户端判断失败原因

use serde::{Deserialize, Serialize};
use std::fmt;

/// 配置错误代码
///
/// 错误代码按类别分组，每个类别占用1000个代码范围：
/// - 1000-1999: 连接相关错误（Master 地址）
/// - 2000-2999: 安全相关错误（TLS、认证）
/// - 3000-3999: 时间参数相关错误
/// - 4000-4999: 消费目标相关错误（消费组、Topic、静态绑定）
/// - 9000-9999: 通用错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    // ============================================================
    // 连接相关错误 (1000-1999)
    // ============================================================
    InvalidFormat = 1000,

    // ============================================================
    // 安全相关错误 (2000-2999)
    // ============================================================
    MissingCredential = 2000,

    // ============================================================
    // 时间参数相关错误 (3000-3999)
    // ============================================================
    OutOfRange = 3000,

    // ============================================================
    // 消费目标相关错误 (4000-4999)
    // ============================================================
    EmptyGroupName = 4000,
    EmptyTopicSet = 4001,
    EmptyTopicFilterMap = 4002,
    EmptySessionKey = 4003,
    InvalidSourceCount = 4004,
    EmptyPartitionMap = 4005,

    // ============================================================
    // 通用错误 (9000-9999)
    // ============================================================
    InvalidValue = 9001,
    NotConfigured = 9002,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取错误代码的数字值
    #[inline]
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 从数字值创建错误代码
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            1000 => Some(ErrorCode::InvalidFormat),
            2000 => Some(ErrorCode::MissingCredential),
            3000 => Some(ErrorCode::OutOfRange),
            4000 => Some(ErrorCode::EmptyGroupName),
            4001 => Some(ErrorCode::EmptyTopicSet),
            4002 => Some(ErrorCode::EmptyTopicFilterMap),
            4003 => Some(ErrorCode::EmptySessionKey),
            4004 => Some(ErrorCode::InvalidSourceCount),
            4005 => Some(ErrorCode::EmptyPartitionMap),
            9001 => Some(ErrorCode::InvalidValue),
            9002 => Some(ErrorCode::NotConfigured),
            _ => None,
        }
    }

    /// 获取错误代码的英文标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::MissingCredential => "MISSING_CREDENTIAL",
            ErrorCode::OutOfRange => "OUT_OF_RANGE",
            ErrorCode::EmptyGroupName => "EMPTY_GROUP_NAME",
            ErrorCode::EmptyTopicSet => "EMPTY_TOPIC_SET",
            ErrorCode::EmptyTopicFilterMap => "EMPTY_TOPIC_FILTER_MAP",
            ErrorCode::EmptySessionKey => "EMPTY_SESSION_KEY",
            ErrorCode::InvalidSourceCount => "INVALID_SOURCE_COUNT",
            ErrorCode::EmptyPartitionMap => "EMPTY_PARTITION_MAP",
            ErrorCode::InvalidValue => "INVALID_VALUE",
            ErrorCode::NotConfigured => "NOT_CONFIGURED",
        }
    }

    /// 获取错误代码的类别（用于错误分类）
    pub fn category(&self) -> ErrorCategory {
        match self.as_u32() {
            1000..=1999 => ErrorCategory::Connection,
            2000..=2999 => ErrorCategory::Security,
            3000..=3999 => ErrorCategory::Timing,
            4000..=4999 => ErrorCategory::Target,
            _ => ErrorCategory::General,
        }
    }
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Connection,
    Security,
    Timing,
    Target,
    General,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Connection => write!(f, "CONNECTION"),
            ErrorCategory::Security => write!(f, "SECURITY"),
            ErrorCategory::Timing => write!(f, "TIMING"),
            ErrorCategory::Target => write!(f, "TARGET"),
            ErrorCategory::General => write!(f, "GENERAL"),
        }
    }
}
