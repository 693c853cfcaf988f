//! 配置校验错误类型

use super::code::ErrorCode;
use thiserror::Error;

/// 配置校验错误
///
/// 所有 setter 在失败时返回此错误，失败时不会修改任何已存储的字段。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 格式错误（例如 Master 地址无法解析）
    #[error("invalid format of {field}: {reason}")]
    InvalidFormat { field: &'static str, reason: String },

    /// 启用 TLS 或认证时缺少凭据
    #[error("missing credential for {field}: {reason}")]
    MissingCredential { field: &'static str, reason: String },

    /// 数值超出允许范围
    #[error("{field} out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("group name must not be empty")]
    EmptyGroupName,

    #[error("subscribed topic set must not be empty")]
    EmptyTopicSet,

    #[error("subscribed topic and filter map must not be empty")]
    EmptyTopicFilterMap,

    #[error("session key must not be empty in bound consume mode")]
    EmptySessionKey,

    #[error("source count must be greater than 0 in bound consume mode")]
    InvalidSourceCount,

    #[error("partition offset map must not be empty in bound consume mode")]
    EmptyPartitionMap,

    /// 字段值非法（长度、字符集等）
    #[error("invalid value of {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// 配置尚未完成，不能交给客户端使用
    #[error("{field} is not configured")]
    NotConfigured { field: &'static str },
}

impl ConfigError {
    pub(crate) fn invalid_format(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidFormat {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_credential(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::MissingCredential {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            ConfigError::MissingCredential { .. } => ErrorCode::MissingCredential,
            ConfigError::OutOfRange { .. } => ErrorCode::OutOfRange,
            ConfigError::EmptyGroupName => ErrorCode::EmptyGroupName,
            ConfigError::EmptyTopicSet => ErrorCode::EmptyTopicSet,
            ConfigError::EmptyTopicFilterMap => ErrorCode::EmptyTopicFilterMap,
            ConfigError::EmptySessionKey => ErrorCode::EmptySessionKey,
            ConfigError::InvalidSourceCount => ErrorCode::InvalidSourceCount,
            ConfigError::EmptyPartitionMap => ErrorCode::EmptyPartitionMap,
            ConfigError::InvalidValue { .. } => ErrorCode::InvalidValue,
            ConfigError::NotConfigured { .. } => ErrorCode::NotConfigured,
        }
    }

    /// 获取出错的字段名
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::InvalidFormat { field, .. }
            | ConfigError::MissingCredential { field, .. }
            | ConfigError::OutOfRange { field, .. }
            | ConfigError::InvalidValue { field, .. }
            | ConfigError::NotConfigured { field } => field,
            ConfigError::EmptyGroupName => "group_name",
            ConfigError::EmptyTopicSet | ConfigError::EmptyTopicFilterMap => "topic_filter_map",
            ConfigError::EmptySessionKey => "session_key",
            ConfigError::InvalidSourceCount => "source_count",
            ConfigError::EmptyPartitionMap => "part_offset_map",
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ConfigError>;
