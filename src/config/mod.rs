//! 客户端配置模块
//!
//! - [`connection`]: Master 地址、TLS、认证和 RPC/心跳时间参数
//! - [`consumer`]: 消费组、订阅目标、静态绑定和再平衡时间参数
//! - [`validation`]: 两者共用的校验规则
//! - [`registration`]: 加入消费组时发送的注册信息

pub mod connection;
pub mod consumer;
pub mod registration;
pub mod validation;

pub use connection::{
    AuthConfig, AuthSettings, ConnectionSecurityConfig, ConnectionSecuritySettings,
    MasterEndpoint, TlsConfig, TlsSettings,
};
pub use consumer::{
    BoundAssignment, BoundSettings, ConsumeMode, ConsumePosition, ConsumptionTargetConfig,
    ConsumptionTargetSettings, PartOffsetMap, TopicFilterMap,
};
pub use registration::{BoundRegistration, RegistrationPayload};

use tracing::warn;

use crate::error::ConfigError;

/// 记录被拒绝的配置修改并原样返回错误
pub(crate) fn rejected(error: ConfigError) -> ConfigError {
    warn!(
        field = error.field(),
        code = %error.code(),
        error = %error,
        "Config change rejected"
    );
    error
}
