//! TubeMQ Client Config
//!
//! 消费者连接 TubeMQ 集群所需的配置与消费组成员约定：连接与安全参数、消费目标、
//! 静态分区绑定，以及在交给运行时客户端和 RPC 层之前必须通过的校验。
//!
//! ```
//! use std::collections::{BTreeMap, BTreeSet};
//! use tubemq_client_config::{ConnectionSecurityConfig, ConsumptionTargetConfig};
//!
//! # fn main() -> tubemq_client_config::Result<()> {
//! let connection = ConnectionSecurityConfig::new("127.0.0.1:8715")?;
//! let mut config = ConsumptionTargetConfig::new(connection);
//!
//! let mut topics = BTreeMap::new();
//! topics.insert("demo".to_string(), BTreeSet::new());
//! let mut offsets = BTreeMap::new();
//! offsets.insert("123:demo:0".to_string(), 0);
//! config.set_bound_target("test_group", &topics, "session-1", 2, false, &offsets)?;
//!
//! assert!(config.is_bound_consume());
//! let payload = config.registration_payload()?;
//! assert_eq!(payload.consume_mode, "bound");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;

// Re-exports
pub use config::{
    BoundAssignment, ConnectionSecurityConfig, ConsumeMode, ConsumePosition,
    ConsumptionTargetConfig, MasterEndpoint, PartOffsetMap, RegistrationPayload, TopicFilterMap,
};
pub use error::{ConfigError, ErrorCategory, ErrorCode, Result};
