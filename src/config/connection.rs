//! 连接与安全配置
//!
//! Master 地址、TLS、用户认证以及 RPC/心跳时间参数。每个字段独立校验，
//! 校验失败时保留原值。

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rejected;
use super::validation::{
    check_credential_pair, check_positive, check_range, parse_master_address,
    RPC_READ_TIMEOUT_MAX_MS, RPC_READ_TIMEOUT_MIN_MS,
};
use crate::error::{ConfigError, Result};

pub const DEFAULT_RPC_READ_TIMEOUT_MS: u32 = 15_000;
pub const DEFAULT_HEARTBEAT_PERIOD_MS: u32 = 10_000;
pub const DEFAULT_MAX_HEARTBEAT_RETRY_TIMES: u32 = 5;
pub const DEFAULT_HEARTBEAT_PERIOD_AFTER_FAIL_MS: u32 = 60_000;

const MASKED: &str = "******";

/// Master 节点地址
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MasterEndpoint {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for MasterEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// TLS 信任库配置，仅在启用 TLS 时存在
#[derive(Clone, PartialEq, Eq)]
pub struct TlsConfig {
    trust_store_path: String,
    trust_store_password: String,
}

impl TlsConfig {
    pub fn trust_store_path(&self) -> &str {
        &self.trust_store_path
    }

    pub fn trust_store_password(&self) -> &str {
        &self.trust_store_password
    }
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("trust_store_path", &self.trust_store_path)
            .field("trust_store_password", &MASKED)
            .finish()
    }
}

/// 用户认证信息，仅在启用认证时存在
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    username: String,
    password: String,
}

impl AuthConfig {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &MASKED)
            .finish()
    }
}

/// 连接与安全配置
///
/// 构建阶段由单个线程逐字段设置；交给客户端后视为只读，可通过 `Arc` 或克隆在线程间共享。
/// `Clone` 为深拷贝，副本与原对象互不影响。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ConnectionSecuritySettings")]
pub struct ConnectionSecurityConfig {
    master_address: String,
    endpoints: Vec<MasterEndpoint>,
    tls: Option<TlsConfig>,
    auth: Option<AuthConfig>,
    rpc_read_timeout_ms: u32,
    heartbeat_period_ms: u32,
    max_heartbeat_retry_times: u32,
    heartbeat_period_after_fail_ms: u32,
}

impl Default for ConnectionSecurityConfig {
    fn default() -> Self {
        Self {
            master_address: String::new(),
            endpoints: Vec::new(),
            tls: None,
            auth: None,
            rpc_read_timeout_ms: DEFAULT_RPC_READ_TIMEOUT_MS,
            heartbeat_period_ms: DEFAULT_HEARTBEAT_PERIOD_MS,
            max_heartbeat_retry_times: DEFAULT_MAX_HEARTBEAT_RETRY_TIMES,
            heartbeat_period_after_fail_ms: DEFAULT_HEARTBEAT_PERIOD_AFTER_FAIL_MS,
        }
    }
}

impl ConnectionSecurityConfig {
    /// 使用 Master 地址创建配置，其余字段取默认值
    pub fn new(master_address: &str) -> Result<Self> {
        let mut config = Self::default();
        config.set_master_address(master_address)?;
        Ok(config)
    }

    /// 设置 Master 地址（逗号分隔的 `host:port` 列表）
    pub fn set_master_address(&mut self, addr: &str) -> Result<()> {
        let endpoints = parse_master_address(addr).map_err(rejected)?;
        debug!(
            master_address = %addr,
            endpoint_count = endpoints.len(),
            "Master address accepted"
        );
        self.master_address = addr.to_string();
        self.endpoints = endpoints;
        Ok(())
    }

    /// 设置 TLS 信息；禁用时清除已保存的信任库信息
    pub fn set_tls(
        &mut self,
        enabled: bool,
        trust_store_path: &str,
        trust_store_password: &str,
    ) -> Result<()> {
        check_credential_pair(
            "tls",
            enabled,
            ("trust_store_path", trust_store_path),
            ("trust_store_password", trust_store_password),
        )
        .map_err(rejected)?;

        self.tls = enabled.then(|| TlsConfig {
            trust_store_path: trust_store_path.to_string(),
            trust_store_password: trust_store_password.to_string(),
        });
        debug!(tls_enabled = enabled, "TLS setting accepted");
        Ok(())
    }

    /// 设置用户认证信息；禁用时清除已保存的用户名和密码
    pub fn set_authentication(
        &mut self,
        enabled: bool,
        username: &str,
        password: &str,
    ) -> Result<()> {
        check_credential_pair(
            "authentication",
            enabled,
            ("username", username),
            ("password", password),
        )
        .map_err(rejected)?;

        self.auth = enabled.then(|| AuthConfig {
            username: username.to_string(),
            password: password.to_string(),
        });
        debug!(auth_enabled = enabled, "Authentication setting accepted");
        Ok(())
    }

    /// 设置 RPC 读超时（毫秒），取值范围 [8000, 300000]
    pub fn set_rpc_read_timeout_ms(&mut self, rpc_read_timeout_ms: u32) -> Result<()> {
        check_range(
            "rpc_read_timeout_ms",
            i64::from(rpc_read_timeout_ms),
            i64::from(RPC_READ_TIMEOUT_MIN_MS),
            i64::from(RPC_READ_TIMEOUT_MAX_MS),
        )
        .map_err(rejected)?;
        self.rpc_read_timeout_ms = rpc_read_timeout_ms;
        Ok(())
    }

    /// 设置心跳周期（毫秒）
    pub fn set_heartbeat_period_ms(&mut self, heartbeat_period_ms: u32) -> Result<()> {
        check_positive("heartbeat_period_ms", heartbeat_period_ms).map_err(rejected)?;
        self.heartbeat_period_ms = heartbeat_period_ms;
        Ok(())
    }

    pub fn set_max_heartbeat_retry_times(&mut self, max_heartbeat_retry_times: u32) -> Result<()> {
        check_positive("max_heartbeat_retry_times", max_heartbeat_retry_times)
            .map_err(rejected)?;
        self.max_heartbeat_retry_times = max_heartbeat_retry_times;
        Ok(())
    }

    /// 设置心跳连续失败后的心跳周期（毫秒）
    pub fn set_heartbeat_period_after_fail_ms(
        &mut self,
        heartbeat_period_after_fail_ms: u32,
    ) -> Result<()> {
        check_positive("heartbeat_period_after_fail_ms", heartbeat_period_after_fail_ms)
            .map_err(rejected)?;
        self.heartbeat_period_after_fail_ms = heartbeat_period_after_fail_ms;
        Ok(())
    }

    /// 原始 Master 地址字符串
    ///
    /// 按调用方传入的内容原样返回，不做去空白等规范化；规范化后的节点见 [`Self::endpoints`]。
    pub fn master_address(&self) -> &str {
        &self.master_address
    }

    /// 解析后的 Master 节点列表，顺序与地址字符串一致
    pub fn endpoints(&self) -> &[MasterEndpoint] {
        &self.endpoints
    }

    pub fn tls(&self) -> Option<&TlsConfig> {
        self.tls.as_ref()
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// 信任库路径，未启用 TLS 时为空字符串
    pub fn trust_store_path(&self) -> &str {
        self.tls.as_ref().map_or("", TlsConfig::trust_store_path)
    }

    pub fn trust_store_password(&self) -> &str {
        self.tls.as_ref().map_or("", TlsConfig::trust_store_password)
    }

    pub fn auth(&self) -> Option<&AuthConfig> {
        self.auth.as_ref()
    }

    pub fn is_authentication_enabled(&self) -> bool {
        self.auth.is_some()
    }

    /// 用户名，未启用认证时为空字符串
    pub fn username(&self) -> &str {
        self.auth.as_ref().map_or("", AuthConfig::username)
    }

    pub fn password(&self) -> &str {
        self.auth.as_ref().map_or("", AuthConfig::password)
    }

    pub fn rpc_read_timeout_ms(&self) -> u32 {
        self.rpc_read_timeout_ms
    }

    pub fn rpc_read_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.rpc_read_timeout_ms))
    }

    pub fn heartbeat_period_ms(&self) -> u32 {
        self.heartbeat_period_ms
    }

    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.heartbeat_period_ms))
    }

    pub fn max_heartbeat_retry_times(&self) -> u32 {
        self.max_heartbeat_retry_times
    }

    pub fn heartbeat_period_after_fail_ms(&self) -> u32 {
        self.heartbeat_period_after_fail_ms
    }

    pub fn heartbeat_period_after_fail(&self) -> Duration {
        Duration::from_millis(u64::from(self.heartbeat_period_after_fail_ms))
    }

    pub(crate) fn ensure_ready(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(rejected(ConfigError::NotConfigured {
                field: "master_address",
            }));
        }
        Ok(())
    }
}

impl fmt::Display for ConnectionSecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = |value: &str| if value.is_empty() { "" } else { MASKED };
        write!(
            f,
            "ConnectionSecurityConfig: {{master_address='{}', tls_enabled={}, \
             trust_store_path='{}', trust_store_password='{}', auth_enabled={}, \
             username='{}', password='{}', \
             rpc_read_timeout_ms={}, heartbeat_period_ms={}, max_heartbeat_retry_times={}, \
             heartbeat_period_after_fail_ms={}}}",
            self.master_address,
            self.is_tls_enabled(),
            self.trust_store_path(),
            secret(self.trust_store_password()),
            self.is_authentication_enabled(),
            self.username(),
            secret(self.password()),
            self.rpc_read_timeout_ms,
            self.heartbeat_period_ms,
            self.max_heartbeat_retry_times,
            self.heartbeat_period_after_fail_ms,
        )
    }
}

/// 连接配置的反序列化形式
///
/// 反序列化结果经过与 setter 相同的校验后才会转换为 [`ConnectionSecurityConfig`]。
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSecuritySettings {
    pub master_address: String,
    #[serde(default)]
    pub tls: Option<TlsSettings>,
    #[serde(default)]
    pub auth: Option<AuthSettings>,
    #[serde(default = "default_rpc_read_timeout_ms")]
    pub rpc_read_timeout_ms: u32,
    #[serde(default = "default_heartbeat_period_ms")]
    pub heartbeat_period_ms: u32,
    #[serde(default = "default_max_heartbeat_retry_times")]
    pub max_heartbeat_retry_times: u32,
    #[serde(default = "default_heartbeat_period_after_fail_ms")]
    pub heartbeat_period_after_fail_ms: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TlsSettings {
    pub enabled: bool,
    #[serde(default)]
    pub trust_store_path: String,
    #[serde(default)]
    pub trust_store_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub enabled: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_rpc_read_timeout_ms() -> u32 {
    DEFAULT_RPC_READ_TIMEOUT_MS
}

fn default_heartbeat_period_ms() -> u32 {
    DEFAULT_HEARTBEAT_PERIOD_MS
}

fn default_max_heartbeat_retry_times() -> u32 {
    DEFAULT_MAX_HEARTBEAT_RETRY_TIMES
}

fn default_heartbeat_period_after_fail_ms() -> u32 {
    DEFAULT_HEARTBEAT_PERIOD_AFTER_FAIL_MS
}

impl TryFrom<ConnectionSecuritySettings> for ConnectionSecurityConfig {
    type Error = ConfigError;

    fn try_from(settings: ConnectionSecuritySettings) -> Result<Self> {
        let mut config = Self::new(&settings.master_address)?;
        if let Some(tls) = settings.tls {
            config.set_tls(tls.enabled, &tls.trust_store_path, &tls.trust_store_password)?;
        }
        if let Some(auth) = settings.auth {
            config.set_authentication(auth.enabled, &auth.username, &auth.password)?;
        }
        config.set_rpc_read_timeout_ms(settings.rpc_read_timeout_ms)?;
        config.set_heartbeat_period_ms(settings.heartbeat_period_ms)?;
        config.set_max_heartbeat_retry_times(settings.max_heartbeat_retry_times)?;
        config.set_heartbeat_period_after_fail_ms(settings.heartbeat_period_after_fail_ms)?;
        Ok(config)
    }
}
