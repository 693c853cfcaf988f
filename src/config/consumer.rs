//! 消费配置
//!
//! 消费组、订阅 Topic 及过滤项、消费模式（动态再平衡 / 静态绑定）、起始消费位置和
//! 再平衡相关的时间参数。连接与安全配置以组合方式内嵌。
//!
//! 订阅目标只能通过三个互斥的入口之一建立：
//! - [`ConsumptionTargetConfig::set_simple_target`]：仅指定 Topic 集合
//! - [`ConsumptionTargetConfig::set_filtered_target`]：指定 Topic 及其过滤项
//! - [`ConsumptionTargetConfig::set_bound_target`]：静态绑定分区及起始 offset
//!
//! 静态绑定所需的字段只存在于 [`ConsumeMode::Bound`] 中，无法单独设置，
//! 因此 `is_bound_consume() == true` 时会话 Key、成员数量和分区映射总是一起出现。

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::connection::ConnectionSecurityConfig;
use super::registration::RegistrationPayload;
use super::rejected;
use super::validation::{
    check_positive, validate_group_name, validate_part_offset_map, validate_session_key,
    validate_source_count, validate_topic_filter_map,
};
use crate::error::{ConfigError, Result};

pub const DEFAULT_MSG_NOT_FOUND_WAIT_PERIOD_MS: u32 = 200;
pub const DEFAULT_MAX_PART_CHECK_PERIOD_MS: u32 = 60_000;
pub const DEFAULT_PART_CHECK_SLICE_MS: u32 = 300;
pub const DEFAULT_MAX_SUB_INFO_REPORT_INTERVAL: u32 = 6;
pub const DEFAULT_REB_CONFIRM_WAIT_PERIOD_MS: u32 = 3_000;
pub const DEFAULT_MAX_CONFIRM_WAIT_PERIOD_MS: u32 = 60_000;
pub const DEFAULT_SHUTDOWN_REB_WAIT_PERIOD_MS: u32 = 10_000;

/// Topic 到过滤项集合的映射，空集合表示该 Topic 不过滤
pub type TopicFilterMap = BTreeMap<String, BTreeSet<String>>;

/// 分区 Key 到起始 offset 的映射
pub type PartOffsetMap = BTreeMap<String, i64>;

/// 无已提交 offset 时的起始消费位置
///
/// 数值会原样写入注册请求，不可修改。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum ConsumePosition {
    /// 从最早的 offset 开始消费
    FromFirst = -1,
    /// 从最新的 offset 开始消费
    #[default]
    FromLatest = 0,
    /// 总是从最大 offset 开始消费，忽略已提交的 offset
    FromMaxAlways = 1,
}

impl ConsumePosition {
    #[inline]
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

impl From<ConsumePosition> for i32 {
    fn from(position: ConsumePosition) -> Self {
        position.as_i32()
    }
}

impl TryFrom<i32> for ConsumePosition {
    type Error = ConfigError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            -1 => Ok(ConsumePosition::FromFirst),
            0 => Ok(ConsumePosition::FromLatest),
            1 => Ok(ConsumePosition::FromMaxAlways),
            _ => Err(ConfigError::OutOfRange {
                field: "consume_position",
                value: i64::from(value),
                min: -1,
                max: 1,
            }),
        }
    }
}

impl fmt::Display for ConsumePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsumePosition::FromFirst => write!(f, "FROM_FIRST"),
            ConsumePosition::FromLatest => write!(f, "FROM_LATEST"),
            ConsumePosition::FromMaxAlways => write!(f, "FROM_MAX_ALWAYS"),
        }
    }
}

/// 静态绑定信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundAssignment {
    session_key: String,
    source_count: u32,
    select_big: bool,
    part_offset_map: PartOffsetMap,
}

impl BoundAssignment {
    /// 同一绑定消费组内所有成员共享的会话 Key
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// 绑定消费组预期的成员总数
    pub fn source_count(&self) -> u32 {
        self.source_count
    }

    /// 多个候选 offset 冲突时是否选择较大值
    pub fn is_select_big(&self) -> bool {
        self.select_big
    }

    pub fn part_offset_map(&self) -> &PartOffsetMap {
        &self.part_offset_map
    }

    /// 按 `brokerId:topic:partitionId` 约定筛选属于指定 Topic 的分区
    pub fn partition_keys_for_topic<'a>(
        &'a self,
        topic: &'a str,
    ) -> impl Iterator<Item = (&'a str, i64)> + 'a {
        self.part_offset_map
            .iter()
            .filter(move |(key, _)| {
                let mut parts = key.split(':');
                matches!(
                    (parts.next(), parts.next(), parts.next(), parts.next()),
                    (Some(_), Some(t), Some(_), None) if t == topic
                )
            })
            .map(|(key, offset)| (key.as_str(), *offset))
    }
}

/// 消费模式
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConsumeMode {
    /// 参与动态再平衡
    #[default]
    Unbound,
    /// 静态绑定分区及起始 offset
    Bound(BoundAssignment),
}

impl ConsumeMode {
    pub fn is_bound(&self) -> bool {
        matches!(self, ConsumeMode::Bound(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumeMode::Unbound => "unbound",
            ConsumeMode::Bound(_) => "bound",
        }
    }
}

/// 消费配置
///
/// 构建阶段由单个线程设置；客户端启动后视为只读，运行时组件只读取不修改。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ConsumptionTargetSettings")]
pub struct ConsumptionTargetConfig {
    connection: ConnectionSecurityConfig,
    group_name: String,
    topic_filter_map: TopicFilterMap,
    consume_mode: ConsumeMode,
    consume_position: ConsumePosition,
    msg_not_found_wait_period_ms: u32,
    max_part_check_period_ms: u32,
    part_check_slice_ms: u32,
    max_sub_info_report_interval: u32,
    rollback_if_confirm_timeout: bool,
    reb_confirm_wait_period_ms: u32,
    max_confirm_wait_period_ms: u32,
    shutdown_reb_wait_period_ms: u32,
}

impl Default for ConsumptionTargetConfig {
    fn default() -> Self {
        Self::new(ConnectionSecurityConfig::default())
    }
}

impl ConsumptionTargetConfig {
    /// 使用连接配置创建消费配置，订阅目标尚未建立
    pub fn new(connection: ConnectionSecurityConfig) -> Self {
        Self {
            connection,
            group_name: String::new(),
            topic_filter_map: TopicFilterMap::new(),
            consume_mode: ConsumeMode::Unbound,
            consume_position: ConsumePosition::default(),
            msg_not_found_wait_period_ms: DEFAULT_MSG_NOT_FOUND_WAIT_PERIOD_MS,
            max_part_check_period_ms: DEFAULT_MAX_PART_CHECK_PERIOD_MS,
            part_check_slice_ms: DEFAULT_PART_CHECK_SLICE_MS,
            max_sub_info_report_interval: DEFAULT_MAX_SUB_INFO_REPORT_INTERVAL,
            rollback_if_confirm_timeout: true,
            reb_confirm_wait_period_ms: DEFAULT_REB_CONFIRM_WAIT_PERIOD_MS,
            max_confirm_wait_period_ms: DEFAULT_MAX_CONFIRM_WAIT_PERIOD_MS,
            shutdown_reb_wait_period_ms: DEFAULT_SHUTDOWN_REB_WAIT_PERIOD_MS,
        }
    }

    pub fn connection(&self) -> &ConnectionSecurityConfig {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionSecurityConfig {
        &mut self.connection
    }

    /// 订阅 Topic 集合（不带过滤项），消费模式为动态再平衡
    pub fn set_simple_target<I, S>(&mut self, group_name: &str, topics: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let topic_filter_map: TopicFilterMap = topics
            .into_iter()
            .map(|topic| (topic.into(), BTreeSet::new()))
            .collect();
        // 组名先于 Topic 集合校验，保证两者都非法时报告组名错误
        validate_group_name(group_name).map_err(rejected)?;
        if topic_filter_map.is_empty() {
            return Err(rejected(ConfigError::EmptyTopicSet));
        }
        self.apply_target(group_name, &topic_filter_map, None)
    }

    /// 订阅 Topic 及其过滤项，消费模式为动态再平衡
    pub fn set_filtered_target(
        &mut self,
        group_name: &str,
        topic_filter_map: &TopicFilterMap,
    ) -> Result<()> {
        self.apply_target(group_name, topic_filter_map, None)
    }

    /// 静态绑定分区及起始 offset
    ///
    /// 同一消费组的所有成员必须使用相同的 `session_key` 和 `source_count`，
    /// 否则 Master 会拒绝加入请求。
    pub fn set_bound_target(
        &mut self,
        group_name: &str,
        topic_filter_map: &TopicFilterMap,
        session_key: &str,
        source_count: u32,
        select_big: bool,
        part_offset_map: &PartOffsetMap,
    ) -> Result<()> {
        self.apply_target(
            group_name,
            topic_filter_map,
            Some((session_key, source_count, select_big, part_offset_map)),
        )
    }

    fn apply_target(
        &mut self,
        group_name: &str,
        topic_filter_map: &TopicFilterMap,
        bound: Option<(&str, u32, bool, &PartOffsetMap)>,
    ) -> Result<()> {
        let group_name = validate_group_name(group_name).map_err(rejected)?;
        let topic_filter_map = validate_topic_filter_map(topic_filter_map).map_err(rejected)?;
        let consume_mode = match bound {
            None => ConsumeMode::Unbound,
            Some((session_key, source_count, select_big, part_offset_map)) => {
                ConsumeMode::Bound(BoundAssignment {
                    session_key: validate_session_key(session_key).map_err(rejected)?,
                    source_count: validate_source_count(source_count).map_err(rejected)?,
                    select_big,
                    part_offset_map: validate_part_offset_map(part_offset_map)
                        .map_err(rejected)?,
                })
            }
        };

        info!(
            group = %group_name,
            topic_count = topic_filter_map.len(),
            mode = consume_mode.as_str(),
            "Consume target established"
        );
        self.group_name = group_name;
        self.topic_filter_map = topic_filter_map;
        self.consume_mode = consume_mode;
        Ok(())
    }

    pub fn set_consume_position(&mut self, consume_position: ConsumePosition) {
        self.consume_position = consume_position;
    }

    /// 设置分区无消息时的等待时间（毫秒）
    pub fn set_msg_not_found_wait_period_ms(&mut self, wait_period_ms: u32) -> Result<()> {
        check_positive("msg_not_found_wait_period_ms", wait_period_ms).map_err(rejected)?;
        self.msg_not_found_wait_period_ms = wait_period_ms;
        Ok(())
    }

    pub fn set_max_part_check_period_ms(&mut self, max_part_check_period_ms: u32) -> Result<()> {
        check_positive("max_part_check_period_ms", max_part_check_period_ms).map_err(rejected)?;
        self.max_part_check_period_ms = max_part_check_period_ms;
        Ok(())
    }

    pub fn set_part_check_slice_ms(&mut self, part_check_slice_ms: u32) -> Result<()> {
        check_positive("part_check_slice_ms", part_check_slice_ms).map_err(rejected)?;
        self.part_check_slice_ms = part_check_slice_ms;
        Ok(())
    }

    /// 设置订阅信息上报的最大间隔（心跳次数）
    pub fn set_max_sub_info_report_interval(
        &mut self,
        max_sub_info_report_interval: u32,
    ) -> Result<()> {
        check_positive("max_sub_info_report_interval", max_sub_info_report_interval)
            .map_err(rejected)?;
        self.max_sub_info_report_interval = max_sub_info_report_interval;
        Ok(())
    }

    /// 确认超时后是否回滚 offset
    pub fn set_rollback_if_confirm_timeout(&mut self, rollback: bool) {
        self.rollback_if_confirm_timeout = rollback;
    }

    /// 设置再平衡时等待消费确认的周期（毫秒）
    pub fn set_reb_confirm_wait_period_ms(
        &mut self,
        reb_confirm_wait_period_ms: u32,
    ) -> Result<()> {
        check_positive("reb_confirm_wait_period_ms", reb_confirm_wait_period_ms)
            .map_err(rejected)?;
        self.reb_confirm_wait_period_ms = reb_confirm_wait_period_ms;
        Ok(())
    }

    pub fn set_max_confirm_wait_period_ms(
        &mut self,
        max_confirm_wait_period_ms: u32,
    ) -> Result<()> {
        check_positive("max_confirm_wait_period_ms", max_confirm_wait_period_ms)
            .map_err(rejected)?;
        self.max_confirm_wait_period_ms = max_confirm_wait_period_ms;
        Ok(())
    }

    /// 设置关闭时等待再平衡完成的时间（毫秒）
    pub fn set_shutdown_reb_wait_period_ms(
        &mut self,
        shutdown_reb_wait_period_ms: u32,
    ) -> Result<()> {
        check_positive("shutdown_reb_wait_period_ms", shutdown_reb_wait_period_ms)
            .map_err(rejected)?;
        self.shutdown_reb_wait_period_ms = shutdown_reb_wait_period_ms;
        Ok(())
    }

    /// 消费组名称，订阅目标未建立时为空字符串
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn topic_filter_map(&self) -> &TopicFilterMap {
        &self.topic_filter_map
    }

    pub fn consume_mode(&self) -> &ConsumeMode {
        &self.consume_mode
    }

    pub fn is_bound_consume(&self) -> bool {
        self.consume_mode.is_bound()
    }

    pub fn bound_assignment(&self) -> Option<&BoundAssignment> {
        match &self.consume_mode {
            ConsumeMode::Bound(assignment) => Some(assignment),
            ConsumeMode::Unbound => None,
        }
    }

    /// 会话 Key，非绑定模式下为空字符串
    pub fn session_key(&self) -> &str {
        self.bound_assignment().map_or("", BoundAssignment::session_key)
    }

    /// 绑定成员数量，非绑定模式下为 0
    pub fn source_count(&self) -> u32 {
        self.bound_assignment().map_or(0, BoundAssignment::source_count)
    }

    pub fn is_select_big(&self) -> bool {
        self.bound_assignment().is_some_and(BoundAssignment::is_select_big)
    }

    /// 分区起始 offset，非绑定模式下为 `None`
    pub fn part_offset_map(&self) -> Option<&PartOffsetMap> {
        self.bound_assignment().map(BoundAssignment::part_offset_map)
    }

    pub fn consume_position(&self) -> ConsumePosition {
        self.consume_position
    }

    pub fn msg_not_found_wait_period_ms(&self) -> u32 {
        self.msg_not_found_wait_period_ms
    }

    pub fn max_part_check_period_ms(&self) -> u32 {
        self.max_part_check_period_ms
    }

    pub fn part_check_slice_ms(&self) -> u32 {
        self.part_check_slice_ms
    }

    pub fn max_sub_info_report_interval(&self) -> u32 {
        self.max_sub_info_report_interval
    }

    pub fn is_rollback_if_confirm_timeout(&self) -> bool {
        self.rollback_if_confirm_timeout
    }

    pub fn reb_confirm_wait_period_ms(&self) -> u32 {
        self.reb_confirm_wait_period_ms
    }

    pub fn max_confirm_wait_period_ms(&self) -> u32 {
        self.max_confirm_wait_period_ms
    }

    pub fn shutdown_reb_wait_period_ms(&self) -> u32 {
        self.shutdown_reb_wait_period_ms
    }

    /// 检查配置是否可以交给客户端：Master 地址已设置且订阅目标已建立
    pub fn ensure_ready(&self) -> Result<()> {
        self.connection.ensure_ready()?;
        if self.group_name.is_empty() || self.topic_filter_map.is_empty() {
            return Err(rejected(ConfigError::NotConfigured {
                field: "consume_target",
            }));
        }
        debug!(group = %self.group_name, "Consumer config is ready");
        Ok(())
    }

    /// 生成加入消费组时发送给 Master 的注册信息
    pub fn registration_payload(&self) -> Result<RegistrationPayload> {
        self.ensure_ready()?;
        Ok(RegistrationPayload::from_config(self))
    }
}

impl fmt::Display for ConsumptionTargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConsumptionTargetConfig: {{group_name='{}', topic_filter_map={{",
            self.group_name
        )?;
        for (i, (topic, filters)) in self.topic_filter_map.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let filters: Vec<&str> = filters.iter().map(String::as_str).collect();
            write!(f, "{}=[{}]", topic, filters.join(","))?;
        }
        write!(f, "}}, bound_consume={}", self.is_bound_consume())?;
        if let Some(bound) = self.bound_assignment() {
            write!(
                f,
                ", session_key='{}', source_count={}, select_big={}, part_offset_map={{",
                bound.session_key, bound.source_count, bound.select_big
            )?;
            for (i, (part_key, offset)) in bound.part_offset_map.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", part_key, offset)?;
            }
            write!(f, "}}")?;
        }
        write!(
            f,
            ", consume_position={}, msg_not_found_wait_period_ms={}, max_part_check_period_ms={}, \
             part_check_slice_ms={}, max_sub_info_report_interval={}, \
             rollback_if_confirm_timeout={}, \
             reb_confirm_wait_period_ms={}, max_confirm_wait_period_ms={}, \
             shutdown_reb_wait_period_ms={}, {}}}",
            self.consume_position,
            self.msg_not_found_wait_period_ms,
            self.max_part_check_period_ms,
            self.part_check_slice_ms,
            self.max_sub_info_report_interval,
            self.rollback_if_confirm_timeout,
            self.reb_confirm_wait_period_ms,
            self.max_confirm_wait_period_ms,
            self.shutdown_reb_wait_period_ms,
            self.connection,
        )
    }
}

/// 消费配置的反序列化形式
///
/// 存在 `bound` 时走静态绑定入口，否则走带过滤项的动态再平衡入口。
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumptionTargetSettings {
    pub connection: ConnectionSecurityConfig,
    pub group_name: String,
    pub topics: TopicFilterMap,
    #[serde(default)]
    pub bound: Option<BoundSettings>,
    #[serde(default)]
    pub consume_position: ConsumePosition,
    #[serde(default = "default_msg_not_found_wait_period_ms")]
    pub msg_not_found_wait_period_ms: u32,
    #[serde(default = "default_max_part_check_period_ms")]
    pub max_part_check_period_ms: u32,
    #[serde(default = "default_part_check_slice_ms")]
    pub part_check_slice_ms: u32,
    #[serde(default = "default_max_sub_info_report_interval")]
    pub max_sub_info_report_interval: u32,
    #[serde(default = "default_rollback_if_confirm_timeout")]
    pub rollback_if_confirm_timeout: bool,
    #[serde(default = "default_reb_confirm_wait_period_ms")]
    pub reb_confirm_wait_period_ms: u32,
    #[serde(default = "default_max_confirm_wait_period_ms")]
    pub max_confirm_wait_period_ms: u32,
    #[serde(default = "default_shutdown_reb_wait_period_ms")]
    pub shutdown_reb_wait_period_ms: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoundSettings {
    pub session_key: String,
    pub source_count: u32,
    #[serde(default)]
    pub select_big: bool,
    pub part_offset_map: PartOffsetMap,
}

fn default_msg_not_found_wait_period_ms() -> u32 {
    DEFAULT_MSG_NOT_FOUND_WAIT_PERIOD_MS
}

fn default_max_part_check_period_ms() -> u32 {
    DEFAULT_MAX_PART_CHECK_PERIOD_MS
}

fn default_part_check_slice_ms() -> u32 {
    DEFAULT_PART_CHECK_SLICE_MS
}

fn default_max_sub_info_report_interval() -> u32 {
    DEFAULT_MAX_SUB_INFO_REPORT_INTERVAL
}

fn default_rollback_if_confirm_timeout() -> bool {
    true
}

fn default_reb_confirm_wait_period_ms() -> u32 {
    DEFAULT_REB_CONFIRM_WAIT_PERIOD_MS
}

fn default_max_confirm_wait_period_ms() -> u32 {
    DEFAULT_MAX_CONFIRM_WAIT_PERIOD_MS
}

fn default_shutdown_reb_wait_period_ms() -> u32 {
    DEFAULT_SHUTDOWN_REB_WAIT_PERIOD_MS
}

impl TryFrom<ConsumptionTargetSettings> for ConsumptionTargetConfig {
    type Error = ConfigError;

    fn try_from(settings: ConsumptionTargetSettings) -> Result<Self> {
        let mut config = Self::new(settings.connection);
        match settings.bound {
            Some(bound) => config.set_bound_target(
                &settings.group_name,
                &settings.topics,
                &bound.session_key,
                bound.source_count,
                bound.select_big,
                &bound.part_offset_map,
            )?,
            None => config.set_filtered_target(&settings.group_name, &settings.topics)?,
        }
        config.set_consume_position(settings.consume_position);
        config.set_msg_not_found_wait_period_ms(settings.msg_not_found_wait_period_ms)?;
        config.set_max_part_check_period_ms(settings.max_part_check_period_ms)?;
        config.set_part_check_slice_ms(settings.part_check_slice_ms)?;
        config.set_max_sub_info_report_interval(settings.max_sub_info_report_interval)?;
        config.set_rollback_if_confirm_timeout(settings.rollback_if_confirm_timeout);
        config.set_reb_confirm_wait_period_ms(settings.reb_confirm_wait_period_ms)?;
        config.set_max_confirm_wait_period_ms(settings.max_confirm_wait_period_ms)?;
        config.set_shutdown_reb_wait_period_ms(settings.shutdown_reb_wait_period_ms)?;
        Ok(config)
    }
}
