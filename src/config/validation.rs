//! 配置校验规则
//!
//! 连接配置和消费配置共用的纯函数校验：只读取入参，返回校验后的值或 [`ConfigError`]。

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::connection::MasterEndpoint;
use crate::error::{ConfigError, Result};

/// RPC 读超时下限（毫秒）
pub const RPC_READ_TIMEOUT_MIN_MS: u32 = 8_000;
/// RPC 读超时上限（毫秒）
pub const RPC_READ_TIMEOUT_MAX_MS: u32 = 300_000;

pub const GROUP_NAME_MAX_LENGTH: usize = 1024;
pub const TOPIC_NAME_MAX_LENGTH: usize = 64;
pub const SESSION_KEY_MAX_LENGTH: usize = 1024;
pub const FILTER_ITEM_MAX_LENGTH: usize = 256;
/// 单个 Topic 允许的最大过滤项数量
pub const FILTER_ITEM_MAX_COUNT: usize = 500;

/// 解析 Master 地址
///
/// 地址格式为逗号分隔的 `host:port` 列表，例如 `"10.0.0.1:8715,10.0.0.2:8715"`。
/// 任意一项无法解析都视为整体格式错误。
pub fn parse_master_address(addr: &str) -> Result<Vec<MasterEndpoint>> {
    if addr.trim().is_empty() {
        return Err(ConfigError::invalid_format(
            "master_address",
            "address must not be empty",
        ));
    }

    addr.split(',').map(parse_endpoint).collect()
}

fn parse_endpoint(token: &str) -> Result<MasterEndpoint> {
    let token = token.trim();
    let (host, port) = token.rsplit_once(':').ok_or_else(|| {
        ConfigError::invalid_format(
            "master_address",
            format!("'{}' is not a host:port pair", token),
        )
    })?;

    let host_ok = if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        !inner.is_empty() && inner.chars().all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.')
    } else {
        !host.is_empty()
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
    };
    if !host_ok {
        return Err(ConfigError::invalid_format(
            "master_address",
            format!("'{}' has an invalid host", token),
        ));
    }

    let port = match port.parse::<u16>() {
        Ok(port) if port != 0 => port,
        _ => {
            return Err(ConfigError::invalid_format(
                "master_address",
                format!("'{}' has an invalid port", token),
            ));
        }
    };

    Ok(MasterEndpoint {
        host: host.to_string(),
        port,
    })
}

/// 校验成对出现的凭据：启用时两项都必须非空
pub fn check_credential_pair(
    field: &'static str,
    enabled: bool,
    (first_name, first): (&str, &str),
    (second_name, second): (&str, &str),
) -> Result<()> {
    if !enabled {
        return Ok(());
    }
    if first.is_empty() {
        return Err(ConfigError::missing_credential(
            field,
            format!("{} is required when {} is enabled", first_name, field),
        ));
    }
    if second.is_empty() {
        return Err(ConfigError::missing_credential(
            field,
            format!("{} is required when {} is enabled", second_name, field),
        ));
    }
    Ok(())
}

/// 校验数值处于闭区间 `[min, max]`
pub fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<()> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// 校验正整数参数（心跳周期、重试次数、再平衡等待时间等）
pub fn check_positive(field: &'static str, value: u32) -> Result<()> {
    check_range(field, i64::from(value), 1, i64::from(u32::MAX))
}

fn check_identifier(field: &'static str, name: &str, max_len: usize) -> Result<()> {
    if name.len() > max_len {
        return Err(ConfigError::invalid_value(
            field,
            format!("'{}' exceeds max length {}", name, max_len),
        ));
    }
    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(ConfigError::invalid_value(
            field,
            format!(
                "'{}' must start with a letter and contain only letters, digits, '_' or '-'",
                name
            ),
        ));
    }
    Ok(())
}

/// 校验消费组名称，返回去除首尾空白后的名称
pub fn validate_group_name(group_name: &str) -> Result<String> {
    let name = group_name.trim();
    if name.is_empty() {
        return Err(ConfigError::EmptyGroupName);
    }
    check_identifier("group_name", name, GROUP_NAME_MAX_LENGTH)?;
    Ok(name.to_string())
}

/// 校验 Topic 名称，返回去除首尾空白后的名称
pub fn validate_topic_name(topic: &str) -> Result<String> {
    let name = topic.trim();
    if name.is_empty() {
        return Err(ConfigError::invalid_value("topic", "topic name must not be empty"));
    }
    check_identifier("topic", name, TOPIC_NAME_MAX_LENGTH)?;
    Ok(name.to_string())
}

/// 校验单个 Topic 的过滤项集合，空集合表示不过滤
pub fn validate_filter_items(topic: &str, filters: &BTreeSet<String>) -> Result<BTreeSet<String>> {
    if filters.len() > FILTER_ITEM_MAX_COUNT {
        return Err(ConfigError::invalid_value(
            "filter_items",
            format!(
                "topic '{}' has {} filter items, max is {}",
                topic,
                filters.len(),
                FILTER_ITEM_MAX_COUNT
            ),
        ));
    }

    let mut validated = BTreeSet::new();
    for item in filters {
        let item = item.trim();
        if item.is_empty() {
            return Err(ConfigError::invalid_value(
                "filter_items",
                format!("topic '{}' contains an empty filter item", topic),
            ));
        }
        if item.len() > FILTER_ITEM_MAX_LENGTH {
            return Err(ConfigError::invalid_value(
                "filter_items",
                format!(
                    "topic '{}' has a filter item longer than {}",
                    topic, FILTER_ITEM_MAX_LENGTH
                ),
            ));
        }
        validated.insert(item.to_string());
    }
    Ok(validated)
}

/// 校验订阅 Topic 及过滤项映射
pub fn validate_topic_filter_map(
    topic_filter_map: &BTreeMap<String, BTreeSet<String>>,
) -> Result<BTreeMap<String, BTreeSet<String>>> {
    if topic_filter_map.is_empty() {
        return Err(ConfigError::EmptyTopicFilterMap);
    }

    let mut validated = BTreeMap::new();
    for (topic, filters) in topic_filter_map {
        let topic = validate_topic_name(topic)?;
        let filters = validate_filter_items(&topic, filters)?;
        // 去空白后重名的 Topic 合并过滤项
        validated
            .entry(topic)
            .or_insert_with(BTreeSet::new)
            .extend(filters);
    }
    Ok(validated)
}

/// 校验静态绑定的会话 Key
pub fn validate_session_key(session_key: &str) -> Result<String> {
    let key = session_key.trim();
    if key.is_empty() {
        return Err(ConfigError::EmptySessionKey);
    }
    if key.len() > SESSION_KEY_MAX_LENGTH {
        return Err(ConfigError::invalid_value(
            "session_key",
            format!("session key exceeds max length {}", SESSION_KEY_MAX_LENGTH),
        ));
    }
    Ok(key.to_string())
}

pub fn validate_source_count(source_count: u32) -> Result<u32> {
    if source_count == 0 {
        return Err(ConfigError::InvalidSourceCount);
    }
    Ok(source_count)
}

/// 校验分区起始 offset 映射
pub fn validate_part_offset_map(
    part_offset_map: &BTreeMap<String, i64>,
) -> Result<BTreeMap<String, i64>> {
    if part_offset_map.is_empty() {
        return Err(ConfigError::EmptyPartitionMap);
    }

    let mut validated = BTreeMap::new();
    for (part_key, offset) in part_offset_map {
        let part_key = part_key.trim();
        if part_key.is_empty() {
            return Err(ConfigError::invalid_value(
                "part_offset_map",
                "partition key must not be empty",
            ));
        }
        if *offset < 0 {
            return Err(ConfigError::invalid_value(
                "part_offset_map",
                format!("offset of partition '{}' must be >= 0, got {}", part_key, offset),
            ));
        }
        match validated.entry(part_key.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(*offset);
            }
            Entry::Occupied(_) => {
                return Err(ConfigError::invalid_value(
                    "part_offset_map",
                    format!("duplicate partition key '{}' after trimming", part_key),
                ));
            }
        }
    }
    Ok(validated)
}
