//! 消费组注册信息
//!
//! 客户端加入消费组时由 RPC 层发送给 Master 的字段集合。Master 依赖
//! `consume_mode == "bound"` 时静态绑定字段完整一致，因此该结构只能从
//! 已通过校验的 [`ConsumptionTargetConfig`] 生成。

use serde::Serialize;

use super::consumer::{ConsumptionTargetConfig, PartOffsetMap, TopicFilterMap};

/// 注册请求载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationPayload {
    pub group_name: String,
    pub topic_filter_map: TopicFilterMap,
    pub consume_mode: &'static str,
    /// 起始消费位置的线上数值（-1 / 0 / 1）
    pub consume_position: i32,
    #[serde(flatten)]
    pub bound: Option<BoundRegistration>,
}

/// 静态绑定的注册字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundRegistration {
    pub session_key: String,
    pub source_count: u32,
    pub select_big: bool,
    pub part_offset_map: PartOffsetMap,
}

impl RegistrationPayload {
    pub(crate) fn from_config(config: &ConsumptionTargetConfig) -> Self {
        Self {
            group_name: config.group_name().to_string(),
            topic_filter_map: config.topic_filter_map().clone(),
            consume_mode: config.consume_mode().as_str(),
            consume_position: config.consume_position().as_i32(),
            bound: config.bound_assignment().map(|bound| BoundRegistration {
                session_key: bound.session_key().to_string(),
                source_count: bound.source_count(),
                select_big: bound.is_select_big(),
                part_offset_map: bound.part_offset_map().clone(),
            }),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }
}
