//! 消费配置测试：订阅目标、静态绑定和再平衡参数

use std::collections::{BTreeMap, BTreeSet};

use tubemq_client_config::{
    ConfigError, ConnectionSecurityConfig, ConsumeMode, ConsumePosition, ConsumptionTargetConfig,
    ErrorCode, PartOffsetMap, TopicFilterMap,
};

fn consumer() -> ConsumptionTargetConfig {
    ConsumptionTargetConfig::new(ConnectionSecurityConfig::new("127.0.0.1:8715").unwrap())
}

fn filter_map(entries: &[(&str, &[&str])]) -> TopicFilterMap {
    entries
        .iter()
        .map(|(topic, filters)| {
            (
                topic.to_string(),
                filters.iter().map(|f| f.to_string()).collect::<BTreeSet<_>>(),
            )
        })
        .collect()
}

fn offsets(entries: &[(&str, i64)]) -> PartOffsetMap {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn simple_target_is_unbound_with_empty_filters() {
    let mut config = consumer();
    config.set_simple_target("g1", ["t1", "t2"]).unwrap();

    assert!(!config.is_bound_consume());
    assert_eq!(config.group_name(), "g1");
    assert_eq!(config.topic_filter_map(), &filter_map(&[("t1", &[]), ("t2", &[])]));
    assert_eq!(config.consume_mode(), &ConsumeMode::Unbound);
    assert_eq!(config.session_key(), "");
    assert_eq!(config.source_count(), 0);
    assert!(config.part_offset_map().is_none());
}

#[test]
fn simple_target_rejects_empty_inputs() {
    let mut config = consumer();

    assert_eq!(
        config.set_simple_target("g1", Vec::<String>::new()).unwrap_err(),
        ConfigError::EmptyTopicSet
    );
    assert_eq!(
        config.set_simple_target("", ["t1"]).unwrap_err(),
        ConfigError::EmptyGroupName
    );
    assert_eq!(
        config.set_simple_target("   ", ["t1"]).unwrap_err().code(),
        ErrorCode::EmptyGroupName
    );
}

#[test]
fn failed_target_keeps_previous_target() {
    let mut config = consumer();
    config.set_simple_target("g1", ["t1"]).unwrap();

    assert_eq!(
        config.set_simple_target("", ["t2"]).unwrap_err(),
        ConfigError::EmptyGroupName
    );
    assert_eq!(config.group_name(), "g1");
    assert_eq!(config.topic_filter_map(), &filter_map(&[("t1", &[])]));
}

#[test]
fn filtered_target_keeps_filter_sets() {
    let mut config = consumer();
    let map = filter_map(&[("t1", &["aaa", "bbb"]), ("t2", &[])]);
    config.set_filtered_target("g1", &map).unwrap();

    assert!(!config.is_bound_consume());
    assert_eq!(config.topic_filter_map(), &map);

    assert_eq!(
        config.set_filtered_target("g1", &TopicFilterMap::new()).unwrap_err(),
        ConfigError::EmptyTopicFilterMap
    );
    assert_eq!(config.topic_filter_map(), &map);
}

#[test]
fn names_and_filters_are_trimmed_and_checked() {
    let mut config = consumer();
    config
        .set_filtered_target(" g1 ", &filter_map(&[(" t1 ", &[" aaa "])]))
        .unwrap();
    assert_eq!(config.group_name(), "g1");
    assert_eq!(config.topic_filter_map(), &filter_map(&[("t1", &["aaa"])]));

    for group in ["1group", "group name", "group$"] {
        assert_eq!(
            config.set_simple_target(group, ["t1"]).unwrap_err().code(),
            ErrorCode::InvalidValue,
            "group {:?}",
            group
        );
    }
    assert!(config.set_simple_target(&"g".repeat(1025), ["t1"]).is_err());
    assert!(config.set_simple_target("g1", ["t".repeat(65)]).is_err());
    assert!(config.set_simple_target("g1", ["bad topic"]).is_err());

    let err = config
        .set_filtered_target("g1", &filter_map(&[("t1", &["  "])]))
        .unwrap_err();
    assert_eq!(err.field(), "filter_items");

    let too_many: Vec<String> = (0..501).map(|i| format!("f{}", i)).collect();
    let too_many: Vec<&str> = too_many.iter().map(String::as_str).collect();
    assert!(config
        .set_filtered_target("g1", &filter_map(&[("t1", &too_many)]))
        .is_err());

    assert_eq!(config.group_name(), "g1");
}

#[test]
fn bound_target_sets_all_bound_fields() {
    let mut config = consumer();
    let map = filter_map(&[("t1", &[])]);
    config
        .set_bound_target("g1", &map, "sess-1", 3, true, &offsets(&[("p0", 100)]))
        .unwrap();

    assert!(config.is_bound_consume());
    assert_eq!(config.session_key(), "sess-1");
    assert_eq!(config.source_count(), 3);
    assert!(config.is_select_big());
    assert_eq!(config.part_offset_map(), Some(&offsets(&[("p0", 100)])));

    let bound = config.bound_assignment().unwrap();
    assert_eq!(bound.session_key(), "sess-1");
    assert_eq!(bound.source_count(), 3);
}

#[test]
fn bound_target_rejections_keep_prior_mode() {
    let mut config = consumer();
    let map = filter_map(&[("t1", &[])]);
    let parts = offsets(&[("p0", 100)]);

    assert_eq!(
        config.set_bound_target("g1", &map, "", 3, true, &parts).unwrap_err(),
        ConfigError::EmptySessionKey
    );
    assert!(!config.is_bound_consume());
    assert_eq!(config.group_name(), "");

    assert_eq!(
        config.set_bound_target("g1", &map, "sess-1", 0, true, &parts).unwrap_err(),
        ConfigError::InvalidSourceCount
    );
    assert_eq!(
        config
            .set_bound_target("g1", &map, "sess-1", 3, true, &PartOffsetMap::new())
            .unwrap_err(),
        ConfigError::EmptyPartitionMap
    );
    assert_eq!(
        config
            .set_bound_target("", &map, "sess-1", 3, true, &parts)
            .unwrap_err(),
        ConfigError::EmptyGroupName
    );
    assert_eq!(
        config
            .set_bound_target("g1", &TopicFilterMap::new(), "sess-1", 3, true, &parts)
            .unwrap_err(),
        ConfigError::EmptyTopicFilterMap
    );
    assert_eq!(
        config
            .set_bound_target("g1", &map, "sess-1", 3, true, &offsets(&[("p0", -5)]))
            .unwrap_err()
            .code(),
        ErrorCode::InvalidValue
    );
    // 去空白后重复的分区 Key 不能静默丢弃其中一个 offset
    let err = config
        .set_bound_target("g1", &map, "sess-1", 3, true, &offsets(&[("p0", 100), (" p0", 5)]))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidValue);
    assert_eq!(err.field(), "part_offset_map");
    assert!(err.to_string().contains("duplicate partition key 'p0'"));
    assert!(!config.is_bound_consume());
    assert!(config.part_offset_map().is_none());

    config.set_bound_target("g1", &map, "sess-1", 3, false, &parts).unwrap();
    assert!(config
        .set_bound_target("g2", &map, "", 2, false, &parts)
        .is_err());
    assert!(config.is_bound_consume());
    assert_eq!(config.group_name(), "g1");
    assert_eq!(config.session_key(), "sess-1");
}

#[test]
fn switching_back_to_unbound_clears_bound_fields() {
    let mut config = consumer();
    let map = filter_map(&[("t1", &[])]);
    config
        .set_bound_target("g1", &map, "sess-1", 2, false, &offsets(&[("p0", 1)]))
        .unwrap();

    config.set_filtered_target("g1", &map).unwrap();
    assert!(!config.is_bound_consume());
    assert_eq!(config.session_key(), "");
    assert!(config.bound_assignment().is_none());
}

#[test]
fn partition_keys_are_grouped_by_topic() {
    let mut config = consumer();
    let map = filter_map(&[("test_1", &[]), ("test_2", &[])]);
    let parts = offsets(&[
        ("123:test_1:0", 0),
        ("123:test_1:1", 10),
        ("123:test_2:0", 350),
        ("p0", 100),
    ]);
    config.set_bound_target("g1", &map, "test_reset2", 2, false, &parts).unwrap();

    let bound = config.bound_assignment().unwrap();
    let test_1: Vec<(&str, i64)> = bound.partition_keys_for_topic("test_1").collect();
    assert_eq!(test_1, vec![("123:test_1:0", 0), ("123:test_1:1", 10)]);
    assert_eq!(bound.partition_keys_for_topic("test_3").count(), 0);
}

#[test]
fn consume_position_wire_values() {
    assert_eq!(ConsumePosition::FromFirst.as_i32(), -1);
    assert_eq!(ConsumePosition::FromLatest.as_i32(), 0);
    assert_eq!(ConsumePosition::FromMaxAlways.as_i32(), 1);
    assert_eq!(ConsumePosition::try_from(-1).unwrap(), ConsumePosition::FromFirst);
    assert_eq!(
        ConsumePosition::try_from(2).unwrap_err().code(),
        ErrorCode::OutOfRange
    );

    let mut config = consumer();
    assert_eq!(config.consume_position(), ConsumePosition::FromLatest);
    config.set_consume_position(ConsumePosition::FromMaxAlways);
    assert_eq!(config.consume_position(), ConsumePosition::FromMaxAlways);
}

#[test]
fn rebalance_timing_setters() {
    let mut config = consumer();
    assert_eq!(config.msg_not_found_wait_period_ms(), 200);
    assert_eq!(config.max_part_check_period_ms(), 60_000);
    assert_eq!(config.part_check_slice_ms(), 300);
    assert_eq!(config.max_sub_info_report_interval(), 6);
    assert!(config.is_rollback_if_confirm_timeout());
    assert_eq!(config.reb_confirm_wait_period_ms(), 3_000);
    assert_eq!(config.max_confirm_wait_period_ms(), 60_000);
    assert_eq!(config.shutdown_reb_wait_period_ms(), 10_000);

    assert!(config.set_msg_not_found_wait_period_ms(0).is_err());
    assert!(config.set_max_part_check_period_ms(0).is_err());
    assert!(config.set_part_check_slice_ms(0).is_err());
    assert!(config.set_max_sub_info_report_interval(0).is_err());
    assert!(config.set_reb_confirm_wait_period_ms(0).is_err());
    assert!(config.set_max_confirm_wait_period_ms(0).is_err());
    assert_eq!(
        config.set_shutdown_reb_wait_period_ms(0).unwrap_err().field(),
        "shutdown_reb_wait_period_ms"
    );
    assert_eq!(config.msg_not_found_wait_period_ms(), 200);

    config.set_msg_not_found_wait_period_ms(500).unwrap();
    config.set_max_part_check_period_ms(30_000).unwrap();
    config.set_part_check_slice_ms(100).unwrap();
    config.set_max_sub_info_report_interval(3).unwrap();
    config.set_rollback_if_confirm_timeout(false);
    config.set_reb_confirm_wait_period_ms(1_000).unwrap();
    config.set_max_confirm_wait_period_ms(20_000).unwrap();
    config.set_shutdown_reb_wait_period_ms(5_000).unwrap();

    assert_eq!(config.msg_not_found_wait_period_ms(), 500);
    assert_eq!(config.max_part_check_period_ms(), 30_000);
    assert_eq!(config.part_check_slice_ms(), 100);
    assert_eq!(config.max_sub_info_report_interval(), 3);
    assert!(!config.is_rollback_if_confirm_timeout());
    assert_eq!(config.reb_confirm_wait_period_ms(), 1_000);
    assert_eq!(config.max_confirm_wait_period_ms(), 20_000);
    assert_eq!(config.shutdown_reb_wait_period_ms(), 5_000);
}

#[test]
fn clone_round_trip_and_independence() {
    let mut original = consumer();
    original
        .set_bound_target(
            "g1",
            &filter_map(&[("t1", &["aaa"])]),
            "sess-1",
            3,
            true,
            &offsets(&[("p0", 100)]),
        )
        .unwrap();
    original.connection_mut().set_authentication(true, "admin", "pw").unwrap();

    let mut copy = original.clone();
    assert_eq!(copy, original);
    assert_eq!(copy.to_string(), original.to_string());

    copy.set_simple_target("g2", ["t9"]).unwrap();
    copy.set_consume_position(ConsumePosition::FromFirst);
    copy.connection_mut().set_master_address("10.0.0.1:8000").unwrap();

    assert!(original.is_bound_consume());
    assert_eq!(original.group_name(), "g1");
    assert_eq!(original.part_offset_map(), Some(&offsets(&[("p0", 100)])));
    assert_eq!(original.consume_position(), ConsumePosition::FromLatest);
    assert_eq!(original.connection().master_address(), "127.0.0.1:8715");
    assert_eq!(original.connection().username(), "admin");
}

#[test]
fn display_dumps_target_and_connection() {
    let mut config = consumer();
    config
        .set_bound_target(
            "g1",
            &filter_map(&[("t1", &["aaa", "bbb"])]),
            "sess-1",
            3,
            true,
            &offsets(&[("p0", 100)]),
        )
        .unwrap();

    let rendered = config.to_string();
    assert!(rendered.contains("group_name='g1'"));
    assert!(rendered.contains("t1=[aaa,bbb]"));
    assert!(rendered.contains("bound_consume=true"));
    assert!(rendered.contains("session_key='sess-1'"));
    assert!(rendered.contains("p0=100"));
    assert!(rendered.contains("consume_position=FROM_LATEST"));
    assert!(rendered.contains("master_address='127.0.0.1:8715'"));
}

#[test]
fn readiness_requires_address_and_target() {
    let mut config = ConsumptionTargetConfig::default();
    assert_eq!(
        config.ensure_ready().unwrap_err(),
        ConfigError::NotConfigured { field: "master_address" }
    );

    config.connection_mut().set_master_address("127.0.0.1:8715").unwrap();
    assert_eq!(
        config.ensure_ready().unwrap_err(),
        ConfigError::NotConfigured { field: "consume_target" }
    );

    config.set_simple_target("g1", ["t1"]).unwrap();
    config.ensure_ready().unwrap();
}

#[test]
fn config_is_shareable_across_threads() {
    let mut config = consumer();
    config.set_simple_target("g1", ["t1"]).unwrap();
    let shared = std::sync::Arc::new(config);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = std::sync::Arc::clone(&shared);
            std::thread::spawn(move || shared.group_name().to_string())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "g1");
    }
}

#[test]
fn group_filter_map_with_duplicate_trimmed_topics_merges_filters() {
    let mut config = consumer();
    let mut map = BTreeMap::new();
    map.insert("t1".to_string(), BTreeSet::from(["a".to_string()]));
    map.insert(" t1".to_string(), BTreeSet::from(["b".to_string()]));
    config.set_filtered_target("g1", &map).unwrap();

    assert_eq!(config.topic_filter_map(), &filter_map(&[("t1", &["a", "b"])]));
}
