//! End-to-end tests of the interval -> group-by -> aggregate pipeline.

use chrono::{DateTime, Duration, Offset, TimeZone, Utc};
use eventagg::aggregate::AggregationTarget;
use eventagg::group::GroupLabels;
use eventagg::{
    AggregationCommand, AggregationError, AggregationType, EngineConfig, Event, EventTemplate,
    GroupBy, GroupByGrouper, InputOrder, Interval, IntervalGrouper, ResultValue, UdfValue,
};
use std::collections::HashSet;

fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn command(
    aggregation_type: AggregationType,
    target: AggregationTarget,
    interval: Interval,
    group: GroupBy,
) -> AggregationCommand {
    AggregationCommand::new(
        aggregation_type,
        EventTemplate::any(),
        target,
        interval,
        group,
    )
}

/// Events spread over a year, each with a unique transaction id.
fn year_of_events() -> Vec<Event> {
    let levels = ["INFO", "WARN", "ERROR"];
    let codes = ["LOGIN", "LOGOUT", "TIMEOUT", "RETRY"];
    let start = ts(2023, 1, 1, 0);
    (0..200)
        .map(|i| {
            let date = start + Duration::hours(i * 43);
            let code = codes[i as usize % codes.len()];
            let mut event = Event::new(date, code, levels[i as usize % 3])
                .with_transaction_id(format!("tx-{i}"))
                .with_udf("latency", UdfValue::Integer(i as i32));
            if i % 5 != 0 {
                event = event.with_context(format!("ctx-{}", i % 7));
            }
            if i % 2 == 0 {
                event = event.with_tag("even");
            }
            event
        })
        .collect()
}

#[test]
fn test_every_event_in_exactly_one_subgroup() {
    let events = year_of_events();
    let config = EngineConfig::default();

    for interval in Interval::ALL {
        for group in GroupBy::ALL {
            let buckets = IntervalGrouper::new(
                events.clone(),
                interval,
                config.offset().unwrap(),
                InputOrder::Sort,
            )
            .unwrap();
            let mut seen = HashSet::new();
            let mut total = 0;
            for bucket in GroupByGrouper::new(buckets, group, GroupLabels::default()) {
                for subgroup in &bucket {
                    for event in subgroup {
                        total += 1;
                        assert!(
                            seen.insert(event.transaction_id.clone().unwrap()),
                            "duplicate event under {} / {}",
                            interval,
                            group
                        );
                    }
                }
            }
            assert_eq!(total, events.len(), "{} / {}", interval, group);
        }
    }
}

#[test]
fn test_count_conservation() {
    let events = year_of_events();
    for interval in Interval::ALL {
        for group in GroupBy::ALL {
            let target = AggregationTarget::events();
            let agg = command(AggregationType::Count, target, interval, group)
                .aggregate(events.clone(), &EngineConfig::default())
                .unwrap();
            let total: i64 = agg
                .iter()
                .flat_map(|r| r.values().cloned().collect::<Vec<_>>())
                .map(|v| match v {
                    ResultValue::Integer(n) => n as i64,
                    other => panic!("unexpected {:?}", other),
                })
                .sum();
            assert_eq!(total, events.len() as i64, "{} / {}", interval, group);
        }
    }
}

#[test]
fn test_sum_over_level_always_fails() {
    let cmd = command(
        AggregationType::Sum,
        AggregationTarget::level(),
        Interval::Days,
        GroupBy::Events,
    );
    let config = EngineConfig::default();
    for events in [Vec::new(), year_of_events()] {
        let err = cmd.aggregate(events, &config).unwrap_err();
        assert!(matches!(err, AggregationError::NotCountable { .. }));
    }
}

#[test]
fn test_missing_udf_fails_whole_run() {
    let date = ts(2024, 3, 1, 12);
    let events = vec![
        Event::new(date, "A", "INFO").with_udf("x", UdfValue::Integer(1)),
        Event::new(date, "A", "INFO"),
        Event::new(date, "A", "INFO").with_udf("x", UdfValue::Integer(3)),
    ];
    let err = command(
        AggregationType::Average,
        AggregationTarget::udf("x"),
        Interval::Days,
        GroupBy::Events,
    )
    .aggregate(events, &EngineConfig::default())
    .unwrap_err();
    assert!(matches!(err, AggregationError::MissingUdf { ref key, .. } if key == "x"));
}

#[test]
fn test_code_grouping() {
    let date = ts(2024, 3, 1, 12);
    let events = vec![
        Event::new(date, "A", "INFO"),
        Event::new(date, "A", "WARN"),
        Event::new(date, "B", "INFO"),
    ];
    let buckets =
        IntervalGrouper::new(events, Interval::Days, Utc.fix(), InputOrder::Strict).unwrap();
    let labels = GroupLabels::default();
    let nested: Vec<_> = GroupByGrouper::new(buckets, GroupBy::Code, labels).collect();
    assert_eq!(nested.len(), 1);
    let sizes: Vec<_> = nested[0]
        .iter()
        .map(|g| (g.identifier.as_str(), g.len()))
        .collect();
    assert_eq!(sizes, vec![("A", 2), ("B", 1)]);
}

#[test]
fn test_buckets_are_chronological() {
    let mut events = year_of_events();
    events.reverse();
    let buckets =
        IntervalGrouper::new(events, Interval::Quarters, Utc.fix(), InputOrder::Sort).unwrap();
    let labels: Vec<_> = buckets.map(|b| b.identifier).collect();
    assert_eq!(
        labels,
        vec![
            "1. quarter of 2023",
            "2. quarter of 2023",
            "3. quarter of 2023",
            "4. quarter of 2023",
        ]
    );
}

#[test]
fn test_strict_order_rejects_unsorted_input() {
    let events = vec![
        Event::new(ts(2024, 1, 2, 0), "A", "INFO"),
        Event::new(ts(2024, 1, 1, 0), "A", "INFO"),
    ];
    let mut config = EngineConfig::default();
    config.bucketing.input_order = InputOrder::Strict;
    let err = command(
        AggregationType::Count,
        AggregationTarget::events(),
        Interval::Days,
        GroupBy::Events,
    )
    .aggregate(events, &config)
    .unwrap_err();
    assert!(matches!(err, AggregationError::UnorderedInput { .. }));
}

#[test]
fn test_utc_offset_moves_day_boundary() {
    // 23:30 UTC is already the next day at UTC+1.
    let late = Utc.with_ymd_and_hms(2024, 6, 30, 23, 30, 0).unwrap();
    let events = vec![Event::new(late, "A", "INFO")];
    let cmd = command(
        AggregationType::Count,
        AggregationTarget::events(),
        Interval::Days,
        GroupBy::Events,
    );

    let default = EngineConfig::default();
    let utc = cmd.aggregate(events.clone(), &default).unwrap();
    assert!(utc.interval_result("30.06.2024").is_ok());

    let mut config = EngineConfig::default();
    config.bucketing.utc_offset_minutes = 60;
    let shifted = cmd.aggregate(events, &config).unwrap();
    assert!(shifted.interval_result("01.07.2024").is_ok());
}

#[test]
fn test_out_of_range_offset_fails_run() {
    let late = Utc.with_ymd_and_hms(2024, 6, 30, 23, 30, 0).unwrap();
    let events = vec![Event::new(late, "A", "INFO")];
    let cmd = command(
        AggregationType::Count,
        AggregationTarget::events(),
        Interval::Days,
        GroupBy::Events,
    );

    let mut config = EngineConfig::default();
    config.bucketing.utc_offset_minutes = 25 * 60;
    assert!(config.validate().is_err());

    let err = cmd.aggregate(events, &config).unwrap_err();
    assert!(matches!(err, AggregationError::Config(_)));
    assert!(err.to_string().contains("1500 minutes"));
}

#[test]
fn test_count_machines_per_month() {
    let events = vec![
        Event::new(ts(2024, 1, 5, 0), "A", "INFO").with_machine_of_origin("web-1"),
        Event::new(ts(2024, 1, 6, 0), "A", "ERROR"),
        Event::new(ts(2024, 1, 7, 0), "A", "INFO").with_machine_of_origin("web-1"),
    ];
    let agg = command(
        AggregationType::Count,
        AggregationTarget::machine_of_origin(),
        Interval::Months,
        GroupBy::Events,
    )
    .aggregate(events, &EngineConfig::default())
    .unwrap();
    let table = agg
        .interval_result("01.2024")
        .unwrap()
        .get("default")
        .and_then(ResultValue::as_frequencies)
        .cloned()
        .unwrap();
    assert_eq!(table.get("web-1"), Some(&2));
    assert_eq!(table.get("No Entry"), Some(&1));
}

#[test]
fn test_maximum_prefers_double() {
    let date = ts(2024, 2, 1, 0);
    let events = vec![
        Event::new(date, "A", "INFO").with_udf("v", UdfValue::Integer(100)),
        Event::new(date, "A", "INFO").with_udf("v", UdfValue::Double(2.5)),
    ];
    let agg = command(
        AggregationType::Maximum,
        AggregationTarget::udf("v"),
        Interval::Years,
        GroupBy::Events,
    )
    .aggregate(events, &EngineConfig::default())
    .unwrap();
    assert_eq!(
        agg.interval_result("2024").unwrap().get("default"),
        Some(&ResultValue::Double(2.5))
    );
}

#[test]
fn test_untagged_events_group_under_no_value() {
    let date = ts(2024, 2, 1, 0);
    let events = vec![
        Event::new(date, "A", "INFO").with_tag("db"),
        Event::new(date, "A", "INFO"),
    ];
    let agg = command(
        AggregationType::Count,
        AggregationTarget::events(),
        Interval::Days,
        GroupBy::Tags,
    )
    .aggregate(events, &EngineConfig::default())
    .unwrap();
    let day = agg.interval_result("01.02.2024").unwrap();
    assert_eq!(day.get("db"), Some(&ResultValue::Integer(1)));
    assert_eq!(day.get("no value"), Some(&ResultValue::Integer(1)));
}
