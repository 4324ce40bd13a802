//! Tests for the XML wire format of aggregation results.

use chrono::{TimeZone, Utc};
use eventagg::aggregate::AggregationTarget;
use eventagg::result::{from_xml, to_xml};
use eventagg::{
    Aggregation, AggregationCommand, AggregationIntervalResult, AggregationType, EngineConfig,
    Event, EventTemplate, FrequencyTable, GroupBy, Interval, ResultValue,
};
use indexmap::IndexMap;

fn scalar_and_table() -> Aggregation {
    let mut table = FrequencyTable::new();
    table.insert("ERROR".to_string(), 3);
    table.insert("INFO".to_string(), 11);

    let mut groups = IndexMap::new();
    groups.insert("default".to_string(), ResultValue::Integer(14));
    groups.insert("levels".to_string(), ResultValue::Frequencies(table));

    let mut agg = Aggregation::new();
    agg.add(AggregationIntervalResult::new("07.2024", groups));
    agg
}

#[test]
fn test_round_trip_scalar_and_frequency_table() {
    let agg = scalar_and_table();
    let xml = agg.to_xml().unwrap();
    let parsed = Aggregation::from_xml(&xml).unwrap();

    assert_eq!(parsed, agg);
    let interval = parsed.interval_result("07.2024").unwrap();
    assert_eq!(interval.get("default"), Some(&ResultValue::Integer(14)));
    let table = interval
        .get("levels")
        .and_then(ResultValue::as_frequencies)
        .unwrap();
    assert_eq!(table.get("INFO"), Some(&11));
}

#[test]
fn test_compact_and_indented_agree() {
    let agg = scalar_and_table();
    let compact = to_xml(&agg, 0).unwrap();
    let indented = to_xml(&agg, 4).unwrap();
    assert!(!compact.trim_end().contains('\n'));
    assert!(indented.contains("\n    <interval"));
    assert_eq!(from_xml(&compact).unwrap(), from_xml(&indented).unwrap());
}

#[test]
fn test_round_trip_pipeline_output() {
    let events: Vec<Event> = (0..48)
        .map(|h| {
            Event::new(
                Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap() + chrono::Duration::hours(h),
                if h % 3 == 0 { "A" } else { "B" },
                if h % 2 == 0 { "INFO" } else { "WARN" },
            )
        })
        .collect();
    let command = AggregationCommand::new(
        AggregationType::Count,
        EventTemplate::any(),
        AggregationTarget::level(),
        Interval::Days,
        GroupBy::Code,
    );
    let agg = command.aggregate(events, &EngineConfig::default()).unwrap();
    assert_eq!(agg.len(), 2);

    let parsed = from_xml(&agg.to_xml().unwrap()).unwrap();
    assert_eq!(parsed, agg);
    assert_eq!(
        parsed.interval_names().collect::<Vec<_>>(),
        vec!["28.02.2024", "29.02.2024"]
    );
}

#[test]
fn test_rejects_garbage() {
    for doc in [
        "",
        "not xml at all",
        "<aggregation><interval><group name=\"g\"><resultInteger>1</resultInteger></group></interval></aggregation>",
        "<aggregation><interval name=\"i\"><group name=\"g\"><resultInteger>one</resultInteger></group></interval></aggregation>",
        "<aggregation><interval name=\"i\"><bucket name=\"g\"/></interval></aggregation>",
    ] {
        let err = from_xml(doc).unwrap_err();
        assert!(err.is_xml(), "accepted {:?}", doc);
    }
}

#[test]
fn test_round_trip_nan() {
    let mut groups = IndexMap::new();
    groups.insert("double".to_string(), ResultValue::Double(f64::NAN));
    groups.insert("float".to_string(), ResultValue::Float(f32::NAN));
    let mut agg = Aggregation::new();
    agg.add(AggregationIntervalResult::new("2024", groups));

    let parsed = from_xml(&agg.to_xml().unwrap()).unwrap();
    assert_eq!(parsed, agg);
    let interval = parsed.interval_result("2024").unwrap();
    assert!(matches!(interval.get("double"), Some(ResultValue::Double(v)) if v.is_nan()));
    assert_ne!(ResultValue::Double(f64::NAN), ResultValue::Float(f32::NAN));
}
