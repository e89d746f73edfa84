//! # Statistics Sink Tests

use std::sync::Arc;

use pretty_assertions::assert_eq;
use revsim_core::stats::{CSV_HEADER, StatFormat, StatisticRecord, StatisticsSink};
use serde_json::Value;

fn record(component: &str, name: &'static str, value: u64, level: u8) -> StatisticRecord {
    StatisticRecord {
        component: Arc::from(component),
        name,
        value,
        unit: "count",
        level,
    }
}

#[test]
fn test_records_above_load_level_are_dropped() {
    let mut sink = StatisticsSink::new(2);
    sink.record(record("cpu.core0", "a", 1, 1));
    sink.record(record("cpu.core0", "b", 2, 2));
    sink.record(record("cpu.core0", "c", 3, 3));
    assert_eq!(sink.len(), 2);
    assert!(sink.enabled(2));
    assert!(!sink.enabled(3));
}

#[test]
fn test_level_zero_records_nothing_above_zero() {
    let mut sink = StatisticsSink::new(0);
    sink.emit(&Arc::from("cpu.core0"), "cycles", 10, "cycles", 1);
    assert!(sink.is_empty());
}

#[test]
fn test_csv_header_and_rows() {
    let mut sink = StatisticsSink::new(5);
    sink.record(record("cpu.core0", "loads", 4, 2));
    let csv = sink.flush(StatFormat::Csv);
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    assert_eq!(lines.next(), Some("cpu.core0,loads,count,2,4"));
    assert_eq!(lines.next(), None);
}

#[test]
fn test_flush_sorts_stably_by_name_then_component() {
    let mut sink = StatisticsSink::new(5);
    sink.record(record("cpu.core1", "mem_latency", 7, 5));
    sink.record(record("cpu.core0", "mem_latency", 3, 5));
    sink.record(record("cpu.core0", "cycles", 9, 1));
    sink.record(record("cpu.core0", "mem_latency", 1, 5));

    let csv = sink.flush(StatFormat::Csv);
    let rows: Vec<&str> = csv.lines().skip(1).collect();
    assert_eq!(
        rows,
        vec![
            "cpu.core0,cycles,count,1,9",
            "cpu.core0,mem_latency,count,5,3",
            "cpu.core0,mem_latency,count,5,1",
            "cpu.core1,mem_latency,count,5,7",
        ]
    );
}

#[test]
fn test_json_rows() {
    let mut sink = StatisticsSink::new(5);
    sink.record(record("cpu.core0.co_proc", "ops_executed", 12, 1));
    let json: Value = serde_json::from_str(&sink.flush(StatFormat::Json)).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "component": "cpu.core0.co_proc",
            "name": "ops_executed",
            "unit": "count",
            "level": 1,
            "value": 12,
        }])
    );
}

#[test]
fn test_empty_sink_flushes_header_only() {
    let csv = StatisticsSink::new(5).flush(StatFormat::Csv);
    assert_eq!(csv, format!("{CSV_HEADER}\n"));
    assert_eq!(StatisticsSink::new(5).flush(StatFormat::Json), "[]");
}
