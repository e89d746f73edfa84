//! # Unit String Tests

use pretty_assertions::assert_eq;
use revsim_core::common::ConfigError;
use revsim_core::config::units::{clock_period_ticks, parse_timebase, time_ticks};
use rstest::rstest;

const PS: f64 = 1e3;

#[rstest]
#[case("1ps", 1e3)]
#[case("1fs", 1.0)]
#[case("10ns", 1e7)]
fn test_timebase(#[case] raw: &str, #[case] fs: f64) {
    assert!((parse_timebase(raw).unwrap() - fs).abs() < 1e-9);
}

#[rstest]
#[case("1GHz")]
#[case("100")]
#[case("0ps")]
#[case("ps")]
fn test_bad_timebase(#[case] raw: &str) {
    assert!(matches!(parse_timebase(raw), Err(ConfigError::Units { what: "timebase", .. })));
}

#[rstest]
#[case("1.0GHz", 1000)]
#[case("2GHz", 500)]
#[case("300MHz", 3333)]
#[case("100mhz", 10_000)]
#[case("2ns", 2000)]
#[case("750", 750)]
fn test_clock_period(#[case] raw: &str, #[case] ticks: u64) {
    assert_eq!(clock_period_ticks(raw, PS).unwrap(), ticks);
}

#[rstest]
#[case("0Hz")]
#[case("10THz")]
#[case("fast")]
#[case("1.5.0GHz")]
fn test_bad_clock(#[case] raw: &str) {
    assert!(clock_period_ticks(raw, PS).is_err());
}

#[rstest]
#[case("0s", 0)]
#[case("0", 0)]
#[case("10ns", 10_000)]
#[case("1.5us", 1_500_000)]
#[case("1ms", 1_000_000_000)]
#[case("42", 42)]
fn test_time_ticks(#[case] raw: &str, #[case] ticks: u64) {
    assert_eq!(time_ticks("stopAtCycle", raw, PS).unwrap(), ticks);
}

#[test]
fn test_time_rejects_frequency() {
    assert!(matches!(
        time_ticks("stopAtCycle", "1GHz", PS),
        Err(ConfigError::Units { what: "stopAtCycle", .. })
    ));
}
