//! Clock-rate and time string parsing.
//!
//! Converts the unit strings of the parameter surface (`"1.0GHz"`, `"1ps"`,
//! `"10us"`) into femtoseconds and then into integer timebase ticks. A bare
//! integer is taken to already be a tick count.

use crate::common::ConfigError;
use crate::common::constants::{
    FS_PER_MICROSECOND, FS_PER_MILLISECOND, FS_PER_NANOSECOND, FS_PER_PICOSECOND, FS_PER_SECOND,
};

/// A parsed quantity: either a frequency or a duration.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Quantity {
    /// Cycles per second.
    Hertz(f64),
    /// Duration in femtoseconds.
    Femtos(f64),
    /// Unitless count, interpreted as timebase ticks.
    Ticks(u64),
}

fn split_number(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    s.split_at(end)
}

fn parse_quantity(what: &'static str, raw: &str) -> Result<Quantity, ConfigError> {
    let reject = |reason: &str| ConfigError::Units {
        what,
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let s = raw.trim();
    let (number, unit) = split_number(s);
    if number.is_empty() {
        return Err(reject("expected a leading number"));
    }
    let unit = unit.trim();

    if unit.is_empty() {
        return number
            .parse::<u64>()
            .map(Quantity::Ticks)
            .map_err(|_| reject("unitless values must be whole tick counts"));
    }

    let value: f64 = number.parse().map_err(|_| reject("malformed number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(reject("value must be finite and non-negative"));
    }

    let quantity = match unit.to_ascii_lowercase().as_str() {
        "hz" => Quantity::Hertz(value),
        "khz" => Quantity::Hertz(value * 1e3),
        "mhz" => Quantity::Hertz(value * 1e6),
        "ghz" => Quantity::Hertz(value * 1e9),
        "s" => Quantity::Femtos(value * FS_PER_SECOND),
        "ms" => Quantity::Femtos(value * FS_PER_MILLISECOND),
        "us" => Quantity::Femtos(value * FS_PER_MICROSECOND),
        "ns" => Quantity::Femtos(value * FS_PER_NANOSECOND),
        "ps" => Quantity::Femtos(value * FS_PER_PICOSECOND),
        "fs" => Quantity::Femtos(value),
        _ => return Err(reject("unknown unit")),
    };
    Ok(quantity)
}

/// Parses the `timebase` program option into femtoseconds per tick.
pub fn parse_timebase(raw: &str) -> Result<f64, ConfigError> {
    match parse_quantity("timebase", raw)? {
        Quantity::Femtos(fs) if fs > 0.0 => Ok(fs),
        Quantity::Femtos(_) => Err(ConfigError::Units {
            what: "timebase",
            value: raw.to_string(),
            reason: "timebase must be positive".to_string(),
        }),
        Quantity::Hertz(_) | Quantity::Ticks(_) => Err(ConfigError::Units {
            what: "timebase",
            value: raw.to_string(),
            reason: "timebase must be a duration such as `1ps`".to_string(),
        }),
    }
}

/// Converts a `clock` string (frequency or period) into a period in timebase ticks.
///
/// The period is rounded to the nearest tick and must be at least one tick.
pub fn clock_period_ticks(raw: &str, timebase_fs: f64) -> Result<u64, ConfigError> {
    let period_fs = match parse_quantity("clock", raw)? {
        Quantity::Hertz(hz) if hz > 0.0 => FS_PER_SECOND / hz,
        Quantity::Hertz(_) => {
            return Err(ConfigError::Units {
                what: "clock",
                value: raw.to_string(),
                reason: "frequency must be positive".to_string(),
            });
        }
        Quantity::Femtos(fs) => fs,
        Quantity::Ticks(ticks) => ticks as f64 * timebase_fs,
    };

    let ticks = (period_fs / timebase_fs).round();
    if ticks < 1.0 {
        return Err(ConfigError::Units {
            what: "clock",
            value: raw.to_string(),
            reason: "period is shorter than one timebase tick".to_string(),
        });
    }
    Ok(ticks as u64)
}

/// Converts a time string (e.g. `stopAtCycle`) into timebase ticks.
///
/// Frequencies are rejected; zero is a valid result.
pub fn time_ticks(what: &'static str, raw: &str, timebase_fs: f64) -> Result<u64, ConfigError> {
    match parse_quantity(what, raw)? {
        Quantity::Ticks(ticks) => Ok(ticks),
        Quantity::Femtos(fs) => Ok((fs / timebase_fs).round() as u64),
        Quantity::Hertz(_) => Err(ConfigError::Units {
            what,
            value: raw.to_string(),
            reason: "expected a duration, not a frequency".to_string(),
        }),
    }
}
