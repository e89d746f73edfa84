//! Simulation statistics collection and reporting.
//!
//! This module implements the statistics sink shared by every component. It provides:
//! 1. **Level Filtering:** Records above the configured load level are discarded on
//!    entry, before anything is cloned or stored.
//! 2. **Append-Only Storage:** Components only append; the sink is the sole writer of
//!    the final output.
//! 3. **Export:** A single flush at teardown produces a CSV (or JSON) table with one
//!    row per record, stable-sorted by `(name, component)`.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;

/// One statistic emitted by a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticRecord {
    /// Emitting component, e.g. `cpu.core0`.
    pub component: Arc<str>,
    /// Statistic name, e.g. `mem_latency`.
    pub name: &'static str,
    /// Recorded value.
    pub value: u64,
    /// Unit of `value`, e.g. `cycles`.
    pub unit: &'static str,
    /// Load level at which the statistic is enabled.
    pub level: u8,
}

/// Output format of [`StatisticsSink::flush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatFormat {
    /// Comma-separated table with a header row.
    #[default]
    Csv,
    /// JSON array of row objects.
    Json,
}

#[derive(Serialize)]
struct Row<'a> {
    component: &'a str,
    name: &'a str,
    unit: &'a str,
    level: u8,
    value: u64,
}

impl<'a> From<&'a StatisticRecord> for Row<'a> {
    fn from(rec: &'a StatisticRecord) -> Self {
        Self {
            component: &rec.component,
            name: rec.name,
            unit: rec.unit,
            level: rec.level,
            value: rec.value,
        }
    }
}

/// CSV header written by [`StatisticsSink::flush`].
pub const CSV_HEADER: &str = "ComponentName,StatisticName,Unit,Level,Value";

/// Level-filtered, append-only statistics store.
#[derive(Debug, Clone, Default)]
pub struct StatisticsSink {
    load_level: u8,
    records: Vec<StatisticRecord>,
}

impl StatisticsSink {
    /// Creates a sink that keeps records at `load_level` and below.
    pub const fn new(load_level: u8) -> Self {
        Self {
            load_level,
            records: Vec::new(),
        }
    }

    /// Returns the configured load level.
    pub const fn load_level(&self) -> u8 {
        self.load_level
    }

    /// Returns `true` if a record at `level` would be kept.
    #[inline(always)]
    pub const fn enabled(&self, level: u8) -> bool {
        level <= self.load_level
    }

    /// Appends a record, or discards it if its level is above the load level.
    #[inline]
    pub fn record(&mut self, rec: StatisticRecord) {
        if self.enabled(rec.level) {
            self.records.push(rec);
        }
    }

    /// Appends a record built from parts. The component name is only cloned when the
    /// level is enabled, so disabled statistics cost a single comparison.
    #[inline]
    pub fn emit(
        &mut self,
        component: &Arc<str>,
        name: &'static str,
        value: u64,
        unit: &'static str,
        level: u8,
    ) {
        if self.enabled(level) {
            self.records.push(StatisticRecord {
                component: Arc::clone(component),
                name,
                value,
                unit,
                level,
            });
        }
    }

    /// Returns the records kept so far, in emission order.
    pub fn records(&self) -> &[StatisticRecord] {
        &self.records
    }

    /// Returns the number of records kept so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records have been kept.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serializes every record and consumes the sink.
    ///
    /// Rows are stable-sorted by `(name, component)`, so records with equal keys keep
    /// their emission order. Consuming `self` makes a second flush impossible.
    pub fn flush(mut self, format: StatFormat) -> String {
        self.records
            .sort_by(|a, b| (a.name, &*a.component).cmp(&(b.name, &*b.component)));

        match format {
            StatFormat::Csv => {
                let mut out = String::with_capacity(32 * (self.records.len() + 1));
                out.push_str(CSV_HEADER);
                out.push('\n');
                for rec in &self.records {
                    let _ = writeln!(
                        out,
                        "{},{},{},{},{}",
                        rec.component, rec.name, rec.unit, rec.level, rec.value
                    );
                }
                out
            }
            StatFormat::Json => {
                let rows: Vec<Row<'_>> = self.records.iter().map(Row::from).collect();
                serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
            }
        }
    }
}
