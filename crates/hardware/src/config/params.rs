//! Per-core bracket-list parameters.
//!
//! Parses strings of the form `[0:RV32I,1:RV64G]` or `[CORES:1:10]` into a table
//! indexed by core id. `CORES` applies an entry to every core; entries are applied
//! left to right, so an explicit index listed after `CORES` overrides it.
//!
//! Strings are parsed once during [`Config::build`](super::Config::build); no
//! component ever sees the string form.

use crate::common::ConfigError;

/// Wildcard selecting every core.
const ALL_CORES: &str = "CORES";

/// Parses a bracket list into one value per core.
///
/// `fields` is the number of `:`-separated fields after the core selector; `parse`
/// receives exactly that many fields for each entry. Every core in
/// `0..num_cores` must end up with a value.
pub fn per_core<T, F>(
    key: &'static str,
    raw: &str,
    num_cores: usize,
    fields: usize,
    mut parse: F,
) -> Result<Vec<T>, ConfigError>
where
    T: Clone,
    F: FnMut(usize, &[&str]) -> Result<T, ConfigError>,
{
    let mut table: Vec<Option<T>> = vec![None; num_cores];

    for entry in entries(key, raw)? {
        let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
        if parts.len() != fields + 1 {
            return Err(ConfigError::Malformed {
                key,
                reason: format!(
                    "entry `{entry}` has {} fields, expected {}",
                    parts.len(),
                    fields + 1
                ),
            });
        }

        let selector = parts[0];
        if selector.eq_ignore_ascii_case(ALL_CORES) {
            for (core, slot) in table.iter_mut().enumerate() {
                *slot = Some(parse(core, &parts[1..])?);
            }
            continue;
        }

        let core: usize = selector.parse().map_err(|_| ConfigError::Malformed {
            key,
            reason: format!("`{selector}` is not a core index"),
        })?;
        let slot = table.get_mut(core).ok_or(ConfigError::CoreOutOfRange {
            key,
            core,
            num_cores,
        })?;
        *slot = Some(parse(core, &parts[1..])?);
    }

    table
        .into_iter()
        .enumerate()
        .map(|(core, value)| value.ok_or(ConfigError::MissingCore { key, core }))
        .collect()
}

/// Splits the bracketed body into comma-separated, non-empty entries.
fn entries<'a>(key: &'static str, raw: &'a str) -> Result<Vec<&'a str>, ConfigError> {
    let body = raw
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| ConfigError::Malformed {
            key,
            reason: format!("`{raw}` must be enclosed in brackets"),
        })?;

    Ok(body
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect())
}

/// Parses an unsigned integer written in decimal or `0x` hexadecimal.
pub fn parse_u64(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let text = raw.trim().replace('_', "");
    let parsed = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| ConfigError::Malformed {
        key,
        reason: format!("`{raw}` is not an unsigned integer"),
    })
}
