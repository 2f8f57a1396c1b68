use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::SkipReason;
use crate::utils::time::parse_timestamp;

/// One record of a tabular input: named cells holding arbitrary JSON values.
///
/// A `null` cell is treated the same as an absent one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(Map<String, Value>);

impl RawRow {
    pub fn new() -> Self {
        RawRow(Map::new())
    }

    /// Builder-style cell setter, mostly for fixtures
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Numeric cell. Numbers and numeric strings are accepted; raw on-chain
    /// amounts often arrive as decimal strings too wide for JSON numbers.
    /// Values that do not fit a finite `f64` ("inf", "1e400") are non-numeric.
    pub fn get_f64(&self, key: &str) -> Result<f64, SkipReason> {
        let value = self
            .get(key)
            .ok_or_else(|| SkipReason::MissingField(key.to_string()))?;

        let parsed = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };

        match parsed {
            Some(number) if number.is_finite() => Ok(number),
            _ => Err(SkipReason::NonNumeric {
                field: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// First of `keys` holding a parseable timestamp
    pub fn get_timestamp(&self, keys: &[&str]) -> Option<DateTime<Utc>> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find_map(parse_timestamp)
    }

    /// Rename `alias` to `canonical` when the canonical column is absent
    pub fn normalize_alias(&mut self, alias: &str, canonical: &str) {
        if self.contains(canonical) {
            return;
        }
        if let Some(value) = self.0.remove(alias) {
            self.0.insert(canonical.to_string(), value);
        }
    }
}

impl From<Map<String, Value>> for RawRow {
    fn from(map: Map<String, Value>) -> Self {
        RawRow(map)
    }
}

/// Key cells rendered as JSON text, so `"1"` and `1` stay distinct
fn join_key(row: &RawRow, keys: &[&str]) -> Option<Vec<String>> {
    keys.iter().map(|key| row.get(key).map(Value::to_string)).collect()
}

/// Left outer join of two row lists on `keys`.
///
/// Every left row yields one output row per matching right row, or itself alone
/// when nothing matches. Non-key columns present on both sides are renamed with
/// `suffixes.0` (left) and `suffixes.1` (right). Left rows missing a key never match.
pub fn left_join(
    left: &[RawRow],
    right: &[RawRow],
    keys: &[&str],
    suffixes: (&str, &str),
) -> Vec<RawRow> {
    let mut right_index: HashMap<Vec<String>, Vec<&RawRow>> = HashMap::new();
    for row in right {
        if let Some(key) = join_key(row, keys) {
            right_index.entry(key).or_default().push(row);
        }
    }

    let mut joined = Vec::with_capacity(left.len());

    for left_row in left {
        let matches = join_key(left_row, keys)
            .and_then(|key| right_index.get(&key))
            .map(Vec::as_slice)
            .unwrap_or_default();

        if matches.is_empty() {
            joined.push(left_row.clone());
            continue;
        }

        for right_row in matches {
            let mut merged = RawRow::new();

            for (column, value) in &left_row.0 {
                let is_key = keys.contains(&column.as_str());
                if !is_key && right_row.0.contains_key(column) {
                    merged.insert(format!("{}{}", column, suffixes.0), value.clone());
                } else {
                    merged.insert(column.clone(), value.clone());
                }
            }

            for (column, value) in &right_row.0 {
                if keys.contains(&column.as_str()) {
                    continue;
                }
                if left_row.0.contains_key(column) {
                    merged.insert(format!("{}{}", column, suffixes.1), value.clone());
                } else {
                    merged.insert(column.clone(), value.clone());
                }
            }

            joined.push(merged);
        }
    }

    joined
}
