use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// Synthetic row identity. Assigned once when a row enters the model and
/// stable across edits and reorders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Raw row storage as supplied by the caller: either an object keyed by
/// column key, or an array addressed by column position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowData {
    Keyed(BTreeMap<String, CellValue>),
    Positional(Vec<CellValue>),
}

impl Default for RowData {
    fn default() -> Self {
        RowData::Keyed(BTreeMap::new())
    }
}

impl RowData {
    /// Build a keyed row from `(key, value)` pairs.
    pub fn keyed<K: Into<String>>(pairs: impl IntoIterator<Item = (K, CellValue)>) -> Self {
        RowData::Keyed(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Look a cell up by key (keyed rows) or by column position (positional rows).
    pub fn get(&self, key: &str, col_index: usize) -> Option<&CellValue> {
        match self {
            RowData::Keyed(map) => map.get(key),
            RowData::Positional(values) => values.get(col_index),
        }
    }

    /// Write a cell. Positional rows grow with `Empty` padding when needed.
    pub fn set(&mut self, key: &str, col_index: usize, value: CellValue) {
        match self {
            RowData::Keyed(map) => {
                map.insert(key.to_string(), value);
            }
            RowData::Positional(values) => {
                if values.len() <= col_index {
                    values.resize(col_index + 1, CellValue::Empty);
                }
                values[col_index] = value;
            }
        }
    }

    /// Drop a cell. Keyed rows lose the key; positional rows shrink when
    /// it is the last value and hold `Empty` otherwise.
    pub fn remove(&mut self, key: &str, col_index: usize) -> Option<CellValue> {
        match self {
            RowData::Keyed(map) => map.remove(key),
            RowData::Positional(values) if col_index + 1 == values.len() => values.pop(),
            RowData::Positional(values) => values
                .get_mut(col_index)
                .map(|v| std::mem::replace(v, CellValue::Empty)),
        }
    }
}
