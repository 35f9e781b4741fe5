//! Left joins against reference tables.
//!
//! The reference side is indexed by a normalized key and de-duplicated (first
//! row wins), so a left join always returns exactly one output row per
//! primary row.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::SchemaError;
use crate::parser::Table;

/// Key normalizer applied to both sides of a join.
pub type KeyFn = fn(&Value) -> Option<String>;

/// Reference table indexed by key, keeping only the requested columns.
#[derive(Debug, Clone)]
pub struct Lookup {
    columns: Vec<String>,
    index: HashMap<String, Map<String, Value>>,
    /// Reference rows dropped because their key was already present.
    pub duplicate_keys: usize,
}

/// Match counts of a join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub matched: usize,
    pub unmatched: usize,
}

impl Lookup {
    /// Index `table` on `key_column`, carrying `columns` across.
    pub fn build(
        table: &Table,
        key_column: &str,
        columns: &[&str],
        key_fn: KeyFn,
    ) -> Result<Self, SchemaError> {
        let mut required = vec![key_column];
        required.extend_from_slice(columns);
        table.require_columns(&required)?;

        let mut index = HashMap::with_capacity(table.len());
        let mut duplicate_keys = 0;
        for record in &table.records {
            let Some(key) = record.get(key_column).and_then(key_fn) else {
                continue;
            };
            if index.contains_key(&key) {
                duplicate_keys += 1;
                continue;
            }
            let mut carried = Map::new();
            for column in columns {
                carried.insert(
                    (*column).to_string(),
                    record.get(*column).cloned().unwrap_or(Value::Null),
                );
            }
            index.insert(key, carried);
        }

        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            index,
            duplicate_keys,
        })
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn get(&self, key: &str) -> Option<&Map<String, Value>> {
        self.index.get(key)
    }
}

/// Left join `records` on `left_key` against `lookup`.
///
/// Matched rows gain the lookup columns; unmatched rows gain them as null.
/// A lookup column that collides with an existing one is added with a
/// `_right` suffix.
pub fn left_join(
    records: &[Value],
    left_key: &str,
    lookup: &Lookup,
    key_fn: KeyFn,
) -> (Vec<Value>, JoinStats) {
    let mut stats = JoinStats::default();
    let joined = records
        .iter()
        .map(|record| {
            let mut obj = record.as_object().cloned().unwrap_or_default();
            let found = record
                .get(left_key)
                .and_then(key_fn)
                .and_then(|key| lookup.get(&key));

            match found {
                Some(_) => stats.matched += 1,
                None => stats.unmatched += 1,
            }

            for column in &lookup.columns {
                let value = found
                    .and_then(|m| m.get(column))
                    .cloned()
                    .unwrap_or(Value::Null);
                let name = if obj.contains_key(column) {
                    format!("{}_right", column)
                } else {
                    column.clone()
                };
                obj.insert(name, value);
            }
            Value::Object(obj)
        })
        .collect();

    (joined, stats)
}
