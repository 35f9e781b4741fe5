//! Reshaping: header-row detection, wide-to-long (melt) and long-to-wide (pivot).

use serde_json::Value;
use std::collections::BTreeMap;

use crate::parser::Table;
use crate::transform::operations::text;

/// One cell of a melted table.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    /// Text of the identifier column for the source row.
    pub id: String,
    /// Header of the melted column.
    pub variable: String,
    pub value: Value,
}

/// Result of a pivot: `rows[index][column] = value`.
#[derive(Debug, Clone, Default)]
pub struct Pivot {
    pub rows: BTreeMap<String, BTreeMap<String, Value>>,
    /// (index, column) pairs seen more than once; the first value is kept.
    pub duplicates: Vec<(String, String)>,
}

#[cfg(test)]
impl Pivot {
    pub fn get(&self, index: &str, column: &str) -> Option<&Value> {
        self.rows.get(index).and_then(|r| r.get(column))
    }
}

/// First row in which at least `min_matches` cells satisfy `is_header_cell`.
pub fn find_header_row<F>(rows: &[Vec<Value>], min_matches: usize, is_header_cell: F) -> Option<usize>
where
    F: Fn(&Value) -> bool,
{
    rows.iter()
        .position(|row| row.iter().filter(|cell| is_header_cell(cell)).count() >= min_matches)
}

/// First column index (searching rows from `from_row`) holding a cell that
/// satisfies `predicate`.
pub fn find_column<F>(rows: &[Vec<Value>], from_row: usize, predicate: F) -> Option<usize>
where
    F: Fn(&Value) -> bool,
{
    rows.iter()
        .skip(from_row)
        .find_map(|row| row.iter().position(&predicate))
}

/// Melt `value_columns` of `table` into long records keyed by `id_column`.
///
/// Rows with a blank identifier are dropped.
pub fn melt(table: &Table, id_column: &str, value_columns: &[String]) -> Vec<LongRecord> {
    let mut out = Vec::with_capacity(table.len() * value_columns.len());
    for record in &table.records {
        let Some(id) = record.get(id_column).and_then(text) else {
            continue;
        };
        for column in value_columns {
            out.push(LongRecord {
                id: id.clone(),
                variable: column.clone(),
                value: record.get(column).cloned().unwrap_or(Value::Null),
            });
        }
    }
    out
}

/// Pivot `(index, column, value)` triples into one row per index.
pub fn pivot<I>(triples: I) -> Pivot
where
    I: IntoIterator<Item = (String, String, Value)>,
{
    let mut result = Pivot::default();
    for (index, column, value) in triples {
        let row = result.rows.entry(index.clone()).or_default();
        if row.contains_key(&column) {
            result.duplicates.push((index, column));
            continue;
        }
        row.insert(column, value);
    }
    result
}
