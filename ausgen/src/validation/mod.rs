//! JSON Schema validation of output rows.
//!
//! Every output record type carries an embedded schema (see
//! [`crate::output::OutputRecord::SCHEMA`], files under `schemas/`). Rows are
//! serialized to JSON and checked before anything is written, so a source
//! whose layout drifted fails its step instead of producing a skewed CSV.

use serde_json::Value;

use crate::error::StepError;
use crate::output::OutputRecord;

/// Validate every row of an output table against `R::SCHEMA`.
pub fn validate_rows<R: OutputRecord>(table: &str, rows: &[R]) -> Result<(), StepError> {
    let schema: Value = serde_json::from_str(R::SCHEMA).map_err(|e| StepError::Validation {
        table: table.to_string(),
        count: rows.len(),
        first: format!("embedded schema does not parse: {}", e),
    })?;
    let validator = jsonschema::draft7::new(&schema).map_err(|e| StepError::Validation {
        table: table.to_string(),
        count: rows.len(),
        first: format!("embedded schema is invalid: {}", e),
    })?;

    let mut failures: Vec<String> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let value = serde_json::to_value(row).map_err(|e| StepError::Validation {
            table: table.to_string(),
            count: 1,
            first: format!("row {}: {}", i, e),
        })?;
        let first = validator.iter_errors(&value).next().map(|e| e.to_string());
        if let Some(err) = first {
            failures.push(format!("row {}: {}", i, err));
        }
    }

    match failures.first() {
        None => Ok(()),
        Some(first) => Err(StepError::Validation {
            table: table.to_string(),
            count: failures.len(),
            first: first.clone(),
        }),
    }
}
