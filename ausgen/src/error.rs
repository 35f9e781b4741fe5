//! Error types for the ausgen pipeline.
//!
//! One enum per layer:
//!
//! - [`LoadError`] - reading CSV files and workbook sheets
//! - [`SchemaError`] - a loaded table does not have the expected layout
//! - [`ConfigError`] - configuration file and environment problems
//! - [`StepError`] - a single output step failed
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while reading a source file into a table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Workbook could not be opened or a sheet could not be read.
    #[error("Workbook '{path}': {message}")]
    Workbook { path: PathBuf, message: String },

    /// Requested sheet does not exist in the workbook.
    #[error("Sheet '{sheet}' not found in '{path}' (available: {available})")]
    SheetNotFound {
        path: PathBuf,
        sheet: String,
        available: String,
    },

    /// Invalid CSV content.
    #[error("Invalid CSV at line {line}: {message}")]
    Csv { line: u64, message: String },

    /// Empty file or sheet.
    #[error("'{0}' is empty")]
    Empty(String),

    /// Fewer rows than the configured header offset.
    #[error("'{source_name}' has {rows} rows, cannot skip {skip} and still read a header")]
    HeaderOutOfRange {
        source_name: String,
        rows: usize,
        skip: usize,
    },
}

// =============================================================================
// Schema Errors
// =============================================================================

/// A loaded table does not match the layout a step expects.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Required column absent from the header row.
    #[error("{table}: missing required column '{column}' (found: {found})")]
    MissingColumn {
        table: String,
        column: String,
        found: String,
    },

    /// Header row could not be located.
    #[error("{table}: could not locate header row ({message})")]
    HeaderNotFound { table: String, message: String },

    /// A column header looked like a yearly column but carried no year token.
    #[error("{table}: column '{column}' has no 4-digit year token")]
    HeaderWithoutYear { table: String, column: String },
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors while building the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`crate::config::Config`].
    #[error("Invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Unknown step name.
    #[error("Unknown step '{0}'")]
    UnknownStep(String),
}

// =============================================================================
// Step Errors
// =============================================================================

/// Errors raised by a single output step.
#[derive(Debug, Error)]
pub enum StepError {
    /// Source could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Source layout was not the expected one.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Output records failed schema validation.
    #[error("{table}: {count} record(s) failed validation, first: {first}")]
    Validation {
        table: String,
        count: usize,
        first: String,
    },

    /// Output could not be written.
    #[error("Failed to write '{path}': {message}")]
    Write { path: PathBuf, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is the error returned by [`crate::transform::pipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration problem.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Output directory could not be prepared.
    #[error("Failed to prepare output directory '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more steps failed.
    #[error("{failed} of {total} step(s) failed")]
    StepsFailed { failed: usize, total: usize },

    /// Manifest could not be written.
    #[error("Failed to write manifest: {0}")]
    Manifest(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let load_err = LoadError::Empty("postcodes.csv".into());
        let step_err: StepError = load_err.into();
        assert!(step_err.to_string().contains("postcodes.csv"));

        let schema_err = SchemaError::MissingColumn {
            table: "Approved".into(),
            column: "State".into(),
            found: "Name, Capacity".into(),
        };
        let step_err: StepError = schema_err.into();
        assert!(step_err.to_string().contains("'State'"));
    }

    #[test]
    fn test_sheet_not_found_lists_available() {
        let err = LoadError::SheetNotFound {
            path: PathBuf::from("stations.xlsx"),
            sheet: "Approved".into(),
            available: "Committed, Probable".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Approved"));
        assert!(msg.contains("Committed, Probable"));
    }
}
