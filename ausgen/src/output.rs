//! CSV output and the run manifest.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{StepError, StepResult};

/// A typed output row.
///
/// `COLUMNS` is the header written to the CSV (also when there are no rows)
/// and must list the serialized field names in declaration order. `SCHEMA`
/// is the JSON Schema each serialized row is validated against.
pub trait OutputRecord: Serialize {
    const COLUMNS: &'static [&'static str];
    const SCHEMA: &'static str;
}

/// Write `rows` to `path`, replacing any existing file. Returns the row count.
pub fn write_csv<R: OutputRecord>(path: &Path, rows: &[R]) -> StepResult<usize> {
    write_csv_with_columns(path, R::COLUMNS, rows)
}

/// Like [`write_csv`] with a header chosen at run time.
pub fn write_csv_with_columns<R, S>(path: &Path, columns: &[S], rows: &[R]) -> StepResult<usize>
where
    R: Serialize,
    S: AsRef<str>,
{
    let write_err = |message: String| StepError::Write {
        path: path.to_path_buf(),
        message,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| write_err(e.to_string()))?;

    writer
        .write_record(columns.iter().map(|c| c.as_ref()))
        .map_err(|e| write_err(e.to_string()))?;
    for row in rows {
        writer.serialize(row).map_err(|e| write_err(e.to_string()))?;
    }
    writer.flush().map_err(|e| write_err(e.to_string()))?;

    Ok(rows.len())
}

// =============================================================================
// Manifest
// =============================================================================

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Failed,
    Skipped,
}

/// Manifest entry for one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step: String,
    pub output: PathBuf,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Summary of a run, written next to the outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// RFC 3339 timestamp.
    pub generated_at: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub steps: Vec<StepReport>,
}

impl Manifest {
    pub const FILE_NAME: &'static str = "manifest.json";

    pub fn new(input_dir: &Path, output_dir: &Path, steps: Vec<StepReport>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            steps,
        }
    }

    pub fn failed(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .count()
    }

    /// Write as pretty JSON into `dir`; returns the file path.
    pub fn write(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(Self::FILE_NAME);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(path)
    }
}
