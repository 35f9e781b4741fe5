//! Run configuration.
//!
//! Defaults reproduce the file names, sheet names and header offsets of the
//! published source releases. Layering, lowest to highest precedence:
//! defaults, JSON config file, environment, command-line flags.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable naming a JSON config file.
pub const ENV_CONFIG: &str = "AUSGEN_CONFIG";
/// Environment variable overriding the input directory.
pub const ENV_INPUT_DIR: &str = "AUSGEN_INPUT_DIR";
/// Environment variable overriding the output directory.
pub const ENV_OUTPUT_DIR: &str = "AUSGEN_OUTPUT_DIR";

/// A workbook sheet source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSource {
    pub file: String,
    pub sheet: String,
    #[serde(default)]
    pub skip_rows: usize,
}

impl SheetSource {
    fn new(file: &str, sheet: &str, skip_rows: usize) -> Self {
        Self {
            file: file.to_string(),
            sheet: sheet.to_string(),
            skip_rows,
        }
    }
}

/// All source locations, relative to [`Config::input_dir`] unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sources {
    /// Australian Energy Statistics Table O, state summary sheet.
    pub energy_statistics: SheetSource,
    /// Global Wind Power Tracker.
    pub wind_tracker: SheetSource,
    /// SRES solar installations by postcode (CSV).
    pub solar_installations: String,
    /// Postcode reference table with state and coordinates (CSV).
    pub postcodes: String,
    /// SRES small-generation-unit wind installations.
    pub sres_wind: SheetSource,
    /// SRES small-generation-unit hydro installations.
    pub sres_hydro: SheetSource,
    /// Approved power stations and projects.
    pub approved_stations: SheetSource,
    /// Historical accredited power stations.
    pub accredited_stations: SheetSource,
}

impl Default for Sources {
    fn default() -> Self {
        let sres = "sres-postcode-data-installations-2011-to-present-and-totals.xlsx";
        Self {
            energy_statistics: SheetSource::new(
                "Australian Energy Statistics 2025 Table O (1).xlsx",
                "State summary 2023-24",
                0,
            ),
            wind_tracker: SheetSource::new("Global-Wind-Power-Tracker-February-2025.xlsx", "Data", 0),
            solar_installations: "swh-solar-installations-2011-to-present-and-totals.csv".to_string(),
            postcodes: "australian_postcodes.csv".to_string(),
            sres_wind: SheetSource::new(sres, "SGU-Wind", 3),
            sres_hydro: SheetSource::new(sres, "SGU-Hydro", 3),
            approved_stations: SheetSource::new(
                "power-stations-and-projects-status.xlsx",
                "Approved",
                3,
            ),
            accredited_stations: SheetSource::new(
                "historical-accredited-power-stations-and-projects.xlsx",
                "Accredited power stations",
                3,
            ),
        }
    }
}

/// Top-level configuration for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Year summed into the per-state solar installations table.
    pub target_year: u16,
    /// Turn header-year mismatches into errors instead of warnings.
    pub strict: bool,
    pub sources: Sources,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            target_year: 2024,
            strict: false,
            sources: Sources::default(),
        }
    }
}

impl Config {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then the file named by `explicit` or `AUSGEN_CONFIG`, then
    /// the directory environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let file = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(ENV_CONFIG).map(PathBuf::from));
        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(dir) = env::var_os(ENV_INPUT_DIR) {
            config.input_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env::var_os(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    /// Resolve a source file name against the input directory.
    pub fn input_path(&self, file: &str) -> PathBuf {
        let p = Path::new(file);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.input_dir.join(p)
        }
    }

    /// Path of an output file.
    pub fn output_path(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
