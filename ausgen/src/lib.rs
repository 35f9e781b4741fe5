//! # ausgen - Australian renewable energy tables
//!
//! ausgen turns the public Australian energy releases (AES Table O, the
//! Global Wind Power Tracker, SRES postcode installations and the Clean
//! Energy Regulator power-station registers) into flat CSV tables for
//! dashboards and charts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ xlsx / csv  │────▶│   Parser    │────▶│    Steps    │────▶│  CSV + JSON │
//! │  (sources)  │     │ (auto-enc)  │     │ (8 outputs) │     │  manifest   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ausgen::{Config, Step};
//!
//! let config = Config::load(None)?;
//! let manifest = ausgen::run(&config, &Step::ALL)?;
//! println!("{} outputs written", manifest.steps.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Run configuration (defaults, JSON file, environment)
//! - [`models`] - Domain models (State, Jurisdiction, Technology)
//! - [`parser`] - CSV and workbook loading
//! - [`transform`] - Coercion, reshaping, joins, grouping and the pipeline
//! - [`steps`] - The eight output tables
//! - [`output`] - CSV writer and run manifest
//! - [`validation`] - JSON Schema validation of output rows
//! - [`logs`] - Log helpers on top of `tracing`

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Loading
pub mod parser;

// Transformation
pub mod steps;
pub mod transform;

// Output
pub mod output;
pub mod validation;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    LoadError,
    PipelineError,
    SchemaError,
    StepError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Jurisdiction, State, Technology, POPULATION_JUNE_2024};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    detect_delimiter,
    detect_encoding,
    decode_content,
    parse_bytes_auto,
    parse_csv_file_auto,
    parse_csv_str,
    sheet::{load_sheet, sheet_names},
    ParseResult,
    Table,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use config::Config;
pub use output::{Manifest, StepReport, StepStatus};
pub use steps::Step;
pub use transform::pipeline::{execute, run};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::validate_rows;
