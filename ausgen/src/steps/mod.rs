//! The eight output steps.
//!
//! Each step loads its own sources, so steps can run in any order or alone.
//! Shared reference data (the postcode table) is loaded per step.

pub mod generation;
pub mod installations;
pub mod population;
pub mod power_stations;
pub mod wind_farms;

use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

use crate::config::{Config, SheetSource};
use crate::error::{ConfigError, StepResult};
use crate::logs::log_warning;
use crate::parser::sheet::{load_sheet, read_sheet_rows};
use crate::parser::{parse_csv_file_auto, Table};

/// Step identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Population,
    StateGwh,
    StateRenewables,
    WindFarms,
    StateSolarInstalls,
    RenewableTrends,
    StatePowerStations,
    OtherRenewables,
}

impl Step {
    /// All steps in run order.
    pub const ALL: [Step; 8] = [
        Step::Population,
        Step::StateGwh,
        Step::StateRenewables,
        Step::WindFarms,
        Step::StateSolarInstalls,
        Step::RenewableTrends,
        Step::StatePowerStations,
        Step::OtherRenewables,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::Population => "population",
            Step::StateGwh => "state_gwh",
            Step::StateRenewables => "state_renewables",
            Step::WindFarms => "au_wind_farms",
            Step::StateSolarInstalls => "state_solar_installs",
            Step::RenewableTrends => "renewable_trends",
            Step::StatePowerStations => "state_power_stations",
            Step::OtherRenewables => "other_renewables",
        }
    }

    pub fn output_file(&self) -> String {
        format!("{}.csv", self.name())
    }

    pub fn description(&self) -> &'static str {
        match self {
            Step::Population => "State population, June 2024",
            Step::StateGwh => "Renewable generation (GWh) and share by state",
            Step::StateRenewables => "Renewable generation joined with population, per capita",
            Step::WindFarms => "Australian wind farms with coordinates",
            Step::StateSolarInstalls => "Small-scale solar installations per state for the target year",
            Step::RenewableTrends => "Yearly small-scale solar, wind and hydro installations",
            Step::StatePowerStations => "Approved power station capacity per state",
            Step::OtherRenewables => "Accredited solar, hydro and bioenergy capacity by postcode",
        }
    }

    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        let wanted = name.trim().trim_end_matches(".csv");
        Step::ALL
            .into_iter()
            .find(|s| s.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownStep(name.to_string()))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-step state: configuration plus collected warnings.
pub struct StepContext<'a> {
    pub config: &'a Config,
    pub warnings: Vec<String>,
}

impl<'a> StepContext<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            warnings: Vec::new(),
        }
    }

    /// Log a warning and keep it for the manifest.
    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log_warning(msg.clone());
        self.warnings.push(msg);
    }

    pub fn output_path(&self, step: Step) -> PathBuf {
        self.config.output_path(&step.output_file())
    }

    pub fn load_sheet(&self, source: &SheetSource) -> StepResult<Table> {
        let path = self.config.input_path(&source.file);
        Ok(load_sheet(&path, &source.sheet, source.skip_rows)?)
    }

    /// Raw rows of a sheet with `skip_rows` already dropped, for sheets whose
    /// header row has to be located by content.
    pub fn sheet_rows(&self, source: &SheetSource) -> StepResult<Vec<Vec<Value>>> {
        let path = self.config.input_path(&source.file);
        let mut rows = read_sheet_rows(&path, &source.sheet)?;
        rows.drain(..source.skip_rows.min(rows.len()));
        Ok(rows)
    }

    pub fn load_csv(&self, file: &str) -> StepResult<Table> {
        let path = self.config.input_path(file);
        let parsed = parse_csv_file_auto(&path)?;
        tracing::debug!(
            file,
            encoding = %parsed.encoding,
            delimiter = ?parsed.delimiter,
            rows = parsed.table.len(),
            "loaded csv"
        );
        Ok(parsed.table)
    }

    pub fn load_postcodes(&self) -> StepResult<Table> {
        self.load_csv(&self.config.sources.postcodes)
    }
}

/// Run one step, writing its output file. Returns the number of rows written.
pub fn run_step(step: Step, ctx: &mut StepContext<'_>) -> StepResult<usize> {
    match step {
        Step::Population => population::run(ctx),
        Step::StateGwh => generation::run_state_gwh(ctx),
        Step::StateRenewables => generation::run_state_renewables(ctx),
        Step::WindFarms => wind_farms::run(ctx),
        Step::StateSolarInstalls => installations::run_state_solar_installs(ctx),
        Step::RenewableTrends => installations::run_renewable_trends(ctx),
        Step::StatePowerStations => power_stations::run_state_power_stations(ctx),
        Step::OtherRenewables => power_stations::run_other_renewables(ctx),
    }
}
