//! `au_wind_farms.csv`: Australian projects from the Global Wind Power Tracker.

use serde::Serialize;

use crate::error::{SchemaError, StepResult};
use crate::output::{write_csv, OutputRecord};
use crate::parser::Table;
use crate::steps::{Step, StepContext};
use crate::transform::operations::{text, to_number};
use crate::validation::validate_rows;

const COUNTRY: &str = "Country/Area";
const PROJECT: &str = "Project Name";
const STATE: &str = "State/Province";
const CAPACITY: &str = "Capacity (MW)";
const STATUS: &str = "Status";
const LATITUDE: &str = "Latitude";
const LONGITUDE: &str = "Longitude";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindFarmRow {
    #[serde(rename = "Project Name")]
    pub project_name: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "Capacity (MW)")]
    pub capacity_mw: Option<f64>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
}

impl OutputRecord for WindFarmRow {
    const COLUMNS: &'static [&'static str] = &[
        "Project Name",
        "State",
        "Capacity (MW)",
        "Status",
        "Latitude",
        "Longitude",
    ];
    const SCHEMA: &'static str = include_str!("../../schemas/au_wind_farms.json");
}

/// Tracker rows whose country is Australia, in source order.
pub fn australian_wind_farms(table: &Table) -> Result<Vec<WindFarmRow>, SchemaError> {
    table.require_columns(&[COUNTRY, PROJECT, STATE, CAPACITY, STATUS, LATITUDE, LONGITUDE])?;

    let rows = table
        .records
        .iter()
        .filter(|r| r.get(COUNTRY).and_then(text).as_deref() == Some("Australia"))
        .map(|r| WindFarmRow {
            project_name: r.get(PROJECT).and_then(text),
            state: r.get(STATE).and_then(text),
            capacity_mw: r.get(CAPACITY).and_then(to_number),
            status: r.get(STATUS).and_then(text),
            latitude: r.get(LATITUDE).and_then(to_number),
            longitude: r.get(LONGITUDE).and_then(to_number),
        })
        .collect();
    Ok(rows)
}

pub fn run(ctx: &mut StepContext<'_>) -> StepResult<usize> {
    let table = ctx.load_sheet(&ctx.config.sources.wind_tracker)?;
    let rows = australian_wind_farms(&table)?;
    tracing::debug!(source = %table.name, total = table.len(), australian = rows.len(), "filtered wind farms");

    validate_rows(Step::WindFarms.name(), &rows)?;
    write_csv(&ctx.output_path(Step::WindFarms), &rows)
}
