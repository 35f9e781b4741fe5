//! `state_gwh.csv` and `state_renewables.csv`.
//!
//! The AES state summary sheet is a presentation table: a title block, a row
//! of jurisdiction headings, then one row per fuel with GWh per jurisdiction.
//!
//! ```text
//!              NSW     Vic     ...  Aust        header row (>= 3 jurisdictions)
//! Wind         5000    8000    ...  24200
//! Hydro        4000     900    ...  14900    ─▶ melt ─▶ filter fuels ─▶ pivot
//! Total       70000   45000    ... 280000
//! ```
//!
//! The result is one row per jurisdiction (including the `Australia` total),
//! sorted by name.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::config::SheetSource;
use crate::error::{SchemaError, StepResult};
use crate::models::Jurisdiction;
use crate::output::{write_csv, OutputRecord};
use crate::parser::sheet::sheet_label;
use crate::parser::{is_blank, Table};
use crate::steps::population::population_of;
use crate::steps::{Step, StepContext};
use crate::transform::operations::{round_to, sum_present, text, to_number};
use crate::transform::reshape::{find_column, find_header_row, melt, pivot};
use crate::validation::validate_rows;

/// Fuel labels kept from the state summary.
pub const TRACKED_FUELS: [&str; 8] = [
    LARGE_SOLAR,
    SMALL_SOLAR,
    WIND,
    HYDRO,
    BAGASSE_WOOD,
    BIOGAS,
    "Total renewable",
    TOTAL,
];

const LARGE_SOLAR: &str = "Large-scale solar PV";
const SMALL_SOLAR: &str = "Small-scale solar PV";
const WIND: &str = "Wind";
const HYDRO: &str = "Hydro";
const BAGASSE_WOOD: &str = "Bagasse, wood";
const BIOGAS: &str = "Biogas";
const TOTAL: &str = "Total";

/// Minimum number of jurisdiction headings that identify the header row.
const MIN_JURISDICTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateGwhRow {
    #[serde(rename = "State or territory")]
    pub name: String,
    #[serde(rename = "Solar PV")]
    pub solar_pv: f64,
    #[serde(rename = "Wind")]
    pub wind: Option<f64>,
    #[serde(rename = "Hydro")]
    pub hydro: Option<f64>,
    #[serde(rename = "Bioenergy")]
    pub bioenergy: f64,
    #[serde(rename = "Total Renewables GWh")]
    pub total_renewables: f64,
    #[serde(rename = "Renewable Share %")]
    pub renewable_share: Option<f64>,
    #[serde(rename = "Total Electricity")]
    pub total_electricity: Option<f64>,
}

impl OutputRecord for StateGwhRow {
    const COLUMNS: &'static [&'static str] = &[
        "State or territory",
        "Solar PV",
        "Wind",
        "Hydro",
        "Bioenergy",
        "Total Renewables GWh",
        "Renewable Share %",
        "Total Electricity",
    ];
    const SCHEMA: &'static str = include_str!("../../schemas/state_gwh.json");
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateRenewablesRow {
    #[serde(rename = "State or territory")]
    pub name: String,
    #[serde(rename = "Solar PV")]
    pub solar_pv: f64,
    #[serde(rename = "Wind")]
    pub wind: Option<f64>,
    #[serde(rename = "Hydro")]
    pub hydro: Option<f64>,
    #[serde(rename = "Bioenergy")]
    pub bioenergy: f64,
    #[serde(rename = "Total Renewables GWh")]
    pub total_renewables: f64,
    #[serde(rename = "Renewable Share %")]
    pub renewable_share: Option<f64>,
    #[serde(rename = "Total Electricity")]
    pub total_electricity: Option<f64>,
    #[serde(rename = "Population")]
    pub population: Option<u64>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "Per Capita Renewables GWh")]
    pub per_capita: Option<f64>,
}

impl OutputRecord for StateRenewablesRow {
    const COLUMNS: &'static [&'static str] = &[
        "State or territory",
        "Solar PV",
        "Wind",
        "Hydro",
        "Bioenergy",
        "Total Renewables GWh",
        "Renewable Share %",
        "Total Electricity",
        "Population",
        "State",
        "Per Capita Renewables GWh",
    ];
    const SCHEMA: &'static str = include_str!("../../schemas/state_renewables.json");
}

/// Parsed state summary.
#[derive(Debug, Clone, Default)]
pub struct GenerationSummary {
    pub rows: Vec<StateGwhRow>,
    /// (jurisdiction, fuel) pairs that appeared more than once.
    pub duplicates: Vec<(String, String)>,
    /// Non-blank cells that did not parse as numbers.
    pub uncoerced: usize,
}

fn is_jurisdiction_cell(cell: &Value) -> bool {
    text(cell).and_then(|t| Jurisdiction::parse(&t)).is_some()
}

fn is_tracked_fuel(cell: &Value) -> bool {
    text(cell).is_some_and(|t| TRACKED_FUELS.contains(&t.as_str()))
}

/// Reshape the raw state summary rows into one row per jurisdiction.
pub fn summarize(mut raw: Vec<Vec<Value>>, source: &str) -> StepResult<GenerationSummary> {
    let header_idx = find_header_row(&raw, MIN_JURISDICTIONS, is_jurisdiction_cell).ok_or_else(|| {
        SchemaError::HeaderNotFound {
            table: source.to_string(),
            message: format!("no row names at least {} states or territories", MIN_JURISDICTIONS),
        }
    })?;
    let fuel_idx = find_column(&raw, header_idx, is_tracked_fuel).ok_or_else(|| {
        SchemaError::HeaderNotFound {
            table: source.to_string(),
            message: format!("no column holds any of the fuel labels {:?}", TRACKED_FUELS),
        }
    })?;

    raw.drain(..header_idx);
    let header_cells = raw[0].clone();
    let table = Table::from_rows(source, raw)?;

    let fuel_column = table.headers.get(fuel_idx).cloned().ok_or_else(|| {
        SchemaError::HeaderNotFound {
            table: source.to_string(),
            message: format!("fuel label column {} lies beyond the header row", fuel_idx + 1),
        }
    })?;
    let jurisdictions: HashMap<String, Jurisdiction> = table
        .headers
        .iter()
        .zip(&header_cells)
        .filter_map(|(header, cell)| {
            text(cell)
                .and_then(|t| Jurisdiction::parse(&t))
                .map(|j| (header.clone(), j))
        })
        .collect();
    let value_columns: Vec<String> = table
        .headers
        .iter()
        .filter(|h| jurisdictions.contains_key(*h))
        .cloned()
        .collect();

    let mut uncoerced = 0;
    let long: Vec<(String, String, Value)> = melt(&table, &fuel_column, &value_columns)
        .into_iter()
        .filter(|r| TRACKED_FUELS.contains(&r.id.as_str()))
        .filter_map(|r| {
            if !is_blank(&r.value) && to_number(&r.value).is_none() {
                uncoerced += 1;
            }
            let jurisdiction = jurisdictions.get(&r.variable)?;
            Some((jurisdiction.name().to_string(), r.id, r.value))
        })
        .collect();
    let pivoted = pivot(long);

    let rows = pivoted
        .rows
        .iter()
        .map(|(name, fuels)| gwh_row(name, fuels))
        .collect();

    Ok(GenerationSummary {
        rows,
        duplicates: pivoted.duplicates,
        uncoerced,
    })
}

fn gwh_row(name: &str, fuels: &BTreeMap<String, Value>) -> StateGwhRow {
    let gwh = |fuel: &str| fuels.get(fuel).and_then(to_number);

    let solar_pv = sum_present([gwh(LARGE_SOLAR), gwh(SMALL_SOLAR)]);
    let bioenergy = sum_present([gwh(BAGASSE_WOOD), gwh(BIOGAS)]);
    let wind = gwh(WIND);
    let hydro = gwh(HYDRO);
    let total_renewables = sum_present([Some(solar_pv), wind, hydro, Some(bioenergy)]);
    let total_electricity = gwh(TOTAL);

    StateGwhRow {
        name: name.to_string(),
        solar_pv,
        wind,
        hydro,
        bioenergy,
        total_renewables,
        renewable_share: renewable_share(total_renewables, total_electricity),
        total_electricity,
    }
}

/// Renewables as a percentage of total generation, 1 decimal place.
pub fn renewable_share(total_renewables: f64, total_electricity: Option<f64>) -> Option<f64> {
    match total_electricity {
        Some(total) if total != 0.0 => Some(round_to(total_renewables / total * 100.0, 1)),
        _ => None,
    }
}

/// GWh per million residents, 2 decimal places.
pub fn per_capita(total_renewables: f64, population: Option<u64>) -> Option<f64> {
    match population {
        Some(p) if p > 0 => Some(round_to(total_renewables / (p as f64 / 1_000_000.0), 2)),
        _ => None,
    }
}

/// Left join on full name with the population table.
pub fn with_population(rows: &[StateGwhRow]) -> Vec<StateRenewablesRow> {
    rows.iter()
        .map(|row| {
            let found = population_of(&row.name);
            let population = found.map(|(_, p)| p);
            StateRenewablesRow {
                name: row.name.clone(),
                solar_pv: row.solar_pv,
                wind: row.wind,
                hydro: row.hydro,
                bioenergy: row.bioenergy,
                total_renewables: row.total_renewables,
                renewable_share: row.renewable_share,
                total_electricity: row.total_electricity,
                population,
                state: found.map(|(s, _)| s.abbreviation().to_string()),
                per_capita: per_capita(row.total_renewables, population),
            }
        })
        .collect()
}

fn load_summary(ctx: &mut StepContext<'_>) -> StepResult<GenerationSummary> {
    let source: SheetSource = ctx.config.sources.energy_statistics.clone();
    let raw = ctx.sheet_rows(&source)?;
    let label = sheet_label(&ctx.config.input_path(&source.file), &source.sheet);
    let summary = summarize(raw, &label)?;

    for (jurisdiction, fuel) in &summary.duplicates {
        ctx.warn(format!(
            "{}: '{}' listed more than once for {}, keeping the first value",
            label, fuel, jurisdiction
        ));
    }
    if summary.uncoerced > 0 {
        tracing::debug!(source = %label, cells = summary.uncoerced, "non-numeric GWh cells treated as missing");
    }
    Ok(summary)
}

pub fn run_state_gwh(ctx: &mut StepContext<'_>) -> StepResult<usize> {
    let summary = load_summary(ctx)?;
    validate_rows(Step::StateGwh.name(), &summary.rows)?;
    write_csv(&ctx.output_path(Step::StateGwh), &summary.rows)
}

pub fn run_state_renewables(ctx: &mut StepContext<'_>) -> StepResult<usize> {
    let summary = load_summary(ctx)?;
    let rows = with_population(&summary.rows);
    validate_rows(Step::StateRenewables.name(), &rows)?;
    write_csv(&ctx.output_path(Step::StateRenewables), &rows)
}
