//! Power-station registries.
//!
//! - `state_power_stations.csv` - approved capacity summed per state
//! - `other_renewables.csv` - accredited solar, hydro and bioenergy capacity,
//!   grouped by postcode and placed with postcode coordinates

use serde::Serialize;

use crate::error::{SchemaError, StepResult};
use crate::models::Technology;
use crate::output::{write_csv, OutputRecord};
use crate::parser::Table;
use crate::steps::{Step, StepContext};
use crate::transform::grouper::{aggregate, sum_by, OrderedFloat};
use crate::transform::join::{left_join, JoinStats, Lookup};
use crate::transform::operations::{postcode_key, text, to_number};
use crate::validation::validate_rows;

// =============================================================================
// state_power_stations
// =============================================================================

const APPROVED_NAME: &str = "Power station name";
const APPROVED_STATE: &str = "State";
const APPROVED_CAPACITY: &str = "Installed capacity (MW)";
const APPROVED_FUEL: &str = "Fuel Source (s)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatePowerRow {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Installed capacity (MW)")]
    pub capacity_mw: f64,
}

impl OutputRecord for StatePowerRow {
    const COLUMNS: &'static [&'static str] = &["State", "Installed capacity (MW)"];
    const SCHEMA: &'static str = include_str!("../../schemas/state_power_stations.json");
}

/// Approved capacity per state, sorted by state. Blank states are dropped.
pub fn capacity_by_state(approved: &Table) -> Result<Vec<StatePowerRow>, SchemaError> {
    approved.require_columns(&[APPROVED_NAME, APPROVED_STATE, APPROVED_CAPACITY, APPROVED_FUEL])?;

    let totals = sum_by(approved.records.iter().filter_map(|record| {
        let state = record.get(APPROVED_STATE).and_then(text)?;
        Some((state, record.get(APPROVED_CAPACITY).and_then(to_number)))
    }));
    Ok(totals
        .into_iter()
        .map(|(state, capacity_mw)| StatePowerRow { state, capacity_mw })
        .collect())
}

pub fn run_state_power_stations(ctx: &mut StepContext<'_>) -> StepResult<usize> {
    let approved = ctx.load_sheet(&ctx.config.sources.approved_stations)?;
    let rows = capacity_by_state(&approved)?;
    tracing::debug!(source = %approved.name, stations = approved.len(), states = rows.len(), "approved capacity grouped");

    validate_rows(Step::StatePowerStations.name(), &rows)?;
    write_csv(&ctx.output_path(Step::StatePowerStations), &rows)
}

// =============================================================================
// other_renewables
// =============================================================================

const ACCREDITED_NAME: &str = "Power station name";
const ACCREDITED_STATE: &str = "State";
const ACCREDITED_CAPACITY: &str = "Installed capacity";
const ACCREDITED_POSTCODE: &str = "Postcode";
const ACCREDITED_FUEL: &str = "Fuel source(s)";

const REF_POSTCODE: &str = "postcode";
const REF_LAT: &str = "lat";
const REF_LONG: &str = "long";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtherRenewableRow {
    #[serde(rename = "Postcode")]
    pub postcode: String,
    #[serde(rename = "Type")]
    pub technology: String,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Capacity_MW")]
    pub capacity_mw: f64,
    #[serde(rename = "State")]
    pub state: Option<String>,
}

impl OutputRecord for OtherRenewableRow {
    const COLUMNS: &'static [&'static str] =
        &["Postcode", "Type", "Latitude", "Longitude", "Capacity_MW", "State"];
    const SCHEMA: &'static str = include_str!("../../schemas/other_renewables.json");
}

/// Rows lost on the way to `other_renewables.csv`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OtherRenewablesReport {
    pub unclassified: usize,
    pub join: JoinStats,
    pub without_coordinates: usize,
}

/// Classify accredited stations, place them by postcode and sum capacity per
/// (postcode, type, latitude, longitude). Output is sorted by that key.
pub fn other_renewables(
    accredited: &Table,
    postcodes: &Table,
) -> Result<(Vec<OtherRenewableRow>, OtherRenewablesReport), SchemaError> {
    accredited.require_columns(&[
        ACCREDITED_NAME,
        ACCREDITED_STATE,
        ACCREDITED_CAPACITY,
        ACCREDITED_POSTCODE,
        ACCREDITED_FUEL,
    ])?;
    let lookup = Lookup::build(postcodes, REF_POSTCODE, &[REF_LAT, REF_LONG], postcode_key)?;

    let mut report = OtherRenewablesReport::default();
    let mut classified = Vec::new();
    let mut types = Vec::new();
    for record in &accredited.records {
        let fuel = record.get(ACCREDITED_FUEL).and_then(text);
        match fuel.as_deref().and_then(Technology::classify_fuel_source) {
            Some(technology) => {
                classified.push(record.clone());
                types.push(technology);
            }
            None => report.unclassified += 1,
        }
    }

    let (joined, stats) = left_join(&classified, ACCREDITED_POSTCODE, &lookup, postcode_key);
    report.join = stats;

    let mut keyed = Vec::with_capacity(joined.len());
    for (record, technology) in joined.iter().zip(types) {
        let postcode = record.get(ACCREDITED_POSTCODE).and_then(postcode_key);
        let lat = record.get(REF_LAT).and_then(to_number);
        let long = record.get(REF_LONG).and_then(to_number);
        let (Some(postcode), Some(lat), Some(long)) = (postcode, lat, long) else {
            report.without_coordinates += 1;
            continue;
        };
        keyed.push((
            (postcode, technology.label(), OrderedFloat(lat), OrderedFloat(long)),
            record.get(ACCREDITED_CAPACITY).and_then(to_number),
            record.get(ACCREDITED_STATE).and_then(text),
        ));
    }

    let rows = aggregate(keyed)
        .into_iter()
        .map(|((postcode, technology, lat, long), agg)| OtherRenewableRow {
            postcode,
            technology: technology.to_string(),
            latitude: lat.0,
            longitude: long.0,
            capacity_mw: agg.sum,
            state: agg.first,
        })
        .collect();
    Ok((rows, report))
}

pub fn run_other_renewables(ctx: &mut StepContext<'_>) -> StepResult<usize> {
    let accredited = ctx.load_sheet(&ctx.config.sources.accredited_stations)?;
    let postcodes = ctx.load_postcodes()?;

    let (rows, report) = other_renewables(&accredited, &postcodes)?;
    if report.without_coordinates > 0 {
        ctx.warn(format!(
            "{}: {} station(s) without postcode coordinates, dropped",
            accredited.name, report.without_coordinates
        ));
    }
    tracing::debug!(
        source = %accredited.name,
        unclassified = report.unclassified,
        matched = report.join.matched,
        unmatched = report.join.unmatched,
        "accredited stations placed"
    );

    validate_rows(Step::OtherRenewables.name(), &rows)?;
    write_csv(&ctx.output_path(Step::OtherRenewables), &rows)
}
