//! Small-scale installation counts from the SRES postcode releases.
//!
//! - `state_solar_installs.csv` - target-year solar installations per state
//! - `renewable_trends.csv` - yearly solar, wind and hydro installations
//!
//! Both read the yearly `... Installation Quantity` columns. A column counts
//! only when its header carries a 4-digit year; negative cells are missing.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{SchemaError, StepResult};
use crate::models::Technology;
use crate::output::{write_csv, write_csv_with_columns, OutputRecord};
use crate::parser::Table;
use crate::steps::{Step, StepContext};
use crate::transform::grouper::sum_by;
use crate::transform::join::{left_join, Lookup};
use crate::transform::operations::{postcode_key, sum_present, text, to_number, year_token};
use crate::validation::validate_rows;

const QUANTITY_MARKER: &str = "Installation Quantity";
const SOLAR_POSTCODE: &str = "Small Unit Installation Postcode";
const REF_POSTCODE: &str = "postcode";
const REF_STATE: &str = "state";

/// Installation-quantity columns of a table, split by whether a year parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearColumns {
    /// (header, year) in source order.
    pub columns: Vec<(String, u16)>,
    /// Quantity headers without a year token. Excluded from every sum.
    pub without_year: Vec<String>,
}

impl YearColumns {
    pub fn for_year(&self, year: u16) -> Vec<String> {
        self.columns
            .iter()
            .filter(|(_, y)| *y == year)
            .map(|(h, _)| h.clone())
            .collect()
    }
}

pub fn installation_columns(table: &Table) -> YearColumns {
    let mut found = YearColumns::default();
    for header in table.headers.iter().filter(|h| h.contains(QUANTITY_MARKER)) {
        match year_token(header) {
            Some(year) => found.columns.push((header.clone(), year)),
            None => found.without_year.push(header.clone()),
        }
    }
    found
}

/// Warn about year-less quantity headers, or fail on the first in strict mode.
fn report_without_year(
    ctx: &mut StepContext<'_>,
    table: &Table,
    columns: &YearColumns,
) -> Result<(), SchemaError> {
    if let Some(first) = columns.without_year.first() {
        if ctx.config.strict {
            return Err(SchemaError::HeaderWithoutYear {
                table: table.name.clone(),
                column: first.clone(),
            });
        }
        for column in &columns.without_year {
            ctx.warn(format!(
                "{}: column '{}' has no year token, excluded",
                table.name, column
            ));
        }
    }
    Ok(())
}

/// An installation count; negative or non-numeric cells are missing.
pub fn installation_count(value: &Value) -> Option<f64> {
    to_number(value).filter(|n| *n >= 0.0)
}

fn row_total(record: &Value, columns: &[String]) -> f64 {
    sum_present(
        columns
            .iter()
            .map(|c| record.get(c).and_then(installation_count)),
    )
}

/// Total installations per year over every row of `table`.
pub fn yearly_sums(table: &Table, columns: &YearColumns) -> BTreeMap<u16, f64> {
    sum_by(table.records.iter().flat_map(move |record| {
        columns
            .columns
            .iter()
            .map(move |(header, year)| (*year, record.get(header).and_then(installation_count)))
    }))
}

// =============================================================================
// state_solar_installs
// =============================================================================

/// One state's target-year total.
///
/// `COLUMNS` are the serialized keys the schema checks. The CSV header is
/// chosen at run time: the count column is named after the target year
/// (see [`installations_column`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSolarRow {
    pub state: String,
    pub installations: f64,
}

impl OutputRecord for StateSolarRow {
    const COLUMNS: &'static [&'static str] = &["state", "installations"];
    const SCHEMA: &'static str = include_str!("../../schemas/state_solar_installs.json");
}

/// Header of the installations column for `year`.
pub fn installations_column(year: u16) -> String {
    format!("Installations_{}", year)
}

/// Target-year installations per state.
///
/// Rows whose postcode has no state in the reference table are dropped.
pub fn solar_installs_by_state(
    solar: &Table,
    postcodes: &Table,
    year: u16,
) -> Result<(Vec<StateSolarRow>, SolarJoinReport), SchemaError> {
    solar.require_columns(&[SOLAR_POSTCODE])?;
    let lookup = Lookup::build(postcodes, REF_POSTCODE, &[REF_STATE], postcode_key)?;
    let target = installation_columns(solar).for_year(year);

    let (joined, stats) = left_join(&solar.records, SOLAR_POSTCODE, &lookup, postcode_key);
    let state_column = if solar.has_column(REF_STATE) {
        format!("{}_right", REF_STATE)
    } else {
        REF_STATE.to_string()
    };

    let totals = sum_by(joined.iter().filter_map(|record| {
        let state = record.get(&state_column).and_then(text)?;
        Some((state, Some(row_total(record, &target))))
    }));

    let rows = totals
        .into_iter()
        .map(|(state, installations)| StateSolarRow {
            state,
            installations,
        })
        .collect();
    let report = SolarJoinReport {
        target_columns: target.len(),
        matched: stats.matched,
        unmatched: stats.unmatched,
        duplicate_postcodes: lookup.duplicate_keys,
    };
    Ok((rows, report))
}

/// Join diagnostics for the solar step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolarJoinReport {
    pub target_columns: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub duplicate_postcodes: usize,
}

pub fn run_state_solar_installs(ctx: &mut StepContext<'_>) -> StepResult<usize> {
    let solar = ctx.load_csv(&ctx.config.sources.solar_installations)?;
    let postcodes = ctx.load_postcodes()?;
    let year = ctx.config.target_year;

    let columns = installation_columns(&solar);
    report_without_year(ctx, &solar, &columns)?;

    let (rows, report) = solar_installs_by_state(&solar, &postcodes, year)?;
    if report.target_columns == 0 {
        ctx.warn(format!(
            "{}: no '{}' columns for {}, every state sums to zero",
            solar.name, QUANTITY_MARKER, year
        ));
    }
    if report.unmatched > 0 {
        ctx.warn(format!(
            "{}: {} of {} postcodes have no state in {}, dropped",
            solar.name,
            report.unmatched,
            report.matched + report.unmatched,
            postcodes.name
        ));
    }
    tracing::debug!(
        year,
        columns = report.target_columns,
        duplicate_postcodes = report.duplicate_postcodes,
        "solar installations joined"
    );

    validate_rows(Step::StateSolarInstalls.name(), &rows)?;
    let header = [REF_STATE.to_string(), installations_column(year)];
    write_csv_with_columns(&ctx.output_path(Step::StateSolarInstalls), &header, &rows)
}

// =============================================================================
// renewable_trends
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    #[serde(rename = "Year")]
    pub year: u16,
    #[serde(rename = "Type")]
    pub technology: Technology,
    #[serde(rename = "Installations")]
    pub installations: f64,
}

impl OutputRecord for TrendRow {
    const COLUMNS: &'static [&'static str] = &["Year", "Type", "Installations"];
    const SCHEMA: &'static str = include_str!("../../schemas/renewable_trends.json");
}

/// Merge per-technology yearly sums, keeping strictly positive totals.
///
/// Ordered by year, then by the order of `series`.
pub fn trend_rows(series: &[(Technology, BTreeMap<u16, f64>)]) -> Vec<TrendRow> {
    let years: BTreeSet<u16> = series.iter().flat_map(|(_, s)| s.keys().copied()).collect();

    let mut rows = Vec::new();
    for year in years {
        for (technology, sums) in series {
            match sums.get(&year) {
                Some(total) if *total > 0.0 => rows.push(TrendRow {
                    year,
                    technology: *technology,
                    installations: *total,
                }),
                _ => {}
            }
        }
    }
    rows
}

fn technology_sums(ctx: &mut StepContext<'_>, table: &Table) -> StepResult<BTreeMap<u16, f64>> {
    let columns = installation_columns(table);
    report_without_year(ctx, table, &columns)?;
    if columns.columns.is_empty() {
        ctx.warn(format!("{}: no yearly '{}' columns", table.name, QUANTITY_MARKER));
    }
    Ok(yearly_sums(table, &columns))
}

pub fn run_renewable_trends(ctx: &mut StepContext<'_>) -> StepResult<usize> {
    let solar = ctx.load_csv(&ctx.config.sources.solar_installations)?;
    let wind = ctx.load_sheet(&ctx.config.sources.sres_wind)?;
    let hydro = ctx.load_sheet(&ctx.config.sources.sres_hydro)?;

    let series = vec![
        (Technology::Solar, technology_sums(ctx, &solar)?),
        (Technology::Wind, technology_sums(ctx, &wind)?),
        (Technology::Hydro, technology_sums(ctx, &hydro)?),
    ];
    let rows = trend_rows(&series);

    validate_rows(Step::RenewableTrends.name(), &rows)?;
    write_csv(&ctx.output_path(Step::RenewableTrends), &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::parser::parse_csv_str;

    fn solar() -> Table {
        parse_csv_str(
            "Small Unit Installation Postcode,Jan 2023 - Installation Quantity,Jan 2024 - Installation Quantity,\
             Feb 2024 - Installation Quantity,Installation Quantity Total,Jan 2024 - SGU Rated Output In kW\n\
             2000,5,10,2,17,40.5\n\
             800,1,-3,4,2,9.0\n\
             2600,,7,n.a.,7,30\n\
             9999,2,2,2,6,8\n",
            ',',
            "solar.csv",
        )
        .unwrap()
    }

    fn postcodes() -> Table {
        parse_csv_str(
            "postcode,locality,state,lat,long\n\
             2000,SYDNEY,NSW,-33.86,151.20\n\
             2000,HAYMARKET,NSW,-33.88,151.21\n\
             0800,DARWIN,NT,-12.46,130.84\n\
             2600,CANBERRA,ACT,-35.28,149.13\n",
            ',',
            "australian_postcodes.csv",
        )
        .unwrap()
    }

    #[test]
    fn test_installation_columns() {
        let columns = installation_columns(&solar());
        let years: Vec<u16> = columns.columns.iter().map(|(_, y)| *y).collect();
        assert_eq!(years, vec![2023, 2024, 2024]);
        assert_eq!(columns.without_year, vec!["Installation Quantity Total"]);
        assert_eq!(columns.for_year(2024).len(), 2);
        assert!(columns.for_year(2011).is_empty());
    }

    #[test]
    fn test_yearly_sums_skip_negative_and_yearless() {
        let table = solar();
        let sums = yearly_sums(&table, &installation_columns(&table));
        assert_eq!(sums[&2023], 8.0);
        // 10 + 2 + 4 + 7 + 2 + 2, the -3 cell is missing
        assert_eq!(sums[&2024], 27.0);
        assert!(sums.values().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_solar_installs_by_state() {
        let (rows, report) = solar_installs_by_state(&solar(), &postcodes(), 2024).unwrap();
        let states: Vec<&str> = rows.iter().map(|r| r.state.as_str()).collect();
        assert_eq!(states, vec!["ACT", "NSW", "NT"]);
        assert_eq!(rows[0].installations, 7.0);
        assert_eq!(rows[1].installations, 12.0);
        assert_eq!(rows[2].installations, 4.0);

        // duplicate 2000 rows in the reference must not double NSW
        assert_eq!(report.matched + report.unmatched, 4);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.duplicate_postcodes, 1);
        assert_eq!(report.target_columns, 2);
        assert!(validate_rows("state_solar_installs", &rows).is_ok());
    }

    #[test]
    fn test_solar_row_columns_match_fields() {
        let row = StateSolarRow { state: "NSW".to_string(), installations: 12.0 };
        let value = serde_json::to_value(&row).unwrap();
        let keys: BTreeSet<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        let columns: BTreeSet<&str> = StateSolarRow::COLUMNS.iter().copied().collect();
        assert_eq!(keys, columns);
        assert_eq!(installations_column(2024), "Installations_2024");
    }

    #[test]
    fn test_solar_installs_requires_postcode_column() {
        let table = parse_csv_str("Postcode,Jan 2024 - Installation Quantity\n2000,1", ',', "s").unwrap();
        assert!(solar_installs_by_state(&table, &postcodes(), 2024).is_err());
    }

    #[test]
    fn test_trend_rows_order_and_filter() {
        let solar: BTreeMap<u16, f64> = [(2011, 10.0), (2012, 0.0)].into_iter().collect();
        let wind: BTreeMap<u16, f64> = [(2012, 2.0), (2011, 1.0)].into_iter().collect();
        let hydro: BTreeMap<u16, f64> = [(2011, 3.0)].into_iter().collect();

        let rows = trend_rows(&[
            (Technology::Solar, solar),
            (Technology::Wind, wind),
            (Technology::Hydro, hydro),
        ]);
        let got: Vec<(u16, Technology)> = rows.iter().map(|r| (r.year, r.technology)).collect();
        assert_eq!(
            got,
            vec![
                (2011, Technology::Solar),
                (2011, Technology::Wind),
                (2011, Technology::Hydro),
                (2012, Technology::Wind),
            ]
        );
        assert!(validate_rows("renewable_trends", &rows).is_ok());
    }

    #[test]
    fn test_strict_mode_rejects_yearless_headers() {
        let table = solar();
        let columns = installation_columns(&table);

        let lenient = Config::default();
        let mut ctx = StepContext::new(&lenient);
        assert!(report_without_year(&mut ctx, &table, &columns).is_ok());
        assert_eq!(ctx.warnings.len(), 1);

        let strict = Config {
            strict: true,
            ..Config::default()
        };
        let mut ctx = StepContext::new(&strict);
        let err = report_without_year(&mut ctx, &table, &columns).unwrap_err();
        assert!(err.to_string().contains("Installation Quantity Total"));
    }
}
