//! Run the output steps and write the run manifest.
//!
//! Steps are independent: a failing step is recorded in the manifest and the
//! run carries on with the next one. The run as a whole fails if any step
//! failed.
//!
//! # Example
//!
//! ```rust,ignore
//! use ausgen::{config::Config, steps::Step, transform::pipeline};
//!
//! let config = Config::load(None)?;
//! let manifest = pipeline::run(&config, &Step::ALL)?;
//! println!("{} steps written", manifest.steps.len());
//! ```

use std::fs;
use std::time::Instant;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_error, log_info, log_success};
use crate::output::{Manifest, StepReport, StepStatus};
use crate::steps::{run_step, Step, StepContext};

/// Run `steps` (all of them when empty) and return the manifest.
///
/// The manifest is written to the output directory even when steps fail;
/// failures then surface as [`PipelineError::StepsFailed`].
pub fn run(config: &Config, steps: &[Step]) -> PipelineResult<Manifest> {
    let manifest = execute(config, steps)?;
    let failed = manifest.failed();
    if failed > 0 {
        return Err(PipelineError::StepsFailed {
            failed,
            total: manifest.steps.len(),
        });
    }
    Ok(manifest)
}

/// Like [`run`], but returns the manifest whatever the step outcomes.
pub fn execute(config: &Config, steps: &[Step]) -> PipelineResult<Manifest> {
    fs::create_dir_all(&config.output_dir).map_err(|source| PipelineError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    let selected: Vec<Step> = if steps.is_empty() {
        Step::ALL.to_vec()
    } else {
        Step::ALL.into_iter().filter(|s| steps.contains(s)).collect()
    };

    log_info(format!(
        "📂 Input: {} ➜ Output: {}",
        config.input_dir.display(),
        config.output_dir.display()
    ));

    let mut reports = Vec::with_capacity(Step::ALL.len());
    for step in Step::ALL {
        if !selected.contains(&step) {
            reports.push(StepReport {
                step: step.name().to_string(),
                output: config.output_path(&step.output_file()),
                status: StepStatus::Skipped,
                rows: None,
                error: None,
                warnings: Vec::new(),
            });
            continue;
        }
        reports.push(execute_step(config, step));
    }

    let manifest = Manifest::new(&config.input_dir, &config.output_dir, reports);
    let path = manifest
        .write(&config.output_dir)
        .map_err(|e| PipelineError::Manifest(e.to_string()))?;

    let failed = manifest.failed();
    if failed == 0 {
        log_success(format!("✨ {} step(s) done, manifest: {}", selected.len(), path.display()));
    } else {
        log_error(format!(
            "{} of {} step(s) failed, manifest: {}",
            failed,
            selected.len(),
            path.display()
        ));
    }
    Ok(manifest)
}

fn execute_step(config: &Config, step: Step) -> StepReport {
    let span = tracing::info_span!("step", name = step.name());
    let _guard = span.enter();

    let started = Instant::now();
    let mut ctx = StepContext::new(config);
    let output = ctx.output_path(step);
    let result = run_step(step, &mut ctx);
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(rows) => {
            log_success(format!("✅ {} ({} rows, {} ms)", step.output_file(), rows, elapsed_ms));
            StepReport {
                step: step.name().to_string(),
                output,
                status: StepStatus::Ok,
                rows: Some(rows),
                error: None,
                warnings: ctx.warnings,
            }
        }
        Err(e) => {
            log_error(format!("❌ {}: {}", step.name(), e));
            StepReport {
                step: step.name().to_string(),
                output,
                status: StepStatus::Failed,
                rows: None,
                error: Some(e.to_string()),
                warnings: ctx.warnings,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetSource;
    use crate::parser::parse_csv_file_auto;
    use rust_xlsxwriter::Workbook;
    use std::path::Path;
    use tempfile::tempdir;

    enum Cell {
        S(&'static str),
        N(f64),
    }
    use Cell::{N, S};

    /// Write one sheet per (name, rows) into an xlsx file. `None` cells stay empty.
    fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<Option<Cell>>>)]) {
        let mut workbook = Workbook::new();
        for (name, rows) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(*name).unwrap();
            for (r, row) in rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    match cell {
                        Some(S(s)) => {
                            worksheet.write_string(r as u32, c as u16, *s).unwrap();
                        }
                        Some(N(n)) => {
                            worksheet.write_number(r as u32, c as u16, *n).unwrap();
                        }
                        None => {}
                    }
                }
            }
        }
        workbook.save(path).unwrap();
    }

    fn s(v: &'static str) -> Option<Cell> {
        Some(S(v))
    }

    fn n(v: f64) -> Option<Cell> {
        Some(N(v))
    }

    /// Three preamble rows, then the header, as in the registry releases.
    fn preamble(width: usize) -> Vec<Vec<Option<Cell>>> {
        let mut rows = vec![vec![s("Published by the Clean Energy Regulator")]];
        rows.push((0..width).map(|_| None).collect());
        rows.push(vec![s("Data current as at 1 July 2025")]);
        rows
    }

    fn write_fixtures(dir: &Path) {
        write_workbook(
            &dir.join("aes.xlsx"),
            &[(
                "State summary 2023-24",
                vec![
                    vec![s("Table O: Australian electricity generation, by state and fuel type")],
                    vec![None, None, s("NSW"), s("Vic"), s("Tas"), s("Aust")],
                    vec![None, s("GWh")],
                    vec![None, s("Wind"), n(5000.0), n(8000.0), n(1200.0), n(14200.0)],
                    vec![None, s("Hydro"), n(4000.0), n(900.0), n(9000.0), n(13900.0)],
                    vec![None, s("Large-scale solar PV"), n(6000.0), n(2000.0), s("-"), n(8000.0)],
                    vec![None, s("Small-scale solar PV"), n(4000.0), n(3000.0), n(300.0), n(7300.0)],
                    vec![None, s("Bagasse, wood"), n(100.0), None, None, n(100.0)],
                    vec![None, s("Biogas"), n(50.0), n(40.0), n(10.0), n(100.0)],
                    vec![None, s("Total"), n(70000.0), n(45000.0), n(11000.0), n(126000.0)],
                ],
            )],
        );

        write_workbook(
            &dir.join("wind.xlsx"),
            &[(
                "Data",
                vec![
                    vec![
                        s("Country/Area"),
                        s("Project Name"),
                        s("State/Province"),
                        s("Capacity (MW)"),
                        s("Status"),
                        s("Latitude"),
                        s("Longitude"),
                    ],
                    vec![s("Australia"), s("Macarthur"), s("Victoria"), n(420.0), s("operating"), n(-38.03), n(142.19)],
                    vec![s("New Zealand"), s("Turitea"), s("Manawatu"), n(222.0), s("operating"), n(-40.43), n(175.67)],
                    vec![s("Australia"), s("Coopers Gap"), s("Queensland"), n(453.0), s("operating"), n(-26.71), n(151.44)],
                ],
            )],
        );

        let mut sgu_wind = preamble(3);
        sgu_wind.push(vec![
            s("Small Unit Installation Postcode"),
            s("Jan 2023 - Installation Quantity"),
            s("Jan 2024 - Installation Quantity"),
        ]);
        sgu_wind.push(vec![n(2000.0), n(1.0), n(2.0)]);
        sgu_wind.push(vec![n(7000.0), None, n(-1.0)]);
        let mut sgu_hydro = preamble(3);
        sgu_hydro.push(vec![
            s("Small Unit Installation Postcode"),
            s("Jan 2023 - Installation Quantity"),
            s("Installation Quantity Total"),
        ]);
        sgu_hydro.push(vec![n(7000.0), n(3.0), n(3.0)]);
        write_workbook(&dir.join("sres.xlsx"), &[("SGU-Wind", sgu_wind), ("SGU-Hydro", sgu_hydro)]);

        let mut approved = preamble(4);
        approved.push(vec![
            s("Power station name"),
            s("State"),
            s("Installed capacity (MW)"),
            s("Fuel Source (s)"),
        ]);
        approved.push(vec![s("Alpha"), s("QLD"), n(120.0), s("Solar")]);
        approved.push(vec![s("Beta"), s("QLD"), n(50.5), s("Wind")]);
        approved.push(vec![s("Gamma"), s("VIC"), n(10.0), s("Wind")]);
        write_workbook(&dir.join("approved.xlsx"), &[("Approved", approved)]);

        let mut accredited = preamble(5);
        accredited.push(vec![
            s("Power station name"),
            s("State"),
            s("Postcode"),
            s("Installed capacity"),
            s("Fuel source(s)"),
        ]);
        accredited.push(vec![s("Sunny"), s("NSW"), n(2000.0), n(5.0), s("Solar")]);
        accredited.push(vec![s("Sunny II"), s("NSW"), n(2000.0), n(2.5), s("Solar")]);
        accredited.push(vec![s("Top End"), s("NT"), n(800.0), n(1.2), s("Solar")]);
        accredited.push(vec![s("Gusty"), s("SA"), n(5000.0), n(40.0), s("Wind")]);
        write_workbook(&dir.join("accredited.xlsx"), &[("Accredited power stations", accredited)]);

        fs::write(
            dir.join("solar.csv"),
            "Small Unit Installation Postcode,Jan 2023 - Installation Quantity,Jan 2024 - Installation Quantity,Feb 2024 - Installation Quantity\n\
             2000,5,10,2\n\
             0800,1,3,4\n\
             7000,2,1,\n\
             9999,1,1,1\n",
        )
        .unwrap();
        fs::write(
            dir.join("postcodes.csv"),
            "postcode,locality,state,long,lat\n\
             2000,SYDNEY,NSW,151.20,-33.86\n\
             2000,HAYMARKET,NSW,151.21,-33.88\n\
             800,DARWIN,NT,130.84,-12.46\n\
             7000,HOBART,TAS,147.32,-42.88\n",
        )
        .unwrap();
    }

    fn fixture_config(input: &Path, output: &Path) -> Config {
        let mut config = Config {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            ..Config::default()
        };
        let sources = &mut config.sources;
        sources.energy_statistics.file = "aes.xlsx".into();
        sources.wind_tracker.file = "wind.xlsx".into();
        sources.solar_installations = "solar.csv".into();
        sources.postcodes = "postcodes.csv".into();
        sources.sres_wind = SheetSource {
            file: "sres.xlsx".into(),
            sheet: "SGU-Wind".into(),
            skip_rows: 3,
        };
        sources.sres_hydro = SheetSource {
            file: "sres.xlsx".into(),
            sheet: "SGU-Hydro".into(),
            skip_rows: 3,
        };
        sources.approved_stations.file = "approved.xlsx".into();
        sources.accredited_stations.file = "accredited.xlsx".into();
        config
    }

    fn read_output(dir: &Path, file: &str) -> (Vec<String>, Vec<serde_json::Value>) {
        let parsed = parse_csv_file_auto(dir.join(file)).unwrap();
        (parsed.table.headers, parsed.table.records)
    }

    #[test]
    fn test_full_run() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_fixtures(input.path());
        let config = fixture_config(input.path(), &output.path().join("out"));

        let manifest = run(&config, &[]).unwrap();
        assert_eq!(manifest.steps.len(), 8);
        assert!(manifest.steps.iter().all(|s| s.status == StepStatus::Ok));
        let out = config.output_dir.as_path();
        assert!(out.join(Manifest::FILE_NAME).exists());

        let (headers, rows) = read_output(out, "population.csv");
        assert_eq!(headers, vec!["State or territory", "Population", "State"]);
        assert_eq!(rows.len(), 8);

        let (headers, rows) = read_output(out, "state_gwh.csv");
        assert_eq!(headers.len(), 8);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["State or territory"], "Australia");
        assert_eq!(rows[1]["State or territory"], "New South Wales");
        assert_eq!(rows[1]["Solar PV"], "10000.0");
        assert_eq!(rows[1]["Renewable Share %"], "27.4");
        // Tasmania: large-scale solar "-" is missing
        assert_eq!(rows[2]["Solar PV"], "300.0");

        let (headers, rows) = read_output(out, "state_renewables.csv");
        assert_eq!(headers.last().map(String::as_str), Some("Per Capita Renewables GWh"));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["Population"], serde_json::Value::Null);
        assert_eq!(rows[1]["State"], "NSW");
        assert_eq!(rows[1]["Per Capita Renewables GWh"], "2257.08");

        let (headers, rows) = read_output(out, "au_wind_farms.csv");
        assert_eq!(headers[1], "State");
        assert_eq!(rows.len(), 2);

        let (headers, rows) = read_output(out, "state_solar_installs.csv");
        assert_eq!(headers, vec!["state", "Installations_2024"]);
        let states: Vec<&str> = rows.iter().filter_map(|r| r["state"].as_str()).collect();
        assert_eq!(states, vec!["NSW", "NT", "TAS"]);
        assert_eq!(rows[0]["Installations_2024"], "12.0");

        let (_, rows) = read_output(out, "renewable_trends.csv");
        let trend: Vec<(String, String, String)> = rows
            .iter()
            .map(|r| {
                (
                    r["Year"].as_str().unwrap().to_string(),
                    r["Type"].as_str().unwrap().to_string(),
                    r["Installations"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(
            trend,
            vec![
                ("2023".to_string(), "Solar".to_string(), "9.0".to_string()),
                ("2023".to_string(), "Wind".to_string(), "1.0".to_string()),
                ("2023".to_string(), "Hydro".to_string(), "3.0".to_string()),
                ("2024".to_string(), "Solar".to_string(), "22.0".to_string()),
                ("2024".to_string(), "Wind".to_string(), "2.0".to_string()),
            ]
        );

        let (_, rows) = read_output(out, "state_power_stations.csv");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["State"], "QLD");
        assert_eq!(rows[0]["Installed capacity (MW)"], "170.5");

        let (headers, rows) = read_output(out, "other_renewables.csv");
        assert_eq!(headers, vec!["Postcode", "Type", "Latitude", "Longitude", "Capacity_MW", "State"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Postcode"], "0800");
        assert_eq!(rows[1]["Capacity_MW"], "7.5");

        // SGU-Hydro carries a year-less quantity column
        let trends = manifest.steps.iter().find(|s| s.step == "renewable_trends").unwrap();
        assert_eq!(trends.warnings.len(), 1);
    }

    #[test]
    fn test_failed_step_does_not_stop_run() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_fixtures(input.path());
        let mut config = fixture_config(input.path(), output.path());
        config.sources.approved_stations.sheet = "Committed".into();

        let err = run(&config, &[]).unwrap_err();
        assert!(matches!(err, PipelineError::StepsFailed { failed: 1, total: 8 }));

        let manifest: Manifest = serde_json::from_str(
            &fs::read_to_string(output.path().join(Manifest::FILE_NAME)).unwrap(),
        )
        .unwrap();
        let failed = manifest.steps.iter().find(|s| s.status == StepStatus::Failed).unwrap();
        assert_eq!(failed.step, "state_power_stations");
        assert!(failed.error.as_deref().unwrap().contains("Committed"));
        assert!(output.path().join("other_renewables.csv").exists());
    }

    #[test]
    fn test_only_selected_steps() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let config = fixture_config(input.path(), output.path());

        let manifest = run(&config, &[Step::Population]).unwrap();
        let ran: Vec<&str> = manifest
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Ok)
            .map(|s| s.step.as_str())
            .collect();
        assert_eq!(ran, vec!["population"]);
        assert!(output.path().join("population.csv").exists());
        assert!(!output.path().join("state_gwh.csv").exists());
    }

    #[test]
    fn test_strict_mode_fails_trends() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_fixtures(input.path());
        let mut config = fixture_config(input.path(), output.path());
        config.strict = true;

        let manifest = execute(&config, &[Step::RenewableTrends]).unwrap();
        let trends = manifest.steps.iter().find(|s| s.step == "renewable_trends").unwrap();
        assert_eq!(trends.status, StepStatus::Failed);
        assert!(trends.error.as_deref().unwrap().contains("Installation Quantity Total"));
    }
}
