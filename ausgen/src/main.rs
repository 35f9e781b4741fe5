//! ausgen CLI - Build the Australian renewable energy tables
//!
//! # Main Commands
//!
//! ```bash
//! ausgen run --input-dir data --output-dir out    # Build every table
//! ausgen run --only state_gwh --only population   # Build selected tables
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! ausgen inspect stations.xlsx --sheet Approved --skip-rows 3
//! ausgen sheets stations.xlsx      # List workbook sheets
//! ausgen steps                     # List steps and their outputs
//! ausgen default-config            # Print the default JSON config
//! ```

use ausgen::logs::{self, log_info};
use ausgen::{load_sheet, parse_csv_file_auto, sheet_names, Config, Step, Table};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ausgen")]
#[command(about = "Build normalized CSV tables from Australian energy releases", long_about = None)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the output steps
    Run {
        /// Directory holding the source files
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Directory the tables are written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// JSON config file (default: $AUSGEN_CONFIG)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run only this step (repeatable)
        #[arg(long = "only", value_name = "STEP")]
        only: Vec<String>,

        /// Fail on installation columns without a year
        #[arg(long)]
        strict: bool,

        /// Target year for state_solar_installs
        #[arg(long, value_name = "YYYY")]
        year: Option<u16>,
    },

    /// Load one source like a step would and print it as JSON
    Inspect {
        /// CSV or workbook file
        file: PathBuf,

        /// Sheet name (workbooks only, default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Rows above the header row
        #[arg(long, default_value = "0")]
        skip_rows: usize,

        /// Number of records to print
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// List the sheets of a workbook
    Sheets {
        /// Workbook file
        file: PathBuf,
    },

    /// List the steps and their output files
    Steps,

    /// Print the default configuration as JSON
    DefaultConfig,
}

fn main() {
    let cli = Cli::parse();
    logs::init(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            input_dir,
            output_dir,
            config,
            only,
            strict,
            year,
        } => cmd_run(input_dir, output_dir, config.as_deref(), &only, strict, year),

        Commands::Inspect {
            file,
            sheet,
            skip_rows,
            limit,
        } => cmd_inspect(&file, sheet.as_deref(), skip_rows, limit),

        Commands::Sheets { file } => cmd_sheets(&file),

        Commands::Steps => cmd_steps(),

        Commands::DefaultConfig => cmd_default_config(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    config_path: Option<&Path>,
    only: &[String],
    strict: bool,
    year: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load(config_path)?;
    if let Some(dir) = input_dir {
        config.input_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if strict {
        config.strict = true;
    }
    if let Some(year) = year {
        config.target_year = year;
    }

    let steps = only
        .iter()
        .map(|name| Step::parse(name))
        .collect::<Result<Vec<_>, _>>()?;

    let manifest = ausgen::run(&config, &steps)?;
    for report in manifest.steps.iter().filter(|r| !r.warnings.is_empty()) {
        eprintln!("⚠️  {}: {} warning(s)", report.step, report.warnings.len());
    }
    Ok(())
}

fn is_workbook(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods")
    )
}

fn cmd_inspect(
    file: &Path,
    sheet: Option<&str>,
    skip_rows: usize,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Inspecting: {}", file.display());

    let table: Table = if is_workbook(file) || sheet.is_some() {
        let sheet = match sheet {
            Some(s) => s.to_string(),
            None => sheet_names(file)?
                .into_iter()
                .next()
                .ok_or_else(|| format!("'{}' has no sheets", file.display()))?,
        };
        eprintln!("   Sheet: {} (skip {})", sheet, skip_rows);
        load_sheet(file, &sheet, skip_rows)?
    } else {
        let parsed = parse_csv_file_auto(file)?;
        eprintln!("   Encoding: {}", parsed.encoding);
        eprintln!("   Delimiter: '{}'", format_delimiter(parsed.delimiter));
        parsed.table
    };

    eprintln!("   Columns: {}", table.headers.join(", "));
    eprintln!("✅ Loaded {} records", table.len());

    let preview: Vec<&serde_json::Value> = table.records.iter().take(limit).collect();
    println!("{}", serde_json::to_string_pretty(&preview)?);
    Ok(())
}

fn cmd_sheets(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    for name in sheet_names(file)? {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_steps() -> Result<(), Box<dyn std::error::Error>> {
    println!("📋 Steps:\n");
    for step in Step::ALL {
        println!("  {:<22} {:<26} {}", step.name(), step.output_file(), step.description());
    }
    Ok(())
}

fn cmd_default_config() -> Result<(), Box<dyn std::error::Error>> {
    log_info("Default configuration (save as JSON and pass with --config)");
    println!("{}", Config::default().to_json()?);
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
