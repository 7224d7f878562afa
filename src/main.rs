use chargesheet::cli;
use chargesheet::config::ExportConfig;
use chargesheet::diagnostics::{ConsoleSink, DiagnosticSink};
use chargesheet::error::ExportResult;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "chargesheet")]
#[command(about = "Collect transient simulation CSVs into a live charge-integral workbook")]
#[command(long_about = "Charge Sheet - transient simulation CSVs to Excel

Each CSV becomes its own sheet with difference, integral and sum formulas.
An aggregate sheet cross-references every sum, one table per device, plus a
normalized table dividing one device by a baseline device. Charts are built
from the aggregate tables.

COMMANDS:
  ls      - List experiments in the data directory
  export  - Build the workbook for one experiment

EXAMPLES:
  chargesheet ls
  chargesheet export run1 -o run1.xlsx
  chargesheet export ./data/run1 --baseline Diode --numerator PC")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List experiments (directories holding CSV files)
    Ls {
        /// Directory to list [default: data_dir from the config]
        dir: Option<PathBuf>,

        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    #[command(long_about = "Build the charge workbook for one experiment.

EXPERIMENT is a directory, or a name looked up under the configured data_dir.
Every *.csv below it is read; file names must carry a device name and the
voltage, lifetime and density tokens, e.g.

  PC_voltage5_lifetime0.001_ehpdensity0.0001_time.csv

Files with unrecognized names are skipped with a warning. A missing baseline
or numerator device aborts the export without writing a workbook.")]
    /// Build the charge workbook for one experiment
    Export {
        /// Experiment directory or name
        experiment: String,

        /// Output workbook path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Baseline device the normalized table divides by
        #[arg(long)]
        baseline: Option<String>,

        /// Device divided by the baseline
        #[arg(long)]
        numerator: Option<String>,

        /// Trailing table rows left out of lifetime charts
        #[arg(long)]
        exclude_trailing_rows: Option<u32>,

        /// List every file and log layout decisions
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "chargesheet=debug,chargesheet::diagnostics=off"
    } else {
        "chargesheet=warn,chargesheet::diagnostics=off"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .init();
}

/// Commands report their own errors; config errors are reported here
fn load_config(path: Option<PathBuf>) -> ExportResult<ExportConfig> {
    ExportConfig::load(path.as_deref()).inspect_err(|e| {
        ConsoleSink::new(false).error(&format!("{}", e));
    })
}

fn run(cli: Cli) -> ExportResult<()> {
    match cli.command {
        Commands::Ls { dir, config } => {
            init_tracing(false);
            let config = load_config(config)?;
            cli::ls(dir.unwrap_or(config.data_dir))?;
        }

        Commands::Export {
            experiment,
            output,
            config,
            baseline,
            numerator,
            exclude_trailing_rows,
            verbose,
        } => {
            init_tracing(verbose);
            let mut config = load_config(config)?;
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(baseline) = baseline {
                config.baseline_device = baseline;
            }
            if let Some(numerator) = numerator {
                config.numerator_device = numerator;
            }
            if let Some(rows) = exclude_trailing_rows {
                config.charts.excluded_trailing_rows = rows;
            }
            cli::export(experiment, config, verbose)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}
