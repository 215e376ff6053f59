use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gridstress",
    author,
    version,
    about = "Contingency and stress testing for linear optimal power flow",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Harness config file (TOML); defaults to ./gridstress.toml when present
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve the base network and print dispatch and nodal prices
    Opf {
        #[arg(value_hint = ValueHint::FilePath)]
        network: PathBuf,
        /// Write the full solution as JSON
        #[arg(long)]
        out_json: Option<PathBuf>,
        /// LP solver backend (clarabel)
        #[arg(long)]
        solver: Option<String>,
        /// Solver time limit in seconds
        #[arg(long)]
        time_limit: Option<f64>,
    },
    /// Single-branch outage study (N-1)
    Nminus1 {
        #[arg(value_hint = ValueHint::FilePath)]
        network: PathBuf,
        /// Comma-separated branches to trip, in order; default is every active line
        #[arg(long, value_delimiter = ',')]
        branches: Vec<String>,
        /// Also trip links when enumerating automatically
        #[arg(long)]
        include_links: bool,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Run the named scenarios of a scenario file
    Stress {
        /// Network file; defaults to the one named by the scenario file
        #[arg(value_hint = ValueHint::FilePath)]
        network: Option<PathBuf>,
        #[arg(long, value_hint = ValueHint::FilePath)]
        scenarios: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Scenario file utilities
    Scenarios {
        #[command(subcommand)]
        command: ScenariosCommands,
    },
    /// Time-series utilities
    Ts {
        #[command(subcommand)]
        command: TsCommands,
    },
    /// Network statistics and diagnostics
    Inspect {
        #[arg(value_hint = ValueHint::FilePath)]
        network: PathBuf,
    },
}

/// Options shared by the enumeration commands. Each one overrides the
/// corresponding config key.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Price unserved demand instead of reporting stranded load as infeasible
    #[arg(long)]
    pub shedding: bool,
    /// Worker threads (0 = one per CPU)
    #[arg(long)]
    pub threads: Option<usize>,
    /// Per-scenario solver time limit in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,
    #[arg(long)]
    pub solver: Option<String>,
    /// Directory for CSV exports and the run manifest
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    /// Keep the serialized network of every scenario under this directory
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ScenariosCommands {
    /// Check ids, and with a network, every perturbation target
    Validate {
        #[arg(value_hint = ValueHint::FilePath)]
        spec: PathBuf,
        #[arg(long)]
        network: Option<PathBuf>,
    },
    /// Write one network file per scenario plus a manifest
    Materialize {
        #[arg(value_hint = ValueHint::FilePath)]
        spec: PathBuf,
        #[arg(long)]
        network: Option<PathBuf>,
        #[arg(long)]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum TsCommands {
    /// Keep the rows of whole days from START to END inclusive
    Slice {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = gridstress_ts::DEFAULT_TIMESTAMP_COLUMN)]
        timestamp_column: String,
    },
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
