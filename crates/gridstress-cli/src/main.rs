use anyhow::Result;
use clap::Parser;
use gridstress_cli::{Cli, Commands, HarnessConfig};
use std::io;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::{inspect, nminus1, opf, scenarios, stress, ts};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {err}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = HarnessConfig::load(cli.config.as_deref())?;
    debug!(?config, "resolved configuration");
    match &cli.command {
        Commands::Opf {
            network,
            out_json,
            solver,
            time_limit,
        } => opf::handle(
            &config,
            network,
            out_json.as_deref(),
            solver.as_deref(),
            *time_limit,
        ),
        Commands::Nminus1 {
            network,
            branches,
            include_links,
            run,
        } => nminus1::handle(&config, network, branches, *include_links, run),
        Commands::Stress {
            network,
            scenarios,
            run,
        } => stress::handle(&config, network.as_deref(), scenarios, run),
        Commands::Scenarios { command } => scenarios::handle(command),
        Commands::Ts { command } => ts::handle(command),
        Commands::Inspect { network } => inspect::handle(network),
    }
}
