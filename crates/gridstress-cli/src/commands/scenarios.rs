use anyhow::{anyhow, Result};
use gridstress_cli::ScenariosCommands;
use gridstress_io::load_network;
use gridstress_scenarios::{
    load_spec_from_path, materialize_scenarios, network_path, resolve_scenarios, validate_against,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tabwriter::TabWriter;
use tracing::info;

pub fn handle(command: &ScenariosCommands) -> Result<()> {
    match command {
        ScenariosCommands::Validate { spec, network } => validate(spec, network.as_deref()),
        ScenariosCommands::Materialize {
            spec,
            network,
            out_dir,
        } => materialize(spec, network.as_deref(), out_dir),
    }
}

fn validate(spec: &Path, network: Option<&Path>) -> Result<()> {
    let set = load_spec_from_path(spec)?;
    let scenarios = match network.map(Path::to_path_buf).or_else(|| network_path(&set, spec)) {
        Some(path) => {
            let network = load_network(&path)?;
            validate_against(&set, &network)?
        }
        None => resolve_scenarios(&set)?,
    };
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "SCENARIO\tPERTURBATIONS\tDESCRIPTION")?;
    for scenario in &scenarios {
        let perturbations = scenario
            .perturbations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            writer,
            "{}\t{perturbations}\t{}",
            scenario.id,
            scenario.description.as_deref().unwrap_or("")
        )?;
    }
    writer.flush()?;
    println!("Scenario spec validated successfully ({} scenarios)", scenarios.len());
    Ok(())
}

fn materialize(spec: &Path, network: Option<&Path>, out_dir: &Path) -> Result<()> {
    let set = load_spec_from_path(spec)?;
    let network_file: PathBuf = network
        .map(Path::to_path_buf)
        .or_else(|| network_path(&set, spec))
        .ok_or_else(|| anyhow!("materialize needs --network or a network in the scenario file"))?;
    let base = load_network(&network_file)?;
    let scenarios = resolve_scenarios(&set)?;
    let artifacts = materialize_scenarios(&base, out_dir, &scenarios)?;
    info!(count = artifacts.len(), out_dir = %out_dir.display(), "materialized scenarios");
    println!(
        "Materialized {} scenarios into {}",
        artifacts.len(),
        out_dir.display()
    );
    Ok(())
}
