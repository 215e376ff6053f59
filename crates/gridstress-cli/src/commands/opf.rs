use anyhow::{bail, Context, Result};
use gridstress_algo::SolveResult;
use gridstress_cli::HarnessConfig;
use gridstress_io::load_network;
use std::fs;
use std::path::Path;
use tracing::info;

use super::report;

pub fn handle(
    config: &HarnessConfig,
    network_path: &Path,
    out_json: Option<&Path>,
    solver: Option<&str>,
    time_limit: Option<f64>,
) -> Result<()> {
    let mut config = config.clone();
    config.override_solver(solver, time_limit);
    config.validate()?;
    let kind = config.solver_kind()?;

    let network = load_network(network_path)?;
    info!(
        network = %network_path.display(),
        snapshots = network.horizon(),
        solver = %kind,
        "solving base network"
    );
    let result = kind
        .adapter(config.solver_settings())
        .solve(&network, None)
        .with_context(|| format!("solving '{}'", network_path.display()))?;
    let solution = match result {
        SolveResult::Feasible(solution) => solution,
        SolveResult::Infeasible { reason } => {
            bail!("network '{}' is infeasible: {reason}", network_path.display())
        }
    };

    println!("Objective: {:.2}", solution.objective);
    println!();
    report::print_dispatch_table(&solution)?;
    println!();
    report::print_price_table(&solution)?;

    if let Some(out) = out_json {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating '{}'", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&solution).context("serializing solution")?;
        fs::write(out, json).with_context(|| format!("writing '{}'", out.display()))?;
        println!("Solution written to {}", out.display());
    }
    Ok(())
}
