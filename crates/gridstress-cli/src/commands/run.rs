use anyhow::{Context, Result};
use gridstress_batch::{Enumerator, RunManifest, RunStage};
use gridstress_core::Network;
use gridstress_scenarios::Candidate;
use std::path::Path;
use std::time::Instant;
use tracing::info;

use super::report;
use gridstress_cli::HarnessConfig;

/// Enumerate `candidates`, print the tables and write the exports.
///
/// Fails after printing when no scenario was feasible.
pub fn run_candidates(
    config: &HarnessConfig,
    network_path: &Path,
    network: &Network,
    candidates: &[Candidate],
) -> Result<()> {
    let start = Instant::now();
    let kind = config.solver_kind()?;
    let adapter = kind.adapter(config.solver_settings());
    let enumerator = Enumerator::new(adapter.as_ref(), config.enumerator_config());
    info!(
        run_id = %enumerator.config().run_id,
        scenarios = candidates.len(),
        solver = %kind,
        network = %network_path.display(),
        "starting contingency run"
    );
    let report = enumerator
        .run(network, candidates)
        .with_context(|| format!("contingency run on '{}'", network_path.display()))?;

    report::print_outcomes(&report)?;
    println!();
    report::print_summary(&report)?;
    println!();
    report::print_conservative(&report.conservative)?;

    if let Some(dir) = &config.output_dir {
        let manifest = RunManifest::from_report(
            &report,
            Some(network_path.display().to_string()),
            kind.as_str(),
            &config.shedding_policy(),
        );
        let written = report::write_exports(dir, &report, &manifest)?;
        for path in written {
            println!("Wrote {}", path.display());
        }
    }
    RunStage::Reported.enter(&report.run_id);
    info!(run_id = %report.run_id, elapsed_ms = start.elapsed().as_millis() as u64, "run complete");

    report.summary()?;
    Ok(())
}
