//! Text tables and file exports for solve and run results.

use anyhow::{Context, Result};
use gridstress_algo::{ConservativeDispatch, OpfSolution};
use gridstress_batch::{
    write_run_manifest, RunManifest, RunReport, ScenarioOutcome, RUN_MANIFEST_FILE,
};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tabwriter::TabWriter;

pub const SCENARIOS_CSV: &str = "scenarios.csv";
pub const CONSERVATIVE_CSV: &str = "conservative_dispatch.csv";

fn peak(series: &[f64]) -> f64 {
    series.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn mean(series: &[f64]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().sum::<f64>() / series.len() as f64
}

pub fn print_dispatch_table(solution: &OpfSolution) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "UNIT\tCARRIER\tPEAK MW\tENERGY MWh")?;
    for (unit, series) in &solution.generator_dispatch {
        let carrier = solution.generator_carrier.get(unit).map(String::as_str).unwrap_or("-");
        let energy: f64 = series
            .iter()
            .enumerate()
            .map(|(t, p)| p * solution.weighting(t))
            .sum();
        writeln!(writer, "{unit}\t{carrier}\t{:.3}\t{energy:.3}", peak(series))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn print_price_table(solution: &OpfSolution) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "BUS\tMEAN PRICE\tMAX PRICE")?;
    for (bus, prices) in &solution.nodal_prices {
        writeln!(writer, "{bus}\t{:.3}\t{:.3}", mean(prices), peak(prices))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn print_outcomes(report: &RunReport) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "SCENARIO\tOUTCOME\tCOST\tUNSERVED MWh\tDETAIL")?;
    for record in &report.records {
        let cost = record
            .objective()
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "-".to_string());
        let (unserved, detail) = match &record.outcome {
            ScenarioOutcome::Secure => ("0.000".to_string(), String::new()),
            ScenarioOutcome::LoadShed { unserved_mwh } => {
                (format!("{unserved_mwh:.3}"), String::new())
            }
            ScenarioOutcome::Infeasible { reason } => ("-".to_string(), reason.clone()),
        };
        writeln!(
            writer,
            "{}\t{}\t{cost}\t{unserved}\t{detail}",
            record.label(),
            record.outcome.label()
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn print_summary(report: &RunReport) -> Result<()> {
    let Some(summary) = &report.summary else {
        println!(
            "No feasible scenario among {}; conservative dispatch is the base case.",
            report.records.len()
        );
        return Ok(());
    };
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "STATISTIC\tVALUE")?;
    writeln!(writer, "base cost\t{:.2}", report.base_objective)?;
    writeln!(writer, "mean cost\t{:.2}", summary.mean_cost)?;
    writeln!(writer, "max cost\t{:.2}", summary.max_cost)?;
    writeln!(writer, "mean unserved MWh\t{:.3}", summary.mean_unserved)?;
    writeln!(writer, "max unserved MWh\t{:.3}", summary.max_unserved)?;
    writeln!(writer, "feasible\t{}", summary.feasible)?;
    writeln!(writer, "infeasible\t{}", summary.infeasible)?;
    writer.flush()?;
    Ok(())
}

pub fn print_conservative(dispatch: &ConservativeDispatch) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    let basis = if dispatch.is_fallback() {
        "base fallback"
    } else {
        "worst case"
    };
    writeln!(writer, "UNIT\tCONSERVATIVE PEAK MW\tBASIS")?;
    for (unit, series) in &dispatch.dispatch {
        writeln!(writer, "{unit}\t{:.3}\t{basis}", peak(series))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct ScenarioRow<'a> {
    scenario: &'a str,
    outcome: &'a str,
    objective: Option<f64>,
    unserved_mwh: Option<f64>,
    reason: Option<&'a str>,
    perturbations: String,
}

#[derive(Serialize)]
struct DispatchRow<'a> {
    unit: &'a str,
    snapshot: usize,
    mw: f64,
}

/// Write `scenarios.csv`, `conservative_dispatch.csv` and the run manifest
/// into `dir`; returns the paths written.
pub fn write_exports(
    dir: &Path,
    report: &RunReport,
    manifest: &RunManifest,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory '{}'", dir.display()))?;

    let scenarios_path = dir.join(SCENARIOS_CSV);
    let mut writer = csv::Writer::from_path(&scenarios_path)
        .with_context(|| format!("creating '{}'", scenarios_path.display()))?;
    for record in &report.records {
        let (unserved_mwh, reason) = match &record.outcome {
            ScenarioOutcome::Secure => (Some(0.0), None),
            ScenarioOutcome::LoadShed { unserved_mwh } => (Some(*unserved_mwh), None),
            ScenarioOutcome::Infeasible { reason } => (None, Some(reason.as_str())),
        };
        writer.serialize(ScenarioRow {
            scenario: record.label(),
            outcome: record.outcome.label(),
            objective: record.objective(),
            unserved_mwh,
            reason,
            perturbations: record
                .candidate
                .perturbations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        })?;
    }
    writer.flush()?;

    let dispatch_path = dir.join(CONSERVATIVE_CSV);
    let mut writer = csv::Writer::from_path(&dispatch_path)
        .with_context(|| format!("creating '{}'", dispatch_path.display()))?;
    for (unit, series) in &report.conservative.dispatch {
        for (snapshot, mw) in series.iter().enumerate() {
            writer.serialize(DispatchRow {
                unit,
                snapshot,
                mw: *mw,
            })?;
        }
    }
    writer.flush()?;

    let manifest_path = dir.join(RUN_MANIFEST_FILE);
    write_run_manifest(&manifest_path, manifest)?;
    Ok(vec![scenarios_path, dispatch_path, manifest_path])
}
