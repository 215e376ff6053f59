use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gridstress_algo::{AggregateBasis, ContingencySummary};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::outcome::ScenarioOutcome;
use crate::runner::RunReport;
use crate::shedding::SheddingPolicy;

pub const RUN_MANIFEST_FILE: &str = "run_manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEntry {
    pub label: String,
    pub perturbations: Vec<String>,
    #[serde(flatten)]
    pub outcome: ScenarioOutcome,
    pub objective: Option<f64>,
}

/// What a run did, for downstream tools; written next to the CSV exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub network: Option<String>,
    pub solver: String,
    pub shedding: SheddingPolicy,
    pub base_objective: f64,
    pub num_scenarios: usize,
    pub feasible: usize,
    pub infeasible: usize,
    pub aggregate_basis: AggregateBasis,
    pub summary: Option<ContingencySummary>,
    pub scenarios: Vec<ScenarioEntry>,
}

impl RunManifest {
    pub fn from_report(
        report: &RunReport,
        network: Option<String>,
        solver: &str,
        shedding: &SheddingPolicy,
    ) -> Self {
        let scenarios: Vec<ScenarioEntry> = report
            .records
            .iter()
            .map(|record| ScenarioEntry {
                label: record.label().to_string(),
                perturbations: record
                    .candidate
                    .perturbations
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                outcome: record.outcome.clone(),
                objective: record.objective(),
            })
            .collect();
        let infeasible = scenarios
            .iter()
            .filter(|s| matches!(s.outcome, ScenarioOutcome::Infeasible { .. }))
            .count();
        Self {
            run_id: report.run_id.clone(),
            started_at: report.started_at,
            finished_at: report.finished_at,
            network,
            solver: solver.to_string(),
            shedding: shedding.clone(),
            base_objective: report.base_objective,
            num_scenarios: scenarios.len(),
            feasible: scenarios.len() - infeasible,
            infeasible,
            aggregate_basis: report.conservative.basis,
            summary: report.summary.clone(),
            scenarios,
        }
    }
}

pub fn write_run_manifest(path: &Path, manifest: &RunManifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating manifest directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(manifest).context("serializing run manifest to JSON")?;
    fs::write(path, json).with_context(|| format!("writing run manifest '{}'", path.display()))?;
    Ok(())
}

pub fn load_run_manifest(path: &Path) -> Result<RunManifest> {
    let file = fs::File::open(path)
        .with_context(|| format!("opening run manifest '{}'", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("parsing run manifest '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ScenarioRecord;
    use gridstress_algo::{ConservativeDispatch, SolveResult};
    use gridstress_scenarios::Candidate;
    use tempfile::tempdir;

    fn report() -> RunReport {
        let now = Utc::now();
        RunReport {
            run_id: "run-1".into(),
            started_at: now,
            finished_at: now,
            base_objective: 4600.0,
            records: vec![ScenarioRecord {
                candidate: Candidate::outage("Line_1_4"),
                result: SolveResult::Infeasible {
                    reason: "island [Bus 4]".into(),
                },
                outcome: ScenarioOutcome::Infeasible {
                    reason: "island [Bus 4]".into(),
                },
            }],
            conservative: ConservativeDispatch {
                basis: AggregateBasis::BaseFallback,
                dispatch: Default::default(),
            },
            summary: None,
        }
    }

    #[test]
    fn manifest_writes_and_reads_back() {
        let manifest = RunManifest::from_report(
            &report(),
            Some("five_bus.yaml".into()),
            "clarabel",
            &SheddingPolicy::Disabled,
        );
        assert_eq!((manifest.feasible, manifest.infeasible), (0, 1));
        assert_eq!(manifest.scenarios[0].perturbations, vec!["branch_outage(Line_1_4)"]);

        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join(RUN_MANIFEST_FILE);
        write_run_manifest(&path, &manifest).unwrap();
        let parsed = load_run_manifest(&path).unwrap();
        assert_eq!(parsed, manifest);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"outcome\": \"infeasible\""));
    }
}
