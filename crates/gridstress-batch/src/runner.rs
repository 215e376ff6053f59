//! Parallel contingency enumeration.

use chrono::{DateTime, Utc};
use gridstress_algo::{
    aggregate, summarize, ConservativeDispatch, ContingencySummary, OpfSolution, ScenarioScratch,
    SolveResult, SolverAdapter, SummaryError, UnservedSelector,
};
use gridstress_core::Network;
use gridstress_scenarios::{build_all, Candidate};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::HarnessError;
use crate::outcome::{RunStage, ScenarioOutcome, ScenarioRecord};
use crate::shedding::SheddingPolicy;

/// Label under which the unperturbed network is solved and scratched.
pub const BASE_LABEL: &str = "base";

#[derive(Debug, Clone)]
pub struct EnumeratorConfig {
    /// Worker threads; `0` uses one per CPU
    pub threads: usize,
    pub shedding: SheddingPolicy,
    /// Carriers whose output counts as unserved energy
    pub unserved: UnservedSelector,
    /// Root for per-scenario scratch networks; `None` writes nothing
    pub scratch_dir: Option<PathBuf>,
    pub run_id: String,
}

impl Default for EnumeratorConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            shedding: SheddingPolicy::Disabled,
            unserved: UnservedSelector::default(),
            scratch_dir: None,
            run_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Base solution plus one record per candidate, in candidate order.
#[derive(Debug, Clone, PartialEq)]
pub struct Enumeration {
    pub run_id: String,
    pub base: OpfSolution,
    pub records: Vec<ScenarioRecord>,
}

impl Enumeration {
    pub fn results(&self) -> impl Iterator<Item = &SolveResult> {
        self.records.iter().map(|r| &r.result)
    }

    pub fn infeasible(&self) -> usize {
        self.records.iter().filter(|r| !r.result.is_feasible()).count()
    }
}

/// Everything a finished run reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub base_objective: f64,
    pub records: Vec<ScenarioRecord>,
    pub conservative: ConservativeDispatch,
    /// `None` when no scenario was feasible
    pub summary: Option<ContingencySummary>,
}

impl RunReport {
    /// The summary statistics, or `EmptyAggregate` when nothing was feasible.
    pub fn summary(&self) -> Result<&ContingencySummary, HarnessError> {
        self.summary.as_ref().ok_or_else(|| {
            HarnessError::EmptyAggregate(SummaryError::EmptyAggregate {
                total: self.records.len(),
            })
        })
    }
}

pub struct Enumerator<'a> {
    adapter: &'a dyn SolverAdapter,
    config: EnumeratorConfig,
}

impl<'a> Enumerator<'a> {
    pub fn new(adapter: &'a dyn SolverAdapter, mut config: EnumeratorConfig) -> Self {
        if let Some(carrier) = config.shedding.carrier() {
            if !config.unserved.matches(carrier) {
                config.unserved.carriers.push(carrier.to_string());
            }
        }
        Self { adapter, config }
    }

    pub fn config(&self) -> &EnumeratorConfig {
        &self.config
    }

    /// Build and solve every candidate against `base`.
    ///
    /// All scenario networks are built before anything is solved, so an
    /// unknown entity fails the run up front. Infeasible scenarios become
    /// records; faults and timeouts abort without a partial result.
    pub fn enumerate(
        &self,
        base: &Network,
        candidates: &[Candidate],
    ) -> Result<Enumeration, HarnessError> {
        let run_id = self.config.run_id.as_str();
        let prepared = self.config.shedding.apply(base)?;
        let networks = candidates
            .iter()
            .map(|candidate| {
                build_all(&prepared, &candidate.perturbations).map_err(|source| {
                    HarnessError::Build {
                        scenario: candidate.label.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        RunStage::Built.enter(run_id);
        info!(
            run_id,
            scenarios = networks.len(),
            shedding = self.config.shedding.is_enabled(),
            "scenarios built"
        );

        let base_solution = match self.solve_one(BASE_LABEL, &prepared, self.scratch(BASE_LABEL))? {
            SolveResult::Feasible(solution) => solution,
            SolveResult::Infeasible { reason } => {
                return Err(HarnessError::BaseInfeasible { reason });
            }
        };

        let threads = if self.config.threads == 0 {
            num_cpus::get()
        } else {
            self.config.threads
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| HarnessError::ThreadPool(e.to_string()))?;

        RunStage::Solving.enter(run_id);
        let records = pool.install(|| {
            candidates
                .par_iter()
                .zip(networks.par_iter())
                .enumerate()
                .map(|(index, (candidate, network))| {
                    let scratch = self.scratch(&format!("{index:03}_{}", candidate.label));
                    let result = self.solve_one(&candidate.label, network, scratch)?;
                    let outcome = ScenarioOutcome::classify(&result, &self.config.unserved);
                    if let ScenarioOutcome::Infeasible { reason } = &outcome {
                        warn!(
                            run_id,
                            scenario = %candidate.label,
                            %reason,
                            "scenario infeasible, excluded from aggregation"
                        );
                    }
                    Ok(ScenarioRecord {
                        candidate: candidate.clone(),
                        result,
                        outcome,
                    })
                })
                .collect::<Result<Vec<_>, HarnessError>>()
        })?;

        Ok(Enumeration {
            run_id: run_id.to_string(),
            base: base_solution,
            records,
        })
    }

    /// Enumerate, then aggregate and summarize.
    ///
    /// A run with no feasible scenario still returns a report: the
    /// conservative dispatch falls back to the base and `summary` is empty.
    pub fn run(&self, base: &Network, candidates: &[Candidate]) -> Result<RunReport, HarnessError> {
        let started_at = Utc::now();
        let enumeration = self.enumerate(base, candidates).map_err(|err| {
            RunStage::Fatal.enter(&self.config.run_id);
            tracing::error!(run_id = %self.config.run_id, error = %err, "run aborted");
            err
        })?;

        let conservative = aggregate(enumeration.results(), &enumeration.base);
        let summary = match summarize(enumeration.results(), &self.config.unserved) {
            Ok(summary) => Some(summary),
            Err(err) => {
                warn!(
                    run_id = %enumeration.run_id,
                    %err,
                    "conservative dispatch falls back to the base case"
                );
                None
            }
        };
        RunStage::Aggregated.enter(&enumeration.run_id);

        Ok(RunReport {
            run_id: enumeration.run_id,
            started_at,
            finished_at: Utc::now(),
            base_objective: enumeration.base.objective,
            records: enumeration.records,
            conservative,
            summary,
        })
    }

    fn scratch(&self, scenario: &str) -> Option<ScenarioScratch> {
        self.config
            .scratch_dir
            .as_ref()
            .map(|root| ScenarioScratch::new(root, &self.config.run_id, scenario))
    }

    fn solve_one(
        &self,
        label: &str,
        network: &Network,
        scratch: Option<ScenarioScratch>,
    ) -> Result<SolveResult, HarnessError> {
        let start = Instant::now();
        let result = self
            .adapter
            .solve(network, scratch.as_ref())
            .map_err(|source| HarnessError::Solver {
                scenario: label.to_string(),
                source,
            })?;
        debug!(
            scenario = label,
            solver = self.adapter.name(),
            feasible = result.is_feasible(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scenario solved"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstress_algo::test_utils::five_bus;
    use gridstress_algo::{SolverError, SolverSettings};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Feasible for the base, faults on every later call.
    struct FaultAfterBase {
        calls: AtomicUsize,
    }

    impl SolverAdapter for FaultAfterBase {
        fn name(&self) -> &str {
            "fault-after-base"
        }

        fn solve(
            &self,
            network: &Network,
            _scratch: Option<&ScenarioScratch>,
        ) -> Result<SolveResult, SolverError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                gridstress_algo::solve_linear_opf(network, &SolverSettings::default())
            } else {
                Err(SolverError::Fault("numerical error".into()))
            }
        }
    }

    #[test]
    fn solver_fault_aborts_without_partial_result() {
        let adapter = FaultAfterBase {
            calls: AtomicUsize::new(0),
        };
        let config = EnumeratorConfig {
            threads: 1,
            ..Default::default()
        };
        let enumerator = Enumerator::new(&adapter, config);
        let err = enumerator
            .enumerate(&five_bus().unwrap(), &[Candidate::outage("Line_0_1")])
            .unwrap_err();
        assert!(matches!(err, HarnessError::Solver { ref scenario, .. } if scenario == "Line_0_1"));
    }

    #[test]
    fn shedding_carrier_joins_the_selector() {
        let adapter = gridstress_algo::ClarabelAdapter::default();
        let config = EnumeratorConfig {
            shedding: SheddingPolicy::Enabled {
                marginal_cost: 5000.0,
                carrier: "curtailed_demand".into(),
                p_nom: 500.0,
            },
            ..Default::default()
        };
        let enumerator = Enumerator::new(&adapter, config);
        assert!(enumerator.config().unserved.matches("curtailed_demand"));
        assert!(enumerator.config().unserved.matches("load_shed"));
    }

    #[test]
    fn run_ids_are_unique_by_default() {
        assert_ne!(EnumeratorConfig::default().run_id, EnumeratorConfig::default().run_id);
    }
}
