//! The solver contract used by the contingency harness.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::anyhow;
use gridstress_core::Network;
use gridstress_io::{sanitize_name, save_network};
use tracing::{debug, warn};

use crate::opf::{solve_linear_opf, SolveResult, SolverError, SolverSettings};

/// Solves one network. Implementations must be callable from several
/// threads at once, each call on its own network copy.
pub trait SolverAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(Infeasible)` for proven infeasibility; `Err` for anything that must end the run.
    fn solve(
        &self,
        network: &Network,
        scratch: Option<&ScenarioScratch>,
    ) -> Result<SolveResult, SolverError>;
}

/// Scenario-scoped location for the serialized network a solve used:
/// `<root>/<run_id>/<scenario>/network.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioScratch {
    root: PathBuf,
    run_id: String,
    scenario: String,
}

impl ScenarioScratch {
    pub fn new(
        root: impl Into<PathBuf>,
        run_id: impl Into<String>,
        scenario: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            run_id: run_id.into(),
            scenario: scenario.into(),
        }
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn dir(&self) -> PathBuf {
        self.root
            .join(sanitize_name(&self.run_id))
            .join(sanitize_name(&self.scenario))
    }

    pub fn network_path(&self) -> PathBuf {
        self.dir().join("network.json")
    }

    pub fn write_network(&self, network: &Network) -> Result<PathBuf, SolverError> {
        let path = self.network_path();
        save_network(network, &path).map_err(|e| SolverError::Scratch(format!("{e:#}")))?;
        Ok(path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LpSolverKind {
    #[default]
    Clarabel,
}

impl LpSolverKind {
    pub fn available() -> &'static [&'static str] {
        &["clarabel"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LpSolverKind::Clarabel => "clarabel",
        }
    }

    pub fn adapter(&self, settings: SolverSettings) -> Box<dyn SolverAdapter> {
        match self {
            LpSolverKind::Clarabel => Box::new(ClarabelAdapter::new(settings)),
        }
    }
}

impl fmt::Display for LpSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LpSolverKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clarabel" => Ok(LpSolverKind::Clarabel),
            other => Err(anyhow!(
                "unknown lp solver '{}'; supported values: {}",
                other,
                LpSolverKind::available().join(", ")
            )),
        }
    }
}

/// Default adapter: the linear OPF solved by Clarabel.
#[derive(Debug, Clone, Default)]
pub struct ClarabelAdapter {
    settings: SolverSettings,
}

impl ClarabelAdapter {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }
}

impl SolverAdapter for ClarabelAdapter {
    fn name(&self) -> &str {
        LpSolverKind::Clarabel.as_str()
    }

    fn solve(
        &self,
        network: &Network,
        scratch: Option<&ScenarioScratch>,
    ) -> Result<SolveResult, SolverError> {
        if let Some(scratch) = scratch {
            let path = scratch.write_network(network)?;
            debug!(scenario = scratch.scenario(), path = %path.display(), "wrote scratch network");
        }
        solve_with_retries(self.settings.max_retries, || {
            solve_linear_opf(network, &self.settings)
        })
    }
}

/// Call `solve` until it returns something other than a fault, at most
/// `max_retries + 1` times. Infeasibility, timeouts and other errors return
/// immediately.
pub fn solve_with_retries<F>(max_retries: u32, mut solve: F) -> Result<SolveResult, SolverError>
where
    F: FnMut() -> Result<SolveResult, SolverError>,
{
    let mut attempt = 0;
    loop {
        match solve() {
            Err(SolverError::Fault(message)) if attempt < max_retries => {
                attempt += 1;
                warn!(attempt, max_retries, %message, "solver fault, retrying");
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::five_bus;
    use tempfile::tempdir;

    #[test]
    fn solver_kind_round_trip_and_rejection() {
        assert_eq!("Clarabel".parse::<LpSolverKind>().unwrap(), LpSolverKind::Clarabel);
        let err = "gurobi".parse::<LpSolverKind>().unwrap_err();
        assert!(err.to_string().contains("supported values: clarabel"));
    }

    #[test]
    fn scratch_paths_are_scenario_scoped() {
        let a = ScenarioScratch::new("/tmp/scratch", "run-1", "Line_1/4");
        let b = ScenarioScratch::new("/tmp/scratch", "run-1", "Line_1_2");
        assert_ne!(a.network_path(), b.network_path());
        assert_eq!(
            a.network_path(),
            PathBuf::from("/tmp/scratch/run-1/Line_1_4/network.json")
        );
    }

    #[test]
    fn adapter_writes_scratch_and_solves() {
        let dir = tempdir().unwrap();
        let scratch = ScenarioScratch::new(dir.path(), "run", "base");
        let adapter = ClarabelAdapter::default();
        let result = adapter.solve(&five_bus().unwrap(), Some(&scratch)).unwrap();
        assert!(result.is_feasible());
        assert!(scratch.network_path().exists());
    }

    #[test]
    fn faults_are_retried_up_to_the_bound() {
        let mut calls = 0;
        let result = solve_with_retries(2, || {
            calls += 1;
            Err(SolverError::Fault("numerical error".into()))
        });
        assert!(matches!(result, Err(SolverError::Fault(_))));
        assert_eq!(calls, 3);

        let mut calls = 0;
        let result = solve_with_retries(2, || {
            calls += 1;
            if calls == 1 {
                Err(SolverError::Fault("insufficient progress".into()))
            } else {
                Ok(SolveResult::Infeasible {
                    reason: "island".into(),
                })
            }
        });
        assert!(matches!(result, Ok(SolveResult::Infeasible { .. })));
        assert_eq!(calls, 2);
    }

    #[test]
    fn infeasible_and_timeout_are_never_retried() {
        let mut calls = 0;
        let result = solve_with_retries(5, || {
            calls += 1;
            Ok(SolveResult::Infeasible {
                reason: "island".into(),
            })
        });
        assert!(!result.unwrap().is_feasible());
        assert_eq!(calls, 1);

        let mut calls = 0;
        let result = solve_with_retries(5, || {
            calls += 1;
            Err(SolverError::Timeout { seconds: 1.0 })
        });
        assert!(matches!(result, Err(SolverError::Timeout { .. })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn no_retry_by_default() {
        let mut calls = 0;
        let _ = solve_with_retries(SolverSettings::default().max_retries, || {
            calls += 1;
            Err(SolverError::Fault("setup failure".into()))
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn adapter_is_object_safe_and_shareable() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn SolverAdapter>();
        let adapter = LpSolverKind::Clarabel.adapter(SolverSettings::default());
        assert_eq!(adapter.name(), "clarabel");
    }
}
