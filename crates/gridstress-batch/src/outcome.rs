use gridstress_algo::{SolveResult, UnservedSelector};
use gridstress_scenarios::Candidate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unserved energy below this is treated as numerical noise.
pub const UNSERVED_EPS_MWH: f64 = 1e-6;

/// How a scenario came out, as shown in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    /// Feasible with all demand served
    Secure,
    /// Feasible only because shedding units ran
    LoadShed { unserved_mwh: f64 },
    Infeasible { reason: String },
}

impl ScenarioOutcome {
    pub fn classify(result: &SolveResult, selector: &UnservedSelector) -> Self {
        match result {
            SolveResult::Infeasible { reason } => ScenarioOutcome::Infeasible {
                reason: reason.clone(),
            },
            SolveResult::Feasible(solution) => {
                let unserved = solution.energy_for_carriers(&selector.carriers);
                if unserved > UNSERVED_EPS_MWH {
                    ScenarioOutcome::LoadShed {
                        unserved_mwh: unserved,
                    }
                } else {
                    ScenarioOutcome::Secure
                }
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScenarioOutcome::Secure => "secure",
            ScenarioOutcome::LoadShed { .. } => "load_shed",
            ScenarioOutcome::Infeasible { .. } => "infeasible",
        }
    }
}

impl fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioOutcome::LoadShed { unserved_mwh } => {
                write!(f, "{} ({unserved_mwh:.3} MWh)", self.label())
            }
            ScenarioOutcome::Infeasible { reason } => write!(f, "{}: {reason}", self.label()),
            ScenarioOutcome::Secure => f.write_str(self.label()),
        }
    }
}

/// One candidate paired with its solve result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub candidate: Candidate,
    pub result: SolveResult,
    pub outcome: ScenarioOutcome,
}

impl ScenarioRecord {
    pub fn label(&self) -> &str {
        &self.candidate.label
    }

    pub fn objective(&self) -> Option<f64> {
        self.result.as_feasible().map(|s| s.objective)
    }
}

/// Lifecycle of a run: `Built -> Solving -> Aggregated -> Reported`, or `Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Built,
    Solving,
    Aggregated,
    Reported,
    Fatal,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Built => "built",
            RunStage::Solving => "solving",
            RunStage::Aggregated => "aggregated",
            RunStage::Reported => "reported",
            RunStage::Fatal => "fatal",
        }
    }

    /// Record entering this stage.
    pub fn enter(self, run_id: &str) -> Self {
        match self {
            RunStage::Fatal => tracing::error!(run_id, stage = self.as_str(), "run stage"),
            _ => tracing::info!(run_id, stage = self.as_str(), "run stage"),
        }
        self
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstress_algo::OpfSolution;

    fn with_shed(mwh: f64) -> SolveResult {
        let mut solution = OpfSolution {
            snapshot_weightings: vec![1.0],
            ..Default::default()
        };
        solution.generator_dispatch.insert("Unserved_Bus_4".into(), vec![mwh]);
        solution.generator_carrier.insert("Unserved_Bus_4".into(), "unserved".into());
        SolveResult::Feasible(solution)
    }

    #[test]
    fn classification_follows_unserved_energy() {
        let selector = UnservedSelector::default();
        assert_eq!(ScenarioOutcome::classify(&with_shed(0.0), &selector), ScenarioOutcome::Secure);
        assert_eq!(
            ScenarioOutcome::classify(&with_shed(80.0), &selector),
            ScenarioOutcome::LoadShed { unserved_mwh: 80.0 }
        );
        let infeasible = SolveResult::Infeasible {
            reason: "island".into(),
        };
        assert_eq!(ScenarioOutcome::classify(&infeasible, &selector).label(), "infeasible");
    }

    #[test]
    fn stages_display_and_serialize_in_snake_case() {
        assert_eq!(RunStage::Aggregated.to_string(), "aggregated");
        assert_eq!(RunStage::Fatal.enter("run-1"), RunStage::Fatal);
        assert_eq!(serde_json::to_string(&RunStage::Reported).unwrap(), "\"reported\"");
    }
}
