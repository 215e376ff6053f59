use gridstress_core::GridError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Optimal operating point of one network over its snapshots.
///
/// Every map is keyed by asset name and holds one value per snapshot, so two
/// solves of the same network serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpfSolution {
    /// Total cost: weighted operating cost plus capital cost of optimized capacity
    pub objective: f64,
    /// Generator output in MW
    pub generator_dispatch: BTreeMap<String, Vec<f64>>,
    pub generator_carrier: BTreeMap<String, String>,
    /// Flow in MW measured at `bus0` (positive from `bus0` to `bus1`); open branches carry zero
    pub branch_flows: BTreeMap<String, Vec<f64>>,
    /// Marginal cost of serving one more MW at each bus
    pub nodal_prices: BTreeMap<String, Vec<f64>>,
    /// Net storage output in MW (discharge minus charge)
    pub storage_dispatch: BTreeMap<String, Vec<f64>>,
    /// Stored energy in MWh at the end of each snapshot
    pub storage_state_of_charge: BTreeMap<String, Vec<f64>>,
    /// Optimized capacity of extendable generators, branches and storage
    pub optimal_capacity: BTreeMap<String, f64>,
    pub snapshot_weightings: Vec<f64>,
    pub iterations: u32,
    pub solve_time_ms: u64,
}

impl OpfSolution {
    pub fn dispatch(&self, generator: &str) -> Option<&[f64]> {
        self.generator_dispatch.get(generator).map(Vec::as_slice)
    }

    pub fn flow(&self, branch: &str) -> Option<&[f64]> {
        self.branch_flows.get(branch).map(Vec::as_slice)
    }

    pub fn price(&self, bus: &str) -> Option<&[f64]> {
        self.nodal_prices.get(bus).map(Vec::as_slice)
    }

    /// Weighted energy (MWh) produced by generators of the given carriers.
    pub fn energy_for_carriers(&self, carriers: &[String]) -> f64 {
        self.generator_dispatch
            .iter()
            .filter(|(name, _)| {
                self.generator_carrier
                    .get(*name)
                    .map(|carrier| carriers.iter().any(|c| c == carrier))
                    .unwrap_or(false)
            })
            .map(|(_, series)| {
                series
                    .iter()
                    .enumerate()
                    .map(|(t, p)| p * self.weighting(t))
                    .sum::<f64>()
            })
            .sum()
    }

    pub fn weighting(&self, t: usize) -> f64 {
        self.snapshot_weightings.get(t).copied().unwrap_or(1.0)
    }
}

/// Outcome of solving one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SolveResult {
    Feasible(OpfSolution),
    /// No operating point satisfies the constraints.
    Infeasible { reason: String },
}

impl SolveResult {
    pub fn is_feasible(&self) -> bool {
        matches!(self, SolveResult::Feasible(_))
    }

    pub fn as_feasible(&self) -> Option<&OpfSolution> {
        match self {
            SolveResult::Feasible(solution) => Some(solution),
            SolveResult::Infeasible { .. } => None,
        }
    }

    pub fn into_feasible(self) -> Option<OpfSolution> {
        match self {
            SolveResult::Feasible(solution) => Some(solution),
            SolveResult::Infeasible { .. } => None,
        }
    }
}

/// Failures other than proven infeasibility. All of them end a run.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Numerical trouble, iteration limit, unboundedness or setup failure
    #[error("solver fault: {0}")]
    Fault(String),

    #[error("solver time limit of {seconds}s reached")]
    Timeout { seconds: f64 },

    /// The network failed validation before the problem was built
    #[error("invalid network: {0}")]
    InvalidNetwork(#[from] GridError),

    #[error("writing scratch network: {0}")]
    Scratch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_counts_only_selected_carriers() {
        let mut solution = OpfSolution {
            snapshot_weightings: vec![1.0, 2.0],
            ..Default::default()
        };
        solution
            .generator_dispatch
            .insert("Shed".into(), vec![10.0, 5.0]);
        solution.generator_carrier.insert("Shed".into(), "load_shed".into());
        solution.generator_dispatch.insert("Gas".into(), vec![50.0, 50.0]);
        solution.generator_carrier.insert("Gas".into(), "gas".into());
        assert_eq!(solution.energy_for_carriers(&["load_shed".to_string()]), 20.0);
        assert_eq!(solution.energy_for_carriers(&[]), 0.0);
    }

    #[test]
    fn infeasible_serializes_with_status_tag() {
        let result = SolveResult::Infeasible {
            reason: "island".into(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"status":"infeasible","reason":"island"}"#);
    }
}
