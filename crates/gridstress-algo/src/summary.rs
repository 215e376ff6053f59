//! Summary statistics over the feasible scenarios of a run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::opf::SolveResult;

pub const DEFAULT_UNSERVED_CARRIERS: &[&str] = &["load_shed", "unserved"];

/// Which generator carriers count as unserved energy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnservedSelector {
    pub carriers: Vec<String>,
}

impl Default for UnservedSelector {
    fn default() -> Self {
        Self {
            carriers: DEFAULT_UNSERVED_CARRIERS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl UnservedSelector {
    pub fn new<I, S>(carriers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            carriers: carriers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, carrier: &str) -> bool {
        self.carriers.iter().any(|c| c == carrier)
    }

    /// Weighted unserved energy (MWh) of one result; `None` when infeasible.
    pub fn unserved_energy(&self, result: &SolveResult) -> Option<f64> {
        result
            .as_feasible()
            .map(|solution| solution.energy_for_carriers(&self.carriers))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencySummary {
    pub mean_cost: f64,
    pub max_cost: f64,
    /// MWh
    pub mean_unserved: f64,
    pub max_unserved: f64,
    pub feasible: usize,
    pub infeasible: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("no feasible scenario among {total} to aggregate")]
    EmptyAggregate { total: usize },
}

/// Mean and maximum of cost and unserved energy over feasible results.
///
/// Infeasible results are counted but excluded from every statistic. With no
/// feasible result this returns [`SummaryError::EmptyAggregate`], never zeros.
pub fn summarize<'a, I>(
    results: I,
    selector: &UnservedSelector,
) -> Result<ContingencySummary, SummaryError>
where
    I: IntoIterator<Item = &'a SolveResult>,
{
    let mut costs = Vec::new();
    let mut unserved = Vec::new();
    let mut infeasible = 0;
    for result in results {
        match result.as_feasible() {
            Some(solution) => {
                costs.push(solution.objective);
                unserved.push(solution.energy_for_carriers(&selector.carriers));
            }
            None => infeasible += 1,
        }
    }
    if costs.is_empty() {
        return Err(SummaryError::EmptyAggregate { total: infeasible });
    }
    Ok(ContingencySummary {
        mean_cost: mean(&costs),
        max_cost: max(&costs),
        mean_unserved: mean(&unserved),
        max_unserved: max(&unserved),
        feasible: costs.len(),
        infeasible,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
