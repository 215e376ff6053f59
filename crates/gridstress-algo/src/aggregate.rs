//! Conservative dispatch: the largest output each unit reached in any
//! feasible scenario.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::opf::{OpfSolution, SolveResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregateBasis {
    /// Maximum over this many feasible scenarios
    WorstCase { scenarios: usize },
    /// No scenario was feasible; the values are the base dispatch
    BaseFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservativeDispatch {
    pub basis: AggregateBasis,
    /// Unit name to per-period MW
    pub dispatch: BTreeMap<String, Vec<f64>>,
}

impl ConservativeDispatch {
    pub fn is_fallback(&self) -> bool {
        self.basis == AggregateBasis::BaseFallback
    }

    pub fn peak(&self, unit: &str) -> Option<f64> {
        self.dispatch
            .get(unit)
            .map(|series| series.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }
}

/// Element-wise maximum of generator dispatch over the feasible results.
///
/// Infeasible results are skipped. A unit missing from some scenario
/// contributes only where it is present. With no feasible result the base
/// dispatch is returned, flagged as [`AggregateBasis::BaseFallback`].
pub fn aggregate<'a, I>(results: I, base: &OpfSolution) -> ConservativeDispatch
where
    I: IntoIterator<Item = &'a SolveResult>,
{
    let mut dispatch: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut scenarios = 0;
    for solution in results.into_iter().filter_map(SolveResult::as_feasible) {
        scenarios += 1;
        for (unit, series) in &solution.generator_dispatch {
            let acc = dispatch.entry(unit.clone()).or_default();
            for (t, value) in series.iter().enumerate() {
                match acc.get_mut(t) {
                    Some(current) => *current = current.max(*value),
                    None => acc.push(*value),
                }
            }
        }
    }
    if scenarios == 0 {
        return ConservativeDispatch {
            basis: AggregateBasis::BaseFallback,
            dispatch: base.generator_dispatch.clone(),
        };
    }
    ConservativeDispatch {
        basis: AggregateBasis::WorstCase { scenarios },
        dispatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(units: &[(&str, Vec<f64>)]) -> SolveResult {
        let mut solution = OpfSolution::default();
        for (name, series) in units {
            solution.generator_dispatch.insert(name.to_string(), series.clone());
        }
        SolveResult::Feasible(solution)
    }

    fn infeasible() -> SolveResult {
        SolveResult::Infeasible {
            reason: "stranded".into(),
        }
    }

    #[test]
    fn takes_per_period_maximum() {
        let results = vec![
            solution(&[("GasPlant", vec![120.0, 10.0])]),
            solution(&[("GasPlant", vec![80.0, 30.0])]),
        ];
        let out = aggregate(&results, &OpfSolution::default());
        assert_eq!(out.basis, AggregateBasis::WorstCase { scenarios: 2 });
        assert_eq!(out.dispatch["GasPlant"], vec![120.0, 30.0]);
        assert_eq!(out.peak("GasPlant"), Some(120.0));
    }

    #[test]
    fn infeasible_results_do_not_participate() {
        let results = vec![
            infeasible(),
            solution(&[("GasPlant", vec![80.0])]),
            infeasible(),
        ];
        let out = aggregate(&results, &OpfSolution::default());
        assert_eq!(out.basis, AggregateBasis::WorstCase { scenarios: 1 });
        assert_eq!(out.dispatch["GasPlant"], vec![80.0]);
    }

    #[test]
    fn unit_missing_from_a_scenario_contributes_where_present() {
        let results = vec![
            solution(&[("A", vec![5.0]), ("B", vec![7.0])]),
            solution(&[("A", vec![9.0])]),
        ];
        let out = aggregate(&results, &OpfSolution::default());
        assert_eq!(out.dispatch["A"], vec![9.0]);
        assert_eq!(out.dispatch["B"], vec![7.0]);
    }

    #[test]
    fn falls_back_to_base_when_nothing_is_feasible() {
        let mut base = OpfSolution::default();
        base.generator_dispatch.insert("GasPlant".into(), vec![95.0]);
        let results = vec![infeasible(), infeasible()];
        let out = aggregate(&results, &base);
        assert!(out.is_fallback());
        assert_eq!(out.dispatch, base.generator_dispatch);
    }
}
