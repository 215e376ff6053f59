//! Ordered candidate lists for contingency enumeration.

use gridstress_core::{Edge, EntityKind, GridError, GridResult, Network};
use serde::{Deserialize, Serialize};

use crate::builder::Perturbation;
use crate::spec::Scenario;

/// A labelled list of perturbations to evaluate against the base network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    pub perturbations: Vec<Perturbation>,
}

impl Candidate {
    /// Single-branch outage labelled by the branch name.
    pub fn outage(branch: impl Into<String>) -> Self {
        let branch = branch.into();
        Self {
            label: branch.clone(),
            perturbations: vec![Perturbation::branch_outage(branch)],
        }
    }
}

impl From<&Scenario> for Candidate {
    fn from(scenario: &Scenario) -> Self {
        Self {
            label: scenario.id.clone(),
            perturbations: scenario.perturbations.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NMinusOneOptions {
    /// Also trip links (corridors), not only lines
    pub include_links: bool,
}

/// One outage per active line (and link when requested), in network order.
pub fn n_minus_one(base: &Network, options: NMinusOneOptions) -> Vec<Candidate> {
    base.branches()
        .into_iter()
        .filter(|edge| edge.is_active())
        .filter(|edge| options.include_links || matches!(edge, Edge::Line(_)))
        .map(|edge| Candidate::outage(edge.name()))
        .collect()
}

/// Outages of the named branches, in the order given.
pub fn n_minus_one_subset(base: &Network, branches: &[String]) -> GridResult<Vec<Candidate>> {
    branches
        .iter()
        .map(|name| {
            base.branch(name)
                .map(|edge| Candidate::outage(edge.name()))
                .ok_or_else(|| GridError::unknown(EntityKind::Branch, name))
        })
        .collect()
}

pub fn scenario_candidates(scenarios: &[Scenario]) -> Vec<Candidate> {
    scenarios.iter().map(Candidate::from).collect()
}
