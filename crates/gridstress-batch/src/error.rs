use gridstress_algo::{SolverError, SummaryError};
use gridstress_core::GridError;
use thiserror::Error;

/// Errors that end a contingency run. Infeasible scenarios are not errors;
/// they are carried as outcomes.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A perturbation or candidate names an entity the base network lacks
    #[error("building scenario '{scenario}': {source}")]
    Build {
        scenario: String,
        #[source]
        source: GridError,
    },

    #[error("solver failed on scenario '{scenario}': {source}")]
    Solver {
        scenario: String,
        #[source]
        source: SolverError,
    },

    /// The unperturbed network has no feasible dispatch
    #[error("base network is infeasible: {reason}")]
    BaseInfeasible { reason: String },

    #[error(transparent)]
    EmptyAggregate(#[from] SummaryError),

    #[error("building thread pool: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Grid(#[from] GridError),
}

impl HarnessError {
    pub fn is_unknown_entity(&self) -> bool {
        match self {
            HarnessError::Build { source, .. } => source.is_unknown_entity(),
            HarnessError::Solver {
                source: SolverError::InvalidNetwork(source),
                ..
            } => source.is_unknown_entity(),
            HarnessError::Grid(source) => source.is_unknown_entity(),
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            HarnessError::Solver {
                source: SolverError::Timeout { .. },
                ..
            }
        )
    }
}
