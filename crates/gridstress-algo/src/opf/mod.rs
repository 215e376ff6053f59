//! Linear optimal power flow
//!
//! A multi-period DC OPF over generators, lines, links and storage, solved
//! with Clarabel. [`solve_linear_opf`] is the entry point; the
//! [`crate::adapter`] module wraps it behind the solver contract used by the
//! contingency harness.

mod linear;
mod types;

pub use linear::solve_linear_opf;
pub use types::{OpfSolution, SolveResult, SolverError};

use serde::{Deserialize, Serialize};

/// Knobs passed to the solver for one solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Wall-clock limit per solve; reaching it is a [`SolverError::Timeout`]
    pub time_limit_secs: Option<f64>,
    pub max_iter: u32,
    /// Extra attempts after a [`SolverError::Fault`]; never applied to infeasibility
    pub max_retries: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            time_limit_secs: None,
            max_iter: 200,
            max_retries: 0,
        }
    }
}
