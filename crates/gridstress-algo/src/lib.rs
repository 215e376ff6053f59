//! # gridstress-algo: dispatch optimisation for contingency studies
//!
//! The pieces a contingency run needs between "here is a network" and
//! "here is a summary":
//!
//! | Item | Role |
//! |------|------|
//! | [`solve_linear_opf`] | Multi-period linear OPF (angle-based KVL on lines, transport on links, storage, global caps) solved with Clarabel |
//! | [`SolverAdapter`] | Object-safe solver contract; [`ClarabelAdapter`] is the default implementation |
//! | [`aggregate`] | Conservative dispatch: element-wise maximum over feasible scenarios |
//! | [`summarize`] | Mean and maximum of cost and unserved energy |
//!
//! A solve yields [`SolveResult::Feasible`] or [`SolveResult::Infeasible`];
//! everything else (numerical trouble, timeouts, scratch I/O) is a
//! [`SolverError`] and ends the run.
//!
//! ```ignore
//! use gridstress_algo::{ClarabelAdapter, SolverAdapter};
//!
//! let result = ClarabelAdapter::default().solve(&network, None)?;
//! if let Some(solution) = result.as_feasible() {
//!     println!("cost {}", solution.objective);
//! }
//! ```

pub mod adapter;
pub mod aggregate;
pub mod opf;
pub mod profiles;
pub mod summary;
pub mod test_utils;

pub use adapter::{
    solve_with_retries, ClarabelAdapter, LpSolverKind, ScenarioScratch, SolverAdapter,
};
pub use aggregate::{aggregate, AggregateBasis, ConservativeDispatch};
pub use opf::{solve_linear_opf, OpfSolution, SolveResult, SolverError, SolverSettings};
pub use summary::{
    summarize, ContingencySummary, SummaryError, UnservedSelector, DEFAULT_UNSERVED_CARRIERS,
};
