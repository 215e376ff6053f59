//! Scenario construction: perturbations of a base network, scenario files
//! and N-1 candidate lists.

pub mod builder;
pub mod contingency;
pub mod manifest;
pub mod spec;

pub use builder::{build, build_all, build_scenario, Perturbation};
pub use contingency::{
    n_minus_one, n_minus_one_subset, scenario_candidates, Candidate, NMinusOneOptions,
};
pub use manifest::{load_manifest, materialize_scenarios, write_manifest, ScenarioArtifact};
pub use spec::{
    load_spec_from_path, network_path, resolve_scenarios, validate, validate_against, Scenario,
    ScenarioSet,
};
