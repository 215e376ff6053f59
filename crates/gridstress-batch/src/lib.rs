//! Contingency enumeration over a base network: build every candidate,
//! solve them in parallel, then aggregate and summarize.

pub mod error;
pub mod manifest;
pub mod outcome;
pub mod runner;
pub mod shedding;

pub use error::HarnessError;
pub use manifest::{
    load_run_manifest, write_run_manifest, RunManifest, ScenarioEntry, RUN_MANIFEST_FILE,
};
pub use outcome::{RunStage, ScenarioOutcome, ScenarioRecord};
pub use runner::{Enumeration, Enumerator, EnumeratorConfig, RunReport, BASE_LABEL};
pub use shedding::{unserved_name, SheddingPolicy};
