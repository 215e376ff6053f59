//! Error type shared by the gridstress crates.
//!
//! [`GridError`] covers model construction, document loading and scenario
//! building. Solver and harness errors live next to the code that raises them
//! and wrap this type where a model error can surface through them.
//!
//! # Example
//!
//! ```
//! use gridstress_core::{EntityKind, GridError, GridResult, Network};
//!
//! fn outage(network: &mut Network, name: &str) -> GridResult<()> {
//!     network
//!         .branch_mut(name)
//!         .ok_or_else(|| GridError::unknown(EntityKind::Branch, name))?
//!         .trip();
//!     Ok(())
//! }
//!
//! let err = outage(&mut Network::new(), "Line_9_9").unwrap_err();
//! assert!(err.is_unknown_entity());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kinds of network entity that can be referenced by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Bus,
    Branch,
    Generator,
    Load,
    StorageUnit,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Bus => "bus",
            EntityKind::Branch => "branch",
            EntityKind::Generator => "generator",
            EntityKind::Load => "load",
            EntityKind::StorageUnit => "storage unit",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Data that cannot describe a solvable network: bad series lengths,
    /// per-unit limits out of range, duplicate names, bad perturbations
    #[error("Validation error: {0}")]
    Validation(String),

    /// A reference to a bus, branch or unit that the network does not contain
    #[error("unknown {kind} '{name}'")]
    UnknownEntity { kind: EntityKind, name: String },
}

impl GridError {
    pub fn unknown(kind: EntityKind, name: impl Into<String>) -> Self {
        GridError::UnknownEntity {
            kind,
            name: name.into(),
        }
    }

    pub fn is_unknown_entity(&self) -> bool {
        matches!(self, GridError::UnknownEntity { .. })
    }
}

pub type GridResult<T> = Result<T, GridError>;
