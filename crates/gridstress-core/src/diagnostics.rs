//! Validation findings collected while checking a network.
//!
//! ```
//! use gridstress_core::diagnostics::{Check, Diagnostics};
//!
//! let mut diag = Diagnostics::new();
//! diag.warning(Check::Policy, "no carrier declares co2_emissions");
//! diag.error(Check::Profile, "p_set has 3 values for 24 snapshots").on("Load1");
//! assert_eq!(diag.count(gridstress_core::Severity::Warning), 1);
//! assert!(diag.has_errors());
//! ```

use serde::Serialize;
use std::fmt;

use crate::error::{GridError, GridResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Solvable, but probably not what the author meant
    Warning,
    /// The network cannot be solved as described
    Error,
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Snapshots,
    Naming,
    /// An asset points at a bus that does not exist
    Reference,
    Rating,
    Efficiency,
    Impedance,
    /// Per-snapshot series: length, finiteness, bounds
    Profile,
    Policy,
}

impl Check {
    pub fn as_str(&self) -> &'static str {
        match self {
            Check::Snapshots => "snapshots",
            Check::Naming => "naming",
            Check::Reference => "reference",
            Check::Rating => "rating",
            Check::Efficiency => "efficiency",
            Check::Impedance => "impedance",
            Check::Profile => "profile",
            Check::Policy => "policy",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    pub check: Check,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
}

impl DiagnosticIssue {
    /// Attach the name of the offending asset.
    pub fn on(&mut self, asset: &str) -> &mut Self {
        self.asset = Some(asset.to_string());
        self
    }
}

impl fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.asset {
            Some(asset) => write!(f, "{level} [{}] {asset}: {}", self.check.as_str(), self.message),
            None => write!(f, "{level} [{}] {}", self.check.as_str(), self.message),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, severity: Severity, check: Check, message: String) -> &mut DiagnosticIssue {
        self.issues.push(DiagnosticIssue {
            severity,
            check,
            message,
            asset: None,
        });
        let last = self.issues.len() - 1;
        &mut self.issues[last]
    }

    pub fn warning(&mut self, check: Check, message: impl Into<String>) -> &mut DiagnosticIssue {
        self.push(Severity::Warning, check, message.into())
    }

    pub fn error(&mut self, check: Check, message: impl Into<String>) -> &mut DiagnosticIssue {
        self.push(Severity::Error, check, message.into())
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// `Ok` when only warnings were found; otherwise every error joined into
    /// one [`GridError::Validation`].
    pub fn into_result(self) -> GridResult<()> {
        let errors: Vec<String> = self
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .map(ToString::to_string)
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GridError::Validation(errors.join("; ")))
        }
    }
}
