//! Harness configuration.
//!
//! Values are layered: built-in defaults, then the TOML file (`--config`, or
//! `gridstress.toml` in the working directory when it exists), then
//! command-line flags. Every key is optional in the file.
//!
//! ```toml
//! threads = 4
//! solver = "clarabel"
//! time_limit_secs = 60.0
//! unserved_carriers = ["load_shed", "unserved"]
//! output_dir = "runs"
//!
//! [shedding]
//! enabled = true
//! marginal_cost = 10000.0
//! ```

use anyhow::{bail, Context, Result};
use gridstress_algo::{LpSolverKind, SolverSettings, UnservedSelector, DEFAULT_UNSERVED_CARRIERS};
use gridstress_batch::{EnumeratorConfig, SheddingPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::RunArgs;

pub const DEFAULT_CONFIG_FILE: &str = "gridstress.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Worker threads (0 = auto-detect)
    pub threads: usize,
    pub solver: String,
    pub time_limit_secs: Option<f64>,
    pub max_iter: u32,
    /// Bounded retries on solver faults; infeasibility is never retried
    pub max_retries: u32,
    pub scratch_dir: Option<PathBuf>,
    pub shedding: SheddingConfig,
    pub unserved_carriers: Vec<String>,
    pub output_dir: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let solver = SolverSettings::default();
        Self {
            threads: 0,
            solver: LpSolverKind::default().as_str().to_string(),
            time_limit_secs: None,
            max_iter: solver.max_iter,
            max_retries: solver.max_retries,
            scratch_dir: None,
            shedding: SheddingConfig::default(),
            unserved_carriers: DEFAULT_UNSERVED_CARRIERS.iter().map(|c| c.to_string()).collect(),
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheddingConfig {
    pub enabled: bool,
    /// Price of unserved energy per MWh
    pub marginal_cost: f64,
    /// Capacity of each per-bus shedding unit in MW
    pub p_nom: f64,
    pub carrier: String,
}

impl Default for SheddingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            marginal_cost: SheddingPolicy::DEFAULT_MARGINAL_COST,
            p_nom: SheddingPolicy::DEFAULT_P_NOM,
            carrier: SheddingPolicy::DEFAULT_CARRIER.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Read `explicit` (which must exist), else `./gridstress.toml` if
    /// present, else the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load_from(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("parsing config '{}'", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.solver_kind()?;
        if let Some(limit) = self.time_limit_secs {
            if !(limit.is_finite() && limit > 0.0) {
                bail!("time_limit_secs must be a positive number of seconds, got {limit}");
            }
        }
        if self.max_iter == 0 {
            bail!("max_iter must be at least 1");
        }
        let shedding = &self.shedding;
        if !(shedding.marginal_cost.is_finite() && shedding.marginal_cost > 0.0) {
            bail!("shedding.marginal_cost must be positive, got {}", shedding.marginal_cost);
        }
        if !(shedding.p_nom.is_finite() && shedding.p_nom > 0.0) {
            bail!("shedding.p_nom must be positive, got {}", shedding.p_nom);
        }
        if shedding.carrier.trim().is_empty() {
            bail!("shedding.carrier cannot be empty");
        }
        Ok(())
    }

    /// Flags win over file values.
    pub fn apply_args(&mut self, args: &RunArgs) -> Result<()> {
        if args.shedding {
            self.shedding.enabled = true;
        }
        if let Some(threads) = args.threads {
            self.threads = threads;
        }
        self.override_solver(args.solver.as_deref(), args.time_limit);
        if let Some(dir) = &args.out_dir {
            self.output_dir = Some(dir.clone());
        }
        if let Some(dir) = &args.scratch_dir {
            self.scratch_dir = Some(dir.clone());
        }
        self.validate()
    }

    pub fn override_solver(&mut self, solver: Option<&str>, time_limit: Option<f64>) {
        if let Some(solver) = solver {
            self.solver = solver.to_string();
        }
        if time_limit.is_some() {
            self.time_limit_secs = time_limit;
        }
    }

    pub fn solver_kind(&self) -> Result<LpSolverKind> {
        self.solver.parse()
    }

    pub fn solver_settings(&self) -> SolverSettings {
        SolverSettings {
            time_limit_secs: self.time_limit_secs,
            max_iter: self.max_iter,
            max_retries: self.max_retries,
        }
    }

    pub fn shedding_policy(&self) -> SheddingPolicy {
        if !self.shedding.enabled {
            return SheddingPolicy::Disabled;
        }
        SheddingPolicy::Enabled {
            marginal_cost: self.shedding.marginal_cost,
            carrier: self.shedding.carrier.clone(),
            p_nom: self.shedding.p_nom,
        }
    }

    pub fn unserved_selector(&self) -> UnservedSelector {
        UnservedSelector::new(self.unserved_carriers.iter().cloned())
    }

    pub fn enumerator_config(&self) -> EnumeratorConfig {
        EnumeratorConfig {
            threads: self.threads,
            shedding: self.shedding_policy(),
            unserved: self.unserved_selector(),
            scratch_dir: self.scratch_dir.clone(),
            ..EnumeratorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = HarnessConfig::from_toml_str("").unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.shedding_policy(), SheddingPolicy::Disabled);
        assert_eq!(config.solver_kind().unwrap(), LpSolverKind::Clarabel);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = HarnessConfig::from_toml_str(
            r#"
threads = 3
time_limit_secs = 30.0

[shedding]
enabled = true
carrier = "load_shed"
"#,
        )
        .unwrap();
        assert_eq!(config.threads, 3);
        assert_eq!(config.solver_settings().time_limit_secs, Some(30.0));
        assert_eq!(
            config.shedding_policy(),
            SheddingPolicy::Enabled {
                marginal_cost: SheddingPolicy::DEFAULT_MARGINAL_COST,
                carrier: "load_shed".into(),
                p_nom: SheddingPolicy::DEFAULT_P_NOM,
            }
        );
    }

    #[test]
    fn flags_override_file_values() {
        let mut config =
            HarnessConfig::from_toml_str("threads = 8\nsolver = \"clarabel\"").unwrap();
        let args = RunArgs {
            shedding: true,
            threads: Some(2),
            time_limit: Some(5.0),
            ..Default::default()
        };
        config.apply_args(&args).unwrap();
        assert_eq!(config.threads, 2);
        assert!(config.shedding.enabled);
        assert_eq!(config.time_limit_secs, Some(5.0));
        assert_eq!(config.enumerator_config().threads, 2);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(HarnessConfig::from_toml_str("solver = \"gurobi\"").is_err());
        assert!(HarnessConfig::from_toml_str("time_limit_secs = -1.0").is_err());
        assert!(HarnessConfig::from_toml_str("thread = 2").is_err());
        assert!(HarnessConfig::from_toml_str("[shedding]\nmarginal_cost = 0.0").is_err());
    }
}
