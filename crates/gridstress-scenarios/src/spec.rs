use anyhow::{anyhow, Context, Result};
use gridstress_core::Network;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::builder::{build_scenario, Perturbation};

/// A file of named stress scenarios.
///
/// ```yaml
/// version: 1
/// network: northgrid.yaml
/// scenarios:
///   - id: storm
///     description: Wind down to 30% during hours 60-100
///     perturbations:
///       - type: scale_availability
///         generator: WindNorth
///         factor: 0.3
///         window: { start: 60, end: 100 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub version: Option<u32>,
    /// Network file the scenarios were written against, relative to the set file
    pub network: Option<String>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub perturbations: Vec<Perturbation>,
}

impl Scenario {
    pub fn new(id: impl Into<String>, perturbations: Vec<Perturbation>) -> Self {
        Self {
            id: id.into(),
            description: None,
            perturbations,
        }
    }
}

pub fn load_spec_from_path(path: &Path) -> Result<ScenarioSet> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading scenario spec '{}'", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing scenario spec yaml")
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing scenario spec json")
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing scenario spec"),
    }
}

/// Check ids and return the scenarios in file order.
pub fn resolve_scenarios(set: &ScenarioSet) -> Result<Vec<Scenario>> {
    if set.scenarios.is_empty() {
        return Err(anyhow!("scenario set contains no scenarios"));
    }
    let mut seen = HashSet::new();
    for scenario in &set.scenarios {
        if scenario.id.trim().is_empty() {
            return Err(anyhow!("scenario id cannot be empty"));
        }
        if !seen.insert(scenario.id.as_str()) {
            return Err(anyhow!("duplicate scenario id '{}' in spec", scenario.id));
        }
    }
    Ok(set.scenarios.clone())
}

pub fn validate(set: &ScenarioSet) -> Result<()> {
    resolve_scenarios(set).map(|_| ())
}

/// Resolve the set and build every scenario against `network`, so unknown
/// entities and bad windows surface before any solve.
pub fn validate_against(set: &ScenarioSet, network: &Network) -> Result<Vec<Scenario>> {
    let scenarios = resolve_scenarios(set)?;
    for scenario in &scenarios {
        build_scenario(network, scenario)
            .with_context(|| format!("scenario '{}'", scenario.id))?;
    }
    Ok(scenarios)
}

/// Network path declared by the set, resolved against the set file's directory.
pub fn network_path(set: &ScenarioSet, spec_path: &Path) -> Option<std::path::PathBuf> {
    let declared = set.network.as_ref()?;
    let declared = Path::new(declared);
    if declared.is_absolute() {
        return Some(declared.to_path_buf());
    }
    Some(
        spec_path
            .parent()
            .map(|dir| dir.join(declared))
            .unwrap_or_else(|| declared.to_path_buf()),
    )
}
