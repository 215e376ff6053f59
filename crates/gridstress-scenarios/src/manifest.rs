use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use gridstress_core::Network;
use gridstress_io::{sanitize_name, save_network};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::path::Path;

use crate::builder::build_scenario;
use crate::spec::Scenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioArtifact {
    pub scenario_id: String,
    pub description: Option<String>,
    pub network_file: String,
    /// Human-readable form of each applied perturbation
    #[serde(default)]
    pub perturbations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Build every scenario against `base` and save the resulting networks.
///
/// Ids that sanitize to the same directory name are rejected before anything
/// is written.
///
/// ```text
/// out_dir/
///   scenario_manifest.json
///   <scenario_id>/
///     network.json
/// ```
pub fn materialize_scenarios(
    base: &Network,
    out_dir: &Path,
    scenarios: &[Scenario],
) -> Result<Vec<ScenarioArtifact>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating scenario output directory '{}'", out_dir.display()))?;
    let mut dirs: BTreeMap<String, &str> = BTreeMap::new();
    for scenario in scenarios {
        let dir = sanitize_name(&scenario.id);
        if let Some(first) = dirs.insert(dir.clone(), &scenario.id) {
            bail!(
                "scenarios '{}' and '{}' would both be written to '{}'",
                first,
                scenario.id,
                out_dir.join(&dir).display()
            );
        }
    }
    let mut artifacts = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let network = build_scenario(base, scenario)
            .with_context(|| format!("building scenario '{}'", scenario.id))?;
        let network_path = out_dir
            .join(sanitize_name(&scenario.id))
            .join("network.json");
        save_network(&network, &network_path)?;
        artifacts.push(ScenarioArtifact {
            scenario_id: scenario.id.clone(),
            description: scenario.description.clone(),
            network_file: network_path.display().to_string(),
            perturbations: scenario.perturbations.iter().map(ToString::to_string).collect(),
            created_at: Utc::now(),
        });
    }
    write_manifest(&out_dir.join("scenario_manifest.json"), &artifacts)?;
    Ok(artifacts)
}

pub fn write_manifest(path: &Path, artifacts: &[ScenarioArtifact]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating scenario manifest '{}'", path.display()))?;
    serde_json::to_writer_pretty(file, artifacts)
        .with_context(|| format!("writing scenario manifest '{}'", path.display()))?;
    Ok(())
}

pub fn load_manifest(path: &Path) -> Result<Vec<ScenarioArtifact>> {
    let file = File::open(path)
        .with_context(|| format!("opening scenario manifest '{}'", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("parsing scenario manifest '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Perturbation;
    use gridstress_core::{Bus, BusId, BranchId, Line};
    use gridstress_io::load_network;
    use tempfile::tempdir;

    fn two_bus() -> Network {
        let mut network = Network::new();
        network.add_bus(Bus::new(BusId::new(0), "A"));
        network.add_bus(Bus::new(BusId::new(1), "B"));
        network
            .add_line(Line::new(BranchId::new(0), "A/B", BusId::new(0), BusId::new(1), 0.1, 10.0))
            .unwrap();
        network
    }

    #[test]
    fn materializes_networks_and_manifest() {
        let dir = tempdir().unwrap();
        let scenarios = vec![Scenario::new(
            "outage/A-B",
            vec![Perturbation::branch_outage("A/B")],
        )];
        let artifacts = materialize_scenarios(&two_bus(), dir.path(), &scenarios).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].network_file.ends_with("network.json"));
        assert!(dir.path().join("outage_A-B").join("network.json").exists());

        let saved = load_network(Path::new(&artifacts[0].network_file)).unwrap();
        assert!(!saved.branch("A/B").unwrap().in_service());

        let manifest = load_manifest(&dir.path().join("scenario_manifest.json")).unwrap();
        assert_eq!(manifest[0].scenario_id, "outage/A-B");
        assert_eq!(manifest[0].perturbations, vec!["branch_outage(A/B)"]);
    }

    #[test]
    fn colliding_directory_names_are_rejected() {
        let mut network = two_bus();
        network.add_bus(Bus::new(BusId::new(2), "C"));
        network
            .add_line(Line::new(BranchId::new(1), "B-C", BusId::new(1), BusId::new(2), 0.1, 10.0))
            .unwrap();
        let dir = tempdir().unwrap();
        let scenarios = vec![
            Scenario::new("trip/a", vec![Perturbation::branch_outage("A/B")]),
            Scenario::new("trip_a", vec![Perturbation::branch_outage("B-C")]),
        ];
        let err = materialize_scenarios(&network, dir.path(), &scenarios).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'trip/a' and 'trip_a'"));
        assert!(!dir.path().join("trip_a").exists());
        assert!(!dir.path().join("scenario_manifest.json").exists());
    }

    #[test]
    fn unknown_entity_stops_materialization() {
        let dir = tempdir().unwrap();
        let scenarios = vec![Scenario::new("bad", vec![Perturbation::branch_outage("nope")])];
        let err = materialize_scenarios(&two_bus(), dir.path(), &scenarios).unwrap_err();
        assert!(format!("{err:#}").contains("unknown branch 'nope'"));
    }
}
