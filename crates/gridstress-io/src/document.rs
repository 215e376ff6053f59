//! Serialized network description.
//!
//! Documents reference buses by name; ids are assigned in document order when
//! the document is turned into a [`Network`]. Unknown fields are rejected so a
//! misspelled attribute fails at load time instead of silently defaulting.

use chrono::{DateTime, Utc};
use gridstress_core::{
    Bus, BusId, BranchId, Carrier, EntityKind, Gen, GenId, GlobalConstraint, GridError,
    GridResult, Line, Link, Load, LoadId, Network, Profile, Snapshots, StorageId, StorageUnit,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshots: Option<SnapshotDoc>,
    pub buses: Vec<BusDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub carriers: Vec<Carrier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generators: Vec<GeneratorDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loads: Vec<LoadDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage_units: Vec<StorageDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<LineDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_constraints: Vec<GlobalConstraint>,
}

/// Either a regular hourly range or explicit timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotDoc {
    Hourly {
        start: DateTime<Utc>,
        periods: usize,
    },
    Explicit {
        timestamps: Vec<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weightings: Option<Vec<f64>>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusDoc {
    pub name: String,
    #[serde(default = "default_ac")]
    pub carrier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorDoc {
    pub name: String,
    pub bus: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_nom_max: Option<f64>,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default = "default_one")]
    pub p_max_pu: Profile,
    #[serde(default = "default_zero")]
    pub p_min_pu: Profile,
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    #[serde(default = "default_true")]
    pub in_service: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadDoc {
    pub name: String,
    pub bus: String,
    pub p_set: Profile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageDoc {
    pub name: String,
    pub bus: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_nom_max: Option<f64>,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default = "default_efficiency")]
    pub max_hours: f64,
    #[serde(default = "default_efficiency")]
    pub efficiency_store: f64,
    #[serde(default = "default_efficiency")]
    pub efficiency_dispatch: f64,
    #[serde(default)]
    pub state_of_charge_initial: f64,
    #[serde(default)]
    pub cyclic_state_of_charge: bool,
    #[serde(default = "default_true")]
    pub in_service: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineDoc {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    pub x: f64,
    #[serde(default)]
    pub r: f64,
    pub s_nom: f64,
    #[serde(default)]
    pub s_nom_extendable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s_nom_max: Option<f64>,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default = "default_one")]
    pub s_max_pu: Profile,
    #[serde(default = "default_efficiency")]
    pub length: f64,
    #[serde(default = "default_ac")]
    pub carrier: String,
    #[serde(default = "default_true")]
    pub in_service: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkDoc {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_nom_max: Option<f64>,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    #[serde(default = "default_one")]
    pub p_max_pu: Profile,
    #[serde(default = "default_zero")]
    pub p_min_pu: Profile,
    #[serde(default = "default_efficiency")]
    pub length: f64,
    #[serde(default)]
    pub carrier: String,
    #[serde(default = "default_true")]
    pub in_service: bool,
}

fn default_ac() -> String {
    "AC".to_string()
}

fn default_one() -> Profile {
    Profile::constant(1.0)
}

fn default_zero() -> Profile {
    Profile::constant(0.0)
}

fn default_efficiency() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Build a network from a document, resolving bus names to ids.
pub fn network_from_document(doc: &NetworkDocument) -> GridResult<Network> {
    let snapshots = match &doc.snapshots {
        None => Snapshots::default(),
        Some(SnapshotDoc::Hourly { start, periods }) => {
            if *periods == 0 {
                return Err(GridError::Validation("snapshots.periods must be positive".into()));
            }
            Snapshots::hourly(*start, *periods)
        }
        Some(SnapshotDoc::Explicit {
            timestamps,
            weightings: None,
        }) => Snapshots::from_timestamps(timestamps.clone())?,
        Some(SnapshotDoc::Explicit {
            timestamps,
            weightings: Some(weightings),
        }) => Snapshots::with_weightings(timestamps.clone(), weightings.clone())?,
    };

    let mut network = Network::with_snapshots(snapshots);
    let mut bus_ids: HashMap<&str, BusId> = HashMap::new();
    for (i, bus) in doc.buses.iter().enumerate() {
        let id = BusId::new(i);
        if bus_ids.insert(bus.name.as_str(), id).is_some() {
            return Err(GridError::Validation(format!("duplicate bus name '{}'", bus.name)));
        }
        network.add_bus(Bus {
            id,
            name: bus.name.clone(),
            carrier: bus.carrier.clone(),
            x: bus.x,
            y: bus.y,
        });
    }
    let resolve = |name: &str| -> GridResult<BusId> {
        bus_ids
            .get(name)
            .copied()
            .ok_or_else(|| GridError::unknown(EntityKind::Bus, name))
    };

    for carrier in &doc.carriers {
        network.add_carrier(carrier.clone());
    }

    for (i, g) in doc.generators.iter().enumerate() {
        network.add_generator(Gen {
            id: GenId::new(i),
            name: g.name.clone(),
            bus: resolve(&g.bus)?,
            carrier: g.carrier.clone(),
            p_nom: g.p_nom,
            p_nom_extendable: g.p_nom_extendable,
            p_nom_max: g.p_nom_max,
            capital_cost: g.capital_cost,
            marginal_cost: g.marginal_cost,
            p_max_pu: g.p_max_pu.clone(),
            p_min_pu: g.p_min_pu.clone(),
            efficiency: g.efficiency,
            in_service: g.in_service,
        })?;
    }

    for (i, l) in doc.loads.iter().enumerate() {
        network.add_load(Load::new(
            LoadId::new(i),
            l.name.clone(),
            resolve(&l.bus)?,
            l.p_set.clone(),
        ))?;
    }

    for (i, s) in doc.storage_units.iter().enumerate() {
        network.add_storage(StorageUnit {
            id: StorageId::new(i),
            name: s.name.clone(),
            bus: resolve(&s.bus)?,
            carrier: s.carrier.clone(),
            p_nom: s.p_nom,
            p_nom_extendable: s.p_nom_extendable,
            p_nom_max: s.p_nom_max,
            capital_cost: s.capital_cost,
            marginal_cost: s.marginal_cost,
            max_hours: s.max_hours,
            efficiency_store: s.efficiency_store,
            efficiency_dispatch: s.efficiency_dispatch,
            state_of_charge_initial: s.state_of_charge_initial,
            cyclic_state_of_charge: s.cyclic_state_of_charge,
            in_service: s.in_service,
        })?;
    }

    // Lines and links share one branch id space.
    let mut branch_id = 0usize;
    for l in &doc.lines {
        network.add_line(Line {
            id: BranchId::new(branch_id),
            name: l.name.clone(),
            from_bus: resolve(&l.bus0)?,
            to_bus: resolve(&l.bus1)?,
            carrier: l.carrier.clone(),
            reactance: l.x,
            resistance: l.r,
            s_nom: l.s_nom,
            s_nom_extendable: l.s_nom_extendable,
            s_nom_max: l.s_nom_max,
            capital_cost: l.capital_cost,
            s_max_pu: l.s_max_pu.clone(),
            length: l.length,
            in_service: l.in_service,
        })?;
        branch_id += 1;
    }
    for k in &doc.links {
        network.add_link(Link {
            id: BranchId::new(branch_id),
            name: k.name.clone(),
            from_bus: resolve(&k.bus0)?,
            to_bus: resolve(&k.bus1)?,
            carrier: k.carrier.clone(),
            p_nom: k.p_nom,
            p_nom_extendable: k.p_nom_extendable,
            p_nom_max: k.p_nom_max,
            capital_cost: k.capital_cost,
            marginal_cost: k.marginal_cost,
            efficiency: k.efficiency,
            p_max_pu: k.p_max_pu.clone(),
            p_min_pu: k.p_min_pu.clone(),
            length: k.length,
            in_service: k.in_service,
        })?;
        branch_id += 1;
    }

    network.global_constraints = doc.global_constraints.clone();
    Ok(network)
}

/// Inverse of [`network_from_document`]; snapshots are always written explicitly.
pub fn document_from_network(network: &Network) -> NetworkDocument {
    let bus_name = |id: BusId| -> String {
        network
            .bus(id)
            .map(|bus| bus.name.clone())
            .unwrap_or_else(|| format!("#{}", id.value()))
    };
    NetworkDocument {
        name: None,
        snapshots: Some(SnapshotDoc::Explicit {
            timestamps: network.snapshots.timestamps().to_vec(),
            weightings: Some(network.snapshots.weightings().to_vec()),
        }),
        buses: network
            .buses()
            .into_iter()
            .map(|bus| BusDoc {
                name: bus.name.clone(),
                carrier: bus.carrier.clone(),
                x: bus.x,
                y: bus.y,
            })
            .collect(),
        carriers: network.carriers.values().cloned().collect(),
        generators: network
            .generators()
            .into_iter()
            .map(|g| GeneratorDoc {
                name: g.name.clone(),
                bus: bus_name(g.bus),
                carrier: g.carrier.clone(),
                p_nom: g.p_nom,
                p_nom_extendable: g.p_nom_extendable,
                p_nom_max: g.p_nom_max,
                capital_cost: g.capital_cost,
                marginal_cost: g.marginal_cost,
                p_max_pu: g.p_max_pu.clone(),
                p_min_pu: g.p_min_pu.clone(),
                efficiency: g.efficiency,
                in_service: g.in_service,
            })
            .collect(),
        loads: network
            .loads()
            .into_iter()
            .map(|l| LoadDoc {
                name: l.name.clone(),
                bus: bus_name(l.bus),
                p_set: l.p_set.clone(),
            })
            .collect(),
        storage_units: network
            .storage_units()
            .into_iter()
            .map(|s| StorageDoc {
                name: s.name.clone(),
                bus: bus_name(s.bus),
                carrier: s.carrier.clone(),
                p_nom: s.p_nom,
                p_nom_extendable: s.p_nom_extendable,
                p_nom_max: s.p_nom_max,
                capital_cost: s.capital_cost,
                marginal_cost: s.marginal_cost,
                max_hours: s.max_hours,
                efficiency_store: s.efficiency_store,
                efficiency_dispatch: s.efficiency_dispatch,
                state_of_charge_initial: s.state_of_charge_initial,
                cyclic_state_of_charge: s.cyclic_state_of_charge,
                in_service: s.in_service,
            })
            .collect(),
        lines: network
            .lines()
            .into_iter()
            .map(|l| LineDoc {
                name: l.name.clone(),
                bus0: bus_name(l.from_bus),
                bus1: bus_name(l.to_bus),
                x: l.reactance,
                r: l.resistance,
                s_nom: l.s_nom,
                s_nom_extendable: l.s_nom_extendable,
                s_nom_max: l.s_nom_max,
                capital_cost: l.capital_cost,
                s_max_pu: l.s_max_pu.clone(),
                length: l.length,
                carrier: l.carrier.clone(),
                in_service: l.in_service,
            })
            .collect(),
        links: network
            .links()
            .into_iter()
            .map(|k| LinkDoc {
                name: k.name.clone(),
                bus0: bus_name(k.from_bus),
                bus1: bus_name(k.to_bus),
                p_nom: k.p_nom,
                p_nom_extendable: k.p_nom_extendable,
                p_nom_max: k.p_nom_max,
                capital_cost: k.capital_cost,
                marginal_cost: k.marginal_cost,
                efficiency: k.efficiency,
                p_max_pu: k.p_max_pu.clone(),
                p_min_pu: k.p_min_pu.clone(),
                length: k.length,
                carrier: k.carrier.clone(),
                in_service: k.in_service,
            })
            .collect(),
        global_constraints: network.global_constraints.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BUS: &str = r#"
snapshots:
  start: 2025-01-01T00:00:00Z
  periods: 3
buses:
  - name: North
    x: 10.0
    y: 56.0
  - name: South
generators:
  - name: Wind
    bus: North
    p_nom: 100
    carrier: wind
    p_max_pu: [0.5, 1.0, 0.0]
loads:
  - name: City
    bus: South
    p_set: 40
lines:
  - name: N-S
    bus0: North
    bus1: South
    x: 0.1
    s_nom: 80
"#;

    #[test]
    fn builds_network_from_yaml() {
        let doc: NetworkDocument = serde_yaml::from_str(TWO_BUS).unwrap();
        let network = network_from_document(&doc).unwrap();
        assert_eq!(network.horizon(), 3);
        assert_eq!(network.buses().len(), 2);
        assert_eq!(network.bus_by_name("North").unwrap().x, Some(10.0));
        let wind = network.generator("Wind").unwrap();
        assert_eq!(wind.p_max_pu.at(0), 0.5);
        assert_eq!(wind.bus, BusId::new(0));
        assert!(network.validate().into_result().is_ok());
    }

    #[test]
    fn unknown_bus_reference_is_reported() {
        let text = TWO_BUS.replace("bus: South", "bus: Nowhere");
        let doc: NetworkDocument = serde_yaml::from_str(&text).unwrap();
        let err = network_from_document(&doc).unwrap_err();
        assert_eq!(err.to_string(), "unknown bus 'Nowhere'");
    }

    #[test]
    fn misspelled_field_is_rejected() {
        let text = TWO_BUS.replace("p_nom: 100", "pnom: 100");
        assert!(serde_yaml::from_str::<NetworkDocument>(&text).is_err());
    }

    #[test]
    fn document_survives_network_conversion() {
        let doc: NetworkDocument = serde_yaml::from_str(TWO_BUS).unwrap();
        let network = network_from_document(&doc).unwrap();
        let rebuilt = network_from_document(&document_from_network(&network)).unwrap();
        assert_eq!(rebuilt.snapshots, network.snapshots);
        assert_eq!(rebuilt.lines()[0], network.lines()[0]);
        assert_eq!(rebuilt.generators()[0], network.generators()[0]);
    }
}
