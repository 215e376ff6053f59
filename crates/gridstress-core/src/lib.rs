//! # gridstress-core: network model for scenario studies
//!
//! Networks are **undirected multigraphs** over snapshots:
//! - **Nodes**: buses, generators, loads and storage units. Only buses are
//!   connected by edges; the other nodes name their host bus.
//! - **Edges**: lines (impedance, DC power flow) and links (controllable
//!   transfer with an efficiency), parallel edges allowed.
//!
//! Every asset kind is its own typed record, so a generator without a host bus
//! or a line without a reactance cannot be constructed. A [`Network`] is a
//! plain value: `clone()` yields a deep copy that shares nothing with the
//! original, which is what scenario building relies on.
//!
//! ## Quick Start
//!
//! ```rust
//! use gridstress_core::*;
//!
//! let mut network = Network::new();
//! network.add_bus(Bus::new(BusId::new(0), "North"));
//! network.add_bus(Bus::new(BusId::new(1), "South"));
//! network
//!     .add_generator(
//!         Gen::new(GenId::new(0), "Wind", BusId::new(0))
//!             .with_capacity(100.0)
//!             .with_carrier("wind"),
//!     )
//!     .unwrap();
//! network
//!     .add_load(Load::new(LoadId::new(0), "City", BusId::new(1), 60.0))
//!     .unwrap();
//! network
//!     .add_line(Line::new(BranchId::new(0), "N-S", BusId::new(0), BusId::new(1), 0.1, 100.0))
//!     .unwrap();
//! assert!(network.validate().into_result().is_ok());
//! ```
//!
//! ## Modules
//!
//! - [`diagnostics`] - validation findings
//! - [`graph_utils`] - islands and topology statistics
//! - [`profile`] - per-snapshot values and snapshot windows
//! - [`snapshots`] - timestamps and weightings

use petgraph::{prelude::*, Undirected};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod profile;
pub mod snapshots;

pub use diagnostics::{Check, DiagnosticIssue, Diagnostics, Severity};
pub use error::{EntityKind, GridError, GridResult};
pub use graph_utils::{find_islands, graph_stats, GraphStats, Island};
pub use petgraph::graph::{EdgeIndex, NodeIndex};
pub use profile::{Profile, SnapshotWindow};
pub use snapshots::Snapshots;

macro_rules! id_type {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(usize);

            impl $name {
                #[inline]
                pub fn new(value: usize) -> Self {
                    $name(value)
                }
                #[inline]
                pub fn value(&self) -> usize {
                    self.0
                }
            }
        )*
    };
}

id_type!(BusId, BranchId, GenId, LoadId, StorageId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    pub carrier: String,
    /// Optional coordinates (longitude, latitude) for layout
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            id: BusId::new(0),
            name: String::new(),
            carrier: "AC".to_string(),
            x: None,
            y: None,
        }
    }
}

impl Bus {
    pub fn new(id: BusId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_coordinates(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }
}

/// Generating unit, including the high-cost units used as a load-shedding proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gen {
    pub id: GenId,
    pub name: String,
    pub bus: BusId,
    pub carrier: String,
    /// Installed capacity in MW (lower bound of the optimum when extendable)
    pub p_nom: f64,
    pub p_nom_extendable: bool,
    /// Upper bound on optimized capacity; `None` is unbounded
    pub p_nom_max: Option<f64>,
    /// Annualized cost per MW of optimized capacity
    pub capital_cost: f64,
    /// Cost per MWh of output
    pub marginal_cost: f64,
    /// Availability as a fraction of capacity, in [0, 1]
    pub p_max_pu: Profile,
    pub p_min_pu: Profile,
    /// Conversion efficiency from primary energy (for emissions accounting)
    pub efficiency: f64,
    pub in_service: bool,
}

impl Default for Gen {
    fn default() -> Self {
        Self {
            id: GenId::new(0),
            name: String::new(),
            bus: BusId::new(0),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_max: None,
            capital_cost: 0.0,
            marginal_cost: 0.0,
            p_max_pu: Profile::constant(1.0),
            p_min_pu: Profile::constant(0.0),
            efficiency: 1.0,
            in_service: true,
        }
    }
}

impl Gen {
    pub fn new(id: GenId, name: impl Into<String>, bus: BusId) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            ..Self::default()
        }
    }

    pub fn with_capacity(mut self, p_nom: f64) -> Self {
        self.p_nom = p_nom;
        self
    }

    pub fn with_marginal_cost(mut self, cost: f64) -> Self {
        self.marginal_cost = cost;
        self
    }

    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = carrier.into();
        self
    }

    pub fn with_availability(mut self, p_max_pu: impl Into<Profile>) -> Self {
        self.p_max_pu = p_max_pu.into();
        self
    }

    /// Let the optimizer size this unit at `capital_cost` per MW, up to `p_nom_max`.
    pub fn extendable(mut self, capital_cost: f64, p_nom_max: Option<f64>) -> Self {
        self.p_nom_extendable = true;
        self.capital_cost = capital_cost;
        self.p_nom_max = p_nom_max;
        self
    }

    /// Upper bound on output at snapshot `t`, `None` when capacity is unbounded.
    pub fn max_output(&self, t: usize) -> Option<f64> {
        if !self.in_service {
            return Some(0.0);
        }
        let capacity = if self.p_nom_extendable {
            self.p_nom_max?
        } else {
            self.p_nom
        };
        Some(capacity * self.p_max_pu.at(t))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub id: LoadId,
    pub name: String,
    pub bus: BusId,
    /// Requested active power in MW
    pub p_set: Profile,
}

impl Load {
    pub fn new(id: LoadId, name: impl Into<String>, bus: BusId, p_set: impl Into<Profile>) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            p_set: p_set.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageUnit {
    pub id: StorageId,
    pub name: String,
    pub bus: BusId,
    pub carrier: String,
    /// Power rating in MW (charge and discharge)
    pub p_nom: f64,
    pub p_nom_extendable: bool,
    pub p_nom_max: Option<f64>,
    pub capital_cost: f64,
    /// Cost per MWh dispatched
    pub marginal_cost: f64,
    /// Energy capacity in hours at full power
    pub max_hours: f64,
    pub efficiency_store: f64,
    pub efficiency_dispatch: f64,
    /// Initial state of charge in MWh
    pub state_of_charge_initial: f64,
    /// When set, the final state of charge must equal the initial one
    pub cyclic_state_of_charge: bool,
    pub in_service: bool,
}

impl Default for StorageUnit {
    fn default() -> Self {
        Self {
            id: StorageId::new(0),
            name: String::new(),
            bus: BusId::new(0),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_max: None,
            capital_cost: 0.0,
            marginal_cost: 0.0,
            max_hours: 1.0,
            efficiency_store: 1.0,
            efficiency_dispatch: 1.0,
            state_of_charge_initial: 0.0,
            cyclic_state_of_charge: false,
            in_service: true,
        }
    }
}

impl StorageUnit {
    pub fn new(id: StorageId, name: impl Into<String>, bus: BusId) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            ..Self::default()
        }
    }
}

/// AC line following the linearized (DC) power-flow law.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: BranchId,
    pub name: String,
    pub from_bus: BusId,
    pub to_bus: BusId,
    pub carrier: String,
    /// Series reactance (any consistent unit; only ratios between lines matter)
    pub reactance: f64,
    pub resistance: f64,
    /// Thermal rating in MVA (MW in the linear model)
    pub s_nom: f64,
    pub s_nom_extendable: bool,
    pub s_nom_max: Option<f64>,
    pub capital_cost: f64,
    pub s_max_pu: Profile,
    pub length: f64,
    pub in_service: bool,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            id: BranchId::new(0),
            name: String::new(),
            from_bus: BusId::new(0),
            to_bus: BusId::new(0),
            carrier: "AC".to_string(),
            reactance: 0.1,
            resistance: 0.0,
            s_nom: 0.0,
            s_nom_extendable: false,
            s_nom_max: None,
            capital_cost: 0.0,
            s_max_pu: Profile::constant(1.0),
            length: 1.0,
            in_service: true,
        }
    }
}

impl Line {
    pub fn new(
        id: BranchId,
        name: impl Into<String>,
        from_bus: BusId,
        to_bus: BusId,
        reactance: f64,
        s_nom: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            from_bus,
            to_bus,
            reactance,
            s_nom,
            ..Self::default()
        }
    }

    /// A line couples bus angles only while it is in service and can carry flow.
    pub fn is_closed(&self) -> bool {
        self.in_service && (self.s_nom_extendable || self.s_nom > 0.0)
    }
}

/// Controllable point-to-point transfer (HVDC corridor, converter, pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: BranchId,
    pub name: String,
    pub from_bus: BusId,
    pub to_bus: BusId,
    pub carrier: String,
    pub p_nom: f64,
    pub p_nom_extendable: bool,
    pub p_nom_max: Option<f64>,
    pub capital_cost: f64,
    pub marginal_cost: f64,
    /// Share of the power withdrawn at `from_bus` that arrives at `to_bus`
    pub efficiency: f64,
    pub p_max_pu: Profile,
    /// Negative values allow reverse flow; the default of zero makes the link one-way
    pub p_min_pu: Profile,
    pub length: f64,
    pub in_service: bool,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            id: BranchId::new(0),
            name: String::new(),
            from_bus: BusId::new(0),
            to_bus: BusId::new(0),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_max: None,
            capital_cost: 0.0,
            marginal_cost: 0.0,
            efficiency: 1.0,
            p_max_pu: Profile::constant(1.0),
            p_min_pu: Profile::constant(0.0),
            length: 1.0,
            in_service: true,
        }
    }
}

impl Link {
    pub fn new(
        id: BranchId,
        name: impl Into<String>,
        from_bus: BusId,
        to_bus: BusId,
        p_nom: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            from_bus,
            to_bus,
            p_nom,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub name: String,
    /// Tonnes of CO2 per MWh of primary energy
    #[serde(default)]
    pub co2_emissions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GlobalConstraint {
    /// Σ_t w_t Σ_g p[g,t] · co2(carrier) / efficiency ≤ limit
    PrimaryEnergyCap { name: String, limit: f64 },
    /// Σ length · capacity over lines and links of the listed carriers (all if empty) ≤ limit
    TransmissionVolumeLimit {
        name: String,
        #[serde(default)]
        carriers: Vec<String>,
        limit: f64,
    },
}

impl GlobalConstraint {
    pub fn name(&self) -> &str {
        match self {
            GlobalConstraint::PrimaryEnergyCap { name, .. } => name,
            GlobalConstraint::TransmissionVolumeLimit { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Bus(Bus),
    Gen(Gen),
    Load(Load),
    Storage(StorageUnit),
}

impl Node {
    pub fn label(&self) -> &str {
        match self {
            Node::Bus(bus) => &bus.name,
            Node::Gen(gen) => &gen.name,
            Node::Load(load) => &load.name,
            Node::Storage(unit) => &unit.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Edge {
    Line(Line),
    Link(Link),
}

impl Edge {
    pub fn name(&self) -> &str {
        match self {
            Edge::Line(line) => &line.name,
            Edge::Link(link) => &link.name,
        }
    }

    pub fn id(&self) -> BranchId {
        match self {
            Edge::Line(line) => line.id,
            Edge::Link(link) => link.id,
        }
    }

    pub fn endpoints(&self) -> (BusId, BusId) {
        match self {
            Edge::Line(line) => (line.from_bus, line.to_bus),
            Edge::Link(link) => (link.from_bus, link.to_bus),
        }
    }

    pub fn carrier(&self) -> &str {
        match self {
            Edge::Line(line) => &line.carrier,
            Edge::Link(link) => &link.carrier,
        }
    }

    pub fn in_service(&self) -> bool {
        match self {
            Edge::Line(line) => line.in_service,
            Edge::Link(link) => link.in_service,
        }
    }

    /// Nominal rating (s_nom for lines, p_nom for links).
    pub fn capacity(&self) -> f64 {
        match self {
            Edge::Line(line) => line.s_nom,
            Edge::Link(link) => link.p_nom,
        }
    }

    /// Take the branch out of service and drop its rating to zero.
    pub fn trip(&mut self) {
        match self {
            Edge::Line(line) => {
                line.s_nom = 0.0;
                line.s_nom_extendable = false;
                line.in_service = false;
            }
            Edge::Link(link) => {
                link.p_nom = 0.0;
                link.p_nom_extendable = false;
                link.in_service = false;
            }
        }
    }

    /// Whether the edge can carry power at all in the current description.
    pub fn is_active(&self) -> bool {
        match self {
            Edge::Line(line) => line.is_closed(),
            Edge::Link(link) => link.in_service && (link.p_nom_extendable || link.p_nom > 0.0),
        }
    }

    pub fn as_line(&self) -> Option<&Line> {
        match self {
            Edge::Line(line) => Some(line),
            Edge::Link(_) => None,
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Edge::Link(link) => Some(link),
            Edge::Line(_) => None,
        }
    }
}

/// Snapshot-indexed network description.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub graph: Graph<Node, Edge, Undirected>,
    pub snapshots: Snapshots,
    pub carriers: BTreeMap<String, Carrier>,
    pub global_constraints: Vec<GlobalConstraint>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshots(snapshots: Snapshots) -> Self {
        Self {
            snapshots,
            ..Self::default()
        }
    }

    /// Number of snapshots.
    pub fn horizon(&self) -> usize {
        self.snapshots.len()
    }

    pub fn add_bus(&mut self, bus: Bus) -> NodeIndex {
        self.graph.add_node(Node::Bus(bus))
    }

    pub fn add_generator(&mut self, gen: Gen) -> GridResult<NodeIndex> {
        self.bus_node(gen.bus)?;
        Ok(self.graph.add_node(Node::Gen(gen)))
    }

    pub fn add_load(&mut self, load: Load) -> GridResult<NodeIndex> {
        self.bus_node(load.bus)?;
        Ok(self.graph.add_node(Node::Load(load)))
    }

    pub fn add_storage(&mut self, unit: StorageUnit) -> GridResult<NodeIndex> {
        self.bus_node(unit.bus)?;
        Ok(self.graph.add_node(Node::Storage(unit)))
    }

    pub fn add_line(&mut self, line: Line) -> GridResult<EdgeIndex> {
        let from = self.bus_node(line.from_bus)?;
        let to = self.bus_node(line.to_bus)?;
        Ok(self.graph.add_edge(from, to, Edge::Line(line)))
    }

    pub fn add_link(&mut self, link: Link) -> GridResult<EdgeIndex> {
        let from = self.bus_node(link.from_bus)?;
        let to = self.bus_node(link.to_bus)?;
        Ok(self.graph.add_edge(from, to, Edge::Link(link)))
    }

    pub fn add_carrier(&mut self, carrier: Carrier) {
        self.carriers.insert(carrier.name.clone(), carrier);
    }

    /// Graph node holding the bus with this id.
    pub fn bus_node(&self, id: BusId) -> GridResult<NodeIndex> {
        self.graph
            .node_indices()
            .find(|idx| matches!(&self.graph[*idx], Node::Bus(bus) if bus.id == id))
            .ok_or_else(|| GridError::unknown(EntityKind::Bus, format!("#{}", id.value())))
    }

    pub fn bus(&self, id: BusId) -> Option<&Bus> {
        self.buses().into_iter().find(|bus| bus.id == id)
    }

    pub fn bus_by_name(&self, name: &str) -> Option<&Bus> {
        self.buses().into_iter().find(|bus| bus.name == name)
    }

    pub fn buses(&self) -> Vec<&Bus> {
        self.graph
            .node_weights()
            .filter_map(|node| match node {
                Node::Bus(bus) => Some(bus),
                _ => None,
            })
            .collect()
    }

    pub fn generators(&self) -> Vec<&Gen> {
        self.graph
            .node_weights()
            .filter_map(|node| match node {
                Node::Gen(gen) => Some(gen),
                _ => None,
            })
            .collect()
    }

    pub fn loads(&self) -> Vec<&Load> {
        self.graph
            .node_weights()
            .filter_map(|node| match node {
                Node::Load(load) => Some(load),
                _ => None,
            })
            .collect()
    }

    pub fn storage_units(&self) -> Vec<&StorageUnit> {
        self.graph
            .node_weights()
            .filter_map(|node| match node {
                Node::Storage(unit) => Some(unit),
                _ => None,
            })
            .collect()
    }

    pub fn branches(&self) -> Vec<&Edge> {
        self.graph.edge_weights().collect()
    }

    pub fn lines(&self) -> Vec<&Line> {
        self.graph.edge_weights().filter_map(Edge::as_line).collect()
    }

    pub fn links(&self) -> Vec<&Link> {
        self.graph.edge_weights().filter_map(Edge::as_link).collect()
    }

    pub fn generator(&self, name: &str) -> Option<&Gen> {
        self.generators().into_iter().find(|gen| gen.name == name)
    }

    pub fn generators_at_bus(&self, bus: BusId) -> Vec<&Gen> {
        self.generators()
            .into_iter()
            .filter(|gen| gen.bus == bus)
            .collect()
    }

    pub fn branch(&self, name: &str) -> Option<&Edge> {
        self.graph.edge_weights().find(|edge| edge.name() == name)
    }

    pub fn generator_mut(&mut self, name: &str) -> Option<&mut Gen> {
        self.graph.node_weights_mut().find_map(|node| match node {
            Node::Gen(gen) if gen.name == name => Some(gen),
            _ => None,
        })
    }

    pub fn load_mut(&mut self, name: &str) -> Option<&mut Load> {
        self.graph.node_weights_mut().find_map(|node| match node {
            Node::Load(load) if load.name == name => Some(load),
            _ => None,
        })
    }

    pub fn storage_mut(&mut self, name: &str) -> Option<&mut StorageUnit> {
        self.graph.node_weights_mut().find_map(|node| match node {
            Node::Storage(unit) if unit.name == name => Some(unit),
            _ => None,
        })
    }

    pub fn branch_mut(&mut self, name: &str) -> Option<&mut Edge> {
        self.graph
            .edge_weights_mut()
            .find(|edge| edge.name() == name)
    }

    pub fn next_generator_id(&self) -> GenId {
        let next = self
            .generators()
            .iter()
            .map(|gen| gen.id.value() + 1)
            .max()
            .unwrap_or(0);
        GenId::new(next)
    }

    /// Emission factor of a carrier; carriers without an entry emit nothing.
    pub fn co2_emissions(&self, carrier: &str) -> f64 {
        self.carriers
            .get(carrier)
            .map(|c| c.co2_emissions)
            .unwrap_or(0.0)
    }

    /// Check references, names and per-period data against the snapshot horizon.
    pub fn validate(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        let horizon = self.horizon();
        if horizon == 0 {
            diag.error(Check::Snapshots, "network has no snapshots");
        }

        let bus_ids: HashSet<BusId> = self.buses().iter().map(|bus| bus.id).collect();
        check_unique(&mut diag, "bus", self.buses().iter().map(|b| b.name.as_str()));
        check_unique(&mut diag, "generator", self.generators().iter().map(|g| g.name.as_str()));
        check_unique(&mut diag, "load", self.loads().iter().map(|l| l.name.as_str()));
        check_unique(
            &mut diag,
            "storage unit",
            self.storage_units().iter().map(|s| s.name.as_str()),
        );
        check_unique(&mut diag, "branch", self.branches().iter().map(|e| e.name()));

        for gen in self.generators() {
            if !bus_ids.contains(&gen.bus) {
                diag.error(Check::Reference, "host bus does not exist").on(&gen.name);
            }
            if gen.p_nom < 0.0 {
                diag.error(Check::Rating, "p_nom is negative").on(&gen.name);
            }
            if !(gen.efficiency > 0.0) {
                diag.error(Check::Efficiency, "efficiency must be positive").on(&gen.name);
            }
            let unit_range = Some((0.0, 1.0));
            check_profile(&mut diag, &gen.name, "p_max_pu", &gen.p_max_pu, horizon, unit_range);
            check_profile(&mut diag, &gen.name, "p_min_pu", &gen.p_min_pu, horizon, unit_range);
        }
        for load in self.loads() {
            if !bus_ids.contains(&load.bus) {
                diag.error(Check::Reference, "host bus does not exist").on(&load.name);
            }
            check_profile(&mut diag, &load.name, "p_set", &load.p_set, horizon, None);
        }
        for unit in self.storage_units() {
            if !bus_ids.contains(&unit.bus) {
                diag.error(Check::Reference, "host bus does not exist").on(&unit.name);
            }
            let efficiencies_ok = [unit.efficiency_store, unit.efficiency_dispatch]
                .iter()
                .all(|eta| *eta > 0.0 && *eta <= 1.0);
            if !efficiencies_ok {
                diag.error(Check::Efficiency, "storage efficiencies must lie in (0, 1]")
                    .on(&unit.name);
            }
            if unit.max_hours < 0.0 || unit.p_nom < 0.0 || unit.state_of_charge_initial < 0.0 {
                diag.error(Check::Rating, "storage ratings must be non-negative").on(&unit.name);
            }
        }
        for edge in self.branches() {
            let (from, to) = edge.endpoints();
            if !bus_ids.contains(&from) || !bus_ids.contains(&to) {
                diag.error(Check::Reference, "endpoint bus does not exist").on(edge.name());
            }
            if edge.capacity() < 0.0 {
                diag.error(Check::Rating, "rating is negative").on(edge.name());
            }
            match edge {
                Edge::Line(line) => {
                    if line.in_service && !(line.reactance > 0.0) {
                        diag.error(Check::Impedance, "reactance must be positive").on(&line.name);
                    }
                    let range = Some((0.0, 1.0));
                    check_profile(
                        &mut diag,
                        &line.name,
                        "s_max_pu",
                        &line.s_max_pu,
                        horizon,
                        range,
                    );
                }
                Edge::Link(link) => {
                    if !(link.efficiency > 0.0) {
                        diag.error(Check::Efficiency, "efficiency must be positive").on(&link.name);
                    }
                    let range = Some((-1.0, 1.0));
                    check_profile(
                        &mut diag,
                        &link.name,
                        "p_max_pu",
                        &link.p_max_pu,
                        horizon,
                        range,
                    );
                    check_profile(
                        &mut diag,
                        &link.name,
                        "p_min_pu",
                        &link.p_min_pu,
                        horizon,
                        range,
                    );
                }
            }
        }
        for constraint in &self.global_constraints {
            if let GlobalConstraint::PrimaryEnergyCap { name, .. } = constraint {
                if self.carriers.values().all(|c| c.co2_emissions == 0.0) {
                    diag.warning(
                        Check::Policy,
                        "no carrier declares co2_emissions; the cap never binds",
                    )
                    .on(name);
                }
            }
        }
        diag
    }
}

fn check_unique<'a>(diag: &mut Diagnostics, kind: &str, names: impl Iterator<Item = &'a str>) {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            diag.error(Check::Naming, format!("{kind} with an empty name"));
        } else if !seen.insert(name) {
            diag.error(Check::Naming, format!("duplicate {kind} name")).on(name);
        }
    }
}

fn check_profile(
    diag: &mut Diagnostics,
    entity: &str,
    field: &str,
    profile: &Profile,
    horizon: usize,
    bounds: Option<(f64, f64)>,
) {
    if let Some(len) = profile.series_len() {
        if len != horizon {
            diag.error(
                Check::Profile,
                format!("{field} has {len} values for {horizon} snapshots"),
            )
            .on(entity);
            return;
        }
    }
    if !profile.min_value().is_finite() || !profile.max_value().is_finite() {
        diag.error(Check::Profile, format!("{field} is not finite")).on(entity);
        return;
    }
    if let Some((lo, hi)) = bounds {
        if profile.min_value() < lo - 1e-9 || profile.max_value() > hi + 1e-9 {
            diag.error(Check::Profile, format!("{field} must stay within [{lo}, {hi}]")).on(entity);
        }
    }
}
