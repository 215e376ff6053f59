use crate::{BusId, Edge, Network, Node};
use petgraph::visit::EdgeRef;
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Topology summary printed by `gridstress inspect`.
#[derive(Debug)]
pub struct GraphStats {
    pub bus_count: usize,
    pub branch_count: usize,
    pub active_branch_count: usize,
    pub generator_count: usize,
    pub load_count: usize,
    pub storage_count: usize,
    pub snapshot_count: usize,
    /// Islands formed by active branches
    pub islands: usize,
    pub min_degree: usize,
    pub avg_degree: f64,
    pub max_degree: usize,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Buses         : {}", self.bus_count)?;
        writeln!(
            f,
            "  Branches      : {} ({} active)",
            self.branch_count, self.active_branch_count
        )?;
        writeln!(f, "  Generators    : {}", self.generator_count)?;
        writeln!(f, "  Loads         : {}", self.load_count)?;
        writeln!(f, "  Storage units : {}", self.storage_count)?;
        writeln!(f, "  Snapshots     : {}", self.snapshot_count)?;
        writeln!(f, "  Islands       : {}", self.islands)?;
        write!(
            f,
            "  Degree [min/avg/max]: {}/{:.2}/{}",
            self.min_degree, self.avg_degree, self.max_degree
        )
    }
}

/// Buses reachable from each other through the selected branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Island {
    pub id: usize,
    /// Member buses in graph order; the first one serves as angle reference
    pub buses: Vec<BusId>,
}

pub fn graph_stats(network: &Network) -> GraphStats {
    let mut degrees = Vec::new();
    for idx in network.graph.node_indices() {
        if matches!(network.graph[idx], Node::Bus(_)) {
            degrees.push(network.graph.edges(idx).count());
        }
    }
    let bus_count = degrees.len();
    let avg_degree = if bus_count == 0 {
        0.0
    } else {
        degrees.iter().sum::<usize>() as f64 / bus_count as f64
    };
    GraphStats {
        bus_count,
        branch_count: network.graph.edge_count(),
        active_branch_count: network.graph.edge_weights().filter(|e| e.is_active()).count(),
        generator_count: network.generators().len(),
        load_count: network.loads().len(),
        storage_count: network.storage_units().len(),
        snapshot_count: network.horizon(),
        islands: find_islands(network, Edge::is_active).len(),
        min_degree: degrees.iter().copied().min().unwrap_or(0),
        avg_degree,
        max_degree: degrees.iter().copied().max().unwrap_or(0),
    }
}

/// Breadth-first labelling of bus islands, traversing only edges accepted by
/// `traverse`. Islands are numbered in order of their first bus in the graph,
/// so the result is stable for a given network.
pub fn find_islands<F>(network: &Network, traverse: F) -> Vec<Island>
where
    F: Fn(&Edge) -> bool,
{
    let mut visited = HashSet::new();
    let mut islands = Vec::new();
    for start in network.graph.node_indices() {
        if !matches!(network.graph[start], Node::Bus(_)) || visited.contains(&start) {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(node);
            for edge in network.graph.edges(node) {
                if !traverse(edge.weight()) {
                    continue;
                }
                let other = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                if !visited.contains(&other) {
                    queue.push_back(other);
                }
            }
        }
        members.sort_by_key(|idx| idx.index());
        let buses = members
            .into_iter()
            .filter_map(|idx| match &network.graph[idx] {
                Node::Bus(bus) => Some(bus.id),
                _ => None,
            })
            .collect();
        islands.push(Island {
            id: islands.len(),
            buses,
        });
    }
    islands
}
