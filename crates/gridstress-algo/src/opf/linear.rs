//! Multi-period linear OPF assembled directly in Clarabel's conic form.
//!
//! Clarabel solves
//! ```text
//! minimize    q'x
//! subject to  Ax + s = b,  s ∈ K
//! ```
//! Equalities use the zero cone and `a'x <= b` rows the nonnegative cone.
//! With `P = 0` the problem is a plain LP. Per snapshot `t` with weighting
//! `w_t` the model holds:
//!
//! - generator output `p[g,t]` within `p_min_pu[t]·cap ..= p_max_pu[t]·cap`
//! - line flows with `x·f = θ_from - θ_to` and `|f| <= s_max_pu[t]·s_nom`
//! - link input `p0[k,t]`; `bus1` receives `efficiency·p0`
//! - storage dispatch, store and state of charge linked over time
//! - one balance row per bus, whose dual divided by `w_t` is the nodal price
//! - global CO2 and transmission-volume constraints
//!
//! Lines that are out of service or have no capacity are open: no flow
//! variable, no angle coupling.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use clarabel::{
    algebra::CscMatrix,
    solver::{DefaultSettingsBuilder, IPSolver, SolverStatus, SupportedConeT},
};
use gridstress_core::{find_islands, BusId, Edge, GlobalConstraint, Network};
use tracing::debug;

use super::types::{OpfSolution, SolveResult, SolverError};
use super::SolverSettings;

const CLEAN_EPS: f64 = 1e-9;

/// Capacity of an asset: a constant or an optimization variable.
#[derive(Debug, Clone, Copy)]
enum Cap {
    Fixed(f64),
    Var(usize),
}

/// Column-wise accumulation of the constraint matrix.
#[derive(Default)]
struct LinearProgram {
    columns: Vec<Vec<(usize, f64)>>,
    cost: Vec<f64>,
    rhs: Vec<f64>,
    cones: Vec<SupportedConeT<f64>>,
}

impl LinearProgram {
    fn var(&mut self, cost: f64) -> usize {
        self.columns.push(Vec::new());
        self.cost.push(cost);
        self.columns.len() - 1
    }

    fn n_var(&self) -> usize {
        self.columns.len()
    }

    fn push_row(&mut self, coeffs: &[(usize, f64)], b: f64) -> usize {
        let row = self.rhs.len();
        let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
        for &(col, val) in coeffs {
            *merged.entry(col).or_insert(0.0) += val;
        }
        for (col, val) in merged {
            if val != 0.0 {
                self.columns[col].push((row, val));
            }
        }
        self.rhs.push(b);
        row
    }

    /// Σ coeff·x = b
    fn push_eq(&mut self, coeffs: &[(usize, f64)], b: f64) -> usize {
        let row = self.push_row(coeffs, b);
        match self.cones.last_mut() {
            Some(SupportedConeT::ZeroConeT(n)) => *n += 1,
            _ => self.cones.push(SupportedConeT::ZeroConeT(1)),
        }
        row
    }

    /// Σ coeff·x <= b
    fn push_leq(&mut self, coeffs: &[(usize, f64)], b: f64) -> usize {
        let row = self.push_row(coeffs, b);
        match self.cones.last_mut() {
            Some(SupportedConeT::NonnegativeConeT(n)) => *n += 1,
            _ => self.cones.push(SupportedConeT::NonnegativeConeT(1)),
        }
        row
    }

    fn lower_bound(&mut self, var: usize, lb: f64) {
        self.push_leq(&[(var, -1.0)], -lb);
    }

    fn upper_bound(&mut self, var: usize, ub: f64) {
        self.push_leq(&[(var, 1.0)], ub);
    }

    /// Σ terms <= pu · cap
    fn push_le_cap(&mut self, terms: &[(usize, f64)], pu: f64, cap: Cap) {
        match cap {
            Cap::Fixed(value) => {
                self.push_leq(terms, pu * value);
            }
            Cap::Var(c) => {
                let mut coeffs = terms.to_vec();
                coeffs.push((c, -pu));
                self.push_leq(&coeffs, 0.0);
            }
        }
    }

    /// var >= pu · cap
    fn push_ge_cap(&mut self, var: usize, pu: f64, cap: Cap) {
        match cap {
            Cap::Fixed(value) => self.lower_bound(var, pu * value),
            Cap::Var(c) => {
                self.push_leq(&[(var, -1.0), (c, pu)], 0.0);
            }
        }
    }

    fn capacity(
        &mut self,
        extendable: bool,
        nominal: f64,
        max: Option<f64>,
        capital_cost: f64,
    ) -> Cap {
        if !extendable {
            return Cap::Fixed(nominal);
        }
        let c = self.var(capital_cost);
        self.lower_bound(c, nominal);
        if let Some(max) = max {
            self.upper_bound(c, max);
        }
        Cap::Var(c)
    }

    fn constraint_matrix(&mut self) -> CscMatrix<f64> {
        let n_rows = self.rhs.len();
        let mut col_ptr = Vec::with_capacity(self.n_var() + 1);
        let mut row_idx = Vec::new();
        let mut values = Vec::new();
        for column in &mut self.columns {
            col_ptr.push(row_idx.len());
            column.sort_by_key(|(r, _)| *r);
            for &(r, v) in column.iter() {
                row_idx.push(r);
                values.push(v);
            }
        }
        col_ptr.push(row_idx.len());
        CscMatrix::new(n_rows, self.n_var(), col_ptr, row_idx, values)
    }
}

/// Variable indices needed to read the solution back.
struct Layout {
    generators: Vec<(String, String, Vec<usize>, Cap)>,
    lines: BTreeMap<String, (Vec<usize>, Cap)>,
    links: BTreeMap<String, (Vec<usize>, Cap)>,
    storage: Vec<(String, Vec<usize>, Vec<usize>, Vec<usize>, Cap)>,
    /// Balance row per (snapshot, bus name); `None` when the bus has no terms
    balance_rows: Vec<BTreeMap<String, Option<usize>>>,
}

/// Solve the linear OPF of `network`.
///
/// Returns `Ok(SolveResult::Infeasible)` for proven infeasibility (including
/// demand stranded on an island without supply) and `Err` for every other
/// failure.
pub fn solve_linear_opf(
    network: &Network,
    settings: &SolverSettings,
) -> Result<SolveResult, SolverError> {
    let start = Instant::now();
    network.validate().into_result()?;

    if let Some(reason) = stranded_demand(network) {
        debug!(%reason, "structural infeasibility");
        return Ok(SolveResult::Infeasible { reason });
    }

    let horizon = network.horizon();
    let weightings: Vec<f64> = (0..horizon).map(|t| network.snapshots.weighting(t)).collect();
    let mut lp = LinearProgram::default();

    // injections[t][bus] collects the balance terms of every asset at that bus
    let mut injections: Vec<BTreeMap<BusId, Vec<(usize, f64)>>> = vec![BTreeMap::new(); horizon];

    let mut generators = Vec::new();
    for gen in network.generators() {
        let cap = if gen.in_service {
            lp.capacity(gen.p_nom_extendable, gen.p_nom, gen.p_nom_max, gen.capital_cost)
        } else {
            Cap::Fixed(0.0)
        };
        let mut vars = Vec::with_capacity(horizon);
        for (t, w) in weightings.iter().enumerate() {
            let p = lp.var(w * gen.marginal_cost);
            lp.push_le_cap(&[(p, 1.0)], gen.p_max_pu.at(t), cap);
            lp.push_ge_cap(p, gen.p_min_pu.at(t), cap);
            injections[t].entry(gen.bus).or_default().push((p, 1.0));
            vars.push(p);
        }
        generators.push((gen.name.clone(), gen.carrier.clone(), vars, cap));
    }

    // one angle reference per island of closed lines; references get no variable
    let line_islands =
        find_islands(network, |edge| matches!(edge, Edge::Line(line) if line.is_closed()));
    let mut theta: Vec<BTreeMap<BusId, usize>> = vec![BTreeMap::new(); horizon];
    for island in line_islands.iter().filter(|island| island.buses.len() > 1) {
        for bus in island.buses.iter().skip(1) {
            for angles in theta.iter_mut() {
                angles.insert(*bus, lp.var(0.0));
            }
        }
    }

    let mut lines = BTreeMap::new();
    for line in network.lines().into_iter().filter(|line| line.is_closed()) {
        let cap = lp.capacity(line.s_nom_extendable, line.s_nom, line.s_nom_max, line.capital_cost);
        let mut vars = Vec::with_capacity(horizon);
        for t in 0..horizon {
            let f = lp.var(0.0);
            let mut kvl = vec![(f, line.reactance)];
            if let Some(&th) = theta[t].get(&line.from_bus) {
                kvl.push((th, -1.0));
            }
            if let Some(&th) = theta[t].get(&line.to_bus) {
                kvl.push((th, 1.0));
            }
            lp.push_eq(&kvl, 0.0);
            let pu = line.s_max_pu.at(t);
            lp.push_le_cap(&[(f, 1.0)], pu, cap);
            lp.push_le_cap(&[(f, -1.0)], pu, cap);
            injections[t].entry(line.from_bus).or_default().push((f, -1.0));
            injections[t].entry(line.to_bus).or_default().push((f, 1.0));
            vars.push(f);
        }
        lines.insert(line.name.clone(), (vars, cap));
    }

    let mut links = BTreeMap::new();
    for link in network.links() {
        if !(link.in_service && (link.p_nom_extendable || link.p_nom > 0.0)) {
            continue;
        }
        let cap = lp.capacity(link.p_nom_extendable, link.p_nom, link.p_nom_max, link.capital_cost);
        let mut vars = Vec::with_capacity(horizon);
        for (t, w) in weightings.iter().enumerate() {
            let p0 = lp.var(w * link.marginal_cost);
            lp.push_le_cap(&[(p0, 1.0)], link.p_max_pu.at(t), cap);
            lp.push_ge_cap(p0, link.p_min_pu.at(t), cap);
            injections[t].entry(link.from_bus).or_default().push((p0, -1.0));
            injections[t]
                .entry(link.to_bus)
                .or_default()
                .push((p0, link.efficiency));
            vars.push(p0);
        }
        links.insert(link.name.clone(), (vars, cap));
    }

    let mut storage = Vec::new();
    for unit in network.storage_units().into_iter().filter(|unit| unit.in_service) {
        let cap = lp.capacity(unit.p_nom_extendable, unit.p_nom, unit.p_nom_max, unit.capital_cost);
        let mut dispatch = Vec::with_capacity(horizon);
        let mut store = Vec::with_capacity(horizon);
        let mut soc = Vec::with_capacity(horizon);
        for (t, w) in weightings.iter().enumerate() {
            let d = lp.var(w * unit.marginal_cost);
            let c = lp.var(0.0);
            let e = lp.var(0.0);
            for v in [d, c, e] {
                lp.lower_bound(v, 0.0);
            }
            lp.push_le_cap(&[(d, 1.0)], 1.0, cap);
            lp.push_le_cap(&[(c, 1.0)], 1.0, cap);
            lp.push_le_cap(&[(e, 1.0)], unit.max_hours, cap);
            let host = injections[t].entry(unit.bus).or_default();
            host.push((d, 1.0));
            host.push((c, -1.0));
            dispatch.push(d);
            store.push(c);
            soc.push(e);
        }
        for (t, w) in weightings.iter().enumerate() {
            let mut row = vec![
                (soc[t], 1.0),
                (store[t], -w * unit.efficiency_store),
                (dispatch[t], w / unit.efficiency_dispatch),
            ];
            let mut b = 0.0;
            if t > 0 {
                row.push((soc[t - 1], -1.0));
            } else if unit.cyclic_state_of_charge {
                row.push((soc[horizon - 1], -1.0));
            } else {
                b = unit.state_of_charge_initial;
            }
            lp.push_eq(&row, b);
        }
        storage.push((unit.name.clone(), dispatch, store, soc, cap));
    }

    let mut balance_rows = Vec::with_capacity(horizon);
    for t in 0..horizon {
        let mut rows = BTreeMap::new();
        for bus in network.buses() {
            let demand: f64 = network
                .loads()
                .iter()
                .filter(|load| load.bus == bus.id)
                .map(|load| load.p_set.at(t))
                .sum();
            let terms = injections[t].get(&bus.id).cloned().unwrap_or_default();
            let row = if terms.is_empty() {
                if demand.abs() > CLEAN_EPS {
                    return Ok(SolveResult::Infeasible {
                        reason: format!(
                            "bus '{}' has demand {demand:.3} MW and no connected asset",
                            bus.name
                        ),
                    });
                }
                None
            } else {
                Some(lp.push_eq(&terms, demand))
            };
            rows.insert(bus.name.clone(), row);
        }
        balance_rows.push(rows);
    }

    if let Some(reason) =
        add_global_constraints(network, &mut lp, &weightings, &generators, &lines, &links)
    {
        return Ok(SolveResult::Infeasible { reason });
    }

    let layout = Layout {
        generators,
        lines,
        links,
        storage,
        balance_rows,
    };

    if lp.n_var() == 0 {
        let solution = read_solution(network, &layout, &lp, &[], &[], &weightings, 0, start);
        return Ok(SolveResult::Feasible(solution));
    }

    let n_var = lp.n_var();
    let a_mat = lp.constraint_matrix();
    let p_mat = CscMatrix::new(n_var, n_var, vec![0; n_var + 1], Vec::new(), Vec::new());

    let mut builder = DefaultSettingsBuilder::default();
    builder.verbose(false).max_iter(settings.max_iter);
    if let Some(limit) = settings.time_limit_secs {
        builder.time_limit(limit);
    }
    let clarabel_settings = builder
        .build()
        .map_err(|e| SolverError::Fault(format!("Clarabel settings error: {e:?}")))?;

    let mut solver = clarabel::solver::DefaultSolver::new(
        &p_mat,
        &lp.cost,
        &a_mat,
        &lp.rhs,
        &lp.cones,
        clarabel_settings,
    )
    .map_err(|e| SolverError::Fault(format!("Clarabel initialization failed: {e:?}")))?;
    solver.solve();

    let sol = solver.solution;
    debug!(
        status = ?sol.status,
        iterations = sol.iterations,
        variables = n_var,
        rows = lp.rhs.len(),
        "clarabel finished"
    );
    match sol.status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => {}
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            return Ok(SolveResult::Infeasible {
                reason: format!("solver proved infeasibility ({:?})", sol.status),
            });
        }
        SolverStatus::MaxTime => {
            return Err(SolverError::Timeout {
                seconds: settings.time_limit_secs.unwrap_or(f64::INFINITY),
            });
        }
        other => {
            return Err(SolverError::Fault(format!("Clarabel returned status {other:?}")));
        }
    }

    let solution = read_solution(
        network,
        &layout,
        &lp,
        &sol.x,
        &sol.z,
        &weightings,
        sol.iterations,
        start,
    );
    Ok(SolveResult::Feasible(solution))
}

/// Adds the global constraint rows. Returns a reason when a constraint can
/// never hold (no adjustable term and a violated constant part).
fn add_global_constraints(
    network: &Network,
    lp: &mut LinearProgram,
    weightings: &[f64],
    generators: &[(String, String, Vec<usize>, Cap)],
    lines: &BTreeMap<String, (Vec<usize>, Cap)>,
    links: &BTreeMap<String, (Vec<usize>, Cap)>,
) -> Option<String> {
    for constraint in &network.global_constraints {
        let (terms, rhs) = match constraint {
            GlobalConstraint::PrimaryEnergyCap { limit, .. } => {
                let mut terms = Vec::new();
                for (name, carrier, vars, _) in generators {
                    let emissions = network.co2_emissions(carrier);
                    if emissions == 0.0 {
                        continue;
                    }
                    let efficiency = network.generator(name).map(|g| g.efficiency).unwrap_or(1.0);
                    for (t, p) in vars.iter().enumerate() {
                        terms.push((*p, weightings[t] * emissions / efficiency));
                    }
                }
                (terms, *limit)
            }
            GlobalConstraint::TransmissionVolumeLimit { carriers, limit, .. } => {
                let selected =
                    |carrier: &str| carriers.is_empty() || carriers.iter().any(|c| c == carrier);
                let mut terms = Vec::new();
                for edge in network.branches() {
                    if !selected(edge.carrier()) {
                        continue;
                    }
                    let (cap, length) = match edge {
                        Edge::Line(line) => {
                            (lines.get(&line.name).map(|(_, cap)| *cap), line.length)
                        }
                        Edge::Link(link) => {
                            (links.get(&link.name).map(|(_, cap)| *cap), link.length)
                        }
                    };
                    if let Some(Cap::Var(c)) = cap {
                        terms.push((c, length));
                    }
                }
                (terms, *limit)
            }
        };
        if terms.is_empty() {
            if rhs < 0.0 {
                return Some(format!(
                    "global constraint '{}' has a negative limit and nothing to adjust",
                    constraint.name()
                ));
            }
            continue;
        }
        lp.push_leq(&terms, rhs);
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn read_solution(
    network: &Network,
    layout: &Layout,
    lp: &LinearProgram,
    x: &[f64],
    z: &[f64],
    weightings: &[f64],
    iterations: u32,
    start: Instant,
) -> OpfSolution {
    let value = |i: usize| clean(x.get(i).copied().unwrap_or(0.0));
    let horizon = weightings.len();
    let mut solution = OpfSolution {
        objective: lp.cost.iter().enumerate().map(|(i, c)| c * value(i)).sum(),
        snapshot_weightings: weightings.to_vec(),
        iterations,
        ..Default::default()
    };

    for (name, carrier, vars, cap) in &layout.generators {
        solution
            .generator_dispatch
            .insert(name.clone(), vars.iter().map(|v| value(*v)).collect());
        solution.generator_carrier.insert(name.clone(), carrier.clone());
        if let Cap::Var(c) = cap {
            solution.optimal_capacity.insert(name.clone(), value(*c));
        }
    }

    for edge in network.branches() {
        let name = edge.name().to_string();
        let entry = match edge {
            Edge::Line(_) => layout.lines.get(&name),
            Edge::Link(_) => layout.links.get(&name),
        };
        let flows = match entry {
            Some((vars, cap)) => {
                if let Cap::Var(c) = cap {
                    solution.optimal_capacity.insert(name.clone(), value(*c));
                }
                vars.iter().map(|v| value(*v)).collect()
            }
            None => vec![0.0; horizon],
        };
        solution.branch_flows.insert(name, flows);
    }

    for (name, dispatch, store, soc, cap) in &layout.storage {
        let net = dispatch
            .iter()
            .zip(store)
            .map(|(d, c)| clean(value(*d) - value(*c)))
            .collect();
        solution.storage_dispatch.insert(name.clone(), net);
        solution
            .storage_state_of_charge
            .insert(name.clone(), soc.iter().map(|v| value(*v)).collect());
        if let Cap::Var(c) = cap {
            solution.optimal_capacity.insert(name.clone(), value(*c));
        }
    }
    let in_service: HashSet<&str> = layout.storage.iter().map(|s| s.0.as_str()).collect();
    for unit in network.storage_units() {
        if !in_service.contains(unit.name.as_str()) {
            solution.storage_dispatch.insert(unit.name.clone(), vec![0.0; horizon]);
            solution
                .storage_state_of_charge
                .insert(unit.name.clone(), vec![0.0; horizon]);
        }
    }

    for (t, rows) in layout.balance_rows.iter().enumerate() {
        for (bus, row) in rows {
            let price = row
                .and_then(|r| z.get(r).copied())
                .map(|dual| clean(-dual / weightings[t]))
                .unwrap_or(0.0);
            solution
                .nodal_prices
                .entry(bus.clone())
                .or_insert_with(|| Vec::with_capacity(horizon))
                .push(price);
        }
    }

    solution.solve_time_ms = start.elapsed().as_millis() as u64;
    solution
}

fn clean(value: f64) -> f64 {
    if value.abs() < CLEAN_EPS {
        0.0
    } else {
        value
    }
}

/// Islands (over active lines and links) with positive demand but no asset
/// able to supply it.
fn stranded_demand(network: &Network) -> Option<String> {
    let horizon = network.horizon();
    for island in find_islands(network, Edge::is_active) {
        let members: HashSet<BusId> = island.buses.iter().copied().collect();
        let peak_demand = (0..horizon)
            .map(|t| {
                network
                    .loads()
                    .iter()
                    .filter(|load| members.contains(&load.bus))
                    .map(|load| load.p_set.at(t))
                    .sum::<f64>()
            })
            .fold(0.0, f64::max);
        if peak_demand <= CLEAN_EPS {
            continue;
        }
        // unbounded extendable units count when they are ever available
        let has_generation = network.generators().iter().any(|gen| {
            members.contains(&gen.bus)
                && (0..horizon).any(|t| {
                    gen.max_output(t)
                        .map_or(gen.p_max_pu.at(t) > 0.0, |cap| cap > CLEAN_EPS)
                })
        });
        let has_storage = network.storage_units().iter().any(|unit| {
            members.contains(&unit.bus)
                && unit.in_service
                && (unit.p_nom_extendable || unit.p_nom > 0.0)
        });
        if !has_generation && !has_storage {
            let names: Vec<&str> = island
                .buses
                .iter()
                .filter_map(|id| network.bus(*id).map(|bus| bus.name.as_str()))
                .collect();
            return Some(format!(
                "island [{}] has {peak_demand:.3} MW of demand and no supply",
                names.join(", ")
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::five_bus;
    use gridstress_core::{
        Bus, BranchId, Carrier, Gen, GenId, Line, Link, Load, LoadId, Profile, Snapshots,
        StorageId, StorageUnit,
    };

    const TOL: f64 = 1e-3;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= TOL * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    fn feasible(network: &Network) -> OpfSolution {
        match solve_linear_opf(network, &SolverSettings::default()).unwrap() {
            SolveResult::Feasible(solution) => solution,
            SolveResult::Infeasible { reason } => panic!("unexpected infeasibility: {reason}"),
        }
    }

    #[test]
    fn five_bus_merit_order_dispatch() {
        let solution = feasible(&five_bus().unwrap());
        assert_close(solution.objective, 4600.0);
        assert_close(solution.dispatch("G0").unwrap()[0], 100.0);
        assert_close(solution.dispatch("G1").unwrap()[0], 60.0);
        assert_close(solution.dispatch("G2").unwrap()[0], 40.0);
        assert_close(solution.dispatch("G3").unwrap()[0], 0.0);
    }

    #[test]
    fn five_bus_flows_follow_reactances() {
        let solution = feasible(&five_bus().unwrap());
        assert_close(solution.flow("Line_0_1").unwrap()[0], 57.5);
        assert_close(solution.flow("Line_1_2").unwrap()[0], -12.5);
        assert_close(solution.flow("Line_2_3").unwrap()[0], -2.5);
        assert_close(solution.flow("Line_3_0").unwrap()[0], -42.5);
        assert_close(solution.flow("Line_1_4").unwrap()[0], 80.0);
    }

    #[test]
    fn uncongested_prices_equal_marginal_unit() {
        let solution = feasible(&five_bus().unwrap());
        for (bus, prices) in &solution.nodal_prices {
            assert!((prices[0] - 50.0).abs() < 1e-2, "{bus}: {}", prices[0]);
        }
    }

    #[test]
    fn stranded_load_is_infeasible() {
        let mut network = five_bus().unwrap();
        network.branch_mut("Line_1_4").unwrap().trip();
        let result = solve_linear_opf(&network, &SolverSettings::default()).unwrap();
        match result {
            SolveResult::Infeasible { reason } => assert!(reason.contains("Bus 4"), "{reason}"),
            SolveResult::Feasible(_) => panic!("bus 4 cannot be served"),
        }
    }

    #[test]
    fn insufficient_capacity_is_infeasible() {
        let mut network = five_bus().unwrap();
        network.load_mut("Load4").unwrap().p_set = Profile::constant(500.0);
        let result = solve_linear_opf(&network, &SolverSettings::default()).unwrap();
        assert!(!result.is_feasible());
    }

    #[test]
    fn invalid_network_is_an_error() {
        let mut network = five_bus().unwrap();
        network.load_mut("Load1").unwrap().p_set = Profile::Series(vec![1.0, 2.0, 3.0]);
        let err = solve_linear_opf(&network, &SolverSettings::default()).unwrap_err();
        assert!(matches!(err, SolverError::InvalidNetwork(_)));
    }

    fn two_period_hub() -> Network {
        let start = "2025-01-01T00:00:00Z".parse().unwrap();
        let mut network = Network::with_snapshots(Snapshots::hourly(start, 2));
        network.add_bus(Bus::new(BusId::new(0), "Hub"));
        network.add_bus(Bus::new(BusId::new(1), "Town"));
        network
            .add_generator(
                Gen::new(GenId::new(0), "Solar", BusId::new(0))
                    .with_capacity(100.0)
                    .with_carrier("solar")
                    .with_availability(vec![1.0, 0.0]),
            )
            .unwrap();
        network
            .add_generator(
                Gen::new(GenId::new(1), "Peaker", BusId::new(1))
                    .with_capacity(100.0)
                    .with_marginal_cost(80.0)
                    .with_carrier("gas"),
            )
            .unwrap();
        network
            .add_load(Load::new(LoadId::new(0), "Town", BusId::new(1), 40.0))
            .unwrap();
        network
            .add_link(Link::new(BranchId::new(0), "Feeder", BusId::new(0), BusId::new(1), 100.0))
            .unwrap();
        network
    }

    #[test]
    fn storage_shifts_cheap_energy() {
        let mut network = two_period_hub();
        let mut battery = StorageUnit::new(StorageId::new(0), "Battery", BusId::new(0));
        battery.p_nom = 50.0;
        battery.max_hours = 2.0;
        network.add_storage(battery).unwrap();
        let solution = feasible(&network);
        // solar charges the battery in hour 0 and the battery covers hour 1
        assert_close(solution.dispatch("Peaker").unwrap()[1], 0.0);
        assert!(solution.storage_state_of_charge["Battery"][0] >= 40.0 - TOL);
        assert_close(solution.storage_dispatch["Battery"][1], 40.0);
        assert_close(solution.objective, 0.0);
    }

    #[test]
    fn link_efficiency_scales_delivery() {
        let mut network = two_period_hub();
        if let Some(Edge::Link(link)) = network.branch_mut("Feeder") {
            link.efficiency = 0.8;
        }
        let solution = feasible(&network);
        assert_close(solution.flow("Feeder").unwrap()[0], 50.0);
        assert_close(solution.dispatch("Solar").unwrap()[0], 50.0);
    }

    #[test]
    fn co2_cap_limits_emitting_units() {
        let mut network = two_period_hub();
        network.add_carrier(Carrier {
            name: "gas".into(),
            co2_emissions: 0.5,
        });
        network.global_constraints.push(GlobalConstraint::PrimaryEnergyCap {
            name: "co2".into(),
            limit: 10.0,
        });
        // hour 1 needs 40 MWh of gas (20 t) against a 10 t cap
        let result = solve_linear_opf(&network, &SolverSettings::default()).unwrap();
        assert!(!result.is_feasible());
    }

    #[test]
    fn extendable_line_is_sized_to_need() {
        let mut network = Network::new();
        network.add_bus(Bus::new(BusId::new(0), "A"));
        network.add_bus(Bus::new(BusId::new(1), "B"));
        network
            .add_generator(
                Gen::new(GenId::new(0), "Cheap", BusId::new(0))
                    .with_capacity(100.0)
                    .with_marginal_cost(10.0),
            )
            .unwrap();
        network
            .add_generator(
                Gen::new(GenId::new(1), "Dear", BusId::new(1))
                    .with_capacity(100.0)
                    .with_marginal_cost(100.0),
            )
            .unwrap();
        network
            .add_load(Load::new(LoadId::new(0), "L", BusId::new(1), 60.0))
            .unwrap();
        let mut line = Line::new(BranchId::new(0), "A-B", BusId::new(0), BusId::new(1), 0.1, 10.0);
        line.s_nom_extendable = true;
        line.capital_cost = 5.0;
        network.add_line(line).unwrap();
        let solution = feasible(&network);
        assert_close(solution.optimal_capacity["A-B"], 60.0);
        assert_close(solution.objective, 60.0 * 10.0 + 60.0 * 5.0);
    }

    fn lone_bus(gen: Gen) -> Network {
        let mut network = Network::new();
        network.add_bus(Bus::new(BusId::new(0), "Island"));
        network.add_generator(gen).unwrap();
        network
            .add_load(Load::new(LoadId::new(0), "L", BusId::new(0), 30.0))
            .unwrap();
        network
    }

    #[test]
    fn unbounded_extendable_unit_supplies_its_island() {
        let gen = Gen::new(GenId::new(0), "New", BusId::new(0)).extendable(20.0, None);
        assert_eq!(stranded_demand(&lone_bus(gen.clone())), None);

        let mut parked = gen.with_availability(vec![0.0]);
        parked.p_nom = 0.0;
        let reason = stranded_demand(&lone_bus(parked)).unwrap();
        assert!(reason.contains("Island"), "{reason}");
    }

    #[test]
    fn open_line_reports_zero_flow() {
        let mut network = five_bus().unwrap();
        network.branch_mut("Line_2_3").unwrap().trip();
        let solution = feasible(&network);
        assert_eq!(solution.flow("Line_2_3").unwrap(), &[0.0]);
        assert_close(solution.objective, 4600.0);
    }
}
