use gridstress_core::{
    Edge, EntityKind, Gen, GridError, GridResult, Network, Profile, SnapshotWindow,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::spec::Scenario;

/// One modification applied to a copy of the base network.
///
/// Entities are referenced by name; branches and generators may also be
/// referenced by their numeric id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Perturbation {
    /// Trip a line or link: zero capacity, out of service.
    BranchOutage { branch: String },
    /// Multiply a generator's `p_max_pu`, over `[start, end)` when a window is given.
    ScaleAvailability {
        generator: String,
        factor: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window: Option<SnapshotWindow>,
    },
    /// Replace a load's demand with a new constant or per-snapshot series.
    ReplaceDemand { load: String, p_set: Profile },
    ScaleDemand {
        load: String,
        factor: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window: Option<SnapshotWindow>,
    },
    /// Force a generator's availability to zero.
    GeneratorOutage {
        generator: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window: Option<SnapshotWindow>,
    },
    StorageOutage { storage: String },
    /// Derate a branch by scaling `s_max_pu` (lines) or `p_max_pu` (links).
    ScaleBranchCapacity {
        branch: String,
        factor: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window: Option<SnapshotWindow>,
    },
}

impl Perturbation {
    pub fn branch_outage(branch: impl Into<String>) -> Self {
        Perturbation::BranchOutage {
            branch: branch.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Perturbation::BranchOutage { .. } => "branch_outage",
            Perturbation::ScaleAvailability { .. } => "scale_availability",
            Perturbation::ReplaceDemand { .. } => "replace_demand",
            Perturbation::ScaleDemand { .. } => "scale_demand",
            Perturbation::GeneratorOutage { .. } => "generator_outage",
            Perturbation::StorageOutage { .. } => "storage_outage",
            Perturbation::ScaleBranchCapacity { .. } => "scale_branch_capacity",
        }
    }

    /// Name of the entity this perturbation touches.
    pub fn target(&self) -> &str {
        match self {
            Perturbation::BranchOutage { branch }
            | Perturbation::ScaleBranchCapacity { branch, .. } => branch,
            Perturbation::ScaleAvailability { generator, .. }
            | Perturbation::GeneratorOutage { generator, .. } => generator,
            Perturbation::ReplaceDemand { load, .. } | Perturbation::ScaleDemand { load, .. } => {
                load
            }
            Perturbation::StorageOutage { storage } => storage,
        }
    }
}

impl fmt::Display for Perturbation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.target())?;
        match self {
            Perturbation::ScaleAvailability { factor, window, .. }
            | Perturbation::ScaleDemand { factor, window, .. }
            | Perturbation::ScaleBranchCapacity { factor, window, .. } => {
                write!(f, " x{factor}")?;
                if let Some(w) = window {
                    write!(f, " @[{}, {})", w.start, w.end)?;
                }
            }
            Perturbation::GeneratorOutage {
                window: Some(w), ..
            } => write!(f, " @[{}, {})", w.start, w.end)?,
            _ => {}
        }
        Ok(())
    }
}

/// Apply one perturbation to an independent copy of `base`.
///
/// `base` is only read; the returned network shares nothing with it. Fails
/// with [`GridError::UnknownEntity`] when the target does not exist and with
/// [`GridError::Validation`] for an unusable factor, window or series, or when
/// the perturbed network no longer validates (a per-unit limit scaled past 1).
pub fn build(base: &Network, perturbation: &Perturbation) -> GridResult<Network> {
    build_all(base, std::slice::from_ref(perturbation))
}

/// Apply every perturbation of a scenario, in order, to one copy of `base`.
pub fn build_scenario(base: &Network, scenario: &Scenario) -> GridResult<Network> {
    build_all(base, &scenario.perturbations)
}

pub fn build_all(base: &Network, perturbations: &[Perturbation]) -> GridResult<Network> {
    let mut network = base.clone();
    for perturbation in perturbations {
        apply(&mut network, perturbation)?;
    }
    network.validate().into_result()?;
    Ok(network)
}

fn apply(network: &mut Network, perturbation: &Perturbation) -> GridResult<()> {
    let horizon = network.horizon();
    match perturbation {
        Perturbation::BranchOutage { branch } => {
            branch_mut(network, branch)?.trip();
        }
        Perturbation::ScaleAvailability {
            generator,
            factor,
            window,
        } => {
            check_factor(*factor)?;
            check_window(*window, horizon)?;
            let gen = generator_mut(network, generator)?;
            gen.p_max_pu = gen.p_max_pu.scaled(*factor, *window, horizon);
            // keep p_min_pu <= p_max_pu inside the derated periods
            if gen.p_min_pu.max_value() > 0.0 {
                gen.p_min_pu = clamp_below(&gen.p_min_pu, &gen.p_max_pu, horizon);
            }
        }
        Perturbation::ReplaceDemand { load, p_set } => {
            if let Some(len) = p_set.series_len() {
                if len != horizon {
                    return Err(GridError::Validation(format!(
                        "replacement demand for '{load}' has {len} values for {horizon} snapshots"
                    )));
                }
            }
            let target = network
                .load_mut(load)
                .ok_or_else(|| GridError::unknown(EntityKind::Load, load))?;
            target.p_set = p_set.clone();
        }
        Perturbation::ScaleDemand {
            load,
            factor,
            window,
        } => {
            check_factor(*factor)?;
            check_window(*window, horizon)?;
            let target = network
                .load_mut(load)
                .ok_or_else(|| GridError::unknown(EntityKind::Load, load))?;
            target.p_set = target.p_set.scaled(*factor, *window, horizon);
        }
        Perturbation::GeneratorOutage { generator, window } => {
            check_window(*window, horizon)?;
            let gen = generator_mut(network, generator)?;
            match window {
                None => {
                    gen.p_max_pu = Profile::constant(0.0);
                    gen.p_min_pu = Profile::constant(0.0);
                    gen.p_nom_extendable = false;
                    gen.p_nom = 0.0;
                }
                Some(_) => {
                    gen.p_max_pu = gen.p_max_pu.scaled(0.0, *window, horizon);
                    gen.p_min_pu = gen.p_min_pu.scaled(0.0, *window, horizon);
                }
            }
        }
        Perturbation::StorageOutage { storage } => {
            let unit = network
                .storage_mut(storage)
                .ok_or_else(|| GridError::unknown(EntityKind::StorageUnit, storage))?;
            unit.p_nom = 0.0;
            unit.p_nom_extendable = false;
            unit.state_of_charge_initial = 0.0;
            unit.in_service = false;
        }
        Perturbation::ScaleBranchCapacity {
            branch,
            factor,
            window,
        } => {
            check_factor(*factor)?;
            check_window(*window, horizon)?;
            match branch_mut(network, branch)? {
                Edge::Line(line) => {
                    line.s_max_pu = line.s_max_pu.scaled(*factor, *window, horizon);
                }
                Edge::Link(link) => {
                    link.p_max_pu = link.p_max_pu.scaled(*factor, *window, horizon);
                    link.p_min_pu = link.p_min_pu.scaled(*factor, *window, horizon);
                }
            }
        }
    }
    Ok(())
}

fn check_factor(factor: f64) -> GridResult<()> {
    if factor.is_finite() && factor >= 0.0 {
        Ok(())
    } else {
        Err(GridError::Validation(format!(
            "scaling factor {factor} must be finite and non-negative"
        )))
    }
}

fn check_window(window: Option<SnapshotWindow>, horizon: usize) -> GridResult<()> {
    match window {
        Some(w) if !w.fits(horizon) => Err(GridError::Validation(format!(
            "window [{}, {}) does not fit {horizon} snapshots",
            w.start, w.end
        ))),
        _ => Ok(()),
    }
}

fn clamp_below(lower: &Profile, upper: &Profile, horizon: usize) -> Profile {
    Profile::Series(
        (0..horizon)
            .map(|t| lower.at(t).min(upper.at(t)))
            .collect(),
    )
}

fn branch_mut<'a>(network: &'a mut Network, needle: &str) -> GridResult<&'a mut Edge> {
    let by_id = needle.parse::<usize>().ok();
    let index = network
        .graph
        .edge_indices()
        .find(|idx| network.graph[*idx].name() == needle)
        .or_else(|| {
            let id = by_id?;
            network
                .graph
                .edge_indices()
                .find(|idx| network.graph[*idx].id().value() == id)
        })
        .ok_or_else(|| GridError::unknown(EntityKind::Branch, needle))?;
    Ok(&mut network.graph[index])
}

fn generator_mut<'a>(network: &'a mut Network, needle: &str) -> GridResult<&'a mut Gen> {
    if network.generator(needle).is_some() {
        return network
            .generator_mut(needle)
            .ok_or_else(|| GridError::unknown(EntityKind::Generator, needle));
    }
    let name = needle
        .parse::<usize>()
        .ok()
        .and_then(|id| {
            network
                .generators()
                .into_iter()
                .find(|gen| gen.id.value() == id)
                .map(|gen| gen.name.clone())
        })
        .ok_or_else(|| GridError::unknown(EntityKind::Generator, needle))?;
    network
        .generator_mut(&name)
        .ok_or_else(|| GridError::unknown(EntityKind::Generator, needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstress_core::{
        Bus, BusId, BranchId, GenId, Line, Load, LoadId, Snapshots, StorageId, StorageUnit,
    };

    fn base() -> Network {
        let start = "2025-01-01T00:00:00Z".parse().unwrap();
        let mut network = Network::with_snapshots(Snapshots::hourly(start, 6));
        network.add_bus(Bus::new(BusId::new(0), "A"));
        network.add_bus(Bus::new(BusId::new(1), "B"));
        network
            .add_generator(
                Gen::new(GenId::new(0), "Wind", BusId::new(0))
                    .with_capacity(100.0)
                    .with_availability(0.8),
            )
            .unwrap();
        network
            .add_load(Load::new(LoadId::new(0), "City", BusId::new(1), 50.0))
            .unwrap();
        network
            .add_line(Line::new(BranchId::new(0), "A-B", BusId::new(0), BusId::new(1), 0.1, 80.0))
            .unwrap();
        let mut battery = StorageUnit::new(StorageId::new(0), "Battery", BusId::new(1));
        battery.p_nom = 20.0;
        network.add_storage(battery).unwrap();
        network
    }

    #[test]
    fn outage_copy_leaves_base_untouched() {
        let base = base();
        let out = build(&base, &Perturbation::branch_outage("A-B")).unwrap();
        assert!(!out.branch("A-B").unwrap().in_service());
        assert_eq!(out.branch("A-B").unwrap().capacity(), 0.0);
        assert!(base.branch("A-B").unwrap().in_service());
        assert_eq!(base.branch("A-B").unwrap().capacity(), 80.0);
    }

    #[test]
    fn branch_by_numeric_id() {
        let out = build(&base(), &Perturbation::branch_outage("0")).unwrap();
        assert!(!out.branch("A-B").unwrap().is_active());
    }

    #[test]
    fn unknown_entities_are_reported() {
        let base = base();
        let cases = [
            Perturbation::branch_outage("Line_9"),
            Perturbation::GeneratorOutage {
                generator: "Nuclear".into(),
                window: None,
            },
            Perturbation::ScaleDemand {
                load: "Village".into(),
                factor: 1.1,
                window: None,
            },
            Perturbation::StorageOutage {
                storage: "Pumped".into(),
            },
        ];
        for case in &cases {
            let err = build(&base, case).unwrap_err();
            assert!(err.is_unknown_entity(), "{case}: {err}");
        }
    }

    #[test]
    fn windowed_availability_scaling() {
        let p = Perturbation::ScaleAvailability {
            generator: "Wind".into(),
            factor: 0.5,
            window: Some(SnapshotWindow::new(2, 4)),
        };
        let out = build(&base(), &p).unwrap();
        let values = out.generator("Wind").unwrap().p_max_pu.values(6);
        assert_eq!(values, vec![0.8, 0.8, 0.4, 0.4, 0.8, 0.8]);
    }

    #[test]
    fn rejects_bad_factor_and_window() {
        let base = base();
        let negative = Perturbation::ScaleDemand {
            load: "City".into(),
            factor: -1.0,
            window: None,
        };
        assert!(matches!(build(&base, &negative), Err(GridError::Validation(_))));
        let outside = Perturbation::GeneratorOutage {
            generator: "Wind".into(),
            window: Some(SnapshotWindow::new(4, 9)),
        };
        assert!(matches!(build(&base, &outside), Err(GridError::Validation(_))));
    }

    #[test]
    fn scaling_past_per_unit_limit_fails_at_build() {
        let base = base();
        let boost = Perturbation::ScaleAvailability {
            generator: "Wind".into(),
            factor: 1.5,
            window: None,
        };
        let err = build(&base, &boost).unwrap_err();
        assert!(matches!(err, GridError::Validation(_)));
        assert!(err.to_string().contains("p_max_pu must stay within [0, 1]"));

        let uprate = Perturbation::ScaleBranchCapacity {
            branch: "A-B".into(),
            factor: 1.25,
            window: None,
        };
        assert!(matches!(build(&base, &uprate), Err(GridError::Validation(_))));
        assert_eq!(base.generator("Wind").unwrap().p_max_pu, Profile::Constant(0.8));
    }

    #[test]
    fn replacement_series_must_match_horizon() {
        let base = base();
        let short = Perturbation::ReplaceDemand {
            load: "City".into(),
            p_set: Profile::Series(vec![1.0, 2.0]),
        };
        assert!(matches!(build(&base, &short), Err(GridError::Validation(_))));
        let spike = Perturbation::ReplaceDemand {
            load: "City".into(),
            p_set: Profile::Series(vec![50.0, 50.0, 90.0, 50.0, 50.0, 50.0]),
        };
        let out = build(&base, &spike).unwrap();
        let load = out.loads()[0];
        assert_eq!(load.p_set.at(2), 90.0);
    }

    #[test]
    fn storage_outage_zeroes_unit() {
        let p = Perturbation::StorageOutage {
            storage: "Battery".into(),
        };
        let out = build(&base(), &p).unwrap();
        let unit = out.storage_units()[0];
        assert_eq!(unit.p_nom, 0.0);
        assert!(!unit.in_service);
    }

    #[test]
    fn perturbations_compose_in_order() {
        let list = vec![
            Perturbation::ScaleDemand {
                load: "City".into(),
                factor: 2.0,
                window: None,
            },
            Perturbation::ScaleBranchCapacity {
                branch: "A-B".into(),
                factor: 0.5,
                window: None,
            },
        ];
        let out = build_all(&base(), &list).unwrap();
        assert_eq!(out.loads()[0].p_set, Profile::Constant(100.0));
        let line = out.lines()[0];
        assert_eq!(line.s_max_pu, Profile::Constant(0.5));
    }

    #[test]
    fn yaml_tagged_form() {
        let text = "type: scale_availability\ngenerator: Wind\nfactor: 0.3\nwindow: {start: 60, end: 100}\n";
        let p: Perturbation = serde_yaml::from_str(text).unwrap();
        assert_eq!(p.to_string(), "scale_availability(Wind) x0.3 @[60, 100)");
    }
}
