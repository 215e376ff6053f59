//! Reference networks shared by unit and integration tests.

use gridstress_core::{
    Bus, BusId, BranchId, Carrier, Gen, GenId, GlobalConstraint, GridResult, Line, Link, Load,
    LoadId, Network, Profile, SnapshotWindow, Snapshots, StorageId, StorageUnit,
};

use crate::profiles::{
    clipped_normal_availability, half_sine_availability, sinusoidal_demand, with_window_value,
};

/// Horizon of [`northgrid`], one week of hourly snapshots.
pub const NORTHGRID_HOURS: usize = 168;

/// Four-bus loop with a radial spur: Bus 4 hangs off Bus 1 through `Line_1_4`,
/// so that line's outage strands 80 MW of demand.
///
/// | unit | bus | MW | cost |
/// |------|-----|----|------|
/// | G0 | 0 | 100 | 0 |
/// | G1 | 1 | 80 | 50 |
/// | G2 | 2 | 40 | 40 |
/// | G3 | 3 | 100 | 200 |
pub fn five_bus() -> GridResult<Network> {
    let start = "2025-01-01T00:00:00Z".parse().unwrap_or_default();
    let mut network = Network::with_snapshots(Snapshots::hourly(start, 1));
    for i in 0..5 {
        network.add_bus(Bus::new(BusId::new(i), format!("Bus {i}")));
    }
    let units = [
        ("G0", 0, 100.0, 0.0, "wind"),
        ("G1", 1, 80.0, 50.0, "gas"),
        ("G2", 2, 40.0, 40.0, "chp"),
        ("G3", 3, 100.0, 200.0, "diesel"),
    ];
    for (i, (name, bus, p_nom, cost, carrier)) in units.into_iter().enumerate() {
        network.add_generator(
            Gen::new(GenId::new(i), name, BusId::new(bus))
                .with_capacity(p_nom)
                .with_marginal_cost(cost)
                .with_carrier(carrier),
        )?;
    }
    for (i, (bus, demand)) in [(1, 50.0), (2, 30.0), (3, 40.0), (4, 80.0)].into_iter().enumerate() {
        network.add_load(Load::new(
            LoadId::new(i),
            format!("Load{bus}"),
            BusId::new(bus),
            demand,
        ))?;
    }
    let lines = [(0, 1), (1, 2), (2, 3), (3, 0), (1, 4)];
    for (i, (from, to)) in lines.into_iter().enumerate() {
        let mut line = Line::new(
            BranchId::new(i),
            format!("Line_{from}_{to}"),
            BusId::new(from),
            BusId::new(to),
            0.1,
            100.0,
        );
        line.resistance = 0.01;
        network.add_line(line)?;
    }
    Ok(network)
}

/// Two-area system over one week: wind, solar and a battery site in the
/// north feed a southern load through `Corridor_B` (360 MW); `Corridor_A` is
/// built but has no capacity. A gas unit backs up the south and a `load_shed`
/// unit at `SouthLoad` absorbs whatever cannot be served.
///
/// The wind profile is drawn from `seed`, with a lull (0.2) in hours 60-70;
/// the gas unit is unavailable in hours 40-60.
pub fn northgrid(seed: u64) -> GridResult<Network> {
    let hours = NORTHGRID_HOURS;
    let start = "2025-01-06T00:00:00Z".parse().unwrap_or_default();
    let mut network = Network::with_snapshots(Snapshots::hourly(start, hours));

    let buses = [
        ("NorthWind", 10.0, 56.0),
        ("NorthSolar", 11.0, 56.1),
        ("NorthStorage", 10.5, 55.8),
        ("NorthHub", 10.5, 55.5),
        ("SouthHub", 10.5, 54.5),
        ("SouthLoad", 10.3, 54.2),
        ("SouthBackupGen", 10.7, 54.1),
    ];
    for (i, (name, x, y)) in buses.into_iter().enumerate() {
        network.add_bus(Bus::new(BusId::new(i), name).with_coordinates(x, y));
    }
    let bus = |name: &str| {
        BusId::new(buses.iter().position(|(n, _, _)| *n == name).unwrap_or_default())
    };

    network.add_carrier(Carrier {
        name: "gas".into(),
        co2_emissions: 0.2,
    });
    for name in ["wind", "solar", "battery", "load_shed"] {
        network.add_carrier(Carrier {
            name: name.into(),
            co2_emissions: 0.0,
        });
    }

    let wind = with_window_value(
        &clipped_normal_availability(hours, 0.6, 0.2, seed),
        SnapshotWindow::new(60, 70),
        0.2,
        hours,
    );
    let gas = with_window_value(&Profile::constant(1.0), SnapshotWindow::new(40, 60), 0.0, hours);
    let generators = [
        Gen::new(GenId::new(0), "WindNorth", bus("NorthWind"))
            .with_capacity(670.0)
            .with_carrier("wind")
            .with_availability(wind),
        Gen::new(GenId::new(1), "SolarNorth", bus("NorthSolar"))
            .with_capacity(205.0)
            .with_carrier("solar")
            .with_availability(half_sine_availability(hours, 7.0)),
        Gen::new(GenId::new(2), "GasSouth", bus("SouthBackupGen"))
            .with_capacity(220.0)
            .with_marginal_cost(70.0)
            .with_carrier("gas")
            .with_availability(gas),
        Gen::new(GenId::new(3), "Unserved_SouthLoad", bus("SouthLoad"))
            .with_capacity(1.0e4)
            .with_marginal_cost(1000.0)
            .with_carrier("load_shed"),
    ];
    for gen in generators {
        network.add_generator(gen)?;
    }
    network.add_load(Load::new(
        LoadId::new(0),
        "SouthDemand",
        bus("SouthLoad"),
        sinusoidal_demand(hours, 300.0, 60.0, 3.0),
    ))?;

    let mut battery = StorageUnit::new(StorageId::new(0), "Battery_North", bus("NorthStorage"));
    battery.carrier = "battery".into();
    battery.max_hours = 4.0;
    battery.efficiency_store = 0.9;
    battery.efficiency_dispatch = 0.9;
    network.add_storage(battery)?;

    let links = [
        ("Wind_to_NorthHub", "NorthWind", "NorthHub", 1000.0, false),
        ("Solar_to_NorthHub", "NorthSolar", "NorthHub", 1000.0, false),
        ("Storage_NorthHub", "NorthStorage", "NorthHub", 1000.0, true),
        ("SouthHub_to_Load", "SouthHub", "SouthLoad", 1000.0, false),
        ("Backup_to_SouthHub", "SouthBackupGen", "SouthHub", 1000.0, false),
        ("Corridor_A", "NorthHub", "SouthHub", 0.0, false),
        ("Corridor_B", "NorthHub", "SouthHub", 360.0, false),
    ];
    for (i, (name, from, to, p_nom, reversible)) in links.into_iter().enumerate() {
        let mut link = Link::new(BranchId::new(i), name, bus(from), bus(to), p_nom);
        link.carrier = (if name.starts_with("Corridor") { "DC" } else { "AC" }).to_string();
        if reversible {
            link.p_min_pu = Profile::constant(-1.0);
        }
        network.add_link(link)?;
    }

    network.global_constraints.push(GlobalConstraint::PrimaryEnergyCap {
        name: "co2_limit".into(),
        limit: 10_000.0,
    });
    Ok(network)
}
