//! Windowed corridor outage on the two-area reference system.

use gridstress_algo::test_utils::{northgrid, NORTHGRID_HOURS};
use gridstress_algo::ClarabelAdapter;
use gridstress_batch::{Enumerator, EnumeratorConfig, ScenarioOutcome};
use gridstress_core::SnapshotWindow;
use gridstress_scenarios::{Candidate, Perturbation};

const WINDOW: (usize, usize) = (72, 96);

#[test]
fn corridor_outage_sheds_only_inside_its_window() {
    let base = northgrid(42).unwrap();
    let candidate = Candidate {
        label: "corridor_b_outage".into(),
        perturbations: vec![Perturbation::ScaleBranchCapacity {
            branch: "Corridor_B".into(),
            factor: 0.0,
            window: Some(SnapshotWindow::new(WINDOW.0, WINDOW.1)),
        }],
    };
    let adapter = ClarabelAdapter::default();
    let config = EnumeratorConfig {
        threads: 1,
        ..Default::default()
    };
    let enumeration = Enumerator::new(&adapter, config)
        .enumerate(&base, &[candidate])
        .unwrap();

    let record = &enumeration.records[0];
    assert!(matches!(record.outcome, ScenarioOutcome::LoadShed { .. }), "{}", record.outcome);
    let stressed = record.result.as_feasible().unwrap().dispatch("Unserved_SouthLoad").unwrap();
    let reference = enumeration.base.dispatch("Unserved_SouthLoad").unwrap();
    assert_eq!(stressed.len(), NORTHGRID_HOURS);

    // gas alone (220 MW) cannot cover the southern minimum of 240 MW
    for t in WINDOW.0..WINDOW.1 {
        assert!(stressed[t] > 1.0, "hour {t} shed {}", stressed[t]);
    }

    let outside = |series: &[f64]| -> f64 {
        series
            .iter()
            .enumerate()
            .filter(|(t, _)| *t < WINDOW.0 || *t >= WINDOW.1)
            .map(|(_, v)| v)
            .sum()
    };
    let (a, b) = (outside(stressed), outside(reference));
    assert!((a - b).abs() <= 1e-2 * (1.0 + b), "outside window {a} vs base {b}");
}
