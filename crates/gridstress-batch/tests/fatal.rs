//! Runs that abort, and runs with nothing feasible.

use gridstress_algo::test_utils::five_bus;
use gridstress_algo::{ClarabelAdapter, SolverSettings};
use gridstress_batch::{Enumerator, EnumeratorConfig, HarnessError, SheddingPolicy};
use gridstress_core::{GridError, Profile};
use gridstress_scenarios::{build, Candidate, Perturbation};
use tempfile::tempdir;

fn config() -> EnumeratorConfig {
    EnumeratorConfig {
        threads: 2,
        ..Default::default()
    }
}

#[test]
fn unknown_branch_aborts_before_solving() {
    let adapter = ClarabelAdapter::default();
    let candidates = [Candidate::outage("Line_0_1"), Candidate::outage("Line_9_9")];
    let err = Enumerator::new(&adapter, config())
        .run(&five_bus().unwrap(), &candidates)
        .unwrap_err();
    assert!(err.is_unknown_entity(), "{err}");
    assert!(err.to_string().contains("Line_9_9"));
}

#[test]
fn nothing_feasible_falls_back_to_base_and_has_no_summary() {
    let adapter = ClarabelAdapter::default();
    let base = five_bus().unwrap();
    let report = Enumerator::new(&adapter, config())
        .run(&base, &[Candidate::outage("Line_1_4")])
        .unwrap();

    assert!(report.conservative.is_fallback());
    let g0 = report.conservative.peak("G0").unwrap();
    assert!((g0 - 100.0).abs() < 1e-3);
    assert!(report.summary.is_none());
    assert!(matches!(report.summary(), Err(HarnessError::EmptyAggregate(_))));
}

#[test]
fn infeasible_base_is_fatal() {
    let overloaded = build(
        &five_bus().unwrap(),
        &Perturbation::ReplaceDemand {
            load: "Load4".into(),
            p_set: Profile::constant(500.0),
        },
    )
    .unwrap();
    let adapter = ClarabelAdapter::default();
    let err = Enumerator::new(&adapter, config())
        .enumerate(&overloaded, &[Candidate::outage("Line_0_1")])
        .unwrap_err();
    assert!(matches!(err, HarnessError::BaseInfeasible { .. }), "{err}");
}

#[test]
fn scratch_networks_are_scenario_scoped() {
    let dir = tempdir().unwrap();
    let adapter = ClarabelAdapter::default();
    let config = EnumeratorConfig {
        threads: 2,
        shedding: SheddingPolicy::Disabled,
        scratch_dir: Some(dir.path().to_path_buf()),
        run_id: "run-x".into(),
        ..Default::default()
    };
    Enumerator::new(&adapter, config)
        .enumerate(
            &five_bus().unwrap(),
            &[Candidate::outage("Line_0_1"), Candidate::outage("Line_1_2")],
        )
        .unwrap();
    let run = dir.path().join("run-x");
    assert!(run.join("base").join("network.json").exists());
    assert!(run.join("000_Line_0_1").join("network.json").exists());
    assert!(run.join("001_Line_1_2").join("network.json").exists());
}

#[test]
fn derate_above_rating_is_a_build_error() {
    let adapter = ClarabelAdapter::default();
    let candidates = [Candidate {
        label: "derate".into(),
        perturbations: vec![Perturbation::ScaleAvailability {
            generator: "G1".into(),
            factor: 1.5,
            window: None,
        }],
    }];
    let err = Enumerator::new(&adapter, config())
        .run(&five_bus().unwrap(), &candidates)
        .unwrap_err();
    match err {
        HarnessError::Build { scenario, source } => {
            assert_eq!(scenario, "derate");
            assert!(matches!(source, GridError::Validation(_)));
        }
        other => panic!("expected a build error, got {other}"),
    }
}

#[test]
fn time_limit_is_fatal() {
    let adapter = ClarabelAdapter::new(SolverSettings {
        time_limit_secs: Some(1e-9),
        ..Default::default()
    });
    let err = Enumerator::new(&adapter, config())
        .run(
            &five_bus().unwrap(),
            &[Candidate::outage("Line_0_1"), Candidate::outage("Line_1_2")],
        )
        .unwrap_err();
    assert!(err.is_timeout(), "{err}");
    assert!(!err.is_unknown_entity());
}
