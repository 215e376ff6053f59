use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join(relative)
}

fn gridstress() -> Command {
    Command::cargo_bin("gridstress").unwrap()
}

fn five_bus() -> String {
    repo_path("test_data/five_bus.yaml").display().to_string()
}

#[test]
fn opf_prints_objective_and_tables() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("solution.json");
    gridstress()
        .args(["opf", &five_bus(), "--out-json", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Objective: 4600.00"))
        .stdout(predicate::str::contains("Bus 4"));
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
    assert!(json["generator_dispatch"]["G0"].is_array());
}

#[test]
fn opf_rejects_unknown_solver() {
    gridstress()
        .args(["opf", &five_bus(), "--solver", "gurobi"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown lp solver"))
        .stderr(predicate::function(|err: &str| {
            err.matches("unknown lp solver 'gurobi'").count() == 1
        }));
}

#[test]
fn nminus1_reports_infeasible_outage() {
    gridstress()
        .args(["nminus1", &five_bus(), "--branches", "Line_0_1,Line_1_4", "--threads", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Line_1_4"))
        .stdout(predicate::str::contains("infeasible"))
        .stdout(predicate::str::contains("mean cost"));
}

#[test]
fn nminus1_with_nothing_feasible_exits_non_zero() {
    gridstress()
        .args(["nminus1", &five_bus(), "--branches", "Line_1_4"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("base fallback"))
        .stderr(predicate::str::contains("no feasible scenario"));
}

#[test]
fn nminus1_unknown_branch_is_fatal() {
    gridstress()
        .args(["nminus1", &five_bus(), "--branches", "Line_9_9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown branch 'Line_9_9'"));
}

#[test]
fn config_file_enables_shedding() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("gridstress.toml");
    fs::write(&config, "threads = 1\n\n[shedding]\nenabled = true\n").unwrap();
    gridstress()
        .args([
            "--config",
            config.to_str().unwrap(),
            "nminus1",
            &five_bus(),
            "--branches",
            "Line_1_4",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("load_shed"))
        .stdout(predicate::str::contains("Unserved_Bus_4"));
}

#[test]
fn stress_writes_exports_and_manifest() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("run");
    gridstress()
        .args([
            "stress",
            "--scenarios",
            repo_path("test_data/five_bus_stress.yaml").to_str().unwrap(),
            "--shedding",
            "--out-dir",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("spur_outage"))
        .stdout(predicate::str::contains("demand_spike"));

    let scenarios = fs::read_to_string(out.join("scenarios.csv")).unwrap();
    assert!(scenarios.starts_with("scenario,outcome,objective"));
    assert_eq!(scenarios.lines().count(), 4);
    assert!(out.join("conservative_dispatch.csv").exists());
    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("run_manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["num_scenarios"], 3);
    assert_eq!(manifest["solver"], "clarabel");
    assert_eq!(manifest["scenarios"][0]["outcome"], "load_shed");
}

#[test]
fn scenarios_validate_checks_targets() {
    gridstress()
        .args([
            "scenarios",
            "validate",
            repo_path("test_data/five_bus_stress.yaml").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("validated successfully (3 scenarios)"));

    let dir = tempdir().unwrap();
    let spec = dir.path().join("bad.yaml");
    fs::write(
        &spec,
        "scenarios:\n  - id: ghost\n    perturbations:\n      - { type: generator_outage, generator: G9 }\n",
    )
    .unwrap();
    gridstress()
        .args(["scenarios", "validate", spec.to_str().unwrap(), "--network", &five_bus()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("G9"));
}

#[test]
fn scenarios_materialize_writes_networks() {
    let dir = tempdir().unwrap();
    gridstress()
        .args([
            "scenarios",
            "materialize",
            repo_path("test_data/five_bus_stress.yaml").to_str().unwrap(),
            "--out-dir",
            dir.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Materialized 3 scenarios"));
    assert!(dir.path().join("scenario_manifest.json").exists());
    assert!(dir.path().join("spur_outage").join("network.json").exists());
}

#[test]
fn ts_slice_keeps_whole_days() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("day2.csv");
    gridstress()
        .args([
            "ts",
            "slice",
            repo_path("test_data/microgrid_timeseries.csv").to_str().unwrap(),
            "--start",
            "2020-01-02",
            "--end",
            "2020-01-02",
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sliced 24 of 96 rows"));
    let text = fs::read_to_string(out).unwrap();
    assert_eq!(text.lines().count(), 25);
}

#[test]
fn inspect_summarizes_network() {
    gridstress()
        .args(["inspect", &five_bus()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Buses         : 5"))
        .stdout(predicate::str::contains("diesel"));
}
