#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ruleflow(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ruleflow").unwrap();
    cmd.current_dir(dir.path()).env_remove("RULEFLOW_CONFIG");
    cmd
}

fn write(dir: &TempDir, rel: &str, body: &str) {
    let path = dir.path().join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, body).unwrap();
}

/// Three append actions plus a knowledge base of one rule per tier level.
fn project(dir: &TempDir) {
    write(dir, "actions/AppendA.yaml", "kind: append\nfield: msg\ntext: A\n");
    write(dir, "actions/AppendB.yaml", "kind: append\nfield: msg\ntext: B\n");
    write(dir, "actions/AppendC.yaml", "kind: append\nfield: msg\ntext: C\n");
    write(
        dir,
        "rules.yaml",
        "rules:\n  - priority: 1\n    action: AppendA\n  - priority: 2\n    action: AppendB\n  - priority: 3\n    action: AppendC\n",
    );
}

fn read_json(dir: &TempDir, rel: &str) -> serde_json::Value {
    let data = std::fs::read_to_string(dir.path().join(rel)).unwrap();
    serde_json::from_str(&data).unwrap()
}

// ---------------------------------------------------------------------------
// ruleflow run
// ---------------------------------------------------------------------------

#[test]
fn run_fires_tiers_in_priority_order() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    ruleflow(&dir)
        .args(["run", "--rules", "rules.yaml", "--actions", "actions"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""msg": "ABC""#));
}

#[test]
fn run_with_no_rules_returns_start_state() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    write(&dir, "empty.yaml", "rules: []\n");
    write(&dir, "start.json", r#"{ "msg": "seed" }"#);
    ruleflow(&dir)
        .args([
            "run", "--rules", "empty.yaml", "--actions", "actions", "--state", "start.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""msg": "seed""#));
}

#[test]
fn run_honors_num_executions() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    write(
        &dir,
        "rules.yaml",
        "rules:\n  - priority: 1\n    action: AppendA\n    actionConfig:\n      numExecutions: 2\n  - priority: 2\n    action: AppendB\n    actionConfig:\n      numExecutions: 3\n",
    );
    ruleflow(&dir)
        .args(["run", "--rules", "rules.yaml", "--actions", "actions"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""msg": "AABBB""#));
}

#[test]
fn last_tiebreak_reverses_equal_priority_choice() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    write(
        &dir,
        "rules.yaml",
        "rules:\n  - priority: 1\n    action: AppendA\n  - priority: 2\n    action: AppendB\n  - priority: 2\n    action: AppendC\n",
    );

    ruleflow(&dir)
        .args(["run", "--rules", "rules.yaml", "--actions", "actions"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""msg": "ABC""#));

    ruleflow(&dir)
        .args([
            "run", "--rules", "rules.yaml", "--actions", "actions", "--tiebreak", "last",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""msg": "ACB""#));
}

#[test]
fn config_file_supplies_actions_dir_and_tiebreak() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    write(
        &dir,
        "rules.yaml",
        "rules:\n  - priority: 5\n    action: AppendB\n  - priority: 5\n    action: AppendC\n",
    );
    write(&dir, "ruleflow.yaml", "actions_dir: actions\ntiebreak: last\n");
    ruleflow(&dir)
        .args(["run", "--rules", "rules.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""msg": "CB""#));
}

#[test]
fn run_json_reports_statistics() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    let output = ruleflow(&dir)
        .args(["--json", "run", "--rules", "rules.yaml", "--actions", "actions"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["state"]["msg"], "ABC");
    assert_eq!(report["firings"], 3);
    assert_eq!(report["passes"], 4);
    assert!(report["run_id"].is_string());
}

#[test]
fn run_writes_final_state_with_out() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    ruleflow(&dir)
        .args([
            "run", "--rules", "rules.yaml", "--actions", "actions", "--out", "out/final.json",
        ])
        .assert()
        .success();
    assert_eq!(read_json(&dir, "out/final.json"), serde_json::json!({ "msg": "ABC" }));
}

#[test]
fn run_stops_at_max_firings() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    ruleflow(&dir)
        .args([
            "run", "--rules", "rules.yaml", "--actions", "actions", "--max-firings", "2",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("firing limit of 2 exceeded"));
}

#[test]
fn run_accepts_fractional_priorities() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    write(
        &dir,
        "rules.yaml",
        "rules:\n  - priority: 1\n    action: AppendB\n  - priority: 0.5\n    action: AppendA\n  - priority: 1.5\n    action: AppendC\n",
    );
    ruleflow(&dir)
        .args(["run", "--rules", "rules.yaml", "--actions", "actions"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""msg": "ABC""#));

    ruleflow(&dir)
        .args(["check", "--rules", "rules.yaml", "--actions", "actions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.5"))
        .stdout(predicate::str::contains("1.5"));
}

#[test]
fn run_rejects_unknown_action() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    write(&dir, "rules.yaml", "rules:\n  - priority: 1\n    action: Missing\n");
    ruleflow(&dir)
        .args(["run", "--rules", "rules.yaml", "--actions", "actions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing"));
}

#[test]
fn run_rejects_duplicate_definitions() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    write(
        &dir,
        "actions/AppendA.json",
        r#"{ "kind": "append", "field": "msg", "text": "a" }"#,
    );
    ruleflow(&dir)
        .args(["run", "--rules", "rules.yaml", "--actions", "actions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AppendA"));
}

#[test]
fn run_without_actions_dir_fails() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    ruleflow(&dir)
        .args(["run", "--rules", "rules.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no actions directory"));
}

#[test]
fn run_rejects_bad_tiebreak() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    ruleflow(&dir)
        .args([
            "run", "--rules", "rules.yaml", "--actions", "actions", "--tiebreak", "random",
        ])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// ruleflow actions
// ---------------------------------------------------------------------------

#[test]
fn actions_lists_discovered_definitions() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    ruleflow(&dir)
        .args(["actions", "--actions", "actions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AppendA"))
        .stdout(predicate::str::contains("AppendC"))
        .stdout(predicate::str::contains("append"));
}

#[test]
fn actions_json_is_an_array() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    let output = ruleflow(&dir)
        .args(["actions", "--actions", "actions", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["AppendA", "AppendB", "AppendC"]);
    assert_eq!(rows[0]["kind"], "append");
    assert!(rows[0]["path"].as_str().unwrap().ends_with("AppendA.yaml"));
}

// ---------------------------------------------------------------------------
// ruleflow check
// ---------------------------------------------------------------------------

#[test]
fn check_shows_tiers_without_running() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    write(
        &dir,
        "rules.yaml",
        "rules:\n  - priority: 2\n    action: AppendC\n  - priority: 1\n    action: AppendA\n  - priority: 2\n    action: AppendB\n",
    );
    ruleflow(&dir)
        .args(["check", "--rules", "rules.yaml", "--actions", "actions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PRIORITY"))
        .stdout(predicate::str::contains("AppendC, AppendB"))
        .stdout(predicate::str::contains("3 rule(s) ok"))
        .stdout(predicate::str::contains("msg").not());
}

#[test]
fn check_rejects_bad_action_config() {
    let dir = TempDir::new().unwrap();
    project(&dir);
    write(
        &dir,
        "rules.yaml",
        "rules:\n  - priority: 1\n    action: AppendA\n    actionConfig:\n      numExecutions: lots\n",
    );
    ruleflow(&dir)
        .args(["check", "--rules", "rules.yaml", "--actions", "actions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AppendA"));
}
