use std::fs;

use tempfile::tempdir;

fn init_workspace(root: &std::path::Path) {
    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("init")
        .arg("--root")
        .arg(root)
        .arg("--name")
        .arg("Acme")
        .assert()
        .success();
}

/// --json output is a parseable DilutionResult with the expected economics.
#[test]
fn round_json_output_parses_and_carries_round_economics() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init_workspace(root);

    let output = assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("round")
        .arg("--captable")
        .arg(root.join("captable.json"))
        .arg("--amount")
        .arg("2000000")
        .arg("--pre-money")
        .arg("8000000")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");

    // Decimals serialize as strings to avoid precision loss.
    assert_eq!(value["post_round"]["post_money"], "10000000");
    assert_eq!(value["post_round"]["converts_at_next_round"], false);

    let stakeholders = value["post_round"]["stakeholders"].as_array().expect("array");
    assert_eq!(stakeholders.len(), 3);

    let deltas = value["dilution_pct"].as_object().expect("map");
    assert_eq!(deltas.len(), 2);
}

/// --report writes a JSON report with a timestamp and the input file hash.
#[test]
fn round_report_records_provenance() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init_workspace(root);

    let report_path = root.join("seed_report.json");
    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("round")
        .arg("--captable")
        .arg(root.join("captable.json"))
        .arg("--amount")
        .arg("2000000")
        .arg("--pre-money")
        .arg("8000000")
        .arg("--report")
        .arg(&report_path)
        .assert()
        .success();

    let body = fs::read_to_string(&report_path).expect("report written");
    let report: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");

    assert!(!report["generated_at"].as_str().unwrap_or_default().is_empty());
    // SHA-256 hex digest of the cap table file.
    assert_eq!(report["captable_hash"].as_str().unwrap_or_default().len(), 64);
    assert_eq!(report["result"]["post_round"]["post_money"], "10000000");
    assert_eq!(report["terms"]["round_name"], "Round");
}

/// --json and --report together keep stdout as pure JSON.
#[test]
fn json_flag_keeps_stdout_parseable_even_with_a_report() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init_workspace(root);

    let output = assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("round")
        .arg("--captable")
        .arg(root.join("captable.json"))
        .arg("--amount")
        .arg("2000000")
        .arg("--pre-money")
        .arg("8000000")
        .arg("--json")
        .arg("--report")
        .arg(root.join("report.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let _: serde_json::Value = serde_json::from_slice(&output).expect("stdout is pure JSON");
    assert!(root.join("report.json").exists());
}

/// ownership --json exposes the snapshot fields frontends need.
#[test]
fn ownership_json_output_parses() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init_workspace(root);

    let output = assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("ownership")
        .arg("--captable")
        .arg(root.join("captable.json"))
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(value["name"], "Acme");
    assert_eq!(value["view"], "fully_diluted");
    assert_eq!(value["stakeholders"].as_array().map(|a| a.len()), Some(2));
}
