use std::fs;

use predicates::prelude::*;
use tempfile::tempdir;

/// ownership should fail (non-zero exit) when the cap table file is missing.
#[test]
fn ownership_fails_for_missing_captable() {
    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("ownership")
        .arg("--captable")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read cap table"));
}

/// The engine's fail-fast validation surfaces through the CLI exit code.
#[test]
fn round_fails_for_zero_amount() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("init")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("round")
        .arg("--captable")
        .arg(root.join("captable.json"))
        .arg("--amount")
        .arg("0")
        .arg("--pre-money")
        .arg("8000000")
        .assert()
        .failure()
        .stderr(predicate::str::contains("positive"));
}

#[test]
fn round_requires_amount_or_terms_file() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("init")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("round")
        .arg("--captable")
        .arg(root.join("captable.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--amount"));
}

#[test]
fn round_rejects_both_valuation_flags() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("init")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("round")
        .arg("--captable")
        .arg(root.join("captable.json"))
        .arg("--amount")
        .arg("2000000")
        .arg("--pre-money")
        .arg("8000000")
        .arg("--post-money")
        .arg("10000000")
        .assert()
        .failure()
        .stderr(predicate::str::contains("exactly one"));
}

#[test]
fn round_rejects_an_unrecognized_instrument_flag() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("init")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("round")
        .arg("--captable")
        .arg(root.join("captable.json"))
        .arg("--amount")
        .arg("1000000")
        .arg("--instrument")
        .arg("warrant")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unrecognized instrument"));
}

/// An unknown instrument tag inside a terms file is a parse failure, never a
/// silent fallback to some default instrument.
#[test]
fn round_rejects_an_unknown_tag_in_a_terms_file() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("init")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    let terms_path = root.join("bad_terms.json");
    fs::write(
        &terms_path,
        r#"{
            "round_name": "Seed",
            "investor_name": "Fund",
            "amount_raised": 1000000,
            "instrument": { "kind": "warrant" }
        }"#,
    )
    .expect("write terms");

    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("round")
        .arg("--captable")
        .arg(root.join("captable.json"))
        .arg("--terms")
        .arg(&terms_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse round terms"));
}

#[test]
fn round_fails_for_post_money_below_amount() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("init")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    assert_cmd::cargo::cargo_bin_cmd!("captable")
        .arg("round")
        .arg("--captable")
        .arg(root.join("captable.json"))
        .arg("--amount")
        .arg("2000000")
        .arg("--post-money")
        .arg("1500000")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must exceed"));
}
