//! CLI Integration Tests
//!
//! Tests the `tally` binary directly using assert_cmd against fixture
//! workbooks written into a TempDir.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

mod common;

use assert_cmd::Command;
use common::*;
use predicates::prelude::*;
use tempfile::TempDir;

fn tally() -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    tally()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tally"))
        .stdout(predicate::str::contains("REPORTS"));
}

#[test]
fn test_cli_version() {
    tally()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_subcommand_help() {
    tally()
        .args(["items", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("優先度"));
    tally()
        .args(["ledger", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SORT ORDERS"));
    tally()
        .args(["visits", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-sheet"));
}

#[test]
fn test_no_subcommand_fails() {
    tally().assert().failure();
}

// ═══════════════════════════════════════════════════════════════════════════
// ITEMS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_items_prints_pivot() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path());
    let data = write_items(dir.path());

    tally()
        .arg("items")
        .arg(&rules)
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("Yearly totals by category"))
        .stdout(predicate::str::contains("乳製品"))
        .stdout(predicate::str::contains("200.0%"));
}

#[test]
fn test_items_exports_xlsx() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path());
    let data = write_items(dir.path());
    let output = dir.path().join("pivot.xlsx");

    tally()
        .arg("items")
        .arg(&rules)
        .arg(&data)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Report exported"));

    assert!(output.exists());
    let book = royalbit_tally::excel::read_workbook(&output).unwrap();
    assert!(book.sheet("pivot").is_some());
    assert!(book.sheet("classified").is_some());
}

#[test]
fn test_items_rejects_non_xlsx_output() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path());
    let data = write_items(dir.path());
    let output = dir.path().join("pivot.csv");

    tally()
        .arg("items")
        .arg(&rules)
        .arg(&data)
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported output format"));
    assert!(!output.exists());
}

#[test]
fn test_items_json() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path());
    let data = write_items(dir.path());

    let json = stdout_json(tally().arg("items").arg(&rules).arg(&data).arg("--json"));
    assert_eq!(json["product_column"], "商品名");
    assert_eq!(json["pivot"]["years"], serde_json::json!([2024, 2023]));
}

#[test]
fn test_items_missing_file_fails() {
    tally()
        .args(["items", "/nonexistent/class.xlsx", "/nonexistent/items.xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

// ═══════════════════════════════════════════════════════════════════════════
// LEDGER
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_ledger_by_category() {
    let dir = TempDir::new().unwrap();
    let (prior, current) = write_ledger_pair(dir.path());
    let helper = write_helper(dir.path());

    tally()
        .arg("ledger")
        .arg(&prior)
        .arg(&current)
        .arg(&helper)
        .assert()
        .success()
        .stdout(predicate::str::contains("By category"))
        .stdout(predicate::str::contains("1 helper rows skipped"))
        .stdout(predicate::str::contains("3500"))
        .stdout(predicate::str::contains("3002"));
}

#[test]
fn test_ledger_by_customer_verbose_warnings() {
    let dir = TempDir::new().unwrap();
    let (prior, current) = write_ledger_pair(dir.path());
    let helper = write_helper(dir.path());

    tally()
        .arg("ledger")
        .arg(&prior)
        .arg(&current)
        .arg(&helper)
        .args(["--by", "customer", "--sort", "worst", "-v"])
        .assert()
        .success()
        .stdout(predicate::str::contains("By customer"))
        .stdout(predicate::str::contains("B空港売店"))
        .stdout(predicate::str::contains("計算修正 row 2"));
}

#[test]
fn test_ledger_json_sorted_worst() {
    let dir = TempDir::new().unwrap();
    let (prior, current) = write_ledger_pair(dir.path());
    let helper = write_helper(dir.path());

    let json = stdout_json(
        tally()
            .arg("ledger")
            .arg(&prior)
            .arg(&current)
            .arg(&helper)
            .args(["--sort", "worst", "--json"]),
    );

    assert_eq!(json["order"], "worst");
    assert_eq!(json["customers"][0]["name"], "B空港売店");
    assert_eq!(json["customers"][0]["delta"], -500);
    assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
}

#[test]
fn test_ledger_invalid_sort_fails() {
    let dir = TempDir::new().unwrap();
    let (prior, current) = write_ledger_pair(dir.path());
    let helper = write_helper(dir.path());

    tally()
        .arg("ledger")
        .arg(&prior)
        .arg(&current)
        .arg(&helper)
        .args(["--sort", "sideways"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown sort order"));
}

#[test]
fn test_ledger_export_with_json_keeps_stdout_clean() {
    let dir = TempDir::new().unwrap();
    let (prior, current) = write_ledger_pair(dir.path());
    let helper = write_helper(dir.path());
    let output = dir.path().join("ledger.xlsx");

    let json = stdout_json(
        tally()
            .arg("ledger")
            .arg(&prior)
            .arg(&current)
            .arg(&helper)
            .arg("--json")
            .arg("-o")
            .arg(&output),
    );
    assert!(json["categories"].is_array());

    let book = royalbit_tally::excel::read_workbook(&output).unwrap();
    assert!(book.sheet("大分類").is_some());
    assert!(book.sheet("得意先").is_some());
}

#[test]
fn test_ledger_config_override() {
    let dir = TempDir::new().unwrap();
    let (prior, current) = write_ledger_pair(dir.path());
    let helper = write_helper(dir.path());
    let config = dir.path().join("tally.yaml");
    std::fs::write(&config, "ledger:\n  unclassified: その他\n").unwrap();

    let json = stdout_json(
        tally()
            .arg("ledger")
            .arg(&prior)
            .arg(&current)
            .arg(&helper)
            .arg("--json")
            .arg("--config")
            .arg(&config),
    );
    let categories: Vec<&str> = json["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["category"].as_str().unwrap())
        .collect();
    assert!(categories.contains(&"その他"));
    assert!(!categories.contains(&"未分類"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let (prior, current) = write_ledger_pair(dir.path());
    let helper = write_helper(dir.path());
    let config = dir.path().join("bad.yaml");
    std::fs::write(&config, "ledger:\n  code_width: 0\n").unwrap();

    tally()
        .arg("ledger")
        .arg(&prior)
        .arg(&current)
        .arg(&helper)
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("code_width"));
}

// ═══════════════════════════════════════════════════════════════════════════
// VISITS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_visits_summary() {
    let dir = TempDir::new().unwrap();
    let report = write_visits(dir.path());

    tally()
        .arg("visits")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Visit Report"))
        .stdout(predicate::str::contains("田中_駅, 佐藤_高速"))
        .stdout(predicate::str::contains("鈴木").not());
}

#[test]
fn test_visits_json_with_filters() {
    let dir = TempDir::new().unwrap();
    let report = write_visits(dir.path());

    let json = stdout_json(
        tally()
            .arg("visits")
            .arg(&report)
            .args(["--person", "田中", "--from", "2024-05-05", "--json"]),
    );
    assert_eq!(json["summary"]["unique_visits"], 1);
    assert_eq!(json["records"][0]["uuid"], "u2");
    assert_eq!(json["log"]["summary"]["entries"], 4);
}

#[test]
fn test_visits_log_sheet_filter() {
    let dir = TempDir::new().unwrap();
    let report = write_visits(dir.path());

    let json = stdout_json(
        tally()
            .arg("visits")
            .arg(&report)
            .args(["--log-sheet", "佐藤_高速", "--json"]),
    );
    assert_eq!(json["log"]["summary"]["entries"], 1);
    assert_eq!(json["log"]["summary"]["unique_targets"], 1);
    assert_eq!(json["summary"]["unique_visits"], 3);
}

#[test]
fn test_visits_invalid_date_fails() {
    let dir = TempDir::new().unwrap();
    let report = write_visits(dir.path());

    tally()
        .arg("visits")
        .arg(&report)
        .args(["--from", "May 5th"])
        .assert()
        .failure();
}
