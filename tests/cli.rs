use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const LEDGER: &str = "\
No.,購入日,部署,品名,単価,数量,金額
1,2022/09/01,Sales,Pen,100,2,200
2,2022/09/01,Sales,Pen,100,1,100
3,2022/08/15,Admin,Pad,500,1,500
4,2022/09/03,Admin,,80,1,80
";

fn bihin(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bihin").unwrap();
    cmd.env("HOME", home).env("NO_COLOR", "1");
    cmd
}

fn write_ledger(dir: &Path, content: &str) -> String {
    let path = dir.join("purchases.csv");
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_summary_prints_every_view() {
    let home = tempfile::tempdir().unwrap();
    let file = write_ledger(home.path(), LEDGER);

    bihin(home.path())
        .args(["summary", "--file", &file, "--year", "2022", "--month", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("September 2022"))
        .stdout(predicate::str::contains("2 purchases"))
        .stdout(predicate::str::contains("¥800"))
        .stdout(predicate::str::contains("Pen"))
        .stdout(predicate::str::contains("2022-08-15 to 2022-09-01, 2/2 departments"))
        .stderr(predicate::str::contains("Skipped 1 rows"));
}

#[test]
fn test_summary_detail_flags() {
    let home = tempfile::tempdir().unwrap();
    let file = write_ledger(home.path(), LEDGER);

    bihin(home.path())
        .args([
            "summary", "--file", &file, "--year", "2022", "--month", "9",
            "--from", "2022-09-01", "--dept", "Sales",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2022-09-01 to 2022-09-01, 1/2 departments"))
        .stdout(predicate::str::contains("2 rows, ¥300"));
}

#[test]
fn test_bad_number_is_a_data_format_error() {
    let home = tempfile::tempdir().unwrap();
    let file = write_ledger(
        home.path(),
        "No.,購入日,部署,品名,単価,数量,金額\n1,2022/09/01,Sales,Pen,abc,2,200\n",
    );

    bihin(home.path())
        .args(["summary", "--file", &file])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Data format error at line 2"));
}

#[test]
fn test_missing_column_fails() {
    let home = tempfile::tempdir().unwrap();
    let file = write_ledger(home.path(), "No.,購入日,部署,品名,単価,数量\n1,2022/09/01,Sales,Pen,100,2\n");

    bihin(home.path())
        .args(["summary", "--file", &file])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required column"));
}

#[test]
fn test_missing_file_fails_with_hint() {
    let home = tempfile::tempdir().unwrap();
    let missing = home.path().join("nope.csv");

    bihin(home.path())
        .args(["summary", "--file", &missing.to_string_lossy()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ledger file not found"));
}

#[test]
fn test_month_out_of_range_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    bihin(home.path())
        .args(["summary", "--month", "13"])
        .assert()
        .failure();
}

#[test]
fn test_demo_then_summary() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("demo.csv");
    let out = out.to_string_lossy().to_string();

    bihin(home.path())
        .args(["demo", "--output", &out, "--seed", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    assert!(Path::new(&out).exists());

    bihin(home.path())
        .args(["summary", "--file", &out])
        .assert()
        .success()
        .stdout(predicate::str::contains("items by quantity"));
}

#[test]
fn test_init_then_status_uses_saved_file() {
    let home = tempfile::tempdir().unwrap();
    let file = write_ledger(home.path(), LEDGER);

    bihin(home.path())
        .args(["init", "--file", &file, "--year", "2022", "--month", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved settings"));
    assert!(home.path().join(".config/bihin/settings.json").exists());

    bihin(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("September 2022"))
        .stdout(predicate::str::contains("Rows:         3"))
        .stdout(predicate::str::contains("Skipped:      1"))
        .stdout(predicate::str::contains("Sales, Admin"));
}
