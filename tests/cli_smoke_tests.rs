mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::temp_dir;

fn cli(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("recurring_core_cli").expect("binary exists");
    cmd.env("RECURRING_CORE_HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn run_generates_instances_from_saved_templates() {
    let home = temp_dir();
    cli(&home)
        .args(["add-template", "rent", "Rent", "1000", "1", "Housing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved template `rent`"));

    cli(&home)
        .args(["--today", "2025-10-05", "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2025-10: paid 0.00, pending 1000.00, total 1000.00",
        ));

    cli(&home)
        .args(["--today", "2025-10-05", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rent").and(predicate::str::contains("pending")));
}

#[test]
fn reset_reports_month() {
    let home = temp_dir();
    cli(&home)
        .args(["--today", "2025-10-05", "reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reset 0 payment(s) in 2025-10"));
}

#[test]
fn invalid_input_exits_with_error() {
    let home = temp_dir();
    cli(&home)
        .args(["add-template", "rent", "Rent", "-3", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Invalid input"));

    cli(&home)
        .args(["--today", "not-a-date", "run"])
        .assert()
        .failure();

    cli(&home).arg("frobnicate").assert().failure();
}
