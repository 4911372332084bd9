#![allow(deprecated)] // TODO: migrate cargo_bin to cargo_bin_cmd!

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("run-consul").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--server"))
        .stdout(predicate::str::contains("--client"))
        .stdout(predicate::str::contains("--cluster-tag-name"))
        .stdout(predicate::str::contains("--skip-consul-config"))
        .stdout(predicate::str::contains("--autopilot-max-trailing-logs"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("run-consul").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("run-consul"));
}

#[test]
fn test_unknown_flag_exits_one_with_usage() {
    let mut cmd = Command::cargo_bin("run-consul").unwrap();
    cmd.args(["--server", "--bogus"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_missing_flag_value_fails() {
    let mut cmd = Command::cargo_bin("run-consul").unwrap();
    cmd.args(["--server", "--cluster-tag-name"])
        .assert()
        .code(1);
}

#[test]
fn test_both_roles_rejected_before_side_effects() {
    let mut cmd = Command::cargo_bin("run-consul").unwrap();
    cmd.args(["--server", "--client"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("exactly one of --server or --client"));
}

#[test]
fn test_no_role_rejected() {
    let mut cmd = Command::cargo_bin("run-consul").unwrap();
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("got neither"));
}

#[test]
fn test_empty_required_value_rejected() {
    let mut cmd = Command::cargo_bin("run-consul").unwrap();
    cmd.args(["--client", "--cluster-tag-name", ""])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--cluster-tag-name must not be empty"));
}

#[test]
fn test_invalid_bool_value_rejected() {
    let mut cmd = Command::cargo_bin("run-consul").unwrap();
    cmd.args(["--server", "--autopilot-cleanup-dead-servers", "maybe"])
        .assert()
        .code(1);
}

#[test]
fn test_invalid_environment_key_rejected() {
    let mut cmd = Command::cargo_bin("run-consul").unwrap();
    cmd.args(["--server", "--environment", "MY-VAR=1"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("must match [A-Za-z_][A-Za-z0-9_]*"));
}
