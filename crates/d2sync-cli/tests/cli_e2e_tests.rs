//! End-to-end tests for the dota2-sync binary
//!
//! Every test points discovery at a temporary Steam directory and an empty
//! settings file so the host machine's configuration never leaks in.

use std::path::PathBuf;

use assert_cmd::Command;
use d2sync_test_utils::TestSteam;
use predicates::prelude::*;

const SRC: &str = "11111111";
const DST: &str = "22222222";

fn dota2_sync() -> Command {
    Command::cargo_bin("dota2-sync").unwrap()
}

/// Command with an isolated settings file and search root.
fn isolated(steam: &TestSteam) -> Command {
    let config: PathBuf = steam.scratch().join("config.toml");
    std::fs::write(&config, "").unwrap();

    let mut cmd = dota2_sync();
    cmd.env_remove("DOTA2_SYNC_STEAM_ROOT")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config)
        .arg("--steam-root")
        .arg(steam.userdata());
    cmd
}

fn scenario() -> TestSteam {
    let steam = TestSteam::new();
    steam.write(SRC, "a.cfg", "1");
    steam.write(SRC, "b.cfg", "2");
    steam.write(DST, "b.cfg", "X");
    steam.write(DST, "c.cfg", "3");
    steam
}

// ============================================================================
// Help and usage
// ============================================================================

#[test]
fn test_help_lists_sync() {
    dota2_sync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_sync_help_lists_flags() {
    dota2_sync()
        .args(["sync", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--mode"))
        .stdout(predicate::str::contains("--on-conflict"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_version() {
    dota2_sync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_arguments_is_usage_error() {
    dota2_sync().assert().code(2);
}

#[test]
fn test_invalid_mode_is_usage_error() {
    dota2_sync()
        .args(["sync", SRC, DST, "--mode", "copy"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("copy"));
}

#[test]
fn test_invalid_policy_is_usage_error() {
    dota2_sync()
        .args(["sync", SRC, DST, "--on-conflict", "ask"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_destination_is_usage_error() {
    dota2_sync().args(["sync", SRC]).assert().code(2);
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_list_shows_accounts() {
    let steam = scenario();

    isolated(&steam)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(SRC))
        .stdout(predicate::str::contains(DST));
}

#[test]
fn test_list_json() {
    let steam = scenario();

    let output = isolated(&steam).args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());

    let profiles: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = profiles
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![SRC, DST]);
}

#[test]
fn test_no_profiles_exits_2() {
    let steam = TestSteam::new();

    isolated(&steam)
        .arg("list")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_unknown_account_exits_2() {
    let steam = scenario();

    isolated(&steam)
        .args(["sync", SRC, "99999999"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("99999999"));
}

#[test]
fn test_same_account_exits_2() {
    let steam = scenario();

    isolated(&steam).args(["sync", SRC, SRC]).assert().code(2);
    assert_eq!(steam.read(SRC, "a.cfg").as_deref(), Some("1"));
}

#[test]
fn test_steam_root_from_environment() {
    let steam = scenario();
    let config = steam.scratch().join("config.toml");
    std::fs::write(&config, "").unwrap();

    dota2_sync()
        .env("DOTA2_SYNC_STEAM_ROOT", steam.userdata())
        .arg("--config")
        .arg(config)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(SRC));
}

#[test]
fn test_invalid_settings_file_exits_1() {
    let steam = scenario();
    let config = steam.scratch().join("bad.toml");
    std::fs::write(&config, "workers = 0\n").unwrap();

    dota2_sync()
        .arg("--config")
        .arg(config)
        .arg("--steam-root")
        .arg(steam.userdata())
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("workers"));
}

// ============================================================================
// Sync
// ============================================================================

#[test]
fn test_mirror_prefer_source() {
    let steam = scenario();

    isolated(&steam)
        .args(["sync", SRC, DST, "--mode", "mirror", "--on-conflict", "prefer-source"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));

    assert_eq!(
        steam.files(DST),
        d2sync_test_utils::file_map(&[("a.cfg", "1"), ("b.cfg", "2")])
    );
    assert_eq!(steam.files(SRC), d2sync_test_utils::file_map(&[("a.cfg", "1"), ("b.cfg", "2")]));
}

#[test]
fn test_merge_default_backs_up_conflicts() {
    let steam = scenario();

    isolated(&steam).args(["sync", SRC, DST]).assert().success();

    assert_eq!(
        steam.files(DST),
        d2sync_test_utils::file_map(&[("a.cfg", "1"), ("b.cfg", "2"), ("c.cfg", "3")])
    );
    let backups = steam.backups(DST);
    assert_eq!(backups.len(), 1);
    let (path, content) = backups.iter().next().unwrap();
    assert!(path.ends_with("/b.cfg"), "got: {path}");
    assert_eq!(content, "X");
}

#[test]
fn test_prefer_destination_keeps_destination() {
    let steam = scenario();

    isolated(&steam)
        .args(["sync", SRC, DST, "--on-conflict", "prefer-destination"])
        .assert()
        .success();

    assert_eq!(steam.read(DST, "b.cfg").as_deref(), Some("X"));
    assert_eq!(steam.read(DST, "a.cfg").as_deref(), Some("1"));
}

#[test]
fn test_dry_run_modifies_nothing() {
    let steam = scenario();
    let before = steam.files(DST);

    isolated(&steam)
        .args(["sync", SRC, DST, "--mode", "mirror", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN"))
        .stdout(predicate::str::contains("a.cfg"))
        .stdout(predicate::str::contains("delete"));

    assert_eq!(steam.files(DST), before);
    assert!(!steam.profile_root(DST).join(".dota2-sync").exists());
}

#[test]
fn test_second_run_changes_nothing() {
    let steam = scenario();

    isolated(&steam)
        .args(["sync", SRC, DST, "--mode", "mirror", "--on-conflict", "prefer-source"])
        .assert()
        .success();
    let after_first = steam.files(DST);

    isolated(&steam)
        .args(["sync", SRC, DST, "--mode", "mirror", "--on-conflict", "prefer-source"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 file(s) updated"));

    assert_eq!(steam.files(DST), after_first);
}

#[test]
fn test_sync_json_dry_run() {
    let steam = scenario();

    let output = isolated(&steam)
        .args(["sync", SRC, DST, "--dry-run", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["source"]["id"], SRC);
    assert_eq!(outcome["destination"]["id"], DST);
    assert_eq!(outcome["changes"]["added"], 1);
    assert_eq!(outcome["changes"]["modified"], 1);
    assert_eq!(outcome["result"]["status"], "planned");
}

// ============================================================================
// Partial failure
// ============================================================================

#[test]
fn test_partial_failure_exits_1_with_report() {
    let steam = TestSteam::new();
    steam.write_all(SRC, &[("a.cfg", "1"), ("sub/x.cfg", "x"), ("z.cfg", "z")]);
    // A plain file where the copy needs a directory.
    steam.write(DST, "sub", "not a directory");

    isolated(&steam)
        .args(["sync", SRC, DST])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("PARTIAL"))
        .stdout(predicate::str::contains("sub/x.cfg"))
        .stdout(predicate::str::contains("not run"))
        .stderr(predicate::str::contains("error"));

    assert_eq!(
        steam.files(DST),
        d2sync_test_utils::file_map(&[("a.cfg", "1"), ("sub", "not a directory")])
    );
    assert!(!steam.profile_root(DST).join(".dota2-sync/baseline.toml").exists());
}

#[test]
fn test_partial_failure_json_report() {
    let steam = TestSteam::new();
    steam.write_all(SRC, &[("a.cfg", "1"), ("sub/x.cfg", "x")]);
    steam.write(DST, "sub", "not a directory");

    let output = isolated(&steam)
        .args(["sync", SRC, DST, "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let states: Vec<&str> = report["outcomes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["state"].as_str().unwrap())
        .collect();
    assert_eq!(states, vec!["committed", "committed", "failed"]);
}
