use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn db_arg(dir: &TempDir) -> String {
    dir.path().join("threadmem.db").display().to_string()
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("threadmem"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("ThreadMem"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("threadmem"));
    cmd.arg("--version").assert().success();
}

#[test]
fn test_stats_on_fresh_database() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("threadmem"));
    cmd.args(["--db", &db_arg(&dir), "stats"])
        .assert()
        .success()
        .stdout(contains("Threads:"))
        .stdout(contains("Messages:"));
}

#[test]
fn test_stats_json_is_parseable() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("threadmem"));
    let assert = cmd
        .args(["--db", &db_arg(&dir), "stats", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["total_threads"], 0);
    assert_eq!(value["total_messages"], 0);
}

#[test]
fn test_cleanup_dry_run_on_fresh_database() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("threadmem"));
    cmd.args(["--db", &db_arg(&dir), "cleanup", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("Dry run; nothing was deleted."))
        .stdout(contains("Threads scanned:     0"));
}

#[test]
fn test_backfill_on_fresh_database() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("threadmem"));
    cmd.args(["--db", &db_arg(&dir), "backfill"])
        .assert()
        .success()
        .stdout(contains("Threads processed: 0"));
}
