//! End-to-end tests for the depgov CLI
//!
//! These tests verify:
//! - `diff` text and JSON output
//! - `resolve` on documents that need no index access
//! - Exit codes for success and fatal errors

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn depgov() -> Command {
    let mut cmd = Command::cargo_bin("depgov").expect("binary should be built");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_snapshots(dir: &TempDir) -> (String, String) {
    let before = dir.path().join("before.tsv");
    let after = dir.path().join("after.tsv");
    fs::write(
        &before,
        "# group\torganization\tartifact\tversion\n\
         core\torg.typelevel\tcats-core\t2.9.0\n\
         core\tcom.lihaoyi\tos-lib\t0.9.1\n",
    )
    .unwrap();
    fs::write(
        &after,
        "core\torg.typelevel\tcats-core\t2.10.0\n\
         core\tco.fs2\tfs2-core\t3.9.4\n",
    )
    .unwrap();
    (
        before.to_string_lossy().into_owned(),
        after.to_string_lossy().into_owned(),
    )
}

#[test]
fn test_diff_text() {
    let dir = TempDir::new().unwrap();
    let (before, after) = write_snapshots(&dir);

    depgov()
        .args(["diff", &before, &after])
        .assert()
        .success()
        .stdout(predicate::str::contains("~ org.typelevel:cats-core 2.9.0 -> 2.10.0"))
        .stdout(predicate::str::contains("+ co.fs2:fs2-core 3.9.4"))
        .stdout(predicate::str::contains("- com.lihaoyi:os-lib 0.9.1"));
}

#[test]
fn test_diff_json() {
    let dir = TempDir::new().unwrap();
    let (before, after) = write_snapshots(&dir);

    let output = depgov()
        .args(["diff", &before, &after, "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed["generated_at"].is_string());
    assert_eq!(parsed["groups"]["core"]["updated"][0]["to"], "2.10.0");
    assert_eq!(parsed["groups"]["core"]["added"][0]["artifact"], "fs2-core");
    assert_eq!(parsed["groups"]["core"]["removed"][0]["artifact"], "os-lib");
}

#[test]
fn test_diff_identical_snapshots() {
    let dir = TempDir::new().unwrap();
    let (before, _) = write_snapshots(&dir);

    depgov()
        .args(["diff", &before, &before])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes"));
}

#[test]
fn test_diff_missing_file_fails() {
    depgov()
        .args(["diff", "/nonexistent/a.tsv", "/nonexistent/b.tsv"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read snapshot"));
}

#[test]
fn test_resolve_offline_document() {
    let dir = TempDir::new().unwrap();
    let deps = dir.path().join("deps.json");
    let snapshot = dir.path().join("resolved.tsv");
    fs::write(
        &deps,
        r#"[
            {"organization": "org.typelevel", "artifact": "cats-core", "version": "=2.10.0", "cross": true, "group": "core"},
            {"organization": "io.circe", "artifact": "circe-core", "version": "$circeVersion", "cross": true, "group": "core"}
        ]"#,
    )
    .unwrap();

    let output = depgov()
        .args([
            "resolve",
            deps.to_str().unwrap(),
            "--json",
            "--verbose",
            "--snapshot-out",
            snapshot.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["summary"]["total"], 2);
    assert_eq!(parsed["summary"]["deferred"], 1);
    assert_eq!(parsed["dependencies"][0]["status"], "up_to_date");
    assert_eq!(parsed["dependencies"][1]["status"], "deferred");

    let written = fs::read_to_string(&snapshot).unwrap();
    assert!(written.contains("core\torg.typelevel\tcats-core\t2.10.0"));
    assert!(!written.contains("circe"));
}

#[test]
fn test_resolve_invalid_document() {
    let dir = TempDir::new().unwrap();
    let deps = dir.path().join("deps.json");
    fs::write(&deps, r#"[{"organization": "a", "artifact": "b", "version": "latest"}]"#).unwrap();

    depgov()
        .args(["resolve", deps.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unparsable version"));
}

#[test]
fn test_resolve_rejects_bad_timeout() {
    depgov()
        .args(["resolve", "deps.json", "--timeout", "forever"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid duration format"));
}
