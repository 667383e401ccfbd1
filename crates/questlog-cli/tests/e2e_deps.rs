//! E2E dependency workflow tests: wiring blockers, the blocked-transition
//! gate, cascade unblocking, and the compact blocked view.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn ql_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ql"));
    cmd.env("QUESTLOG_DATA_DIR", dir.join("data"));
    cmd.env("QUESTLOG_SESSION_ROOT", dir.join("sessions"));
    cmd.env("QUESTLOG_SESSION", "ses_deps");
    cmd.env("QUESTLOG_LOG", "error");
    cmd.env_remove("QUESTLOG_FORMAT");
    cmd
}

fn create_quest(dir: &Path, subject: &str) -> String {
    let output = ql_cmd(dir)
        .args([
            "create",
            "--subject",
            subject,
            "--description",
            &format!("brief for {subject}"),
            "--json",
        ])
        .output()
        .expect("create should not crash");
    assert!(
        output.status.success(),
        "create failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    json["quest"]["id"].as_str().expect("id must exist").to_string()
}

fn add_blocker(dir: &Path, blocked: &str, blocker: &str) {
    ql_cmd(dir)
        .args(["update", blocked, "--blocked-by", blocker])
        .assert()
        .success();
}

fn update_json(dir: &Path, args: &[&str]) -> Value {
    let mut full = vec!["update"];
    full.extend_from_slice(args);
    full.push("--json");
    let output = ql_cmd(dir).args(&full).output().expect("update should not crash");
    assert!(
        output.status.success(),
        "update failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("update --json must parse")
}

#[test]
fn blocked_advance_is_rejected_naming_the_blocker() {
    let dir = TempDir::new().unwrap();
    let a = create_quest(dir.path(), "Foundation");
    let b = create_quest(dir.path(), "Build feature");
    add_blocker(dir.path(), &b, &a);

    ql_cmd(dir.path())
        .args(["update", &b, "--status", "in_progress"])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("blocked")
                .and(predicate::str::contains(&a))
                .and(predicate::str::contains("Foundation")),
        );

    // Nothing moved.
    let output = ql_cmd(dir.path())
        .args(["get", &b, "--json"])
        .output()
        .expect("get");
    let json: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["quest"]["status"], "pending");
}

#[test]
fn completing_a_blocker_cascades_to_dependents() {
    let dir = TempDir::new().unwrap();
    let a = create_quest(dir.path(), "Foundation");
    let b = create_quest(dir.path(), "Build feature");
    add_blocker(dir.path(), &b, &a);

    // The dependent is not available while the blocker is open.
    ql_cmd(dir.path())
        .args(["list", "--available"])
        .assert()
        .success()
        .stdout(predicate::str::contains(&b).not());

    let done = update_json(dir.path(), &[a.as_str(), "--status", "completed"]);
    assert_eq!(
        done["newly_unblocked"].as_array().unwrap(),
        &vec![Value::String(b.clone())]
    );

    // Now available, but still pending until explicitly started.
    ql_cmd(dir.path())
        .args(["list", "--available"])
        .assert()
        .success()
        .stdout(predicate::str::contains(&b));
    let output = ql_cmd(dir.path())
        .args(["get", &b, "--json"])
        .output()
        .expect("get");
    let json: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["quest"]["status"], "pending");

    // And the advance goes through.
    ql_cmd(dir.path())
        .args(["update", &b, "--status", "in_progress"])
        .assert()
        .success();
}

#[test]
fn finishing_everything_reports_all_completed() {
    let dir = TempDir::new().unwrap();
    let a = create_quest(dir.path(), "one");
    let b = create_quest(dir.path(), "two");

    ql_cmd(dir.path())
        .args(["update", &a, "--status", "completed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("all quests completed").not());

    ql_cmd(dir.path())
        .args(["update", &b, "--status", "completed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("all quests completed"));
}

#[test]
fn unblock_flag_removes_blockers() {
    let dir = TempDir::new().unwrap();
    let a = create_quest(dir.path(), "gate");
    let b = create_quest(dir.path(), "gated");
    add_blocker(dir.path(), &b, &a);

    ql_cmd(dir.path())
        .args(["update", &b, "--unblock", &a])
        .assert()
        .success();

    // With the blocker gone the advance is allowed.
    ql_cmd(dir.path())
        .args(["update", &b, "--status", "completed"])
        .assert()
        .success();
}

#[test]
fn unknown_blocker_ids_are_silently_ignored() {
    let dir = TempDir::new().unwrap();
    let a = create_quest(dir.path(), "solo");

    let updated = update_json(dir.path(), &[a.as_str(), "--blocked-by", "quest-404"]);
    assert!(updated["quest"]["blockedBy"].as_array().unwrap().is_empty());

    // The dangling reference never gates the advance.
    ql_cmd(dir.path())
        .args(["update", &a, "--status", "completed"])
        .assert()
        .success();
}

#[test]
fn compact_list_marks_blocked_quests() {
    let dir = TempDir::new().unwrap();
    let a = create_quest(dir.path(), "Foundation");
    let b = create_quest(dir.path(), "Build feature");
    add_blocker(dir.path(), &b, &a);

    ql_cmd(dir.path())
        .args(["list", "--compact"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("○001")
                .and(predicate::str::contains("○002⊘"))
                .and(predicate::str::contains("legend:")),
        );
}

#[test]
fn blocked_marker_appears_in_the_plain_listing() {
    let dir = TempDir::new().unwrap();
    let a = create_quest(dir.path(), "Foundation");
    let b = create_quest(dir.path(), "Build feature");
    add_blocker(dir.path(), &b, &a);

    ql_cmd(dir.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("blocked by: {a}")));
}
