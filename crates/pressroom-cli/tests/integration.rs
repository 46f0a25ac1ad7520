use assert_cmd::Command;
use chrono::{Duration, Utc};
use predicates::prelude::*;
use tempfile::TempDir;

fn pressroom(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pressroom").unwrap();
    cmd.current_dir(dir.path()).env("PRESSROOM_ROOT", dir.path());
    cmd
}

fn init_project(dir: &TempDir) {
    pressroom(dir).arg("init").assert().success();
}

/// Run a command expected to succeed and parse its stdout as JSON.
fn json_out(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = pressroom(dir).args(args).arg("-j").output().unwrap();
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn future_time() -> String {
    (Utc::now() + Duration::hours(2)).to_rfc3339()
}

fn create_product(dir: &TempDir, name: &str) -> String {
    let entity = json_out(
        dir,
        &[
            "content", "create", name, "--kind", "product", "--brand", "acme", "--description",
            "Solid walnut", "--category", "furniture", "--price", "29.99", "--image", "desk.jpg",
            "--stock", "10",
        ],
    );
    entity["id"].as_str().unwrap().to_string()
}

fn create_schedule(dir: &TempDir, name: &str) -> String {
    let schedule = json_out(
        dir,
        &[
            "schedule",
            "create",
            name,
            "--mode",
            "blog",
            "--per-day",
            "3",
            "--start",
            "2026-09-01",
            "--publish-mode",
            "qc_required",
            "--brand",
            "acme",
        ],
    );
    schedule["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// pressroom init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_data_directory() {
    let dir = TempDir::new().unwrap();
    pressroom(&dir).arg("init").assert().success();

    assert!(dir.path().join(".pressroom").is_dir());
    assert!(dir.path().join(".pressroom/config.yaml").exists());
    assert!(dir.path().join(".pressroom/state.redb").exists());
    assert!(dir.path().join(".pressroom/audit.sqlite").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    pressroom(&dir).arg("init").assert().success();
    pressroom(&dir).arg("init").assert().success();
}

// ---------------------------------------------------------------------------
// pressroom config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_accepts_defaults() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    pressroom(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config ok"));
}

// ---------------------------------------------------------------------------
// content lifecycle
// ---------------------------------------------------------------------------

#[test]
fn content_lifecycle_end_to_end() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let id = create_product(&dir, "Walnut Desk");

    let at = future_time();
    pressroom(&dir)
        .args(["content", "schedule", &id, "--at", &at])
        .assert()
        .success();
    pressroom(&dir)
        .args(["content", "approve", &id])
        .assert()
        .success();
    pressroom(&dir)
        .args(["content", "publish", &id])
        .assert()
        .success();

    let entity = json_out(&dir, &["content", "show", &id]);
    assert_eq!(entity["status"], "PUBLISHED");
}

#[test]
fn publishing_a_draft_is_rejected() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let id = create_product(&dir, "Walnut Desk");
    pressroom(&dir)
        .args(["content", "publish", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DRAFT"));
}

#[test]
fn viewer_cannot_create_content() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    pressroom(&dir)
        .args([
            "--role", "viewer", "--brand", "acme", "content", "create", "Walnut Desk", "--kind",
            "product",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("permission denied"));
}

#[test]
fn unknown_role_is_rejected() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    pressroom(&dir)
        .args(["--role", "wizard", "content", "list"])
        .assert()
        .failure();
}

#[test]
fn content_list_json_is_parseable() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create_product(&dir, "Walnut Desk");
    create_product(&dir, "Oak Shelf");

    let list = json_out(&dir, &["content", "list"]);
    assert_eq!(list.as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// keywords
// ---------------------------------------------------------------------------

#[test]
fn keyword_retry_clears_recorded_error() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let schedule_id = create_schedule(&dir, "Autumn posts");
    let rows = json_out(&dir, &["keyword", "add", &schedule_id, "walnut desk"]);
    let keyword_id = rows[0]["id"].as_str().unwrap().to_string();

    pressroom(&dir)
        .args([
            "keyword", "update", &schedule_id, &keyword_id, "--status", "failed",
        ])
        .assert()
        .success();

    let kw = json_out(&dir, &["keyword", "retry", &schedule_id, &keyword_id]);
    assert_eq!(kw["status"], "PENDING");
    assert!(kw.get("last_error").is_none() || kw["last_error"].is_null());
}

#[test]
fn keyword_of_another_schedule_is_not_found() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let first = create_schedule(&dir, "First");
    let second = create_schedule(&dir, "Second");
    let rows = json_out(&dir, &["keyword", "add", &first, "walnut desk"]);
    let keyword_id = rows[0]["id"].as_str().unwrap().to_string();

    pressroom(&dir)
        .args(["keyword", "delete", &second, &keyword_id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

// ---------------------------------------------------------------------------
// jobs
// ---------------------------------------------------------------------------

#[test]
fn running_job_cannot_be_deleted() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let job = json_out(&dir, &["job", "create", "engine-a"]);
    let id = job["id"].as_str().unwrap().to_string();

    // SCHEDULED -> RUNNING
    pressroom(&dir).args(["job", "resume", &id]).assert().success();

    pressroom(&dir)
        .args(["job", "delete", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RUNNING"));

    pressroom(&dir).args(["job", "cancel", &id]).assert().success();
    pressroom(&dir).args(["job", "delete", &id]).assert().success();
}

// ---------------------------------------------------------------------------
// approvals
// ---------------------------------------------------------------------------

#[test]
fn approval_must_be_reviewed_before_execution() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let target = create_product(&dir, "Walnut Desk");
    let approval = json_out(
        &dir,
        &[
            "approval", "request", "--category", "product", "--action", "promote", "--target",
            &target,
        ],
    );
    let id = approval["id"].as_str().unwrap().to_string();
    assert_eq!(approval["status"], "PENDING");

    pressroom(&dir)
        .args(["approval", "execute", &id])
        .assert()
        .failure();

    pressroom(&dir)
        .args(["approval", "approve", &id])
        .assert()
        .success();
    pressroom(&dir)
        .args(["approval", "execute", &id])
        .assert()
        .success();

    let entity = json_out(&dir, &["content", "show", &target]);
    assert_eq!(entity["priority"], 1);
    assert_eq!(entity["featured"], true);
}

#[test]
fn simulate_leaves_target_untouched() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let target = create_product(&dir, "Walnut Desk");
    let report = json_out(
        &dir,
        &[
            "approval", "simulate", "--category", "product", "--action", "promote", "--target",
            &target,
        ],
    );
    assert_eq!(report["supported"], true);
    assert_eq!(report["impact"]["priority_after"], 1);

    let entity = json_out(&dir, &["content", "show", &target]);
    assert_eq!(entity["priority"], 0);
    assert_eq!(entity["featured"], false);
}

// ---------------------------------------------------------------------------
// engine + audit
// ---------------------------------------------------------------------------

#[test]
fn engine_status_reflects_heartbeat() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let before = json_out(&dir, &["engine", "status", "engine-a"]);
    assert_eq!(before["liveness"], "STOPPED");

    pressroom(&dir)
        .args(["engine", "heartbeat", "engine-a"])
        .assert()
        .success();

    let after = json_out(&dir, &["engine", "status", "engine-a"]);
    assert_eq!(after["liveness"], "RUNNING");
}

#[test]
fn audit_records_mutations() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    pressroom(&dir)
        .args([
            "--actor", "ana", "content", "create", "Walnut Desk", "--kind", "product", "--brand",
            "acme",
        ])
        .assert()
        .success();

    let entries = json_out(&dir, &["audit"]);
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["actor"], "ana");
    assert_eq!(entries[0]["status_after"], "DRAFT");
}
