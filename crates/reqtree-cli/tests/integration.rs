#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn reqtree(ws: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("reqtree").unwrap();
    cmd.current_dir(ws.path())
        .env("REQTREE_WORKSPACE", ws.path());
    cmd
}

fn add_requirement(ws: &TempDir, name: &str) -> String {
    let output = reqtree(ws)
        .args([
            "add", name, "--iteration", "24.10.1", "--deadline", "2026-10-24", "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    value["id"].as_str().unwrap().to_string()
}

fn init_repo(ws: &TempDir, name: &str) -> std::path::PathBuf {
    let repo = ws.path().join(name);
    std::fs::create_dir(&repo).unwrap();
    for args in [
        vec!["init", "-b", "main"],
        vec!["config", "user.email", "dev@example.com"],
        vec!["config", "user.name", "Dev"],
        vec!["commit", "--allow-empty", "-m", "init"],
    ] {
        let status = std::process::Command::new("git")
            .args(&args)
            .current_dir(&repo)
            .output()
            .unwrap();
        assert!(status.status.success(), "git {args:?} failed");
    }
    repo
}

// ---------------------------------------------------------------------------
// reqtree init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_workspace_items() {
    let ws = TempDir::new().unwrap();
    reqtree(&ws)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("requirements.json"));

    assert!(ws.path().join("requirements.json").exists());
    assert!(ws.path().join("worktrees").is_dir());
    assert!(ws.path().join(".mcp.json").exists());
    assert!(ws.path().join(".gemini/settings.json").exists());
}

#[test]
fn init_is_idempotent() {
    let ws = TempDir::new().unwrap();
    reqtree(&ws).arg("init").assert().success();
    reqtree(&ws)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists"));
}

#[test]
fn missing_workspace_fails() {
    Command::cargo_bin("reqtree")
        .unwrap()
        .env_remove("REQTREE_WORKSPACE")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no workspace"));
}

// ---------------------------------------------------------------------------
// requirement CRUD
// ---------------------------------------------------------------------------

#[test]
fn add_and_list() {
    let ws = TempDir::new().unwrap();
    add_requirement(&ws, "Login page");

    reqtree(&ws)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Login page"));
}

#[test]
fn add_with_links_shows_them() {
    let ws = TempDir::new().unwrap();
    reqtree(&ws)
        .args([
            "add",
            "Login page",
            "--iteration",
            "24.10.1",
            "--deadline",
            "2026-10-24",
            "--link",
            "PRD=https://example.com/prd",
        ])
        .assert()
        .success();

    let out = reqtree(&ws).args(["list", "--json"]).output().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let id = value[0]["id"].as_str().unwrap();

    reqtree(&ws)
        .args(["show", id])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://example.com/prd"));
}

#[test]
fn add_invalid_iteration_fails() {
    let ws = TempDir::new().unwrap();
    reqtree(&ws)
        .args([
            "add", "Login page", "--iteration", "not-a-label", "--deadline", "2026-10-24",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid iteration"));
}

#[test]
fn add_invalid_link_fails() {
    let ws = TempDir::new().unwrap();
    reqtree(&ws)
        .args([
            "add",
            "Login page",
            "--iteration",
            "24.10.1",
            "--deadline",
            "2026-10-24",
            "--link",
            "PRD=ftp://example.com",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid link"));
}

#[test]
fn show_unknown_id_fails() {
    let ws = TempDir::new().unwrap();
    reqtree(&ws)
        .args(["show", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requirement not found"));
}

#[test]
fn update_changes_fields() {
    let ws = TempDir::new().unwrap();
    let id = add_requirement(&ws, "Login page");

    reqtree(&ws)
        .args(["update", &id, "--name", "Login flow", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Login flow"));
}

#[test]
fn finish_marks_and_list_hides() {
    let ws = TempDir::new().unwrap();
    let id = add_requirement(&ws, "Login page");

    reqtree(&ws).args(["finish", &id]).assert().success();

    reqtree(&ws)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Login page").not());
    reqtree(&ws)
        .args(["list", "--finished"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Login page"));
}

#[test]
fn delete_with_yes_removes() {
    let ws = TempDir::new().unwrap();
    let id = add_requirement(&ws, "Login page");

    reqtree(&ws).args(["delete", &id, "--yes"]).assert().success();
    reqtree(&ws)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No requirements."));
}

#[test]
fn delete_declined_confirmation_aborts_cleanly() {
    let ws = TempDir::new().unwrap();
    let id = add_requirement(&ws, "Login page");

    reqtree(&ws)
        .args(["delete", &id])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted."));

    reqtree(&ws)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Login page"));
}

// ---------------------------------------------------------------------------
// worktrees
// ---------------------------------------------------------------------------

#[test]
fn worktree_create_show_remove_cycle() {
    let ws = TempDir::new().unwrap();
    let id = add_requirement(&ws, "Login page");
    let repo = init_repo(&ws, "app");

    let expected = ws
        .path()
        .join("worktrees")
        .join(&id)
        .join("app-feat-r1-login");
    reqtree(&ws)
        .args([
            "worktree",
            "create",
            &id,
            "--repo",
            repo.to_str().unwrap(),
            "--branch",
            "feat/r1/login",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("app-feat-r1-login"));
    assert!(expected.join(".git").exists());

    reqtree(&ws)
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("feat/r1/login"));

    reqtree(&ws)
        .args(["worktree", "list", "--repo", repo.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("feat/r1/login"));

    reqtree(&ws)
        .args([
            "worktree",
            "remove",
            &id,
            "--path",
            expected.to_str().unwrap(),
            "--repo",
            repo.to_str().unwrap(),
            "--yes",
        ])
        .assert()
        .success();
    assert!(!expected.exists());
}

#[test]
fn worktree_create_invalid_branch_fails() {
    let ws = TempDir::new().unwrap();
    let id = add_requirement(&ws, "Login page");
    let repo = init_repo(&ws, "app");

    reqtree(&ws)
        .args([
            "worktree",
            "create",
            &id,
            "--repo",
            repo.to_str().unwrap(),
            "--branch",
            "has space",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid branch name"));
}

#[test]
fn worktree_create_without_branch_uses_slug() {
    let ws = TempDir::new().unwrap();
    let id = add_requirement(&ws, "Export CSV");
    let repo = init_repo(&ws, "app");

    // --no-ai keeps the test hermetic: the deterministic slug is used.
    reqtree(&ws)
        .args([
            "worktree",
            "create",
            &id,
            "--repo",
            repo.to_str().unwrap(),
            "--no-ai",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("feat/{id}/export-csv")));
}

#[test]
fn worktree_remove_unregistered_path_fails() {
    let ws = TempDir::new().unwrap();
    let id = add_requirement(&ws, "Login page");
    let repo = init_repo(&ws, "app");

    reqtree(&ws)
        .args([
            "worktree",
            "remove",
            &id,
            "--path",
            "/tmp/never-registered",
            "--repo",
            repo.to_str().unwrap(),
            "--yes",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no worktree registered"));
}

// ---------------------------------------------------------------------------
// sync
// ---------------------------------------------------------------------------

#[test]
fn sync_missing_document_fails() {
    let ws = TempDir::new().unwrap();
    reqtree(&ws)
        .args(["sync", "--doc", "/tmp/definitely-missing.xlsx", "--filter", "all"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("document not found"));
}
