//! Git worktree lifecycle, shelling out to the `git` binary.

use crate::error::{ReqtreeError, Result};
use crate::paths;
use crate::process::{best_error_line, run_capture, CmdOutput};
use crate::requirement::{FeatureType, WorktreeInfo};
use crate::store::RequirementStore;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const ADD_TIMEOUT: Duration = Duration::from_secs(30);
const REMOVE_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Branch name validation
// ---------------------------------------------------------------------------

const FORBIDDEN_CHARS: [char; 9] = ['~', '^', ':', '?', '*', '[', ']', '\\', ' '];

/// Check a proposed branch name against git ref-name constraints, without
/// invoking git. Rejects empty names, a leading `-`, `..`, whitespace, and
/// the ref-syntax metacharacters.
pub fn validate_branch_name(name: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(ReqtreeError::InvalidBranchName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };
    if name.is_empty() {
        return reject("must not be empty");
    }
    if name.starts_with('-') {
        return reject("must not start with '-'");
    }
    if name.contains("..") {
        return reject("must not contain '..'");
    }
    if let Some(bad) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        if bad == ' ' {
            return reject("must not contain spaces");
        }
        return reject(&format!("must not contain '{bad}'"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Repository queries
// ---------------------------------------------------------------------------

pub fn is_git_repository(repo: &Path) -> bool {
    run_capture(
        "git",
        &["rev-parse", "--is-inside-work-tree"],
        Some(repo),
        Some(REMOVE_TIMEOUT),
    )
    .map(|out| out.success && out.stdout.trim() == "true")
    .unwrap_or(false)
}

pub fn repo_root(repo: &Path) -> Result<PathBuf> {
    let out = run_capture(
        "git",
        &["rev-parse", "--show-toplevel"],
        Some(repo),
        Some(REMOVE_TIMEOUT),
    )?;
    if !out.success {
        return Err(ReqtreeError::NotARepository(repo.to_path_buf()));
    }
    Ok(PathBuf::from(out.stdout.trim()))
}

/// `git show-ref --verify --quiet`: a non-zero exit means "does not exist",
/// not an error.
pub fn branch_exists(repo: &Path, branch: &str) -> bool {
    run_capture(
        "git",
        &["show-ref", "--verify", "--quiet", &format!("refs/heads/{branch}")],
        Some(repo),
        Some(REMOVE_TIMEOUT),
    )
    .map(|out| out.success)
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Worktree listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeEntry {
    pub path: PathBuf,
    /// None for a detached HEAD or the bare entry.
    pub branch: Option<String>,
}

pub fn list_worktrees(repo: &Path) -> Result<Vec<WorktreeEntry>> {
    let out = run_capture(
        "git",
        &["worktree", "list", "--porcelain"],
        Some(repo),
        Some(REMOVE_TIMEOUT),
    )?;
    if !out.success {
        return Err(git_failed(&out));
    }
    Ok(parse_worktree_porcelain(&out.stdout))
}

fn parse_worktree_porcelain(raw: &str) -> Vec<WorktreeEntry> {
    let mut entries = Vec::new();
    let mut path: Option<PathBuf> = None;
    let mut branch: Option<String> = None;
    for line in raw.lines() {
        if let Some(value) = line.strip_prefix("worktree ") {
            if let Some(p) = path.take() {
                entries.push(WorktreeEntry {
                    path: p,
                    branch: branch.take(),
                });
            }
            path = Some(PathBuf::from(value.trim()));
            branch = None;
        } else if let Some(value) = line.strip_prefix("branch ") {
            branch = value
                .trim()
                .strip_prefix("refs/heads/")
                .map(str::to_string);
        }
    }
    if let Some(p) = path {
        entries.push(WorktreeEntry { path: p, branch });
    }
    entries
}

// ---------------------------------------------------------------------------
// Worktree lifecycle
// ---------------------------------------------------------------------------

pub struct CreateWorktree<'a> {
    pub workspace_root: &'a Path,
    pub repo: &'a Path,
    pub requirement_id: &'a str,
    pub branch: &'a str,
    pub base_branch: &'a str,
    pub feature_type: FeatureType,
    /// Replace an existing directory at the target path by removing it as a
    /// worktree first. Without it an existing path aborts.
    pub force: bool,
}

/// Create a worktree for a requirement and register it in the store.
///
/// Order matters: every precondition is checked before git mutates anything,
/// so a failed run leaves both the repository and the store untouched. The
/// one exception is the final store write after `git worktree add` succeeds;
/// if that write fails, the worktree exists on disk but is unregistered, and
/// the error says so.
pub fn create_worktree(store: &RequirementStore, req: &CreateWorktree<'_>) -> Result<PathBuf> {
    validate_branch_name(req.branch)?;
    if !is_git_repository(req.repo) {
        return Err(ReqtreeError::NotARepository(req.repo.to_path_buf()));
    }
    store.find(req.requirement_id)?;

    let repository = paths::repo_name(req.repo);
    let target = paths::worktree_path(
        req.workspace_root,
        req.requirement_id,
        &repository,
        req.branch,
    );

    if target.exists() {
        if !req.force {
            return Err(ReqtreeError::WorktreePathExists(target));
        }
        debug!(path = %target.display(), "removing existing worktree before recreate");
        let target_str = target.to_string_lossy();
        let out = run_capture(
            "git",
            &["worktree", "remove", "--force", &*target_str],
            Some(req.repo),
            Some(REMOVE_TIMEOUT),
        )?;
        if !out.success {
            return Err(git_failed(&out));
        }
    }

    if branch_exists(req.repo, req.branch) {
        return Err(ReqtreeError::BranchExists(req.branch.to_string()));
    }

    // git worktree add -b <branch> <path> [<commit-ish>]
    let target_str = target.to_string_lossy();
    let mut args = vec!["worktree", "add", "-b", req.branch, &*target_str];
    if !req.base_branch.is_empty() {
        args.push(req.base_branch);
    }
    let out = run_capture("git", &args, Some(req.repo), Some(ADD_TIMEOUT))?;
    if !out.success {
        return Err(git_failed(&out));
    }

    store
        .add_worktree(
            req.requirement_id,
            WorktreeInfo {
                path: target.clone(),
                branch: req.branch.to_string(),
                repository,
                base_branch: req.base_branch.to_string(),
                feature_type: req.feature_type,
            },
        )
        .map_err(|e| ReqtreeError::ToolFailed {
            tool: "reqtree".to_string(),
            message: format!(
                "worktree created at {} but could not be registered: {e}",
                target.display()
            ),
        })?;

    info!(path = %target.display(), branch = req.branch, "created worktree");
    Ok(target)
}

/// Remove a worktree and deregister it. Fail closed: the store entry is only
/// dropped after git reports success, so a failed removal stays visible.
pub fn remove_worktree(
    store: &RequirementStore,
    repo: &Path,
    requirement_id: &str,
    path: &Path,
) -> Result<WorktreeInfo> {
    let registered = store
        .find(requirement_id)?
        .worktrees
        .into_iter()
        .find(|w| w.path == path)
        .ok_or(ReqtreeError::WorktreeNotFound {
            requirement_id: requirement_id.to_string(),
            path: path.to_path_buf(),
        })?;

    let path_str = path.to_string_lossy();
    let out = run_capture(
        "git",
        &["worktree", "remove", &*path_str],
        Some(repo),
        Some(REMOVE_TIMEOUT),
    )?;
    if !out.success {
        return Err(git_failed(&out));
    }

    store.remove_worktree(requirement_id, path)?;
    info!(path = %path.display(), "removed worktree");
    Ok(registered)
}

fn git_failed(out: &CmdOutput) -> ReqtreeError {
    ReqtreeError::ToolFailed {
        tool: "git".to_string(),
        message: best_error_line(&out.stderr),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::Requirement;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn branch_names_accepted() {
        for name in ["main", "feat/req-1/login", "fix/r2/crash-on-save", "v1.2"] {
            validate_branch_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn branch_names_rejected() {
        for name in ["", "-feature", "a..b", "has space", "weird~branch", "q?x", "a[b]"] {
            assert!(
                validate_branch_name(name).is_err(),
                "expected invalid: {name}"
            );
        }
    }

    #[test]
    fn porcelain_parser_reads_paths_and_branches() {
        let raw = "worktree /repo\nHEAD abc123\nbranch refs/heads/main\n\n\
                   worktree /ws/worktrees/r1/app-feat-x\nHEAD def456\nbranch refs/heads/feat/x\n\n\
                   worktree /ws/detached\nHEAD 0123abc\ndetached\n";
        let entries = parse_worktree_porcelain(raw);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].branch.as_deref(), Some("main"));
        assert_eq!(entries[1].path, PathBuf::from("/ws/worktrees/r1/app-feat-x"));
        assert_eq!(entries[1].branch.as_deref(), Some("feat/x"));
        assert!(entries[2].branch.is_none());
    }

    #[test]
    fn porcelain_parser_empty_input() {
        assert!(parse_worktree_porcelain("").is_empty());
    }

    // -- integration against a real git binary --------------------------------

    fn git(repo: &Path, args: &[&str]) {
        let out = run_capture("git", args, Some(repo), None).unwrap();
        assert!(out.success, "git {args:?} failed: {}", out.stderr);
    }

    fn init_repo(name: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let repo = dir.path().join(name);
        std::fs::create_dir(&repo).unwrap();
        git(&repo, &["init", "-b", "main"]);
        git(&repo, &["config", "user.email", "dev@example.com"]);
        git(&repo, &["config", "user.name", "Dev"]);
        git(&repo, &["commit", "--allow-empty", "-m", "init"]);
        (dir, repo)
    }

    fn seeded_store(ws: &Path, id: &str) -> RequirementStore {
        let store = RequirementStore::new(ws);
        let mut req = Requirement::new(
            "24.10.1",
            "Login page",
            NaiveDate::from_ymd_opt(2026, 10, 24).unwrap(),
        );
        req.id = id.to_string();
        store.add(req).unwrap();
        store
    }

    #[test]
    fn plain_directory_is_not_a_repository() {
        let dir = TempDir::new().unwrap();
        assert!(!is_git_repository(dir.path()));
    }

    #[test]
    fn create_worktree_end_to_end() {
        let (_guard, repo) = init_repo("app");
        let ws = TempDir::new().unwrap();
        let store = seeded_store(ws.path(), "r1");

        let created = create_worktree(
            &store,
            &CreateWorktree {
                workspace_root: ws.path(),
                repo: &repo,
                requirement_id: "r1",
                branch: "feat/r1/login",
                base_branch: "main",
                feature_type: FeatureType::Feat,
                force: false,
            },
        )
        .unwrap();

        assert_eq!(
            created,
            ws.path().join("worktrees/r1/app-feat-r1-login")
        );
        assert!(created.join(".git").exists());
        assert!(branch_exists(&repo, "feat/r1/login"));

        let req = store.find("r1").unwrap();
        assert_eq!(req.worktrees.len(), 1);
        assert_eq!(req.worktrees[0].path, created);
        assert_eq!(req.worktrees[0].repository, "app");
        assert_eq!(req.worktrees[0].base_branch, "main");
    }

    #[test]
    fn create_aborts_on_existing_branch_without_store_write() {
        let (_guard, repo) = init_repo("app");
        let ws = TempDir::new().unwrap();
        let store = seeded_store(ws.path(), "r1");
        git(&repo, &["branch", "feat/taken"]);

        let err = create_worktree(
            &store,
            &CreateWorktree {
                workspace_root: ws.path(),
                repo: &repo,
                requirement_id: "r1",
                branch: "feat/taken",
                base_branch: "main",
                feature_type: FeatureType::Feat,
                force: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ReqtreeError::BranchExists(_)));
        assert!(store.find("r1").unwrap().worktrees.is_empty());
    }

    #[test]
    fn create_aborts_on_existing_path_without_force() {
        let (_guard, repo) = init_repo("app");
        let ws = TempDir::new().unwrap();
        let store = seeded_store(ws.path(), "r1");
        let target = ws.path().join("worktrees/r1/app-feat-x");
        std::fs::create_dir_all(&target).unwrap();

        let err = create_worktree(
            &store,
            &CreateWorktree {
                workspace_root: ws.path(),
                repo: &repo,
                requirement_id: "r1",
                branch: "feat/x",
                base_branch: "main",
                feature_type: FeatureType::Feat,
                force: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ReqtreeError::WorktreePathExists(_)));
    }

    #[test]
    fn create_unknown_requirement_fails_before_git() {
        let (_guard, repo) = init_repo("app");
        let ws = TempDir::new().unwrap();
        let store = RequirementStore::new(ws.path());

        let err = create_worktree(
            &store,
            &CreateWorktree {
                workspace_root: ws.path(),
                repo: &repo,
                requirement_id: "ghost",
                branch: "feat/x",
                base_branch: "main",
                feature_type: FeatureType::Feat,
                force: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ReqtreeError::RequirementNotFound(_)));
        assert!(!branch_exists(&repo, "feat/x"));
    }

    #[test]
    fn remove_worktree_round_trip() {
        let (_guard, repo) = init_repo("app");
        let ws = TempDir::new().unwrap();
        let store = seeded_store(ws.path(), "r1");
        let created = create_worktree(
            &store,
            &CreateWorktree {
                workspace_root: ws.path(),
                repo: &repo,
                requirement_id: "r1",
                branch: "feat/r1/login",
                base_branch: "main",
                feature_type: FeatureType::Feat,
                force: false,
            },
        )
        .unwrap();

        remove_worktree(&store, &repo, "r1", &created).unwrap();
        assert!(store.find("r1").unwrap().worktrees.is_empty());
        assert!(!created.exists());
    }

    #[test]
    fn remove_fails_closed_when_git_fails() {
        let (_guard, repo) = init_repo("app");
        let ws = TempDir::new().unwrap();
        let store = seeded_store(ws.path(), "r1");
        // Registered in the store but never created by git, so removal fails.
        let phantom = ws.path().join("worktrees/r1/app-feat-ghost");
        store
            .add_worktree(
                "r1",
                WorktreeInfo {
                    path: phantom.clone(),
                    branch: "feat/ghost".to_string(),
                    repository: "app".to_string(),
                    base_branch: "main".to_string(),
                    feature_type: FeatureType::Feat,
                },
            )
            .unwrap();

        let err = remove_worktree(&store, &repo, "r1", &phantom).unwrap_err();
        assert!(matches!(err, ReqtreeError::ToolFailed { .. }));
        assert_eq!(store.find("r1").unwrap().worktrees.len(), 1);
    }

    #[test]
    fn remove_unregistered_path_fails_without_touching_git() {
        let (_guard, repo) = init_repo("app");
        let ws = TempDir::new().unwrap();
        let store = seeded_store(ws.path(), "r1");
        let err = remove_worktree(
            &store,
            &repo,
            "r1",
            &ws.path().join("worktrees/r1/never-registered"),
        )
        .unwrap_err();
        assert!(matches!(err, ReqtreeError::WorktreeNotFound { .. }));
    }

    #[test]
    fn list_worktrees_includes_created() {
        let (_guard, repo) = init_repo("app");
        let ws = TempDir::new().unwrap();
        let store = seeded_store(ws.path(), "r1");
        create_worktree(
            &store,
            &CreateWorktree {
                workspace_root: ws.path(),
                repo: &repo,
                requirement_id: "r1",
                branch: "feat/r1/login",
                base_branch: "main",
                feature_type: FeatureType::Feat,
                force: false,
            },
        )
        .unwrap();

        let entries = list_worktrees(&repo).unwrap();
        assert!(entries
            .iter()
            .any(|e| e.branch.as_deref() == Some("feat/r1/login")
                && e.path.ends_with("worktrees/r1/app-feat-r1-login")));
    }
}
