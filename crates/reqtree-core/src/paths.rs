use crate::error::{ReqtreeError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Workspace layout constants
// ---------------------------------------------------------------------------

pub const REQUIREMENTS_FILE: &str = "requirements.json";
pub const WORKTREES_DIR: &str = "worktrees";
pub const CONFIG_FILE: &str = "reqtree.yaml";
pub const MCP_CONFIG_FILE: &str = ".mcp.json";
pub const GEMINI_SETTINGS_FILE: &str = ".gemini/settings.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Expand a leading `~` or `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path == "~" || path.starts_with("~/") {
        let base = home::home_dir().ok_or(ReqtreeError::HomeNotFound)?;
        if path == "~" {
            return Ok(base);
        }
        return Ok(base.join(&path[2..]));
    }
    Ok(PathBuf::from(path))
}

pub fn data_file_path(root: &Path) -> PathBuf {
    root.join(REQUIREMENTS_FILE)
}

pub fn worktrees_dir(root: &Path) -> PathBuf {
    root.join(WORKTREES_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Target directory for one worktree:
/// `<root>/worktrees/<requirementId>/<repository>-<branch>` with every `/`
/// in the branch flattened to `-` so the whole thing stays one path segment.
pub fn worktree_path(root: &Path, requirement_id: &str, repository: &str, branch: &str) -> PathBuf {
    let flat_branch = branch.replace('/', "-");
    worktrees_dir(root)
        .join(requirement_id)
        .join(format!("{repository}-{flat_branch}"))
}

/// Directory basename of a repository path, used to label its worktrees.
pub fn repo_name(repo_path: &Path) -> String {
    repo_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repo".to_string())
}

// ---------------------------------------------------------------------------
// Iteration validation
// ---------------------------------------------------------------------------

static ITERATION_RE: OnceLock<Regex> = OnceLock::new();

fn iteration_re() -> &'static Regex {
    ITERATION_RE.get_or_init(|| Regex::new(r"^\d{2}\.\d{1,2}\.\d+$").unwrap())
}

/// Iteration labels look like `24.10.1` (YY.MM.N). Loosely enforced: the
/// month part is not range-checked, only shaped.
pub fn validate_iteration(iteration: &str) -> Result<()> {
    if !iteration_re().is_match(iteration) {
        return Err(ReqtreeError::InvalidIteration(iteration.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worktree_path_layout() {
        let root = Path::new("/tmp/ws");
        assert_eq!(
            worktree_path(root, "r1", "app", "main"),
            PathBuf::from("/tmp/ws/worktrees/r1/app-main")
        );
    }

    #[test]
    fn worktree_path_flattens_branch_slashes() {
        let root = Path::new("/tmp/ws");
        assert_eq!(
            worktree_path(root, "r1", "app", "feat/r1/login"),
            PathBuf::from("/tmp/ws/worktrees/r1/app-feat-r1-login")
        );
    }

    #[test]
    fn worktree_path_is_a_pure_function() {
        let root = Path::new("/tmp/ws");
        let a = worktree_path(root, "r1", "app", "feat/x");
        let b = worktree_path(root, "r1", "app", "feat/x");
        assert_eq!(a, b);
    }

    #[test]
    fn repo_name_is_basename() {
        assert_eq!(repo_name(Path::new("/home/dev/projects/app")), "app");
        assert_eq!(repo_name(Path::new("app")), "app");
    }

    #[test]
    fn valid_iterations() {
        for it in ["24.10.1", "25.1.12", "99.12.0"] {
            validate_iteration(it).unwrap_or_else(|_| panic!("expected valid: {it}"));
        }
    }

    #[test]
    fn invalid_iterations() {
        for it in ["", "2024.10.1", "24-10-1", "24.10", "abc", "24.100.1"] {
            assert!(validate_iteration(it).is_err(), "expected invalid: {it}");
        }
    }

    #[test]
    fn expand_tilde_passthrough_for_absolute() {
        assert_eq!(
            expand_tilde("/tmp/ws").unwrap(),
            PathBuf::from("/tmp/ws")
        );
    }

    #[test]
    fn expand_tilde_resolves_home_prefix() {
        if let Some(h) = home::home_dir() {
            assert_eq!(expand_tilde("~/ws").unwrap(), h.join("ws"));
            assert_eq!(expand_tilde("~").unwrap(), h);
        }
    }
}
