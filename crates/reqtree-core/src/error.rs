use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReqtreeError {
    #[error("requirement not found: {0}")]
    RequirementNotFound(String),

    #[error("invalid requirement name '{0}': must be 2-100 characters")]
    InvalidName(String),

    #[error("invalid iteration '{0}': expected a YY.MM.N label like 24.10.1")]
    InvalidIteration(String),

    #[error("invalid link '{0}': must be an http or https URL")]
    InvalidUrl(String),

    #[error("invalid deadline '{0}': expected YYYY-MM-DD or MM-DD")]
    InvalidDeadline(String),

    #[error("invalid branch name '{name}': {reason}")]
    InvalidBranchName { name: String, reason: String },

    #[error("branch already exists: {0}")]
    BranchExists(String),

    #[error("worktree path already exists: {0}")]
    WorktreePathExists(PathBuf),

    #[error("no worktree registered at {path} for requirement {requirement_id}")]
    WorktreeNotFound {
        requirement_id: String,
        path: PathBuf,
    },

    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("'{tool}' not found: ensure it is installed and on PATH")]
    ToolNotFound { tool: String },

    #[error("'{tool}' timed out after {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },

    #[error("'{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("could not parse {path}: {message} (content starts with: {preview})")]
    StorageParse {
        path: PathBuf,
        message: String,
        preview: String,
    },

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Query(#[from] reqtree_query::QueryError),
}

pub type Result<T> = std::result::Result<T, ReqtreeError>;
