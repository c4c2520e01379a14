//! Core domain for requirement tracking and git worktree management.
//!
//! A workspace directory holds one `requirements.json` document and a
//! `worktrees/` tree with one subdirectory per requirement. The modules here
//! cover the data model and store, path derivation, the git worktree
//! lifecycle, branch-name suggestion, spreadsheet sync through an AI CLI,
//! and workspace initialization. Presentation (prompting the user, printing
//! tables) lives in the CLI crate.

pub mod branch;
pub mod config;
pub mod error;
pub mod git;
pub mod io;
pub mod paths;
pub mod process;
pub mod prompts;
pub mod requirement;
pub mod store;
pub mod sync;
pub mod workspace;

pub use config::Config;
pub use error::{ReqtreeError, Result};
pub use requirement::{ContextInfo, FeatureType, Requirement, RequirementsData, WorktreeInfo};
pub use store::RequirementStore;
