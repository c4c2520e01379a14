use crate::error::Result;
use crate::paths;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Resolved runtime configuration, built once at process start and passed by
/// reference. The workspace root comes from the CLI; the optional
/// `reqtree.yaml` in the root fills in the rest.
#[derive(Debug, Clone)]
pub struct Config {
    pub workspace_root: PathBuf,
    /// Executable name or path for the Claude CLI.
    pub claude_cli: String,
    /// Executable name or path for the Gemini CLI.
    pub gemini_cli: String,
    pub base_branch: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    claude_cli: Option<String>,
    #[serde(default)]
    gemini_cli: Option<String>,
    #[serde(default)]
    base_branch: Option<String>,
}

impl Config {
    /// Resolve from a workspace argument (`~` expanded) plus the optional
    /// `reqtree.yaml` inside it. A missing config file means defaults.
    pub fn resolve(workspace: &str) -> Result<Self> {
        let root = paths::expand_tilde(workspace)?;
        let file = Self::load_file(&root)?;
        Ok(Self {
            workspace_root: root,
            claude_cli: resolve_tool(file.claude_cli, "claude")?,
            gemini_cli: resolve_tool(file.gemini_cli, "gemini")?,
            base_branch: file
                .base_branch
                .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_string()),
        })
    }

    fn load_file(root: &Path) -> Result<ConfigFile> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(ConfigFile::default());
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    /// Names of configured external tools missing from PATH. Advisory only;
    /// operations still fail with their own errors when actually invoked.
    pub fn missing_tools(&self) -> Vec<String> {
        ["git", self.claude_cli.as_str(), self.gemini_cli.as_str()]
            .into_iter()
            .filter(|tool| which::which(tool).is_err())
            .map(str::to_string)
            .collect()
    }
}

/// Configured values containing a path separator are treated as paths and
/// get `~` expanded; bare names stay verbatim for PATH lookup.
fn resolve_tool(configured: Option<String>, default: &str) -> Result<String> {
    let value = match configured {
        Some(v) => v,
        None => return Ok(default.to_string()),
    };
    if value.contains('/') {
        Ok(paths::expand_tilde(&value)?.to_string_lossy().into_owned())
    } else {
        Ok(value)
    }
}
