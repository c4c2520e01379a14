//! Workspace initialization. Every item is write-if-missing, so `init` is
//! safe to re-run and reports created-vs-existing per item.

use crate::error::Result;
use crate::io::{ensure_dir, write_if_missing};
use crate::paths;
use crate::requirement::RequirementsData;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Directory,
}

#[derive(Debug, Clone)]
pub struct InitItem {
    pub name: &'static str,
    pub path: PathBuf,
    pub kind: ItemKind,
    pub created: bool,
}

/// The xlsx MCP server both AI CLIs use to read spreadsheets during sync.
fn xlsx_mcp_config() -> serde_json::Value {
    json!({
        "mcpServers": {
            "xlsx": {
                "command": "uvx",
                "args": ["xlsx-mcp"]
            }
        }
    })
}

pub fn initialize(root: &Path) -> Result<Vec<InitItem>> {
    let mut items = Vec::new();

    let data_path = paths::data_file_path(root);
    let empty = serde_json::to_vec_pretty(&RequirementsData::empty())?;
    items.push(InitItem {
        name: "requirements store",
        path: data_path.clone(),
        kind: ItemKind::File,
        created: write_if_missing(&data_path, &empty)?,
    });

    let worktrees = paths::worktrees_dir(root);
    let existed = worktrees.is_dir();
    ensure_dir(&worktrees)?;
    items.push(InitItem {
        name: "worktrees directory",
        path: worktrees,
        kind: ItemKind::Directory,
        created: !existed,
    });

    let mcp_config = serde_json::to_vec_pretty(&xlsx_mcp_config())?;
    let mcp_path = root.join(paths::MCP_CONFIG_FILE);
    items.push(InitItem {
        name: "mcp config",
        path: mcp_path.clone(),
        kind: ItemKind::File,
        created: write_if_missing(&mcp_path, &mcp_config)?,
    });

    let gemini_path = root.join(paths::GEMINI_SETTINGS_FILE);
    items.push(InitItem {
        name: "gemini settings",
        path: gemini_path.clone(),
        kind: ItemKind::File,
        created: write_if_missing(&gemini_path, &mcp_config)?,
    });

    let created = items.iter().filter(|i| i.created).count();
    info!(root = %root.display(), created, "workspace initialized");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_all_items_fresh() {
        let dir = TempDir::new().unwrap();
        let items = initialize(dir.path()).unwrap();
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|i| i.created));
        assert!(dir.path().join("requirements.json").exists());
        assert!(dir.path().join("worktrees").is_dir());
        assert!(dir.path().join(".mcp.json").exists());
        assert!(dir.path().join(".gemini/settings.json").exists());
    }

    #[test]
    fn rerun_is_idempotent() {
        let dir = TempDir::new().unwrap();
        initialize(dir.path()).unwrap();
        std::fs::write(dir.path().join("requirements.json"), "{\"version\":\"1.0\",\"requirements\":[]}").unwrap();
        let items = initialize(dir.path()).unwrap();
        assert!(items.iter().all(|i| !i.created));
        // an existing store is never overwritten
        assert_eq!(
            std::fs::read_to_string(dir.path().join("requirements.json")).unwrap(),
            "{\"version\":\"1.0\",\"requirements\":[]}"
        );
    }

    #[test]
    fn mcp_config_names_the_xlsx_server() {
        let dir = TempDir::new().unwrap();
        initialize(dir.path()).unwrap();
        let raw = std::fs::read_to_string(dir.path().join(".mcp.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["mcpServers"]["xlsx"]["command"].is_string());
    }
}
