use crate::output::print_json;
use anyhow::Context;
use reqtree_core::workspace::{self, ItemKind};
use reqtree_core::Config;

pub fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    let items = workspace::initialize(&config.workspace_root)
        .context("failed to initialize workspace")?;

    if json {
        let entries: Vec<serde_json::Value> = items
            .iter()
            .map(|i| {
                serde_json::json!({
                    "name": i.name,
                    "path": i.path,
                    "kind": match i.kind {
                        ItemKind::File => "file",
                        ItemKind::Directory => "directory",
                    },
                    "created": i.created,
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "workspace": config.workspace_root,
            "items": entries,
            "missing_tools": config.missing_tools(),
        }))?;
        return Ok(());
    }

    println!("Workspace: {}", config.workspace_root.display());
    for item in &items {
        let status = if item.created { "created" } else { "exists" };
        println!("  {status:8} {} ({})", item.path.display(), item.name);
    }
    let missing = config.missing_tools();
    if !missing.is_empty() {
        println!("Missing tools (some commands will fail): {}", missing.join(", "));
    }
    Ok(())
}
