use crate::output::print_json;
use anyhow::Context;
use reqtree_core::paths::expand_tilde;
use reqtree_core::sync::SyncEngine;
use reqtree_core::{Config, RequirementStore};
use reqtree_query::{Profile, QueryClient};

/// Spreadsheet sync goes through the Gemini CLI: it runs in the workspace
/// root so it picks up the xlsx MCP server from `.gemini/settings.json`,
/// and carries no timeout because large documents take as long as they take.
pub fn run(config: &Config, doc: &str, filter: &str, json: bool) -> anyhow::Result<()> {
    let doc = expand_tilde(doc)?;
    if !doc.exists() {
        anyhow::bail!("document not found: {}", doc.display());
    }

    let store = RequirementStore::new(&config.workspace_root);
    let client = QueryClient::new(Profile::Gemini)
        .with_program(&config.gemini_cli)
        .with_cwd(&config.workspace_root);

    let report = SyncEngine::new(&store, &client)
        .run(&doc, filter)
        .context("sync failed")?;

    if json {
        print_json(&serde_json::json!({
            "parsed": report.parsed,
            "appended": report.appended,
        }))?;
        return Ok(());
    }

    match (report.parsed, report.appended) {
        (0, _) => println!("No matching rows in the document."),
        (p, 0) => println!("All {p} parsed requirements were already present."),
        (p, a) => println!("Appended {a} of {p} parsed requirements."),
    }
    Ok(())
}
