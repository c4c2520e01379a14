use crate::confirm::confirm;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use reqtree_core::branch::suggest_branch_name;
use reqtree_core::git::{self, CreateWorktree};
use reqtree_core::paths::{self, expand_tilde};
use reqtree_core::{Config, FeatureType, RequirementStore};
use reqtree_query::{Profile, QueryClient};
use std::path::PathBuf;
use std::time::Duration;

const BRANCH_SUGGESTION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Subcommand)]
pub enum WorktreeSubcommand {
    /// Create a worktree for a requirement
    Create {
        /// Requirement id
        id: String,
        /// Repository path
        #[arg(long)]
        repo: String,
        /// Branch name (omit to derive one)
        #[arg(long)]
        branch: Option<String>,
        /// Base branch to fork from
        #[arg(long)]
        base: Option<String>,
        /// feat or fix
        #[arg(long = "type", default_value = "feat")]
        feature_type: FeatureType,
        /// Replace an existing directory at the target path
        #[arg(long)]
        force: bool,
        /// Skip the AI branch-name suggestion, always use the slug
        #[arg(long)]
        no_ai: bool,
        /// Skip confirmation prompts
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Remove a worktree and deregister it
    Remove {
        /// Requirement id
        id: String,
        /// Worktree path as registered
        #[arg(long)]
        path: String,
        /// Repository path
        #[arg(long)]
        repo: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// List git worktrees of a repository
    List {
        /// Repository path
        #[arg(long)]
        repo: String,
    },
}

pub fn run(config: &Config, subcmd: WorktreeSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        WorktreeSubcommand::Create {
            id,
            repo,
            branch,
            base,
            feature_type,
            force,
            no_ai,
            yes,
        } => create(
            config,
            &id,
            &repo,
            branch.as_deref(),
            base.as_deref(),
            feature_type,
            force,
            no_ai,
            yes,
            json,
        ),
        WorktreeSubcommand::Remove {
            id,
            path,
            repo,
            yes,
        } => remove(config, &id, &path, &repo, yes, json),
        WorktreeSubcommand::List { repo } => list(&repo, json),
    }
}

#[allow(clippy::too_many_arguments)]
fn create(
    config: &Config,
    id: &str,
    repo: &str,
    branch: Option<&str>,
    base: Option<&str>,
    feature_type: FeatureType,
    force: bool,
    no_ai: bool,
    yes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let repo = expand_tilde(repo)?;
    let store = RequirementStore::new(&config.workspace_root);

    let branch = match branch {
        Some(b) => {
            git::validate_branch_name(b)?;
            b.to_string()
        }
        None => {
            let requirement = store.find(id)?;
            let client = (!no_ai).then(|| {
                QueryClient::new(Profile::Claude)
                    .with_program(&config.claude_cli)
                    .with_timeout(BRANCH_SUGGESTION_TIMEOUT)
            });
            suggest_branch_name(client.as_ref(), &requirement, feature_type)
        }
    };

    let base = base.unwrap_or(&config.base_branch);
    let target = paths::worktree_path(
        &config.workspace_root,
        id,
        &paths::repo_name(&repo),
        &branch,
    );
    if force && target.exists() && !yes {
        let prompt = format!(
            "Replace the existing worktree at {}? Uncommitted work there is lost.",
            target.display()
        );
        if !confirm(&prompt)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let created = git::create_worktree(
        &store,
        &CreateWorktree {
            workspace_root: &config.workspace_root,
            repo: &repo,
            requirement_id: id,
            branch: &branch,
            base_branch: base,
            feature_type,
            force,
        },
    )
    .context("failed to create worktree")?;

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "branch": branch,
            "base": base,
            "path": created,
        }))?;
    } else {
        println!("Created worktree on '{branch}' at {}", created.display());
        println!("Open it with: reqtree open {}", created.display());
    }
    Ok(())
}

fn remove(
    config: &Config,
    id: &str,
    path: &str,
    repo: &str,
    yes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let repo = expand_tilde(repo)?;
    let path = PathBuf::from(path);
    let store = RequirementStore::new(&config.workspace_root);

    if !yes {
        let prompt = format!("Remove the worktree at {}?", path.display());
        if !confirm(&prompt)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = git::remove_worktree(&store, &repo, id, &path)
        .context("failed to remove worktree")?;

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "branch": removed.branch,
            "path": path,
            "removed": true,
        }))?;
    } else {
        println!("Removed worktree '{}' at {}", removed.branch, path.display());
    }
    Ok(())
}

fn list(repo: &str, json: bool) -> anyhow::Result<()> {
    let repo = expand_tilde(repo)?;
    let entries = git::list_worktrees(&repo).context("failed to list worktrees")?;

    if json {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "path": e.path,
                    "branch": e.branch,
                })
            })
            .collect();
        print_json(&items)?;
        return Ok(());
    }

    if entries.is_empty() {
        println!("No worktrees.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.path.display().to_string(),
                e.branch.clone().unwrap_or_else(|| "(detached)".to_string()),
            ]
        })
        .collect();
    print_table(&["PATH", "BRANCH"], rows);
    Ok(())
}
