mod cmd;
mod confirm;
mod output;

use clap::{Parser, Subcommand};
use cmd::worktree::WorktreeSubcommand;
use reqtree_core::Config;

#[derive(Parser)]
#[command(
    name = "reqtree",
    about = "Track requirements and manage one git worktree per requirement",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root holding requirements.json and worktrees/
    #[arg(long, global = true, env = "REQTREE_WORKSPACE")]
    workspace: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the workspace (store, worktrees dir, MCP config)
    Init,

    /// Add a requirement
    Add {
        /// Requirement name (2-100 characters)
        name: String,
        /// Iteration label, e.g. 24.10.1
        #[arg(long)]
        iteration: String,
        /// Deadline as YYYY-MM-DD
        #[arg(long)]
        deadline: String,
        /// Reference link as LABEL=URL (repeatable)
        #[arg(long = "link")]
        links: Vec<String>,
    },

    /// List requirements
    List {
        /// Only this iteration
        #[arg(long)]
        iteration: Option<String>,
        /// Include finished requirements
        #[arg(long)]
        finished: bool,
    },

    /// Show one requirement with its worktrees
    Show { id: String },

    /// Update requirement fields
    Update {
        id: String,
        #[arg(long)]
        iteration: Option<String>,
        #[arg(long)]
        name: Option<String>,
        /// Deadline as YYYY-MM-DD
        #[arg(long)]
        deadline: Option<String>,
        /// Replace the reference links with LABEL=URL entries (repeatable)
        #[arg(long = "link")]
        links: Vec<String>,
    },

    /// Mark a requirement finished
    Finish { id: String },

    /// Delete a requirement (worktree directories stay on disk)
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Pull requirements from a spreadsheet via the AI CLI
    Sync {
        /// Spreadsheet path
        #[arg(long)]
        doc: String,
        /// Which rows to extract, in plain language
        #[arg(long)]
        filter: String,
    },

    /// Manage git worktrees for requirements
    Worktree {
        #[command(subcommand)]
        subcommand: WorktreeSubcommand,
    },

    /// Reveal a path in the system file manager
    Open { path: String },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let result = run(cli);
    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli.workspace.as_deref())?;

    match cli.command {
        Commands::Init => cmd::init::run(&config, cli.json),
        Commands::Add {
            name,
            iteration,
            deadline,
            links,
        } => cmd::requirement::add(&config, &name, &iteration, &deadline, &links, cli.json),
        Commands::List {
            iteration,
            finished,
        } => cmd::requirement::list(&config, iteration.as_deref(), finished, cli.json),
        Commands::Show { id } => cmd::requirement::show(&config, &id, cli.json),
        Commands::Update {
            id,
            iteration,
            name,
            deadline,
            links,
        } => cmd::requirement::update(
            &config,
            &id,
            iteration.as_deref(),
            name.as_deref(),
            deadline.as_deref(),
            &links,
            cli.json,
        ),
        Commands::Finish { id } => cmd::requirement::finish(&config, &id, cli.json),
        Commands::Delete { id, yes } => cmd::requirement::delete(&config, &id, yes, cli.json),
        Commands::Sync { doc, filter } => cmd::sync::run(&config, &doc, &filter, cli.json),
        Commands::Worktree { subcommand } => cmd::worktree::run(&config, subcommand, cli.json),
        Commands::Open { path } => cmd::open::run(&path),
    }
}

fn resolve_config(workspace: Option<&str>) -> anyhow::Result<Config> {
    let workspace = workspace
        .ok_or_else(|| anyhow::anyhow!("no workspace: pass --workspace or set REQTREE_WORKSPACE"))?;
    Ok(Config::resolve(workspace)?)
}
