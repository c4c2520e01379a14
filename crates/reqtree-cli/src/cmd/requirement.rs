use crate::confirm::confirm;
use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::NaiveDate;
use reqtree_core::store::RequirementPatch;
use reqtree_core::{Config, ContextInfo, Requirement, RequirementStore};

fn store(config: &Config) -> RequirementStore {
    RequirementStore::new(&config.workspace_root)
}

fn parse_deadline(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid deadline '{raw}': expected YYYY-MM-DD"))
}

fn parse_link(raw: &str) -> anyhow::Result<ContextInfo> {
    let (label, url) = raw
        .split_once('=')
        .with_context(|| format!("invalid link '{raw}': expected LABEL=URL"))?;
    let ctx = ContextInfo::link(label, url);
    ctx.validate()?;
    Ok(ctx)
}

pub fn add(
    config: &Config,
    name: &str,
    iteration: &str,
    deadline: &str,
    links: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let deadline = parse_deadline(deadline)?;
    let mut req = Requirement::new(iteration, name, deadline);
    for link in links {
        req.context.push(parse_link(link)?);
    }

    let created = store(config).add(req).context("failed to add requirement")?;

    if json {
        print_json(&created)?;
    } else {
        println!("Added requirement '{}' ({})", created.name, created.id);
    }
    Ok(())
}

pub fn list(
    config: &Config,
    iteration: Option<&str>,
    include_finished: bool,
    json: bool,
) -> anyhow::Result<()> {
    let requirements: Vec<Requirement> = store(config)
        .load()
        .context("failed to load requirements")?
        .into_iter()
        .filter(|r| iteration.map_or(true, |it| r.iteration == it))
        .filter(|r| include_finished || !r.is_finished)
        .collect();

    if json {
        print_json(&requirements)?;
        return Ok(());
    }

    if requirements.is_empty() {
        println!("No requirements.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = requirements
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.iteration.clone(),
                r.name.clone(),
                r.deadline.to_string(),
                if r.is_finished { "yes" } else { "no" }.to_string(),
                r.worktrees.len().to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "ITERATION", "NAME", "DEADLINE", "FINISHED", "WORKTREES"],
        rows,
    );
    Ok(())
}

pub fn show(config: &Config, id: &str, json: bool) -> anyhow::Result<()> {
    let req = store(config).find(id)?;

    if json {
        print_json(&req)?;
        return Ok(());
    }

    println!("Requirement: {} ({})", req.name, req.id);
    println!("Iteration:   {}", req.iteration);
    println!("Deadline:    {}", req.deadline);
    println!("Finished:    {}", if req.is_finished { "yes" } else { "no" });
    if !req.context.is_empty() {
        println!("Links:");
        for ctx in &req.context {
            println!("  {}: {}", ctx.label, ctx.content);
        }
    }
    if req.worktrees.is_empty() {
        println!("Worktrees:   (none)");
    } else {
        println!("Worktrees:");
        for wt in &req.worktrees {
            println!(
                "  {} on {} from {} ({})",
                wt.branch,
                wt.repository,
                wt.base_branch,
                wt.path.display()
            );
        }
    }
    Ok(())
}

pub fn update(
    config: &Config,
    id: &str,
    iteration: Option<&str>,
    name: Option<&str>,
    deadline: Option<&str>,
    links: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let context = if links.is_empty() {
        None
    } else {
        Some(
            links
                .iter()
                .map(|l| parse_link(l))
                .collect::<anyhow::Result<Vec<_>>>()?,
        )
    };
    let patch = RequirementPatch {
        iteration: iteration.map(str::to_string),
        name: name.map(str::to_string),
        deadline: deadline.map(parse_deadline).transpose()?,
        context,
        ..Default::default()
    };
    let updated = store(config)
        .update_by_id(id, patch)
        .context("failed to update requirement")?;

    if json {
        print_json(&updated)?;
    } else {
        println!("Updated requirement '{}' ({})", updated.name, updated.id);
    }
    Ok(())
}

pub fn finish(config: &Config, id: &str, json: bool) -> anyhow::Result<()> {
    let updated = store(config).update_by_id(
        id,
        RequirementPatch {
            is_finished: Some(true),
            ..Default::default()
        },
    )?;

    if json {
        print_json(&updated)?;
    } else {
        println!("Finished requirement '{}' ({})", updated.name, updated.id);
    }
    Ok(())
}

pub fn delete(config: &Config, id: &str, yes: bool, json: bool) -> anyhow::Result<()> {
    let s = store(config);
    let req = s.find(id)?;

    if !yes {
        let prompt = if req.worktrees.is_empty() {
            format!("Delete requirement '{}'?", req.name)
        } else {
            format!(
                "Delete requirement '{}'? Its {} worktree director{} will stay on disk.",
                req.name,
                req.worktrees.len(),
                if req.worktrees.len() == 1 { "y" } else { "ies" }
            )
        };
        if !confirm(&prompt)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = s.delete_by_id(id)?;

    if json {
        print_json(&serde_json::json!({ "id": removed.id, "deleted": true }))?;
    } else {
        println!("Deleted requirement '{}' ({})", removed.name, removed.id);
    }
    Ok(())
}
