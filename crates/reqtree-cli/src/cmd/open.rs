use anyhow::Context;
use reqtree_core::paths::expand_tilde;

/// Reveal a path with the platform opener (Finder, explorer, xdg-open).
pub fn run(path: &str) -> anyhow::Result<()> {
    let path = expand_tilde(path)?;
    if !path.exists() {
        anyhow::bail!("path does not exist: {}", path.display());
    }
    open::that(&path).with_context(|| format!("failed to open {}", path.display()))?;
    println!("Opened {}", path.display());
    Ok(())
}
