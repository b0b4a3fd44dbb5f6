use anyhow::Context;
use review_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing review-bot in: {}", root.display());

    let dir = paths::review_dir(root);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let yaml = serde_yaml::to_string(&Config::default())?;
    let created = io::write_if_missing(&paths::config_path(root), yaml.as_bytes())
        .context("failed to write config.yaml")?;
    if created {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    println!();
    println!("Edit {} before the first run.", paths::CONFIG_FILE);
    Ok(())
}
