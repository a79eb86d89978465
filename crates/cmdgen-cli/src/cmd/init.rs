use anyhow::Context;
use cmdgen_core::{catalog::Catalog, config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing cmdgen in: {}", root.display());

    let dir = paths::cmdgen_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    // 1. config.yaml
    let config = if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config")?
    } else {
        let cfg = Config::default();
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    // 2. catalog
    let catalog_path = config.catalog_path(root);
    let written = io::write_if_missing(&catalog_path, Catalog::starter_yaml().as_bytes())
        .with_context(|| format!("failed to write {}", catalog_path.display()))?;
    let label = if written { "created:" } else { "exists: " };
    println!("  {label} {}", config.catalog.display());

    // 3. store directory
    let store_dir = config.store_dir(root);
    io::ensure_dir(&store_dir)
        .with_context(|| format!("failed to create {}", store_dir.display()))?;

    println!("\ncmdgen initialized successfully.");
    println!("Next: cmdgen commands");
    Ok(())
}
