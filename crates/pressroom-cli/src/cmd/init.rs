use anyhow::Context;
use pressroom_core::{config::Config, io, paths, store::Store};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pressroom".to_string());

    println!("Initializing pressroom in: {}", root.display());

    let dir = paths::pressroom_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        let cfg = Config::new(project_name.as_str());
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    // Opening the store creates the state tables and the audit log.
    Store::open(root).context("failed to open state store")?;
    println!("  ready:   {}", paths::STATE_DB);
    println!("  ready:   {}", paths::AUDIT_DB);

    Ok(())
}
