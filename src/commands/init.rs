//! Init command - write the default project config

use anyhow::{Context, Result};
use colored::Colorize;
use loglens::config::Config;
use loglens::paths;
use std::path::Path;

pub fn execute(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => paths::project::config_path(&std::env::current_dir()?),
    };

    if path.exists() && !force {
        println!(
            "{} Config already exists at {}. Use --force to overwrite.",
            "⚠️".yellow(),
            path.display()
        );
        return Ok(());
    }

    Config::write_default(&path)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    println!("{} Wrote {}", "✓".green(), path.display());
    println!();
    println!("Next steps:");
    println!("  export {}=...", paths::API_KEY_ENV_VAR);
    println!("  loglens ingest logs.json");
    println!("  loglens ask \"What errors occurred?\"");

    Ok(())
}
