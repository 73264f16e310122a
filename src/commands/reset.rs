//! Reset command - delete the vector store

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let mut gateway = super::open_gateway(&config)?;
    let dir = gateway.collection_dir().to_path_buf();

    let removed = gateway
        .reset()
        .with_context(|| format!("Failed to delete {}", dir.display()))?;

    if removed {
        println!("{} Deleted {}", "✓".green(), dir.display());
    } else {
        println!("{} Nothing to delete at {}", "○".dimmed(), dir.display());
    }

    Ok(())
}
