//! Status command - report the vector store location and contents

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

pub fn execute(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let mut gateway = super::open_gateway(&config)?;

    let status = gateway.status().context("Failed to read store status")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("📊 Store: {}", status.path.display());

    let Some(info) = status.collection.as_ref() else {
        println!("  {} nothing ingested yet", "○".dimmed());
        return Ok(());
    };

    println!("  Collection: {}", info.name);
    println!("  Chunks:     {}", status.chunks);
    println!("  Model:      {} ({} dimensions)", info.model, info.dimension);
    println!("  Created:    {}", info.created_at.to_rfc3339());

    if status.model_mismatch() {
        println!(
            "  {} configured model is {} ({} dimensions); queries will fail until you reset or switch back",
            "⚠️".yellow(),
            status.configured_model,
            status.configured_dimension
        );
    }

    Ok(())
}
