//! Ingest command - embed and store a JSON log file

use anyhow::{Context, Result};
use colored::Colorize;
use loglens::normalize;
use std::path::Path;

pub fn execute(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let config = super::load_config(config_path)?;

    // Parse before touching the provider or the store
    let records = normalize::read_records(file)
        .with_context(|| format!("Failed to read log records from {}", file.display()))?;

    let mut gateway = super::open_gateway(&config)?;

    println!(
        "🔮 Embedding {} records with {}...",
        records.len(),
        gateway.model_name()
    );

    let report = gateway.ingest(&records).context("Ingest failed")?;

    println!(
        "{} Stored {} log entries ({} total in {})",
        "✓".green(),
        report.stored,
        report.total_in_collection,
        gateway.collection_dir().display()
    );

    Ok(())
}
