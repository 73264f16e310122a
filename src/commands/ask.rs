//! Ask command - retrieve relevant logs and analyze them

use anyhow::{Context, Result};
use colored::Colorize;
use loglens::pipeline::{LogAnalyst, QueryOutcome};
use loglens::{AnalysisAgent, Error};
use std::path::Path;

pub fn execute(
    config_path: Option<&Path>,
    question: &str,
    k: Option<usize>,
    json: bool,
) -> Result<()> {
    let config = super::load_config(config_path)?;
    let k = config.check_k(k.unwrap_or(config.retrieval.default_k))?;

    let gateway = super::open_gateway(&config)?;
    let credentials = super::require_credentials()?;
    let agent = AnalysisAgent::from_config(&config.llm, credentials)
        .context("Failed to create analysis agent")?;

    let mut analyst = LogAnalyst::new(gateway, agent);

    let outcome = match analyst.ask(question, k) {
        Ok(outcome) => outcome,
        Err(Error::StoreNotFound { path }) => {
            anyhow::bail!(
                "No vector store found at {}\n\nRun `loglens ingest <file>` first.",
                path.display()
            );
        }
        Err(e) => return Err(e).context("Search failed"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        QueryOutcome::NoMatches => {
            println!("{} No relevant logs found for your question.", "⚠️".yellow());
        }
        QueryOutcome::Analyzed {
            retrieved,
            response,
        } => {
            println!("{}", "Answer".bold());
            println!("{}", response.answer);
            println!();

            println!(
                "{} ({} analyzed)",
                "Relevant logs".bold(),
                response.total_logs_analyzed
            );
            if response.relevant_logs.is_empty() {
                println!("  {}", "none cited".dimmed());
            }
            for log in &response.relevant_logs {
                println!("  {}", serde_json::to_string(log)?);
            }
            println!();

            println!("{}", "Retrieved".bold());
            for hit in retrieved.iter() {
                println!(
                    "  [{}] {:.3}  {}",
                    hit.chunk.metadata.index,
                    hit.similarity,
                    hit.chunk.text.dimmed()
                );
            }
        }
    }

    Ok(())
}
