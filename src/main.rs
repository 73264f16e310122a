use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Ask questions about JSON logs using retrieval-augmented analysis", long_about = None)]
struct Cli {
    /// Config file (defaults to .loglens/config.toml, then ~/.loglens/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file to .loglens/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Embed and store a JSON array of log records
    Ingest {
        /// File containing a JSON array
        file: PathBuf,
    },

    /// Ask a question about the ingested logs
    Ask {
        /// Question to answer
        question: String,

        /// Number of log entries to retrieve (1-20)
        #[arg(short, long)]
        k: Option<usize>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the vector store location and contents
    Status {
        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete the vector store
    Reset,
}

fn main() -> Result<()> {
    loglens::logging::init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => {
            commands::init::execute(config_path, force)?;
        }
        Commands::Ingest { file } => {
            commands::ingest::execute(config_path, &file)?;
        }
        Commands::Ask { question, k, json } => {
            commands::ask::execute(config_path, &question, k, json)?;
        }
        Commands::Status { json } => {
            commands::status::execute(config_path, json)?;
        }
        Commands::Reset => {
            commands::reset::execute(config_path)?;
        }
    }

    Ok(())
}
