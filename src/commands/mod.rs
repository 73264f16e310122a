pub mod ask;
pub mod ingest;
pub mod init;
pub mod reset;
pub mod status;

use anyhow::{Context, Result};
use loglens::config::{Config, Credentials, EmbeddingProvider};
use loglens::paths::API_KEY_ENV_VAR;
use loglens::StoreGateway;
use std::path::Path;

/// Load config from the explicit path or the usual locations
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}

/// API key from the environment, required
pub fn require_credentials() -> Result<Credentials> {
    Credentials::from_env(API_KEY_ENV_VAR).with_context(|| {
        format!(
            "{} is not set\n\nExport your API key, or set `provider = \"hashing\"` under [embeddings] for offline use.",
            API_KEY_ENV_VAR
        )
    })
}

/// Gateway for the configured embedder; only the openai provider needs a key
pub fn open_gateway(config: &Config) -> Result<StoreGateway> {
    let credentials = match config.embeddings.provider {
        EmbeddingProvider::OpenAi => Some(require_credentials()?),
        EmbeddingProvider::Hashing => None,
    };
    StoreGateway::from_config(config, credentials.as_ref()).context("Failed to create embedder")
}
