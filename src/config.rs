//! Configuration for loglens
//!
//! Loaded from TOML. Resolution order:
//! 1. Explicit path (`--config`)
//! 2. `.loglens/config.toml` in the working directory
//! 3. `~/.loglens/config.toml`
//! 4. Built-in defaults
//!
//! The provider API key is not part of the file. It travels as
//! [`Credentials`] into every provider constructor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use crate::embeddings;
use crate::error::{Error, Result};
use crate::paths;

/// Upper bound for `k` accepted by the query path
pub const MAX_K: usize = 20;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub store: StoreSection,
    pub embeddings: EmbeddingsSection,
    pub llm: LlmSection,
    pub retrieval: RetrievalSection,
}

/// Where the vector store lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreSection {
    /// Store root directory (`~` is expanded)
    pub path: String,
    /// Named collection inside the root
    pub collection: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: paths::DEFAULT_STORE_ROOT.to_string(),
            collection: "logs".to_string(),
        }
    }
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible `/embeddings` endpoint
    OpenAi,
    /// Local deterministic feature hashing (no network)
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingsSection {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimensions: usize,
    pub base_url: String,
    /// Records embedded (and then stored) per round trip
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingsSection {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAi,
            model: "text-embedding-ada-002".to_string(),
            dimensions: 1536,
            base_url: "https://api.openai.com/v1".to_string(),
            batch_size: 64,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// How many times the agent asks the model to fix non-conforming output
    pub max_repair_attempts: usize,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
            max_repair_attempts: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalSection {
    pub default_k: usize,
    pub max_k: usize,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            default_k: 5,
            max_k: MAX_K,
        }
    }
}

impl Config {
    /// Load configuration following the resolution order above
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let cwd = std::env::current_dir()?;
        let candidates = [
            paths::project::config_path(&cwd),
            paths::user_config_path(),
        ];

        for candidate in candidates.iter() {
            if candidate.exists() {
                log::debug!("loading config from {}", candidate.display());
                return Self::from_file(candidate);
            }
        }

        log::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse config from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default configuration to `path`, creating parent directories
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = toml::to_string_pretty(&Self::default())
            .map_err(|e| Error::Config(format!("failed to render config: {}", e)))?;
        std::fs::write(path, format!("# loglens configuration\n\n{}", body))?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.store.collection.trim().is_empty() {
            return Err(Error::Config("store.collection must not be empty".into()));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be > 0".into()));
        }
        if self.embeddings.provider == EmbeddingProvider::OpenAi
            && self.embeddings.model == embeddings::FIXED_SIZE_MODEL
            && self.embeddings.dimensions != embeddings::FIXED_SIZE_DIMENSIONS
        {
            return Err(Error::Config(format!(
                "{} only produces {}-dimensional embeddings; set embeddings.dimensions = {} or pick a model that supports resizing",
                embeddings::FIXED_SIZE_MODEL,
                embeddings::FIXED_SIZE_DIMENSIONS,
                embeddings::FIXED_SIZE_DIMENSIONS
            )));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::Config("embeddings.batch_size must be > 0".into()));
        }
        if self.retrieval.max_k == 0 || self.retrieval.max_k > MAX_K {
            return Err(Error::Config(format!(
                "retrieval.max_k must be in 1..={}",
                MAX_K
            )));
        }
        if self.retrieval.default_k == 0 || self.retrieval.default_k > self.retrieval.max_k {
            return Err(Error::Config(format!(
                "retrieval.default_k must be in 1..={}",
                self.retrieval.max_k
            )));
        }
        Ok(())
    }

    /// Store root with `~` expanded
    pub fn store_root(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store.path).as_ref())
    }

    /// Directory of the configured collection
    pub fn collection_dir(&self) -> PathBuf {
        paths::collection::dir(&self.store_root(), &self.store.collection)
    }

    /// Check a requested `k` against the configured bounds
    pub fn check_k(&self, k: usize) -> Result<usize> {
        if k == 0 || k > self.retrieval.max_k {
            return Err(Error::Config(format!(
                "k must be between 1 and {}, got {}",
                self.retrieval.max_k, k
            )));
        }
        Ok(k)
    }
}

/// Provider API key, passed explicitly into every provider-touching call
///
/// Redacted in `Debug` and wiped from memory on drop.
#[derive(Clone)]
pub struct Credentials {
    api_key: Zeroizing<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Zeroizing::new(api_key.into()),
        }
    }

    /// Read the key from an environment variable, if set and non-empty
    pub fn from_env(var: &str) -> Option<Self> {
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => Some(Self::new(value.trim())),
            _ => None,
        }
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_str()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}
