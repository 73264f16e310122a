//! Filesystem layout for loglens.
//!
//! This module defines WHERE data lives. It has no I/O and no validation.
//!
//! # User-Level Paths (~/.loglens/)
//!
//! ```text
//! ~/.loglens/
//! └── config.toml              # Global config (fallback)
//! ```
//!
//! # Project-Level Paths (project/.loglens/)
//!
//! ```text
//! project/.loglens/
//! ├── config.toml              # Project config
//! └── store/                   # Default store root
//!     └── {collection}/        # One directory per named collection
//!         ├── chunks.db        # SQLite payloads + collection metadata
//!         └── chunks.usearch   # HNSW vector index
//! ```

use std::path::{Path, PathBuf};

/// Environment variable controlling the log filter
pub const LOG_ENV_VAR: &str = "LOGLENS_LOG";

/// Environment variable the CLI reads the provider API key from
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

// =============================================================================
// User Level (~/.loglens/)
// =============================================================================

/// User's loglens home directory: `~/.loglens/`
pub fn loglens_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".loglens")
}

/// Global config file: `~/.loglens/config.toml`
pub fn user_config_path() -> PathBuf {
    loglens_home().join("config.toml")
}

// =============================================================================
// Project Level (project/.loglens/)
// =============================================================================

/// Project-level paths, relative to a project root.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use loglens::paths::project;
///
/// let root = Path::new("/home/user/service");
/// let config = project::config_path(root);
/// assert_eq!(config, Path::new("/home/user/service/.loglens/config.toml"));
/// ```
pub mod project {
    use super::*;

    /// Project's loglens directory: `.loglens/`
    pub fn loglens_dir(root: &Path) -> PathBuf {
        root.join(".loglens")
    }

    /// Project config: `.loglens/config.toml`
    pub fn config_path(root: &Path) -> PathBuf {
        loglens_dir(root).join("config.toml")
    }
}

/// Default store root, relative to the working directory
pub const DEFAULT_STORE_ROOT: &str = ".loglens/store";

/// Collection layout inside a store root
pub mod collection {
    use super::*;

    /// Collection directory: `{root}/{name}/`
    pub fn dir(root: &Path, name: &str) -> PathBuf {
        root.join(name)
    }

    /// SQLite payload database: `{dir}/chunks.db`
    pub fn db_path(dir: &Path) -> PathBuf {
        dir.join("chunks.db")
    }

    /// USearch index file: `{dir}/chunks.usearch`
    pub fn index_path(dir: &Path) -> PathBuf {
        dir.join("chunks.usearch")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loglens_home() {
        let home = loglens_home();
        assert!(home.ends_with(".loglens"));
        assert!(user_config_path().starts_with(&home));
    }

    #[test]
    fn test_collection_paths() {
        let dir = collection::dir(Path::new("/tmp/store"), "logs");
        assert_eq!(dir, PathBuf::from("/tmp/store/logs"));
        assert_eq!(
            collection::db_path(&dir),
            PathBuf::from("/tmp/store/logs/chunks.db")
        );
        assert_eq!(
            collection::index_path(&dir),
            PathBuf::from("/tmp/store/logs/chunks.usearch")
        );
    }

    #[test]
    fn test_project_paths() {
        let root = Path::new("/tmp/test-project");
        assert_eq!(
            project::loglens_dir(root),
            PathBuf::from("/tmp/test-project/.loglens")
        );
    }
}
