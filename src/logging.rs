//! Diagnostic logging to stderr
//!
//! Filter comes from `LOGLENS_LOG` using `env_logger` syntax
//! (e.g. `LOGLENS_LOG=debug`, `LOGLENS_LOG=loglens::gateway=trace`).

use env_logger::{Builder, Env};

use crate::paths::LOG_ENV_VAR;

const DEFAULT_FILTER: &str = "warn";

/// Install the global logger. Later calls are no-ops.
pub fn init() {
    let _ = Builder::from_env(Env::default().filter_or(LOG_ENV_VAR, DEFAULT_FILTER))
        .format_timestamp(None)
        .try_init();
}
