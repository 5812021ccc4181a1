//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if the base directory cannot be
//! resolved. Everything has a default so a bare `clutch` invocation works.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Lowest worker count an operator may request.
pub const MIN_WORKERS: usize = 1;
/// Highest worker count an operator may request.
pub const MAX_WORKERS: usize = 500;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base data directory. `$CLUTCH_DIR`, default `~/.clutch`.
    pub base_dir: PathBuf,
    /// Binary invoked for each unit of work. `$CLUTCH_CLAUDE_BIN`, default `claude`.
    pub claude_bin: String,
    /// Wall-clock limit for one unit-of-work call. `$CLUTCH_TIMEOUT_SECS`, default 300.
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let base_dir = match std::env::var("CLUTCH_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::home_dir()
                .ok_or_else(|| Error::Config("cannot resolve home directory".to_string()))?
                .join(".clutch"),
        };

        let timeout_secs = match std::env::var("CLUTCH_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| Error::Config(format!("CLUTCH_TIMEOUT_SECS is not a number: {raw}")))?,
            Err(_) => 300,
        };

        Ok(Self {
            base_dir,
            claude_bin: std::env::var("CLUTCH_CLAUDE_BIN").unwrap_or_else(|_| "claude".to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Directory holding cloned repositories.
    pub fn repos_dir(&self) -> PathBuf {
        self.base_dir.join("repos")
    }

    /// Directory holding per-project state.
    pub fn projects_dir(&self) -> PathBuf {
        self.base_dir.join("projects")
    }
}
