//! Session configuration.
//!
//! Loaded from an optional `redshell.toml` at startup; command-line flags
//! override file values, and built-in defaults cover everything else.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Result, ShellError};

/// Which storage backend the session runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-memory tree, seeded with sample content at construction.
    Memory,
    /// Real directory tree under a fixed sandbox root, seeded on first run.
    Disk,
}

impl FromStr for BackendKind {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "memory" => Ok(BackendKind::Memory),
            "disk" => Ok(BackendKind::Disk),
            other => Err(ShellError::Config(format!(
                "unknown backend '{other}' (expected 'memory' or 'disk')"
            ))),
        }
    }
}

/// Startup configuration for a shell session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// User name shown in the prompt.
    pub user: String,
    /// Host name shown in the prompt.
    pub host: String,
    /// Storage backend to run against.
    pub backend: BackendKind,
    /// Sandbox root directory for the disk backend.
    pub root: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user: "user".to_string(),
            host: "ctf-linux".to_string(),
            backend: BackendKind::Memory,
            root: PathBuf::from("OS"),
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file. A missing file yields defaults;
    /// a present but malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        Ok(config)
    }
}
