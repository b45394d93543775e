//! Krishi configuration.
//!
//! Loaded from `~/.krishi/config.toml`. A missing file means defaults;
//! an invalid one is an error.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

/// Krishi configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Storage root override. Defaults to `~/.krishi/`.
    pub data_dir: Option<PathBuf>,

    /// Which advisory persistence backend to use.
    #[serde(default)]
    pub advisory_backend: AdvisoryBackend,
}

/// Advisory persistence backend.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvisoryBackend {
    /// One JSON file per subject under `<root>/advisories/`.
    #[default]
    Json,

    /// A single SQLite database at `<root>/advisories.sqlite`.
    Sqlite,
}

impl Config {
    /// Load config from `~/.krishi/config.toml`.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.krishi/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".krishi").join("config.toml"))
    }
}
