//! Configuration for Trustlend.
//!
//! Every field has a default, so an absent or partial `config.json` is
//! valid. The data directory is resolved from `TRUSTLEND_HOME`, then
//! `$HOME/.trustlend`, then the working directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "TRUSTLEND_HOME";

/// File name of the optional config file inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Default data directory.
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV) {
        return PathBuf::from(dir);
    }
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".trustlend")
}

/// Marketplace configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Root directory of persisted state.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Profile searches with fewer (trimmed) characters return nothing.
    #[serde(default = "default_search_min_chars")]
    pub search_min_chars: usize,

    /// Result cap used when a search caller passes no limit.
    #[serde(default = "default_search_limit")]
    pub search_default_limit: usize,

    /// Reject booking requests from the item's own owner.
    #[serde(default = "default_true")]
    pub forbid_self_booking: bool,

    /// Longest booking request accepted, in days (both ends included).
    #[serde(default = "default_max_booking_days")]
    pub max_booking_days: u64,
}

fn default_search_min_chars() -> usize {
    3
}

fn default_search_limit() -> usize {
    5
}

fn default_max_booking_days() -> u64 {
    crate::booking::DEFAULT_MAX_BOOKING_DAYS
}

fn default_true() -> bool {
    true
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            search_min_chars: default_search_min_chars(),
            search_default_limit: default_search_limit(),
            forbid_self_booking: true,
            max_booking_days: default_max_booking_days(),
        }
    }
}

impl MarketConfig {
    /// Load config for the data directory named by the environment.
    pub fn from_env() -> Result<Self> {
        Self::load(default_data_dir())
    }

    /// Load `{data_dir}/config.json` if present, otherwise defaults.
    ///
    /// `data_dir` always wins over a `data_dir` field inside the file.
    pub fn load(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let path = data_dir.join(CONFIG_FILE);

        let mut config = if path.exists() {
            Self::read_file(&path)?
        } else {
            Self::default()
        };
        config.data_dir = data_dir;

        log::debug!("loaded config for {}", config.data_dir.display());
        Ok(config)
    }

    /// Write this config to `{data_dir}/config.json`.
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MarketError::SerializationError(e.to_string()))?;
        std::fs::write(self.data_dir.join(CONFIG_FILE), json.as_bytes())?;
        Ok(())
    }

    fn read_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            MarketError::InvalidFileFormat(format!(
                "failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }
}
