//! Configuration loading and management

mod io;
mod settings;
mod token;

pub use settings::{LeaderboardSettings, LedgerSettings, ServerSettings, Settings};
pub use token::generate_http_token;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ledger::QrPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    /// Create a config with default settings
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Database file: `settings.database_path` or `~/.greencampus/campus.db`
    pub fn database_path(&self) -> PathBuf {
        match &self.settings.database_path {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => Self::global_config_dir().join("campus.db"),
        }
    }

    pub fn qr_policy(&self) -> QrPolicy {
        QrPolicy {
            require_signature: self.settings.ledger.require_signed_qr,
        }
    }
}
