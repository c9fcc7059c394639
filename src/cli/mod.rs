//! CLI command implementations

pub mod account;
pub mod init;
pub mod ledger;
pub mod mission;
pub mod reward;
pub mod scan;
pub mod serve;

use std::path::PathBuf;

use anyhow::{Context, Result};

use greencampus::Campus;
use greencampus::account::{Session, SessionCache};
use greencampus::config::Config;

/// Global flags shared by every command
pub struct CliContext {
    config_path: Option<PathBuf>,
    db_path: Option<PathBuf>,
}

impl CliContext {
    pub fn new(config_path: Option<PathBuf>, db_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            db_path,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(Config::global_config_path)
    }

    /// `--db`, falling back to the configured database path
    pub fn db_path(&self, config: &Config) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| config.database_path())
    }

    pub fn load_config(&self) -> Result<Config> {
        Config::load_from(&self.config_path())
    }

    /// Open the campus database with the CLI session cache attached
    pub fn open_campus(&self) -> Result<Campus> {
        let config = self.load_config()?;
        let db_path = self.db_path(&config);
        let campus = Campus::open_at(&db_path, config)
            .with_context(|| format!("Failed to open campus database: {}", db_path.display()))?;
        // Session file lives next to the config so alternate configs stay separate
        let session_path = self.config_path().with_file_name("session.json");
        Ok(campus.with_session_cache(SessionCache::new(session_path)))
    }
}

/// The logged-in session, or an error telling the user to log in
pub fn require_session(campus: &Campus) -> Result<Session> {
    campus
        .accounts()
        .require_current()
        .context("Run `greencampus account login <email>` first")
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
