//! Configuration file I/O operations

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::Config;

impl Config {
    /// Get the global config directory path (~/.greencampus/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".greencampus")
    }

    /// Get the global config file path (~/.greencampus/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a file with atomic write and file locking.
    ///
    /// This ensures:
    /// 1. Exclusive lock prevents concurrent writes from two CLI processes
    /// 2. Atomic write (temp file + rename) prevents corruption on crash
    /// 3. Parent directory is created if needed
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        let _lock = lock_config(path)?;
        write_atomic(path, &content)
        // Lock is released when _lock is dropped
    }

    /// Load global configuration from ~/.greencampus/config.toml
    /// If no config exists, auto-creates one with defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::global_config_path())
    }

    /// Load configuration from `path`, creating it with defaults if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            Self::auto_init(path)?;
        }
        Self::from_file(path)
    }

    /// Auto-initialize configuration when no config exists
    ///
    /// Uses file locking to prevent race conditions when multiple processes
    /// try to auto-init simultaneously.
    fn auto_init(path: &Path) -> Result<()> {
        if let Some(config_dir) = path.parent() {
            std::fs::create_dir_all(config_dir).with_context(|| {
                format!("Failed to create config directory: {}", config_dir.display())
            })?;
        }

        let _lock = lock_config(path)?;

        // Re-check if config exists after acquiring lock (another process may have created it)
        if path.exists() {
            return Ok(());
        }

        // http_token left empty for local use; auth is only enforced once it is set
        let config_content = toml::to_string_pretty(&Self::with_defaults())
            .with_context(|| "Failed to serialize default config")?;
        write_atomic(path, &config_content)?;

        tracing::info!("Created {}", path.display());
        Ok(())
    }
}

/// Lock file next to the config (separate from config to avoid issues with rename)
fn lock_config(path: &Path) -> Result<File> {
    let lock_path = path.with_extension("toml.lock");
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

    // Blocks until available
    lock_file
        .lock_exclusive()
        .with_context(|| "Failed to acquire config lock")?;
    Ok(lock_file)
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("toml.tmp");
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

    temp_file
        .write_all(content.as_bytes())
        .with_context(|| "Failed to write config content")?;

    temp_file
        .sync_all()
        .with_context(|| "Failed to sync config file")?;

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename config file: {}", path.display()))?;
    Ok(())
}
