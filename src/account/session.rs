//! Explicit session value and its on-disk mirror
//!
//! Every ledger and catalog call takes a [`Session`]. The CLI keeps the last
//! login in `~/.greencampus/session.json`, but that file is only a cache: it
//! is re-validated against the store on every read.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{Profile, Role};

/// Identity of the caller for one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    /// Issued timestamp (ms since epoch)
    pub issued_at: i64,
}

impl Session {
    pub fn for_profile(profile: &Profile) -> Self {
        Self {
            user_id: profile.id.clone(),
            email: profile.email.clone(),
            role: profile.role,
            issued_at: crate::domain::now_ms(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// JSON file mirroring the last logged-in session
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached session. A corrupt file counts as no session.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {}", self.path.display()))?;
        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable session cache {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    /// Replace the cached session (temp file + rename)
    pub fn store(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create session directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(session)?;
        let temp_path = self.path.with_extension("json.tmp");
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
        temp_file
            .write_all(content.as_bytes())
            .with_context(|| "Failed to write session")?;
        temp_file.sync_all()?;

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;
        Ok(())
    }

    /// Remove the cached session, if any
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session file: {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cache_store_load_clear() {
        let dir = tempdir().unwrap();
        let cache = SessionCache::new(dir.path().join("session.json"));
        assert_eq!(cache.load().unwrap(), None);

        let profile = Profile::new("siti@campus.ac.id", "Siti", Role::Student);
        let session = Session::for_profile(&profile);
        cache.store(&session).unwrap();
        assert_eq!(cache.load().unwrap(), Some(session));

        cache.clear().unwrap();
        assert_eq!(cache.load().unwrap(), None);
        // Clearing twice is fine
        cache.clear().unwrap();
    }

    #[test]
    fn test_corrupt_cache_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(SessionCache::new(&path).load().unwrap(), None);
    }
}
