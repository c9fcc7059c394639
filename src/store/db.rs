//! SQLite database connection and schema management
//!
//! Manages the `~/.greencampus/campus.db` database. The schema carries the
//! ledger invariants itself: one completion per (user, mission), no negative
//! balances, no negative stock.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// How long a writer waits for another process holding the write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database wrapper shared by repositories and ledgers
#[derive(Clone)]
pub struct CampusDb {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl CampusDb {
    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open campus db: {}", path.display()))?;

        // WAL lets the CLI read while `serve` writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Get a reference to the connection
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("Campus DB lock poisoned")
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize campus schema")?;
        Ok(())
    }

    /// Current schema version
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn();
        let version = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )?;
        Ok(version)
    }
}

/// True when `err` is a UNIQUE or PRIMARY KEY constraint violation
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

/// SQL schema for the campus database
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);

-- ============================================
-- PROFILES
-- ============================================
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'student' CHECK (role IN ('student', 'admin')),
    points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
    completed_missions INTEGER NOT NULL DEFAULT 0 CHECK (completed_missions >= 0),
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_profiles_ranking ON profiles(points DESC, id ASC);

-- ============================================
-- CATALOG
-- ============================================
CREATE TABLE IF NOT EXISTS missions (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    points INTEGER NOT NULL CHECK (points > 0),
    location TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL,
    qr_code TEXT NOT NULL UNIQUE,
    qr_secret TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_missions_active ON missions(active, points);

CREATE TABLE IF NOT EXISTS rewards (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    points INTEGER NOT NULL CHECK (points > 0),
    stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
    category TEXT NOT NULL DEFAULT '',
    active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_rewards_active ON rewards(active, points);

-- ============================================
-- LEDGER (append-only)
-- ============================================
-- mission_id / reward_id carry no foreign key: deleting a catalog entry
-- leaves its history in place.
CREATE TABLE IF NOT EXISTS mission_completions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES profiles(id),
    mission_id TEXT NOT NULL,
    points_earned INTEGER NOT NULL CHECK (points_earned > 0),
    completed_at INTEGER NOT NULL,
    qr_scanned TEXT NOT NULL,
    UNIQUE (user_id, mission_id)
);
CREATE INDEX IF NOT EXISTS idx_completions_user ON mission_completions(user_id, completed_at);

CREATE TABLE IF NOT EXISTS reward_redemptions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES profiles(id),
    reward_id TEXT NOT NULL,
    points_spent INTEGER NOT NULL CHECK (points_spent > 0),
    redeemed_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_redemptions_user ON reward_redemptions(user_id, redeemed_at);
"#;
