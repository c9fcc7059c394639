//! Entry point tying store, config and services together

use std::path::Path;

use anyhow::Result;

use crate::account::{Accounts, SessionCache};
use crate::catalog::{CatalogAdmin, CatalogBrowser};
use crate::config::Config;
use crate::dashboard::DashboardQuery;
use crate::leaderboard::Leaderboard;
use crate::ledger::{LedgerAudit, MissionLedger, RewardLedger};
use crate::store::CampusDb;

/// Central handle for one campus database
///
/// Cheap to clone; every service shares the same connection.
#[derive(Clone)]
pub struct Campus {
    db: CampusDb,
    config: Config,
    accounts: Accounts,
}

impl Campus {
    /// Open the database named by the config
    pub fn open(config: Config) -> Result<Self> {
        let db = CampusDb::open(&config.database_path())?;
        Ok(Self::with_db(db, config))
    }

    /// Open a database at an explicit path, ignoring `settings.database_path`
    pub fn open_at(path: &Path, config: Config) -> Result<Self> {
        let db = CampusDb::open(path)?;
        Ok(Self::with_db(db, config))
    }

    pub fn with_db(db: CampusDb, config: Config) -> Self {
        let accounts = Accounts::new(db.clone(), config.settings.admin_emails.clone());
        Self {
            db,
            config,
            accounts,
        }
    }

    /// Mirror logins into a session file
    pub fn with_session_cache(mut self, cache: SessionCache) -> Self {
        self.accounts = self.accounts.with_cache(cache);
        self
    }

    pub fn db(&self) -> &CampusDb {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    pub fn missions(&self) -> MissionLedger {
        MissionLedger::new(self.db.clone(), self.config.qr_policy())
    }

    pub fn rewards(&self) -> RewardLedger {
        RewardLedger::new(self.db.clone())
    }

    pub fn audit(&self) -> LedgerAudit {
        LedgerAudit::new(self.db.clone())
    }

    pub fn catalog(&self) -> CatalogAdmin {
        CatalogAdmin::new(self.db.clone())
    }

    pub fn browser(&self) -> CatalogBrowser {
        CatalogBrowser::new(self.db.clone())
    }

    pub fn leaderboard(&self) -> Leaderboard {
        Leaderboard::new(self.db.clone()).with_podium_size(self.config.settings.leaderboard.podium_size)
    }

    pub fn dashboard(&self) -> DashboardQuery {
        DashboardQuery::new(self.db.clone())
    }
}
