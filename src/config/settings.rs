//! Settings configuration types

mod leaderboard;
mod ledger;
mod server;

pub use leaderboard::LeaderboardSettings;
pub use ledger::LedgerSettings;
pub use server::ServerSettings;

use serde::{Deserialize, Serialize};

/// General settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Override for the database location (default: ~/.greencampus/campus.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,

    /// Emails that register with the admin role (matched case-insensitively)
    #[serde(default)]
    pub admin_emails: Vec<String>,

    /// Mission and reward ledger settings
    #[serde(default)]
    pub ledger: LedgerSettings,

    /// Leaderboard settings
    #[serde(default)]
    pub leaderboard: LeaderboardSettings,

    /// HTTP API settings
    #[serde(default)]
    pub server: ServerSettings,
}
