//! Leaderboard settings

use serde::{Deserialize, Serialize};

use crate::leaderboard::{DEFAULT_LIMIT, DEFAULT_PODIUM_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardSettings {
    /// Entries returned when no explicit limit is given
    /// Default: 50
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Top ranks flagged as podium entries
    /// Default: 3
    #[serde(default = "default_podium_size")]
    pub podium_size: u32,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_podium_size() -> u32 {
    DEFAULT_PODIUM_SIZE
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            podium_size: default_podium_size(),
        }
    }
}
