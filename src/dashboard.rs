//! Personal dashboard: profile, progression and recent activity

use anyhow::{Context, Result};
use serde::Serialize;

use crate::account::Session;
use crate::domain::{Profile, RewardRedemption};
use crate::leaderboard::Leaderboard;
use crate::progress::{Badge, LevelProgress};
use crate::store::{CampusDb, HistoryRepository, ProfileRepository, RecentActivity};

/// Completions shown in the activity feed
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub profile: Profile,
    pub level: LevelProgress,
    pub badges: Vec<&'static Badge>,
    pub next_badge: Option<&'static Badge>,
    pub recent_activity: Vec<RecentActivity>,
    pub rank: Option<u32>,
}

/// A user's full ledger history
#[derive(Debug, Clone, Serialize)]
pub struct History {
    pub completed_mission_ids: Vec<String>,
    pub redemptions: Vec<RewardRedemption>,
}

pub struct DashboardQuery {
    db: CampusDb,
}

impl DashboardQuery {
    pub fn new(db: CampusDb) -> Self {
        Self { db }
    }

    /// Returns None if the session's profile no longer exists
    pub fn for_session(&self, session: &Session) -> Result<Option<Dashboard>> {
        let Some(profile) = ProfileRepository::new(self.db.clone()).get(&session.user_id)? else {
            return Ok(None);
        };

        let recent_activity = HistoryRepository::new(self.db.clone())
            .recent_activity(&profile.id, RECENT_ACTIVITY_LIMIT)
            .context("Failed to load recent activity")?;
        let rank = Leaderboard::new(self.db.clone()).rank_of(&profile.id)?;

        Ok(Some(Dashboard {
            level: profile.level_progress(),
            badges: profile.badges(),
            next_badge: Badge::next(profile.points),
            recent_activity,
            rank,
            profile,
        }))
    }

    pub fn history(&self, session: &Session) -> Result<History> {
        let history = HistoryRepository::new(self.db.clone());
        Ok(History {
            completed_mission_ids: history.completed_mission_ids(&session.user_id)?,
            redemptions: history.redemptions(&session.user_id)?,
        })
    }
}
