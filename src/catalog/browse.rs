//! Student-facing catalog listings

use std::collections::HashSet;

use anyhow::Result;
use serde::Serialize;

use crate::account::Session;
use crate::domain::{Mission, Reward};
use crate::store::{CampusDb, HistoryRepository, MissionRepository, ProfileRepository, RewardRepository};

#[derive(Debug, Clone, Serialize)]
pub struct MissionListing {
    #[serde(flatten)]
    pub mission: Mission,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RewardListing {
    #[serde(flatten)]
    pub reward: Reward,
    pub affordable: bool,
}

pub struct CatalogBrowser {
    db: CampusDb,
}

impl CatalogBrowser {
    pub fn new(db: CampusDb) -> Self {
        Self { db }
    }

    /// Active missions, cheapest first, flagged with the user's completions
    pub fn missions(&self, session: &Session) -> Result<Vec<MissionListing>> {
        let done: HashSet<String> = HistoryRepository::new(self.db.clone())
            .completed_mission_ids(&session.user_id)?
            .into_iter()
            .collect();
        let listings = MissionRepository::new(self.db.clone())
            .list_active()?
            .into_iter()
            .map(|mission| MissionListing {
                completed: done.contains(&mission.id),
                mission,
            })
            .collect();
        Ok(listings)
    }

    /// Active rewards, cheapest first. Affordable means enough points and stock left.
    pub fn rewards(&self, session: &Session) -> Result<Vec<RewardListing>> {
        let balance = ProfileRepository::new(self.db.clone())
            .get(&session.user_id)?
            .map(|p| p.points)
            .unwrap_or(0);
        let listings = RewardRepository::new(self.db.clone())
            .list_active()?
            .into_iter()
            .map(|reward| RewardListing {
                affordable: reward.in_stock() && balance >= reward.points,
                reward,
            })
            .collect();
        Ok(listings)
    }
}
