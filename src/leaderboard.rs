//! Leaderboard projection
//!
//! Read-only. Ranks are recomputed from `profiles` on every fetch; ties on
//! points are broken by profile ID so the order is stable.

use anyhow::Result;
use rusqlite::{OptionalExtension, params};
use serde::Serialize;

use crate::progress::LevelProgress;
use crate::store::CampusDb;

pub const DEFAULT_LIMIT: usize = 50;
pub const DEFAULT_PODIUM_SIZE: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: u32,
    pub user_id: String,
    pub name: String,
    pub points: u32,
    pub level: u32,
    pub completed_missions: u32,
    pub podium: bool,
}

/// Query interface for rankings
pub struct Leaderboard {
    db: CampusDb,
    podium_size: u32,
}

impl Leaderboard {
    pub fn new(db: CampusDb) -> Self {
        Self {
            db,
            podium_size: DEFAULT_PODIUM_SIZE,
        }
    }

    pub fn with_podium_size(mut self, podium_size: u32) -> Self {
        self.podium_size = podium_size;
        self
    }

    /// Top `limit` profiles by points
    pub fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, points, completed_missions
            FROM profiles
            ORDER BY points DESC, id ASC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, u32>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let entries = rows
            .into_iter()
            .zip(1u32..)
            .map(|((user_id, name, points, completed_missions), rank)| LeaderboardEntry {
                rank,
                user_id,
                name,
                points,
                level: LevelProgress::for_points(points).level,
                completed_missions,
                podium: rank <= self.podium_size,
            })
            .collect();
        Ok(entries)
    }

    /// Current rank of one profile across all profiles
    pub fn rank_of(&self, user_id: &str) -> Result<Option<u32>> {
        let conn = self.db.conn();
        let rank = conn
            .query_row(
                r#"
                SELECT 1 + (
                    SELECT COUNT(*) FROM profiles o
                    WHERE o.points > p.points OR (o.points = p.points AND o.id < p.id)
                )
                FROM profiles p WHERE p.id = ?1
                "#,
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(rank)
    }
}
