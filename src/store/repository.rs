//! Repository implementations for campus data access
//!
//! Plain CRUD. Anything that moves points lives in [`crate::ledger`] and runs
//! inside a transaction instead.

use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row, params};
use serde::Serialize;

use super::db::CampusDb;
use crate::domain::{Mission, MissionCompletion, Profile, Reward, RewardRedemption, Role};

pub(crate) const PROFILE_COLUMNS: &str =
    "id, email, name, role, points, completed_missions, created_at";
pub(crate) const MISSION_COLUMNS: &str = "id, title, description, points, location, category, qr_code, qr_secret, active, created_at, updated_at";
pub(crate) const REWARD_COLUMNS: &str =
    "id, name, description, points, stock, category, active, created_at, updated_at";

pub(crate) fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: Role::from_str(&row.get::<_, String>(3)?).unwrap_or_default(),
        points: row.get(4)?,
        completed_missions: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub(crate) fn mission_from_row(row: &Row<'_>) -> rusqlite::Result<Mission> {
    Ok(Mission {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        points: row.get(3)?,
        location: row.get(4)?,
        category: row.get(5)?,
        qr_code: row.get(6)?,
        qr_secret: row.get(7)?,
        active: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub(crate) fn reward_from_row(row: &Row<'_>) -> rusqlite::Result<Reward> {
    Ok(Reward {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        points: row.get(3)?,
        stock: row.get(4)?,
        category: row.get(5)?,
        active: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

// ============================================
// PROFILE REPOSITORY
// ============================================

/// Repository for Profile CRUD operations
pub struct ProfileRepository {
    db: CampusDb,
}

impl ProfileRepository {
    pub fn new(db: CampusDb) -> Self {
        Self { db }
    }

    /// Create a new profile
    pub fn create(&self, profile: &Profile) -> Result<()> {
        let conn = self.db.conn();
        conn.execute(
            r#"
            INSERT INTO profiles (id, email, name, role, points, completed_missions, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                profile.id,
                profile.email,
                profile.name,
                profile.role.as_str(),
                profile.points,
                profile.completed_missions,
                profile.created_at,
            ],
        )
        .context("Failed to create profile")?;
        Ok(())
    }

    /// Get a profile by ID
    pub fn get(&self, id: &str) -> Result<Option<Profile>> {
        let conn = self.db.conn();
        let profile = conn
            .query_row(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
                params![id],
                profile_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    /// Get a profile by email (case-insensitive)
    pub fn get_by_email(&self, email: &str) -> Result<Option<Profile>> {
        let conn = self.db.conn();
        let profile = conn
            .query_row(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = ?1"),
                params![email],
                profile_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    /// List all profiles, newest first
    pub fn list(&self) -> Result<Vec<Profile>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at DESC, id ASC"
        ))?;
        let profiles = stmt
            .query_map([], profile_from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(profiles)
    }

    /// Change a profile's role. Returns false if the profile does not exist.
    pub fn set_role(&self, id: &str, role: Role) -> Result<bool> {
        let conn = self.db.conn();
        let changed = conn.execute(
            "UPDATE profiles SET role = ?2 WHERE id = ?1",
            params![id, role.as_str()],
        )?;
        Ok(changed > 0)
    }
}

// ============================================
// MISSION REPOSITORY
// ============================================

/// Repository for Mission CRUD operations
pub struct MissionRepository {
    db: CampusDb,
}

impl MissionRepository {
    pub fn new(db: CampusDb) -> Self {
        Self { db }
    }

    /// Create a new mission
    pub fn create(&self, mission: &Mission) -> Result<()> {
        let conn = self.db.conn();
        conn.execute(
            r#"
            INSERT INTO missions (id, title, description, points, location, category,
                                  qr_code, qr_secret, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                mission.id,
                mission.title,
                mission.description,
                mission.points,
                mission.location,
                mission.category,
                mission.qr_code,
                mission.qr_secret,
                mission.active,
                mission.created_at,
                mission.updated_at,
            ],
        )
        .context("Failed to create mission")?;
        Ok(())
    }

    /// Get a mission by ID
    pub fn get(&self, id: &str) -> Result<Option<Mission>> {
        let conn = self.db.conn();
        let mission = conn
            .query_row(
                &format!("SELECT {MISSION_COLUMNS} FROM missions WHERE id = ?1"),
                params![id],
                mission_from_row,
            )
            .optional()?;
        Ok(mission)
    }

    /// List all missions for the admin view, newest first
    pub fn list_all(&self) -> Result<Vec<Mission>> {
        self.query_list(&format!(
            "SELECT {MISSION_COLUMNS} FROM missions ORDER BY created_at DESC, id ASC"
        ))
    }

    /// List active missions, cheapest first
    pub fn list_active(&self) -> Result<Vec<Mission>> {
        self.query_list(&format!(
            "SELECT {MISSION_COLUMNS} FROM missions WHERE active = 1 ORDER BY points ASC, id ASC"
        ))
    }

    fn query_list(&self, sql: &str) -> Result<Vec<Mission>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(sql)?;
        let missions = stmt
            .query_map([], mission_from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(missions)
    }

    /// Update editable fields. `qr_code` and `qr_secret` are left untouched.
    pub fn update(&self, mission: &Mission) -> Result<bool> {
        let conn = self.db.conn();
        let changed = conn
            .execute(
                r#"
                UPDATE missions SET
                    title = ?2,
                    description = ?3,
                    points = ?4,
                    location = ?5,
                    category = ?6,
                    active = ?7,
                    updated_at = ?8
                WHERE id = ?1
                "#,
                params![
                    mission.id,
                    mission.title,
                    mission.description,
                    mission.points,
                    mission.location,
                    mission.category,
                    mission.active,
                    mission.updated_at,
                ],
            )
            .context("Failed to update mission")?;
        Ok(changed > 0)
    }

    pub fn set_active(&self, id: &str, active: bool) -> Result<bool> {
        let conn = self.db.conn();
        let changed = conn.execute(
            "UPDATE missions SET active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, active, crate::domain::now_ms()],
        )?;
        Ok(changed > 0)
    }

    /// Delete a mission. Completion rows referencing it are kept.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.db.conn();
        let changed = conn.execute("DELETE FROM missions WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

// ============================================
// REWARD REPOSITORY
// ============================================

/// Repository for Reward CRUD operations
pub struct RewardRepository {
    db: CampusDb,
}

impl RewardRepository {
    pub fn new(db: CampusDb) -> Self {
        Self { db }
    }

    pub fn create(&self, reward: &Reward) -> Result<()> {
        let conn = self.db.conn();
        conn.execute(
            r#"
            INSERT INTO rewards (id, name, description, points, stock, category, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                reward.id,
                reward.name,
                reward.description,
                reward.points,
                reward.stock,
                reward.category,
                reward.active,
                reward.created_at,
                reward.updated_at,
            ],
        )
        .context("Failed to create reward")?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Reward>> {
        let conn = self.db.conn();
        let reward = conn
            .query_row(
                &format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE id = ?1"),
                params![id],
                reward_from_row,
            )
            .optional()?;
        Ok(reward)
    }

    /// List all rewards for the admin view, newest first
    pub fn list_all(&self) -> Result<Vec<Reward>> {
        self.query_list(&format!(
            "SELECT {REWARD_COLUMNS} FROM rewards ORDER BY created_at DESC, id ASC"
        ))
    }

    /// List active rewards, cheapest first
    pub fn list_active(&self) -> Result<Vec<Reward>> {
        self.query_list(&format!(
            "SELECT {REWARD_COLUMNS} FROM rewards WHERE active = 1 ORDER BY points ASC, id ASC"
        ))
    }

    fn query_list(&self, sql: &str) -> Result<Vec<Reward>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(sql)?;
        let rewards = stmt
            .query_map([], reward_from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rewards)
    }

    /// Update editable fields, including stock
    pub fn update(&self, reward: &Reward) -> Result<bool> {
        let conn = self.db.conn();
        let changed = conn
            .execute(
                r#"
                UPDATE rewards SET
                    name = ?2,
                    description = ?3,
                    points = ?4,
                    stock = ?5,
                    category = ?6,
                    active = ?7,
                    updated_at = ?8
                WHERE id = ?1
                "#,
                params![
                    reward.id,
                    reward.name,
                    reward.description,
                    reward.points,
                    reward.stock,
                    reward.category,
                    reward.active,
                    reward.updated_at,
                ],
            )
            .context("Failed to update reward")?;
        Ok(changed > 0)
    }

    pub fn set_active(&self, id: &str, active: bool) -> Result<bool> {
        let conn = self.db.conn();
        let changed = conn.execute(
            "UPDATE rewards SET active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, active, crate::domain::now_ms()],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.db.conn();
        let changed = conn.execute("DELETE FROM rewards WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

// ============================================
// LEDGER HISTORY (read-only)
// ============================================

/// A completion joined with its mission title, for activity feeds
#[derive(Debug, Clone, Serialize)]
pub struct RecentActivity {
    pub mission_id: String,
    /// None when the mission has since been deleted
    pub mission_title: Option<String>,
    pub points_earned: u32,
    pub completed_at: i64,
}

/// Read access to a user's completion and redemption history
pub struct HistoryRepository {
    db: CampusDb,
}

impl HistoryRepository {
    pub fn new(db: CampusDb) -> Self {
        Self { db }
    }

    /// All completions of a user, newest first
    pub fn completions(&self, user_id: &str) -> Result<Vec<MissionCompletion>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, mission_id, points_earned, completed_at, qr_scanned
            FROM mission_completions WHERE user_id = ?1
            ORDER BY completed_at DESC, id DESC
            "#,
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(MissionCompletion {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    mission_id: row.get(2)?,
                    points_earned: row.get(3)?,
                    completed_at: row.get(4)?,
                    qr_scanned: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// IDs of missions a user has completed
    pub fn completed_mission_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.db.conn();
        let mut stmt =
            conn.prepare("SELECT mission_id FROM mission_completions WHERE user_id = ?1")?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(ids)
    }

    /// Most recent completions with mission titles
    pub fn recent_activity(&self, user_id: &str, limit: usize) -> Result<Vec<RecentActivity>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT c.mission_id, m.title, c.points_earned, c.completed_at
            FROM mission_completions c
            LEFT JOIN missions m ON m.id = c.mission_id
            WHERE c.user_id = ?1
            ORDER BY c.completed_at DESC, c.id DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(RecentActivity {
                    mission_id: row.get(0)?,
                    mission_title: row.get(1)?,
                    points_earned: row.get(2)?,
                    completed_at: row.get(3)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// All redemptions of a user, newest first
    pub fn redemptions(&self, user_id: &str) -> Result<Vec<RewardRedemption>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, reward_id, points_spent, redeemed_at
            FROM reward_redemptions WHERE user_id = ?1
            ORDER BY redeemed_at DESC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(RewardRedemption {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    reward_id: row.get(2)?,
                    points_spent: row.get(3)?,
                    redeemed_at: row.get(4)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }
}
