//! Persistent storage for profiles, catalog and ledger
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Repositories │   │   Ledgers    │   │ Leaderboard  │
//! │  (CRUD)      │   │ (1 tx / op)  │   │  (read-only) │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        └──────────────────┼──────────────────┘
//!                           ▼
//!                ~/.greencampus/campus.db
//! ```

mod db;
mod repository;

pub use db::CampusDb;
pub(crate) use db::is_unique_violation;
pub use repository::{
    HistoryRepository, MissionRepository, ProfileRepository, RecentActivity, RewardRepository,
};
pub(crate) use repository::{
    MISSION_COLUMNS, PROFILE_COLUMNS, REWARD_COLUMNS, mission_from_row, profile_from_row,
    reward_from_row,
};
