//! Reward ledger - exchanges points for stock

use rusqlite::{OptionalExtension, TransactionBehavior, params};
use serde::Serialize;
use tracing::{debug, info};

use super::LedgerError;
use crate::account::Session;
use crate::domain::{new_id, now_ms};
use crate::store::{CampusDb, REWARD_COLUMNS, reward_from_row};

/// Outcome of a successful redemption
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardRedeemed {
    pub redemption_id: String,
    pub reward_id: String,
    pub reward_name: String,
    pub points_spent: u32,
    pub remaining_points: u32,
    pub remaining_stock: u32,
}

#[derive(Clone)]
pub struct RewardLedger {
    db: CampusDb,
}

impl RewardLedger {
    pub fn new(db: CampusDb) -> Self {
        Self { db }
    }

    /// Spend points on a reward.
    ///
    /// The redemption row, the points debit and the stock decrement commit
    /// together or not at all. Both decrements are conditional, so neither a
    /// balance nor a stock count can go below zero even if another writer got
    /// in between the checks.
    pub fn redeem_reward(
        &self,
        session: &Session,
        reward_id: &str,
    ) -> Result<RewardRedeemed, LedgerError> {
        let mut conn = self.db.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let reward = tx
            .query_row(
                &format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE id = ?1"),
                params![reward_id],
                reward_from_row,
            )
            .optional()?
            .filter(|r| r.active)
            .ok_or(LedgerError::RewardUnavailable)?;

        let available: u32 = tx
            .query_row(
                "SELECT points FROM profiles WHERE id = ?1",
                params![session.user_id],
                |r| r.get(0),
            )
            .optional()?
            .ok_or(LedgerError::ProfileNotFound)?;

        let insufficient = LedgerError::InsufficientPoints {
            required: reward.points,
            available,
        };
        if available < reward.points {
            debug!(user_id = %session.user_id, reward_id, "Rejected redemption: balance");
            return Err(insufficient);
        }
        if !reward.in_stock() {
            debug!(user_id = %session.user_id, reward_id, "Rejected redemption: stock");
            return Err(LedgerError::OutOfStock);
        }

        let redemption_id = new_id();
        let now = now_ms();
        tx.execute(
            r#"
            INSERT INTO reward_redemptions (id, user_id, reward_id, points_spent, redeemed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![redemption_id, session.user_id, reward.id, reward.points, now],
        )?;

        let debited = tx.execute(
            "UPDATE profiles SET points = points - ?2 WHERE id = ?1 AND points >= ?2",
            params![session.user_id, reward.points],
        )?;
        if debited == 0 {
            return Err(insufficient);
        }

        let taken = tx.execute(
            "UPDATE rewards SET stock = stock - 1, updated_at = ?2 WHERE id = ?1 AND stock > 0",
            params![reward.id, now],
        )?;
        if taken == 0 {
            return Err(LedgerError::OutOfStock);
        }

        let remaining_points: u32 = tx.query_row(
            "SELECT points FROM profiles WHERE id = ?1",
            params![session.user_id],
            |r| r.get(0),
        )?;
        let remaining_stock: u32 = tx.query_row(
            "SELECT stock FROM rewards WHERE id = ?1",
            params![reward.id],
            |r| r.get(0),
        )?;

        tx.commit()?;

        info!(
            user_id = %session.user_id,
            reward_id = %reward.id,
            points = reward.points,
            remaining_points,
            remaining_stock,
            "Reward redeemed"
        );

        Ok(RewardRedeemed {
            redemption_id,
            reward_id: reward.id,
            reward_name: reward.name,
            points_spent: reward.points,
            remaining_points,
            remaining_stock,
        })
    }
}
