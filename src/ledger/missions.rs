//! Mission ledger - turns a scanned QR payload into points

use rusqlite::{OptionalExtension, TransactionBehavior, params};
use serde::Serialize;
use tracing::{debug, info};

use super::LedgerError;
use crate::account::Session;
use crate::domain::{Mission, now_ms};
use crate::qr::{self, QrPayload};
use crate::store::{CampusDb, MISSION_COLUMNS, is_unique_violation, mission_from_row};

/// Which QR payloads the ledger accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrPolicy {
    /// Reject bare codes; only `<code>.<signature>` payloads are accepted.
    /// A signature that is present is verified either way.
    pub require_signature: bool,
}

impl QrPolicy {
    pub fn signed() -> Self {
        Self {
            require_signature: true,
        }
    }

    pub fn lenient() -> Self {
        Self {
            require_signature: false,
        }
    }
}

impl Default for QrPolicy {
    fn default() -> Self {
        Self::signed()
    }
}

/// Outcome of a successful scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissionCompleted {
    pub mission_id: String,
    pub mission_title: String,
    pub points_awarded: u32,
    /// Profile totals after the completion
    pub total_points: u32,
    pub completed_missions: u32,
}

/// Records mission completions and credits points
#[derive(Clone)]
pub struct MissionLedger {
    db: CampusDb,
    policy: QrPolicy,
}

impl MissionLedger {
    pub fn new(db: CampusDb, policy: QrPolicy) -> Self {
        Self { db, policy }
    }

    /// Complete the mission identified by `raw_payload` for the session's user.
    ///
    /// The completion row and the counter increment commit together. A second
    /// scan of the same mission, concurrent or not, hits the UNIQUE
    /// (user_id, mission_id) constraint and fails with `AlreadyCompleted`.
    pub fn complete_mission(
        &self,
        session: &Session,
        raw_payload: &str,
    ) -> Result<MissionCompleted, LedgerError> {
        let Some(payload) = QrPayload::parse(raw_payload) else {
            debug!(user_id = %session.user_id, "Rejected scan: malformed payload");
            return Err(LedgerError::InvalidOrInactiveMission);
        };

        let mut conn = self.db.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mission = tx
            .query_row(
                &format!("SELECT {MISSION_COLUMNS} FROM missions WHERE qr_code = ?1 AND active = 1"),
                params![payload.code],
                mission_from_row,
            )
            .optional()?;
        let Some(mission) = mission else {
            debug!(user_id = %session.user_id, code = payload.code, "Rejected scan: no active mission");
            return Err(LedgerError::InvalidOrInactiveMission);
        };

        if !self.accepts(&mission, &payload) {
            debug!(user_id = %session.user_id, mission_id = %mission.id, "Rejected scan: signature");
            return Err(LedgerError::InvalidOrInactiveMission);
        }

        let profile_exists = tx
            .query_row(
                "SELECT 1 FROM profiles WHERE id = ?1",
                params![session.user_id],
                |_| Ok(()),
            )
            .optional()?;
        if profile_exists.is_none() {
            return Err(LedgerError::ProfileNotFound);
        }

        // Ledger row first; the counter can always be rebuilt from it
        let inserted = tx.execute(
            r#"
            INSERT INTO mission_completions (user_id, mission_id, points_earned, completed_at, qr_scanned)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                session.user_id,
                mission.id,
                mission.points,
                now_ms(),
                raw_payload.trim(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                debug!(user_id = %session.user_id, mission_id = %mission.id, "Rejected scan: already completed");
                return Err(LedgerError::AlreadyCompleted);
            }
            Err(e) => return Err(e.into()),
        }

        tx.execute(
            r#"
            UPDATE profiles
            SET points = points + ?2, completed_missions = completed_missions + 1
            WHERE id = ?1
            "#,
            params![session.user_id, mission.points],
        )?;

        let (total_points, completed_missions): (u32, u32) = tx.query_row(
            "SELECT points, completed_missions FROM profiles WHERE id = ?1",
            params![session.user_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        tx.commit()?;

        info!(
            user_id = %session.user_id,
            mission_id = %mission.id,
            points = mission.points,
            total_points,
            "Mission completed"
        );

        Ok(MissionCompleted {
            mission_id: mission.id,
            mission_title: mission.title,
            points_awarded: mission.points,
            total_points,
            completed_missions,
        })
    }

    fn accepts(&self, mission: &Mission, payload: &QrPayload<'_>) -> bool {
        match payload.signature {
            Some(sig) => qr::verify(payload.code, &mission.qr_secret, sig),
            None => !self.policy.require_signature,
        }
    }
}
