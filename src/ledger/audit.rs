//! Balance reconciliation
//!
//! Profile counters are a cache of the ledger tables. For every profile:
//!
//! ```text
//! points             == SUM(completions.points_earned) - SUM(redemptions.points_spent)
//! completed_missions == COUNT(completions)
//! ```

use rusqlite::{Connection, TransactionBehavior, params};
use serde::Serialize;
use tracing::{info, warn};

use super::LedgerError;
use crate::account::Session;
use crate::store::CampusDb;

/// Counters as stored next to the values recomputed from the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub user_id: String,
    pub recorded_points: u32,
    pub ledger_points: i64,
    pub recorded_completions: u32,
    pub ledger_completions: u32,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        i64::from(self.recorded_points) == self.ledger_points
            && self.recorded_completions == self.ledger_completions
    }

    /// Recorded minus recomputed points
    pub fn point_drift(&self) -> i64 {
        i64::from(self.recorded_points) - self.ledger_points
    }
}

const RECONCILE_SQL: &str = r#"
    SELECT p.id, p.points, p.completed_missions,
        COALESCE((SELECT SUM(c.points_earned) FROM mission_completions c WHERE c.user_id = p.id), 0)
          - COALESCE((SELECT SUM(r.points_spent) FROM reward_redemptions r WHERE r.user_id = p.id), 0),
        (SELECT COUNT(*) FROM mission_completions c WHERE c.user_id = p.id)
    FROM profiles p
"#;

fn reconciliation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reconciliation> {
    Ok(Reconciliation {
        user_id: row.get(0)?,
        recorded_points: row.get(1)?,
        recorded_completions: row.get(2)?,
        ledger_points: row.get(3)?,
        ledger_completions: row.get(4)?,
    })
}

fn drifted_profiles(conn: &Connection) -> rusqlite::Result<Vec<Reconciliation>> {
    let mut stmt = conn.prepare(&format!("{RECONCILE_SQL} ORDER BY p.id"))?;
    let rows = stmt
        .query_map([], reconciliation_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows.into_iter().filter(|r| !r.is_consistent()).collect())
}

/// Checks and repairs denormalized profile counters
#[derive(Clone)]
pub struct LedgerAudit {
    db: CampusDb,
}

impl LedgerAudit {
    pub fn new(db: CampusDb) -> Self {
        Self { db }
    }

    pub fn reconcile(&self, user_id: &str) -> Result<Reconciliation, LedgerError> {
        let conn = self.db.conn();
        match conn.query_row(
            &format!("{RECONCILE_SQL} WHERE p.id = ?1"),
            params![user_id],
            reconciliation_from_row,
        ) {
            Ok(r) => Ok(r),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(LedgerError::ProfileNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Every profile whose counters disagree with the ledger
    pub fn discrepancies(&self) -> Result<Vec<Reconciliation>, LedgerError> {
        let conn = self.db.conn();
        Ok(drifted_profiles(&conn)?)
    }

    /// Overwrite drifted counters with the ledger values. Admin only.
    ///
    /// Profiles whose ledger balance is negative cannot be repaired and are
    /// skipped. Returns the profiles that were rewritten.
    pub fn repair(&self, admin: &Session) -> Result<Vec<Reconciliation>, LedgerError> {
        if !admin.is_admin() {
            return Err(LedgerError::Forbidden);
        }

        // Recompute and rewrite under the same write lock
        let mut conn = self.db.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let drifted = drifted_profiles(&tx)?;
        let mut repaired = Vec::new();
        for r in drifted {
            let Ok(points) = u32::try_from(r.ledger_points) else {
                warn!(user_id = %r.user_id, ledger_points = r.ledger_points, "Cannot repair negative ledger balance");
                continue;
            };
            tx.execute(
                "UPDATE profiles SET points = ?2, completed_missions = ?3 WHERE id = ?1",
                params![r.user_id, points, r.ledger_completions],
            )?;
            repaired.push(r);
        }
        tx.commit()?;

        info!(count = repaired.len(), by = %admin.user_id, "Repaired profile counters");
        Ok(repaired)
    }
}
