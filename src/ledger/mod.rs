//! Points ledger
//!
//! The only code that changes point balances or reward stock. Each operation
//! runs in one IMMEDIATE transaction, so concurrent writers (other threads or
//! another process on the same database file) are serialized by SQLite and
//! every check sees the state it then modifies.

mod audit;
mod error;
mod missions;
mod rewards;

pub use audit::{LedgerAudit, Reconciliation};
pub use error::LedgerError;
pub use missions::{MissionCompleted, MissionLedger, QrPolicy};
pub use rewards::{RewardLedger, RewardRedeemed};
