//! Ledger error taxonomy

/// Why a ledger operation was refused or failed.
///
/// Everything except [`LedgerError::StoreUnavailable`] is detected before
/// the transaction commits and leaves no trace in the store.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Unknown token, inactive mission or bad signature. Deliberately vague.
    #[error("QR code is invalid or the mission is not active")]
    InvalidOrInactiveMission,

    #[error("you have already completed this mission")]
    AlreadyCompleted,

    #[error("not enough points: {required} needed, {available} available")]
    InsufficientPoints { required: u32, available: u32 },

    #[error("this reward is out of stock")]
    OutOfStock,

    #[error("this reward is not available")]
    RewardUnavailable,

    #[error("profile not found")]
    ProfileNotFound,

    #[error("only admins can do that")]
    Forbidden,

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),
}

impl LedgerError {
    /// Stable machine-readable kind, used in API responses
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidOrInactiveMission => "invalid_or_inactive_mission",
            Self::AlreadyCompleted => "already_completed",
            Self::InsufficientPoints { .. } => "insufficient_points",
            Self::OutOfStock => "out_of_stock",
            Self::RewardUnavailable => "reward_unavailable",
            Self::ProfileNotFound => "profile_not_found",
            Self::Forbidden => "forbidden",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }

    /// Validation errors are informational; retrying will not help
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::StoreUnavailable(_) | Self::Forbidden)
    }
}
