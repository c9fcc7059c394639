//! Core domain types for GreenCampus

mod mission;
mod profile;
mod reward;

pub use mission::{Mission, MissionCompletion, MissionDraft};
pub use profile::{Profile, Role};
pub use reward::{Reward, RewardDraft, RewardRedemption};

/// Current timestamp in milliseconds since epoch
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a new opaque record ID
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
