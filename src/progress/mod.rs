//! Derived progression: levels and badges

mod badges;
mod levels;

pub use badges::{BADGES, Badge, BadgeId};
pub use levels::{LevelProgress, POINTS_PER_LEVEL};
