//! Level system
//!
//! Levels are a pure function of points: every 50 points is one level,
//! starting at level 1.

use serde::Serialize;

/// Points needed to advance one level
pub const POINTS_PER_LEVEL: u32 = 50;

/// Level and progress towards the next one
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: u32,
    pub points: u32,
    /// Points gathered since reaching the current level
    pub points_into_level: u32,
    /// Total points at which the next level is reached
    pub next_level_points: u32,
}

impl LevelProgress {
    /// Calculate level and progress for given points
    pub fn for_points(points: u32) -> Self {
        let level = points / POINTS_PER_LEVEL + 1;
        Self {
            level,
            points,
            points_into_level: points % POINTS_PER_LEVEL,
            next_level_points: level.saturating_mul(POINTS_PER_LEVEL),
        }
    }

    /// Progress to next level (0.0 - 1.0)
    pub fn progress(&self) -> f32 {
        self.points_into_level as f32 / POINTS_PER_LEVEL as f32
    }

    /// Points still missing to reach the next level
    pub fn points_to_next(&self) -> u32 {
        self.next_level_points.saturating_sub(self.points)
    }
}
