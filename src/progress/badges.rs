//! Badge definitions
//!
//! Badges are derived from the point balance and never stored.

use serde::Serialize;

/// Unique identifier for each badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeId {
    EcoStarter,
    EcoHero,
    GreenMaster,
    PlanetSaver,
}

impl BadgeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EcoStarter => "eco_starter",
            Self::EcoHero => "eco_hero",
            Self::GreenMaster => "green_master",
            Self::PlanetSaver => "planet_saver",
        }
    }
}

/// Badge definition with display metadata
#[derive(Debug, Clone, Serialize)]
pub struct Badge {
    pub id: BadgeId,
    pub name: &'static str,
    pub icon: &'static str,
    /// Minimum point balance to hold the badge
    pub min_points: u32,
}

/// All badge definitions (sorted by threshold)
pub static BADGES: &[Badge] = &[
    Badge {
        id: BadgeId::EcoStarter,
        name: "Eco Starter",
        icon: "🌱",
        min_points: 50,
    },
    Badge {
        id: BadgeId::EcoHero,
        name: "Eco Hero",
        icon: "🦸",
        min_points: 200,
    },
    Badge {
        id: BadgeId::GreenMaster,
        name: "Green Master",
        icon: "👑",
        min_points: 500,
    },
    Badge {
        id: BadgeId::PlanetSaver,
        name: "Planet Saver",
        icon: "🌍",
        min_points: 1000,
    },
];

impl Badge {
    /// Badges held at the given point balance
    pub fn earned(points: u32) -> Vec<&'static Badge> {
        BADGES.iter().filter(|b| points >= b.min_points).collect()
    }

    /// The next badge not yet held, if any
    pub fn next(points: u32) -> Option<&'static Badge> {
        BADGES.iter().find(|b| points < b.min_points)
    }
}
