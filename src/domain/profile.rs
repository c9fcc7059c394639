//! Player profile and role

use serde::{Deserialize, Serialize};

use crate::progress::{Badge, LevelProgress};

/// Access role of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered user with their gamification counters.
///
/// `points` and `completed_missions` are denormalized from the ledger tables;
/// see [`crate::ledger::LedgerAudit`] for the reconciliation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub points: u32,
    pub completed_missions: u32,
    /// Created timestamp (ms since epoch)
    pub created_at: i64,
}

impl Profile {
    /// Create a fresh profile with zeroed counters
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: super::new_id(),
            email: email.into(),
            name: name.into(),
            role,
            points: 0,
            completed_missions: 0,
            created_at: super::now_ms(),
        }
    }

    /// Derived level: `floor(points / 50) + 1`
    pub fn level(&self) -> u32 {
        LevelProgress::for_points(self.points).level
    }

    pub fn level_progress(&self) -> LevelProgress {
        LevelProgress::for_points(self.points)
    }

    pub fn badges(&self) -> Vec<&'static Badge> {
        Badge::earned(self.points)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_starts_at_zero() {
        let profile = Profile::new("ana@campus.ac.id", "Ana", Role::Student);
        assert_eq!(profile.points, 0);
        assert_eq!(profile.completed_missions, 0);
        assert_eq!(profile.level(), 1);
        assert!(!profile.is_admin());
        assert!(!profile.id.is_empty());
    }

    #[test]
    fn test_role_roundtrip_strings() {
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str(Role::Student.as_str()), Some(Role::Student));
        assert_eq!(Role::from_str("root"), None);
    }

    #[test]
    fn test_level_follows_points() {
        let mut profile = Profile::new("b@campus.ac.id", "Budi", Role::Student);
        profile.points = 49;
        assert_eq!(profile.level(), 1);
        profile.points = 50;
        assert_eq!(profile.level(), 2);
        profile.points = 850;
        assert_eq!(profile.level(), 18);
    }
}
