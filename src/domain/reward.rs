//! Reward catalog entries and redemption records

use serde::{Deserialize, Serialize};

/// Something a student can spend points on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Cost in points
    pub points: u32,
    pub stock: u32,
    pub category: String,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Reward {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Low stock threshold used for highlighting in listings
    pub fn is_low_stock(&self) -> bool {
        self.stock <= 5
    }
}

/// Admin-editable fields of a reward
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub points: u32,
    pub stock: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl RewardDraft {
    pub fn new(name: impl Into<String>, points: u32, stock: u32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            points,
            stock,
            category: String::new(),
            active: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("reward name must not be empty".to_string());
        }
        if self.points == 0 {
            return Err("reward cost must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Permanent record that a user spent points on a reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRedemption {
    pub id: String,
    pub user_id: String,
    pub reward_id: String,
    pub points_spent: u32,
    pub redeemed_at: i64,
}
