//! Mission catalog entries and completion records

use serde::{Deserialize, Serialize};

/// An eco-action tied to a physical QR code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Points awarded on completion (always > 0)
    pub points: u32,
    pub location: String,
    pub category: String,
    /// Token printed into the QR image, e.g. "QR_ENERGY_SAVING_1718000000000"
    pub qr_code: String,
    /// Key for signing `qr_code`. Never serialized.
    #[serde(skip_serializing, default)]
    pub qr_secret: String,
    pub active: bool,
    /// Created timestamp (ms since epoch)
    pub created_at: i64,
    /// Updated timestamp (ms since epoch)
    pub updated_at: i64,
}

/// Admin-editable fields of a mission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissionDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub points: u32,
    #[serde(default)]
    pub location: String,
    pub category: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl MissionDraft {
    pub fn new(title: impl Into<String>, category: impl Into<String>, points: u32) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            points,
            location: String::new(),
            category: category.into(),
            active: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("mission title must not be empty".to_string());
        }
        if self.category.trim().is_empty() {
            return Err("mission category must not be empty".to_string());
        }
        if self.points == 0 {
            return Err("mission points must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Permanent record that a user finished a mission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionCompletion {
    pub id: i64,
    pub user_id: String,
    pub mission_id: String,
    /// Mission point value at scan time
    pub points_earned: u32,
    pub completed_at: i64,
    /// Raw payload that was scanned
    pub qr_scanned: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_validation() {
        assert!(MissionDraft::new("Bawa Tumbler", "Plastic Reduction", 15).validate().is_ok());
        assert!(MissionDraft::new("  ", "Energy", 10).validate().is_err());
        assert!(MissionDraft::new("Hemat Listrik", "", 10).validate().is_err());
        assert!(MissionDraft::new("Hemat Listrik", "Energy", 0).validate().is_err());
    }

    #[test]
    fn test_secret_is_not_serialized() {
        let mission = Mission {
            id: "m1".to_string(),
            title: "Tanam Pohon".to_string(),
            description: String::new(),
            points: 50,
            location: "Taman Kampus".to_string(),
            category: "Reforestation".to_string(),
            qr_code: "QR_REFORESTATION_1".to_string(),
            qr_secret: "top-secret".to_string(),
            active: true,
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_string(&mission).unwrap();
        assert!(!json.contains("top-secret"));
        assert!(json.contains("QR_REFORESTATION_1"));
    }
}
