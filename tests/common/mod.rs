//! Shared test utilities for campus integration tests

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;

use greencampus::account::Session;
use greencampus::config::Config;
use greencampus::{Campus, Mission, MissionDraft, Reward, RewardDraft};

pub const ADMIN_EMAIL: &str = "admin@campus.test";

/// A campus on a throwaway database with one registered admin
pub struct TestCampus {
    pub campus: Campus,
    pub admin: Session,
    pub db_path: PathBuf,
    _dir: TempDir,
}

/// Creates a campus whose config grants `ADMIN_EMAIL` the admin role
pub fn create_test_campus() -> TestCampus {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("campus.db");

    let mut config = Config::with_defaults();
    config.settings.admin_emails = vec![ADMIN_EMAIL.to_string()];

    let campus = Campus::open_at(&db_path, config).expect("Failed to open campus");
    campus
        .accounts()
        .register(ADMIN_EMAIL, "Campus Admin")
        .expect("Failed to register admin");
    let admin = campus
        .accounts()
        .login(ADMIN_EMAIL)
        .expect("Failed to log in admin");

    TestCampus {
        campus,
        admin,
        db_path,
        _dir: dir,
    }
}

impl TestCampus {
    /// Second handle with its own connection to the same database file
    pub fn reopen(&self) -> Campus {
        Campus::open_at(&self.db_path, self.campus.config().clone())
            .expect("Failed to reopen campus")
    }

    pub fn student(&self, email: &str) -> Session {
        self.campus
            .accounts()
            .register(email, "Student")
            .expect("Failed to register student");
        self.campus
            .accounts()
            .login(email)
            .expect("Failed to log in student")
    }

    /// Create an active mission and return it with its signed payload
    pub fn mission(&self, title: &str, points: u32) -> (Mission, String) {
        let mission = self
            .campus
            .catalog()
            .create_mission(&self.admin, MissionDraft::new(title, "Recycling", points))
            .expect("Failed to create mission");
        let payload = self
            .campus
            .catalog()
            .mission_token(&self.admin, &mission.id)
            .expect("Failed to sign mission payload");
        (mission, payload)
    }

    pub fn reward(&self, name: &str, points: u32, stock: u32) -> Reward {
        self.campus
            .catalog()
            .create_reward(&self.admin, RewardDraft::new(name, points, stock))
            .expect("Failed to create reward")
    }

    /// Give a student points by completing a fresh mission worth that much
    pub fn award(&self, student: &Session, points: u32) {
        let (mission, payload) = self.mission(&format!("Bonus {}", points), points);
        self.campus
            .missions()
            .complete_mission(student, &payload)
            .unwrap_or_else(|e| panic!("Failed to complete {}: {}", mission.title, e));
    }

    pub fn points_of(&self, session: &Session) -> u32 {
        self.campus
            .accounts()
            .profile(session)
            .expect("Failed to load profile")
            .points
    }
}
