//! Admin CRUD over missions and rewards

use tracing::info;

use super::CatalogError;
use crate::account::Session;
use crate::domain::{Mission, MissionDraft, Reward, RewardDraft, new_id, now_ms};
use crate::qr;
use crate::store::{CampusDb, MissionRepository, RewardRepository, is_unique_violation};

/// Suffixes tried when two missions of a category land on the same millisecond
const MAX_CODE_ATTEMPTS: u32 = 100;

/// Catalog write operations. Every call checks the session's role.
#[derive(Clone)]
pub struct CatalogAdmin {
    db: CampusDb,
}

impl CatalogAdmin {
    pub fn new(db: CampusDb) -> Self {
        Self { db }
    }

    fn missions(&self) -> MissionRepository {
        MissionRepository::new(self.db.clone())
    }

    fn rewards(&self) -> RewardRepository {
        RewardRepository::new(self.db.clone())
    }

    fn authorize(session: &Session) -> Result<(), CatalogError> {
        if session.is_admin() {
            Ok(())
        } else {
            Err(CatalogError::Forbidden)
        }
    }

    // ============================================
    // MISSIONS
    // ============================================

    pub fn list_missions(&self, session: &Session) -> Result<Vec<Mission>, CatalogError> {
        Self::authorize(session)?;
        Ok(self.missions().list_all()?)
    }

    pub fn get_mission(&self, session: &Session, id: &str) -> Result<Mission, CatalogError> {
        Self::authorize(session)?;
        self.missions()
            .get(id)?
            .ok_or_else(|| CatalogError::NotFound(format!("mission {id}")))
    }

    /// Create a mission with a fresh QR code and signing secret
    pub fn create_mission(
        &self,
        session: &Session,
        draft: MissionDraft,
    ) -> Result<Mission, CatalogError> {
        Self::authorize(session)?;
        draft.validate().map_err(CatalogError::InvalidInput)?;

        let now = now_ms();
        let base_code = qr::generate_code(&draft.category, now);
        let mut mission = Mission {
            id: new_id(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            points: draft.points,
            location: draft.location,
            category: draft.category.trim().to_string(),
            qr_code: base_code.clone(),
            qr_secret: qr::generate_secret(),
            active: draft.active,
            created_at: now,
            updated_at: now,
        };

        let repo = self.missions();
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            if attempt > 1 {
                mission.qr_code = format!("{base_code}_{attempt}");
            }
            match repo.create(&mission) {
                Ok(()) => {
                    info!(mission_id = %mission.id, qr_code = %mission.qr_code, by = %session.user_id, "Created mission");
                    return Ok(mission);
                }
                Err(e)
                    if e
                        .downcast_ref::<rusqlite::Error>()
                        .is_some_and(is_unique_violation) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Err(CatalogError::InvalidInput(format!(
            "could not allocate a unique QR code for {base_code}"
        )))
    }

    /// Replace a mission's editable fields. The QR code never changes.
    pub fn update_mission(
        &self,
        session: &Session,
        id: &str,
        draft: MissionDraft,
    ) -> Result<Mission, CatalogError> {
        let mut mission = self.get_mission(session, id)?;
        draft.validate().map_err(CatalogError::InvalidInput)?;

        mission.title = draft.title.trim().to_string();
        mission.description = draft.description;
        mission.points = draft.points;
        mission.location = draft.location;
        mission.category = draft.category.trim().to_string();
        mission.active = draft.active;
        mission.updated_at = now_ms();

        if !self.missions().update(&mission)? {
            return Err(CatalogError::NotFound(format!("mission {id}")));
        }
        info!(mission_id = %id, by = %session.user_id, "Updated mission");
        Ok(mission)
    }

    /// Delete a mission. Existing completions keep their points.
    pub fn delete_mission(&self, session: &Session, id: &str) -> Result<(), CatalogError> {
        Self::authorize(session)?;
        if !self.missions().delete(id)? {
            return Err(CatalogError::NotFound(format!("mission {id}")));
        }
        info!(mission_id = %id, by = %session.user_id, "Deleted mission");
        Ok(())
    }

    pub fn set_mission_active(
        &self,
        session: &Session,
        id: &str,
        active: bool,
    ) -> Result<(), CatalogError> {
        Self::authorize(session)?;
        if !self.missions().set_active(id, active)? {
            return Err(CatalogError::NotFound(format!("mission {id}")));
        }
        info!(mission_id = %id, active, by = %session.user_id, "Changed mission activation");
        Ok(())
    }

    /// Signed payload to print into the mission's QR image
    pub fn mission_token(&self, session: &Session, id: &str) -> Result<String, CatalogError> {
        let mission = self.get_mission(session, id)?;
        qr::signed_payload(&mission.qr_code, &mission.qr_secret).ok_or_else(|| {
            CatalogError::InvalidInput(format!("mission {id} has an unusable signing secret"))
        })
    }

    // ============================================
    // REWARDS
    // ============================================

    pub fn list_rewards(&self, session: &Session) -> Result<Vec<Reward>, CatalogError> {
        Self::authorize(session)?;
        Ok(self.rewards().list_all()?)
    }

    pub fn get_reward(&self, session: &Session, id: &str) -> Result<Reward, CatalogError> {
        Self::authorize(session)?;
        self.rewards()
            .get(id)?
            .ok_or_else(|| CatalogError::NotFound(format!("reward {id}")))
    }

    pub fn create_reward(
        &self,
        session: &Session,
        draft: RewardDraft,
    ) -> Result<Reward, CatalogError> {
        Self::authorize(session)?;
        draft.validate().map_err(CatalogError::InvalidInput)?;

        let now = now_ms();
        let reward = Reward {
            id: new_id(),
            name: draft.name.trim().to_string(),
            description: draft.description,
            points: draft.points,
            stock: draft.stock,
            category: draft.category,
            active: draft.active,
            created_at: now,
            updated_at: now,
        };
        self.rewards().create(&reward)?;
        info!(reward_id = %reward.id, by = %session.user_id, "Created reward");
        Ok(reward)
    }

    pub fn update_reward(
        &self,
        session: &Session,
        id: &str,
        draft: RewardDraft,
    ) -> Result<Reward, CatalogError> {
        let mut reward = self.get_reward(session, id)?;
        draft.validate().map_err(CatalogError::InvalidInput)?;

        reward.name = draft.name.trim().to_string();
        reward.description = draft.description;
        reward.points = draft.points;
        reward.stock = draft.stock;
        reward.category = draft.category;
        reward.active = draft.active;
        reward.updated_at = now_ms();

        if !self.rewards().update(&reward)? {
            return Err(CatalogError::NotFound(format!("reward {id}")));
        }
        info!(reward_id = %id, by = %session.user_id, "Updated reward");
        Ok(reward)
    }

    pub fn delete_reward(&self, session: &Session, id: &str) -> Result<(), CatalogError> {
        Self::authorize(session)?;
        if !self.rewards().delete(id)? {
            return Err(CatalogError::NotFound(format!("reward {id}")));
        }
        info!(reward_id = %id, by = %session.user_id, "Deleted reward");
        Ok(())
    }

    pub fn set_reward_active(
        &self,
        session: &Session,
        id: &str,
        active: bool,
    ) -> Result<(), CatalogError> {
        Self::authorize(session)?;
        if !self.rewards().set_active(id, active)? {
            return Err(CatalogError::NotFound(format!("reward {id}")));
        }
        info!(reward_id = %id, active, by = %session.user_id, "Changed reward activation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Profile, Role};
    use crate::store::ProfileRepository;
    use tempfile::tempdir;

    fn setup(dir: &std::path::Path) -> (CatalogAdmin, Session, Session) {
        let db = CampusDb::open(&dir.join("campus.db")).unwrap();
        let repo = ProfileRepository::new(db.clone());
        let admin = Profile::new("admin@campus.ac.id", "Admin", Role::Admin);
        let student = Profile::new("siti@campus.ac.id", "Siti", Role::Student);
        repo.create(&admin).unwrap();
        repo.create(&student).unwrap();
        (
            CatalogAdmin::new(db),
            Session::for_profile(&admin),
            Session::for_profile(&student),
        )
    }

    #[test]
    fn test_students_are_forbidden() {
        let dir = tempdir().unwrap();
        let (catalog, _, student) = setup(dir.path());

        assert!(matches!(
            catalog.create_mission(&student, MissionDraft::new("Tanam Pohon", "Reforestation", 50)),
            Err(CatalogError::Forbidden)
        ));
        assert!(matches!(
            catalog.create_reward(&student, RewardDraft::new("Kopi", 100, 5)),
            Err(CatalogError::Forbidden)
        ));
        assert!(matches!(
            catalog.list_missions(&student),
            Err(CatalogError::Forbidden)
        ));
    }

    #[test]
    fn test_create_mission_generates_token() {
        let dir = tempdir().unwrap();
        let (catalog, admin, _) = setup(dir.path());

        let mission = catalog
            .create_mission(&admin, MissionDraft::new("Hemat Listrik", "Energy Saving", 20))
            .unwrap();
        assert!(mission.qr_code.starts_with("QR_ENERGY_SAVING_"));
        assert!(!mission.qr_secret.is_empty());

        let token = catalog.mission_token(&admin, &mission.id).unwrap();
        let payload = qr::QrPayload::parse(&token).unwrap();
        assert_eq!(payload.code, mission.qr_code);
        assert!(qr::verify(payload.code, &mission.qr_secret, payload.signature.unwrap()));
    }

    #[test]
    fn test_colliding_codes_get_suffix() {
        let dir = tempdir().unwrap();
        let (catalog, admin, _) = setup(dir.path());

        let codes: Vec<String> = (0..5)
            .map(|_| {
                catalog
                    .create_mission(&admin, MissionDraft::new("Bawa Tumbler", "Plastic", 15))
                    .unwrap()
                    .qr_code
            })
            .collect();
        let mut unique = codes.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_update_keeps_token() {
        let dir = tempdir().unwrap();
        let (catalog, admin, _) = setup(dir.path());
        let mission = catalog
            .create_mission(&admin, MissionDraft::new("Old", "Waste", 10))
            .unwrap();

        let updated = catalog
            .update_mission(
                &admin,
                &mission.id,
                MissionDraft::new("New", "Waste Management", 30).with_location("Kantin"),
            )
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.points, 30);
        assert_eq!(updated.qr_code, mission.qr_code);

        let stored = catalog.get_mission(&admin, &mission.id).unwrap();
        assert_eq!(stored.qr_code, mission.qr_code);
        assert_eq!(stored.qr_secret, mission.qr_secret);
        assert_eq!(stored.location, "Kantin");
    }

    #[test]
    fn test_validation_and_not_found() {
        let dir = tempdir().unwrap();
        let (catalog, admin, _) = setup(dir.path());

        assert!(matches!(
            catalog.create_mission(&admin, MissionDraft::new("", "Waste", 10)),
            Err(CatalogError::InvalidInput(_))
        ));
        assert!(matches!(
            catalog.create_mission(&admin, MissionDraft::new("Zero", "Waste", 0)),
            Err(CatalogError::InvalidInput(_))
        ));
        assert!(matches!(
            catalog.create_reward(&admin, RewardDraft::new("Free", 0, 1)),
            Err(CatalogError::InvalidInput(_))
        ));
        assert!(matches!(
            catalog.delete_mission(&admin, "missing"),
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            catalog.set_reward_active(&admin, "missing", false),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_reward_lifecycle() {
        let dir = tempdir().unwrap();
        let (catalog, admin, _) = setup(dir.path());

        let reward = catalog
            .create_reward(&admin, RewardDraft::new("Parkir Gratis", 500, 10).with_category("Parking"))
            .unwrap();
        catalog.set_reward_active(&admin, &reward.id, false).unwrap();
        assert!(!catalog.get_reward(&admin, &reward.id).unwrap().active);

        let updated = catalog
            .update_reward(&admin, &reward.id, RewardDraft::new("Parkir Gratis", 450, 0))
            .unwrap();
        assert_eq!(updated.stock, 0);
        assert_eq!(updated.points, 450);

        catalog.delete_reward(&admin, &reward.id).unwrap();
        assert!(catalog.list_rewards(&admin).unwrap().is_empty());
    }
}
