//! Demo catalog
//!
//! Five missions and five rewards for a fresh campus. Seeding only fills
//! empty tables, so running it twice is harmless.

use anyhow::Result;
use tracing::info;

use crate::domain::{Mission, MissionDraft, Reward, RewardDraft, new_id, now_ms};
use crate::qr;
use crate::store::{CampusDb, MissionRepository, RewardRepository};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub missions: usize,
    pub rewards: usize,
}

pub fn demo_missions() -> Vec<MissionDraft> {
    vec![
        MissionDraft::new("Buang Sampah Terpilah", "Waste Management", 10)
            .with_description("Pisahkan sampah organik dan anorganik di tempat sampah terpilah")
            .with_location("Area Kampus"),
        MissionDraft::new("Bawa Tumbler Sendiri", "Plastic Reduction", 15)
            .with_description("Gunakan tumbler sendiri saat membeli minuman")
            .with_location("Kantin"),
        MissionDraft::new("Hemat Listrik", "Energy Saving", 20)
            .with_description("Matikan lampu dan AC saat meninggalkan ruangan")
            .with_location("Ruang Kelas"),
        MissionDraft::new("Gunakan Transportasi Umum", "Transportation", 25)
            .with_description("Datang ke kampus dengan transportasi umum atau sepeda")
            .with_location("Gerbang Kampus"),
        MissionDraft::new("Tanam Pohon", "Reforestation", 50)
            .with_description("Ikut serta dalam kegiatan penanaman pohon")
            .with_location("Taman Kampus"),
    ]
}

pub fn demo_rewards() -> Vec<RewardDraft> {
    vec![
        RewardDraft::new("Diskon Kantin 20%", 100, 50)
            .with_description("Potongan harga 20% di kantin kampus")
            .with_category("Diskon"),
        RewardDraft::new("Merchandise Kampus", 250, 20)
            .with_description("Kaos atau tote bag ramah lingkungan")
            .with_category("Merchandise"),
        RewardDraft::new("Free Coffee Week", 150, 30)
            .with_description("Kopi gratis selama satu minggu")
            .with_category("Voucher"),
        RewardDraft::new("Green Campus Badge", 300, 15)
            .with_description("Pin eksklusif Green Campus")
            .with_category("Merchandise"),
        RewardDraft::new("Parkir Gratis 1 Bulan", 500, 10)
            .with_description("Bebas biaya parkir selama satu bulan")
            .with_category("Parking"),
    ]
}

/// Insert the demo catalog into empty tables
pub fn seed_demo(db: &CampusDb) -> Result<SeedReport> {
    let missions = MissionRepository::new(db.clone());
    let rewards = RewardRepository::new(db.clone());
    let mut report = SeedReport::default();

    if missions.list_all()?.is_empty() {
        for (i, draft) in demo_missions().into_iter().enumerate() {
            let now = now_ms();
            missions.create(&Mission {
                id: new_id(),
                // Index keeps codes unique within one millisecond
                qr_code: format!("{}_{}", qr::generate_code(&draft.category, now), i + 1),
                qr_secret: qr::generate_secret(),
                title: draft.title,
                description: draft.description,
                points: draft.points,
                location: draft.location,
                category: draft.category,
                active: draft.active,
                created_at: now,
                updated_at: now,
            })?;
            report.missions += 1;
        }
    }

    if rewards.list_all()?.is_empty() {
        for draft in demo_rewards() {
            let now = now_ms();
            rewards.create(&Reward {
                id: new_id(),
                name: draft.name,
                description: draft.description,
                points: draft.points,
                stock: draft.stock,
                category: draft.category,
                active: draft.active,
                created_at: now,
                updated_at: now,
            })?;
            report.rewards += 1;
        }
    }

    info!(missions = report.missions, rewards = report.rewards, "Seeded demo catalog");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_demo_drafts_are_valid() {
        assert!(demo_missions().iter().all(|d| d.validate().is_ok()));
        assert!(demo_rewards().iter().all(|d| d.validate().is_ok()));
    }

    #[test]
    fn test_seed_is_idempotent() {
        let dir = tempdir().unwrap();
        let db = CampusDb::open(&dir.path().join("campus.db")).unwrap();

        let first = seed_demo(&db).unwrap();
        assert_eq!(first, SeedReport { missions: 5, rewards: 5 });
        let second = seed_demo(&db).unwrap();
        assert_eq!(second, SeedReport::default());

        let active = MissionRepository::new(db.clone()).list_active().unwrap();
        let points: Vec<u32> = active.iter().map(|m| m.points).collect();
        assert_eq!(points, vec![10, 15, 20, 25, 50]);
    }
}
