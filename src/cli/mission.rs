//! Mission catalog commands

use anyhow::Result;

use greencampus::MissionDraft;

use super::{CliContext, require_session, truncate};

pub fn draft(
    title: String,
    category: String,
    points: u32,
    description: String,
    location: String,
    inactive: bool,
) -> MissionDraft {
    let draft = MissionDraft::new(title, category, points)
        .with_description(description)
        .with_location(location);
    if inactive { draft.inactive() } else { draft }
}

/// Admins see the full catalog; students see active missions and their progress
pub fn list(ctx: &CliContext, json: bool) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;

    if session.is_admin() {
        let missions = campus.catalog().list_missions(&session)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&missions)?);
            return Ok(());
        }
        if missions.is_empty() {
            println!("No missions found.");
            return Ok(());
        }
        println!(
            "{:<38} {:<28} {:>6} {:<8} {:<32}",
            "ID", "TITLE", "POINTS", "ACTIVE", "QR CODE"
        );
        println!("{}", "-".repeat(116));
        for m in missions {
            println!(
                "{:<38} {:<28} {:>6} {:<8} {:<32}",
                m.id,
                truncate(&m.title, 26),
                m.points,
                if m.active { "yes" } else { "no" },
                m.qr_code,
            );
        }
        return Ok(());
    }

    let listings = campus.browser().missions(&session)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }
    if listings.is_empty() {
        println!("No active missions.");
        return Ok(());
    }
    println!(
        "{:<4} {:<30} {:>6} {:<20} {:<18}",
        "", "MISSION", "POINTS", "CATEGORY", "LOCATION"
    );
    println!("{}", "-".repeat(82));
    for l in listings {
        println!(
            "{:<4} {:<30} {:>6} {:<20} {:<18}",
            if l.completed { "[x]" } else { "[ ]" },
            truncate(&l.mission.title, 28),
            l.mission.points,
            truncate(&l.mission.category, 18),
            truncate(&l.mission.location, 16),
        );
    }
    Ok(())
}

pub fn create(ctx: &CliContext, draft: MissionDraft) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;
    let mission = campus.catalog().create_mission(&session, draft)?;
    println!("Created mission {}", mission.id);
    println!("QR code: {}", mission.qr_code);
    println!("Run `greencampus mission token {}` for the printable payload.", mission.id);
    Ok(())
}

pub fn update(ctx: &CliContext, id: &str, draft: MissionDraft) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;
    let mission = campus.catalog().update_mission(&session, id, draft)?;
    println!("Updated mission {} ({})", mission.id, mission.title);
    Ok(())
}

pub fn delete(ctx: &CliContext, id: &str) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;
    campus.catalog().delete_mission(&session, id)?;
    println!("Deleted mission {}", id);
    Ok(())
}

pub fn set_active(ctx: &CliContext, id: &str, active: bool) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;
    campus.catalog().set_mission_active(&session, id, active)?;
    println!(
        "Mission {} {}",
        id,
        if active { "activated" } else { "deactivated" }
    );
    Ok(())
}

pub fn token(ctx: &CliContext, id: &str) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;
    println!("{}", campus.catalog().mission_token(&session, id)?);
    Ok(())
}
