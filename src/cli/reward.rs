//! Reward catalog commands

use anyhow::Result;

use greencampus::RewardDraft;

use super::{CliContext, require_session, truncate};

pub fn draft(
    name: String,
    points: u32,
    stock: u32,
    description: String,
    category: String,
    inactive: bool,
) -> RewardDraft {
    let mut draft = RewardDraft::new(name, points, stock)
        .with_description(description)
        .with_category(category);
    draft.active = !inactive;
    draft
}

pub fn list(ctx: &CliContext, json: bool) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;

    if session.is_admin() {
        let rewards = campus.catalog().list_rewards(&session)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&rewards)?);
            return Ok(());
        }
        if rewards.is_empty() {
            println!("No rewards found.");
            return Ok(());
        }
        println!(
            "{:<38} {:<26} {:>6} {:>6} {:<8}",
            "ID", "NAME", "COST", "STOCK", "ACTIVE"
        );
        println!("{}", "-".repeat(88));
        for r in rewards {
            println!(
                "{:<38} {:<26} {:>6} {:>6} {:<8}",
                r.id,
                truncate(&r.name, 24),
                r.points,
                r.stock,
                if r.active { "yes" } else { "no" },
            );
        }
        return Ok(());
    }

    let listings = campus.browser().rewards(&session)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }
    if listings.is_empty() {
        println!("No rewards available.");
        return Ok(());
    }
    println!(
        "{:<38} {:<26} {:>6} {:>6} {:<10}",
        "ID", "REWARD", "COST", "STOCK", ""
    );
    println!("{}", "-".repeat(90));
    for l in listings {
        let note = if !l.reward.in_stock() {
            "sold out"
        } else if l.affordable {
            "available"
        } else if l.reward.is_low_stock() {
            "low stock"
        } else {
            ""
        };
        println!(
            "{:<38} {:<26} {:>6} {:>6} {:<10}",
            l.reward.id,
            truncate(&l.reward.name, 24),
            l.reward.points,
            l.reward.stock,
            note,
        );
    }
    Ok(())
}

pub fn create(ctx: &CliContext, draft: RewardDraft) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;
    let reward = campus.catalog().create_reward(&session, draft)?;
    println!("Created reward {} ({})", reward.id, reward.name);
    Ok(())
}

pub fn update(ctx: &CliContext, id: &str, draft: RewardDraft) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;
    let reward = campus.catalog().update_reward(&session, id, draft)?;
    println!("Updated reward {} ({})", reward.id, reward.name);
    Ok(())
}

pub fn delete(ctx: &CliContext, id: &str) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;
    campus.catalog().delete_reward(&session, id)?;
    println!("Deleted reward {}", id);
    Ok(())
}

pub fn set_active(ctx: &CliContext, id: &str, active: bool) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;
    campus.catalog().set_reward_active(&session, id, active)?;
    println!(
        "Reward {} {}",
        id,
        if active { "activated" } else { "deactivated" }
    );
    Ok(())
}
