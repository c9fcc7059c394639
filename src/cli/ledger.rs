//! Redeem, leaderboard, dashboard and audit commands

use anyhow::{Context, Result};

use super::{CliContext, format_timestamp, require_session, truncate};

pub fn redeem(ctx: &CliContext, reward_id: &str) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;
    let redeemed = campus.rewards().redeem_reward(&session, reward_id)?;
    println!(
        "Redeemed {} for {} points. Remaining balance: {}",
        redeemed.reward_name, redeemed.points_spent, redeemed.remaining_points
    );
    println!("Redemption ID: {}", redeemed.redemption_id);
    Ok(())
}

pub fn leaderboard(ctx: &CliContext, limit: Option<usize>, json: bool) -> Result<()> {
    let campus = ctx.open_campus()?;
    let limit = limit.unwrap_or(campus.config().settings.leaderboard.limit);
    let entries = campus.leaderboard().top(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("Nobody on the leaderboard yet.");
        return Ok(());
    }

    println!(
        "{:<6} {:<28} {:>8} {:>6} {:>9}",
        "RANK", "NAME", "POINTS", "LEVEL", "MISSIONS"
    );
    println!("{}", "-".repeat(61));
    for e in entries {
        let rank = if e.podium {
            format!("#{}*", e.rank)
        } else {
            format!("#{}", e.rank)
        };
        println!(
            "{:<6} {:<28} {:>8} {:>6} {:>9}",
            rank,
            truncate(&e.name, 26),
            e.points,
            e.level,
            e.completed_missions,
        );
    }
    Ok(())
}

pub fn dashboard(ctx: &CliContext, json: bool) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;
    let dashboard = campus
        .dashboard()
        .for_session(&session)?
        .context("Profile no longer exists; log in again")?;
    let history = campus.dashboard().history(&session)?;

    if json {
        let out = serde_json::json!({ "dashboard": dashboard, "history": history });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let p = &dashboard.profile;
    let level = &dashboard.level;
    println!("{} <{}>", p.name, p.email);
    println!(
        "Points:   {}  (rank {})",
        p.points,
        dashboard.rank.map(|r| format!("#{r}")).unwrap_or_else(|| "-".to_string())
    );
    println!(
        "Level:    {}  ({}/{} to level {}, {:.0}%)",
        level.level,
        p.points,
        level.next_level_points,
        level.level + 1,
        level.progress() * 100.0
    );
    println!("Missions: {}", p.completed_missions);

    if dashboard.badges.is_empty() {
        println!("Badges:   none yet");
    } else {
        let names: Vec<String> = dashboard
            .badges
            .iter()
            .map(|b| format!("{} {}", b.icon, b.name))
            .collect();
        println!("Badges:   {}", names.join(", "));
    }
    if let Some(next) = dashboard.next_badge {
        println!(
            "Next:     {} at {} points ({} to go)",
            next.name,
            next.min_points,
            next.min_points.saturating_sub(p.points)
        );
    }

    if !dashboard.recent_activity.is_empty() {
        println!("\nRecent activity:");
        for a in &dashboard.recent_activity {
            println!(
                "  {}  +{:<4} {}",
                format_timestamp(a.completed_at),
                a.points_earned,
                a.mission_title.as_deref().unwrap_or("(deleted mission)")
            );
        }
    }

    if !history.redemptions.is_empty() {
        println!("\nRedemptions:");
        for r in &history.redemptions {
            println!(
                "  {}  -{:<4} {}",
                format_timestamp(r.redeemed_at),
                r.points_spent,
                r.reward_id
            );
        }
    }
    Ok(())
}

pub fn audit(ctx: &CliContext, repair: bool, json: bool) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = require_session(&campus)?;
    let audit = campus.audit();

    let drifted = if repair {
        audit.repair(&session)?
    } else {
        if !session.is_admin() {
            anyhow::bail!("Only admins can audit the ledger");
        }
        audit.discrepancies()?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&drifted)?);
        return Ok(());
    }
    if drifted.is_empty() {
        println!("All profile counters match the ledger.");
        return Ok(());
    }

    println!(
        "{:<38} {:>10} {:>10} {:>10} {:>10}",
        "PROFILE", "POINTS", "LEDGER", "MISSIONS", "LEDGER"
    );
    println!("{}", "-".repeat(82));
    for r in &drifted {
        println!(
            "{:<38} {:>10} {:>10} {:>10} {:>10}",
            r.user_id, r.recorded_points, r.ledger_points, r.recorded_completions, r.ledger_completions
        );
    }
    if repair {
        println!("\nRepaired {} profile(s).", drifted.len());
    } else {
        println!("\nRun with --repair to rewrite these counters from the ledger.");
    }
    Ok(())
}
