//! Account commands

use anyhow::{Result, anyhow};

use greencampus::Role;

use super::{CliContext, format_timestamp, require_session};

pub fn register(ctx: &CliContext, email: &str, name: &str) -> Result<()> {
    let campus = ctx.open_campus()?;
    let profile = campus.accounts().register(email, name)?;
    println!("Registered {} <{}> as {}", profile.name, profile.email, profile.role);
    println!("ID: {}", profile.id);
    Ok(())
}

pub fn login(ctx: &CliContext, email: &str) -> Result<()> {
    let campus = ctx.open_campus()?;
    let session = campus.accounts().login(email)?;
    println!("Logged in as {} ({})", session.email, session.role);
    Ok(())
}

pub fn logout(ctx: &CliContext) -> Result<()> {
    let campus = ctx.open_campus()?;
    campus.accounts().logout()?;
    println!("Logged out.");
    Ok(())
}

pub fn whoami(ctx: &CliContext, json: bool) -> Result<()> {
    let campus = ctx.open_campus()?;
    let Some(session) = campus.accounts().current()? else {
        println!("Not logged in.");
        return Ok(());
    };
    let profile = campus.accounts().profile(&session)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("ID:            {}", profile.id);
        println!("Name:          {}", profile.name);
        println!("Email:         {}", profile.email);
        println!("Role:          {}", profile.role);
        println!("Points:        {}", profile.points);
        println!("Level:         {}", profile.level());
        println!("Missions:      {}", profile.completed_missions);
        println!("Joined:        {}", format_timestamp(profile.created_at));
    }
    Ok(())
}

pub fn set_role(ctx: &CliContext, email: &str, role: &str) -> Result<()> {
    let role = Role::from_str(role).ok_or_else(|| anyhow!("Invalid role: {} (student|admin)", role))?;
    let campus = ctx.open_campus()?;
    let admin = require_session(&campus)?;
    let profile = campus.accounts().set_role(&admin, email, role)?;
    println!("{} is now {}", profile.email, profile.role);
    Ok(())
}
