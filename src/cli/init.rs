//! Init and seed commands

use anyhow::{Result, bail};

use greencampus::config::{Config, generate_http_token};
use greencampus::seed;

use super::CliContext;

pub fn init_command(ctx: &CliContext, force: bool, with_token: bool) -> Result<()> {
    let config_path = ctx.config_path();

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    let mut config = Config::with_defaults();
    if with_token {
        config.settings.server.http_token = generate_http_token();
    }
    config.save_to_file(&config_path)?;
    println!("Created: {}", config_path.display());

    let campus = ctx.open_campus()?;
    println!(
        "Database: {} (schema v{})",
        ctx.db_path(&config).display(),
        campus.db().schema_version()?
    );
    if with_token {
        println!("HTTP token: {}", config.settings.server.http_token);
    }

    Ok(())
}

pub fn seed_command(ctx: &CliContext) -> Result<()> {
    let campus = ctx.open_campus()?;
    let report = seed::seed_demo(campus.db())?;

    if report.missions == 0 && report.rewards == 0 {
        println!("Catalog already populated; nothing seeded.");
    } else {
        println!(
            "Seeded {} missions and {} rewards.",
            report.missions, report.rewards
        );
    }
    Ok(())
}
