use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

use cli::CliContext;

#[derive(Parser)]
#[command(name = "greencampus")]
#[command(about = "GreenCampus - scan eco-missions, earn points, redeem rewards")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.greencampus/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database (overrides settings.database_path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configuration file and database
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,

        /// Generate an HTTP API token
        #[arg(long)]
        with_token: bool,
    },

    /// Insert the demo missions and rewards into an empty catalog
    Seed,

    /// Register, log in and out
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// Manage missions (admin)
    Mission {
        #[command(subcommand)]
        command: MissionCommands,
    },

    /// Manage rewards (admin)
    Reward {
        #[command(subcommand)]
        command: RewardCommands,
    },

    /// Complete a mission by scanning its QR code
    ///
    /// Without --code, decoded payloads are read from stdin, one per line
    /// (e.g. `zbarcam --raw | greencampus scan`).
    Scan {
        /// QR payload to submit directly
        #[arg(long)]
        code: Option<String>,

        /// Run the zbarcam decoder with this camera (environment, user or a device path)
        #[arg(long)]
        camera: Option<String>,
    },

    /// Spend points on a reward
    Redeem {
        /// Reward ID
        reward_id: String,
    },

    /// Show the leaderboard
    Leaderboard {
        /// Number of entries (default: settings.leaderboard.limit)
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Show your points, level, badges and recent activity
    Dashboard {
        #[arg(long)]
        json: bool,
    },

    /// Check profile counters against the ledger (admin)
    Audit {
        /// Rewrite drifted counters from the ledger
        #[arg(long)]
        repair: bool,

        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP JSON API until Ctrl-C
    Serve {
        /// Override settings.server.port
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Create a profile
    Register {
        email: String,
        #[arg(long)]
        name: String,
    },
    /// Log in (credentials are checked by the campus identity provider)
    Login { email: String },
    Logout,
    /// Show the logged-in profile
    Whoami {
        #[arg(long)]
        json: bool,
    },
    /// Grant or revoke the admin role (admin)
    Role {
        email: String,
        /// student or admin
        role: String,
    },
}

#[derive(Subcommand)]
enum MissionCommands {
    /// List missions (admins see inactive ones too)
    List {
        #[arg(long)]
        json: bool,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        points: u32,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        location: String,
        /// Create the mission deactivated
        #[arg(long)]
        inactive: bool,
    },
    /// Replace a mission's editable fields (the QR code is kept)
    Update {
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        points: u32,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long)]
        inactive: bool,
    },
    Delete { id: String },
    Activate { id: String },
    Deactivate { id: String },
    /// Print the signed payload to encode into the mission's QR image
    Token { id: String },
}

#[derive(Subcommand)]
enum RewardCommands {
    /// List rewards (admins see inactive ones too)
    List {
        #[arg(long)]
        json: bool,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        points: u32,
        #[arg(long)]
        stock: u32,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long)]
        inactive: bool,
    },
    Update {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        points: u32,
        #[arg(long)]
        stock: u32,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long)]
        inactive: bool,
    },
    Delete { id: String },
    Activate { id: String },
    Deactivate { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let ctx = CliContext::new(cli.config, cli.db);

    match cli.command {
        Commands::Init { force, with_token } => {
            cli::init::init_command(&ctx, force, with_token)?;
        }
        Commands::Seed => {
            cli::init::seed_command(&ctx)?;
        }
        Commands::Account { command } => match command {
            AccountCommands::Register { email, name } => {
                cli::account::register(&ctx, &email, &name)?
            }
            AccountCommands::Login { email } => cli::account::login(&ctx, &email)?,
            AccountCommands::Logout => cli::account::logout(&ctx)?,
            AccountCommands::Whoami { json } => cli::account::whoami(&ctx, json)?,
            AccountCommands::Role { email, role } => cli::account::set_role(&ctx, &email, &role)?,
        },
        Commands::Mission { command } => match command {
            MissionCommands::List { json } => cli::mission::list(&ctx, json)?,
            MissionCommands::Create {
                title,
                category,
                points,
                description,
                location,
                inactive,
            } => {
                let draft = cli::mission::draft(title, category, points, description, location, inactive);
                cli::mission::create(&ctx, draft)?
            }
            MissionCommands::Update {
                id,
                title,
                category,
                points,
                description,
                location,
                inactive,
            } => {
                let draft = cli::mission::draft(title, category, points, description, location, inactive);
                cli::mission::update(&ctx, &id, draft)?
            }
            MissionCommands::Delete { id } => cli::mission::delete(&ctx, &id)?,
            MissionCommands::Activate { id } => cli::mission::set_active(&ctx, &id, true)?,
            MissionCommands::Deactivate { id } => cli::mission::set_active(&ctx, &id, false)?,
            MissionCommands::Token { id } => cli::mission::token(&ctx, &id)?,
        },
        Commands::Reward { command } => match command {
            RewardCommands::List { json } => cli::reward::list(&ctx, json)?,
            RewardCommands::Create {
                name,
                points,
                stock,
                description,
                category,
                inactive,
            } => {
                let draft = cli::reward::draft(name, points, stock, description, category, inactive);
                cli::reward::create(&ctx, draft)?
            }
            RewardCommands::Update {
                id,
                name,
                points,
                stock,
                description,
                category,
                inactive,
            } => {
                let draft = cli::reward::draft(name, points, stock, description, category, inactive);
                cli::reward::update(&ctx, &id, draft)?
            }
            RewardCommands::Delete { id } => cli::reward::delete(&ctx, &id)?,
            RewardCommands::Activate { id } => cli::reward::set_active(&ctx, &id, true)?,
            RewardCommands::Deactivate { id } => cli::reward::set_active(&ctx, &id, false)?,
        },
        Commands::Scan { code, camera } => {
            cli::scan::scan_command(&ctx, code, camera).await?;
        }
        Commands::Redeem { reward_id } => {
            cli::ledger::redeem(&ctx, &reward_id)?;
        }
        Commands::Leaderboard { limit, json } => {
            cli::ledger::leaderboard(&ctx, limit, json)?;
        }
        Commands::Dashboard { json } => {
            cli::ledger::dashboard(&ctx, json)?;
        }
        Commands::Audit { repair, json } => {
            cli::ledger::audit(&ctx, repair, json)?;
        }
        Commands::Serve { port } => {
            cli::serve::serve_command(&ctx, port).await?;
        }
    }

    Ok(())
}
