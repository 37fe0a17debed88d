//! Speedy CLI - event points operations from command line
//!
//! Usage:
//! ```bash
//! speedy init
//! speedy register 42 alice --referrer 7
//! speedy user --id 42 --username alice bonus
//! speedy user --id 42 --username alice checkin
//! speedy user --id 42 --username alice withdraw 1000
//! speedy admin approve 6f1c...
//! speedy admin broadcast "Event starts tomorrow"
//! speedy leaderboard --limit 10
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use speedy_core::AppConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod db;
mod notifier;

use commands::{admin, public, user};

/// Speedy - points engine for the event Mini App
#[derive(Parser)]
#[command(name = "speedy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (TOML); defaults are used when omitted
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Database file path, overrides the config
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database with schema
    Init,

    /// Show database status
    Status,

    /// First contact from the app or the bot
    Register {
        telegram_id: i64,
        username: String,
        /// Telegram id of the referrer
        #[arg(long)]
        referrer: Option<i64>,
    },

    /// Operations on behalf of a user
    User {
        /// Telegram id of the caller
        #[arg(long)]
        id: i64,
        /// Telegram username of the caller
        #[arg(long)]
        username: String,
        #[command(subcommand)]
        action: UserAction,
    },

    /// Admin panel operations
    Admin {
        /// Admin username
        #[arg(long, default_value = "admin")]
        name: String,
        #[command(subcommand)]
        action: AdminAction,
    },

    /// Top users by points
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// Countdown to the event
    Countdown,

    /// Display settings
    Settings,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Show the caller's account
    Profile,
    /// Claim the one-time join bonus
    Bonus,
    /// Daily check-in
    Checkin,
    /// Referral count and claimable milestones
    Referrals,
    /// Claim a referral milestone (1, 3 or 5)
    Claim { milestone: i64 },
    /// Active tasks with completion flags
    Tasks,
    /// Complete a task
    Complete { task_id: String },
    /// Request a withdrawal
    Withdraw { amount: i64 },
    /// The caller's withdrawals
    Withdrawals,
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// Dashboard counters
    Stats,
    /// All users by points
    Users,
    /// All withdrawals, newest first
    Withdrawals,
    /// Approve a pending withdrawal
    Approve { withdrawal_id: String },
    /// Reject a pending withdrawal
    Reject {
        withdrawal_id: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// Add (or subtract) points
    Adjust {
        telegram_id: i64,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// All tasks including inactive
    Tasks,
    /// Create a task
    CreateTask {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Channel label (telegram, youtube, twitter, ...)
        #[arg(long = "type", default_value = "telegram")]
        task_type: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        reward: i64,
    },
    /// Deactivate a task
    DeactivateTask { task_id: String },
    /// Update display settings
    Settings {
        #[arg(long)]
        background_image_url: Option<String>,
        #[arg(long)]
        tap_image_url: Option<String>,
        #[arg(long)]
        tap_video_url: Option<String>,
    },
    /// Message every user
    Broadcast { message: String },
}

/// Load the config file (or defaults) and apply command-line overrides
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => AppConfig::default(),
    };

    if let Some(path) = &cli.db {
        config.database.url = format!("sqlite:{}?mode=rwc", path.display());
    }
    Ok(config)
}

fn init_tracing(config: &AppConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config);

    let ctx = db::open(config).await?;

    let result = match cli.command {
        Commands::Init => db::init(&ctx).await,
        Commands::Status => db::show_status(&ctx).await,
        Commands::Register {
            telegram_id,
            username,
            referrer,
        } => user::register(&ctx, telegram_id, &username, referrer).await,
        Commands::User {
            id,
            username,
            action,
        } => user::handle(&ctx, id, &username, action).await,
        Commands::Admin { name, action } => admin::handle(&ctx, &name, action).await,
        Commands::Leaderboard { limit } => public::leaderboard(&ctx, limit).await,
        Commands::Countdown => public::countdown(&ctx),
        Commands::Settings => public::settings(&ctx).await,
    };

    ctx.database().close().await;
    result
}
