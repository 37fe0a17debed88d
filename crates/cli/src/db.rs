//! Database initialization and status

use anyhow::{Context, Result};
use speedy_core::{AppConfig, WithdrawalStatus};
use speedy_engine::ServiceContext;
use speedy_persistence::{Database, SettingsRepo, TaskRepo, UserRepo, WithdrawalRepo};
use std::path::Path;
use std::sync::Arc;

/// Connect (applying the schema) and build the service context
pub async fn open(config: AppConfig) -> Result<ServiceContext> {
    if let Some(path) = file_path(&config.database.url) {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }
    }

    tracing::debug!(url = %config.database.url, "opening database");
    let db = Database::connect(&config.database)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;
    Ok(ServiceContext::new(Arc::new(db), config))
}

/// Schema is applied on connect; this seeds the settings document
pub async fn init(ctx: &ServiceContext) -> Result<()> {
    SettingsRepo::get_or_seed(ctx.pool(), &ctx.config().settings)
        .await
        .context("Failed to seed display settings")?;
    println!("✅ Database initialized at {}", ctx.config().database.url);
    Ok(())
}

/// Show database status
pub async fn show_status(ctx: &ServiceContext) -> Result<()> {
    let pool = ctx.pool();
    let (users, points) = UserRepo::totals(pool).await?;
    let tasks = TaskRepo::count_active(pool).await?;
    let pending = WithdrawalRepo::count_by_status(pool, WithdrawalStatus::Pending).await?;

    println!("📊 Database Status");
    println!("   URL: {}", ctx.config().database.url);
    println!();
    println!("   Users:               {}", users);
    println!("   Points in play:      {}", points);
    println!("   Active tasks:        {}", tasks);
    println!("   Pending withdrawals: {}", pending);
    Ok(())
}

/// Filesystem path of a `sqlite:` URL, `None` for in-memory databases
fn file_path(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("sqlite:")?;
    let rest = rest.trim_start_matches("//");
    let path = rest.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(path)
}
