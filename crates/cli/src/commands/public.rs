//! Public queries (no principal)

use anyhow::Result;
use chrono::Utc;
use speedy_engine::{QueryService, ServiceContext};

use super::emit;

pub async fn leaderboard(ctx: &ServiceContext, limit: i64) -> Result<()> {
    let board = QueryService::new(ctx).leaderboard(limit).await?;
    for entry in &board {
        println!("{:>3}. @{:<20} {:>10}", entry.rank, entry.username, entry.points);
    }
    Ok(())
}

pub fn countdown(ctx: &ServiceContext) -> Result<()> {
    let countdown = QueryService::new(ctx).countdown(Utc::now());
    println!("⏳ {}", countdown.message);
    Ok(())
}

pub async fn settings(ctx: &ServiceContext) -> Result<()> {
    emit(&QueryService::new(ctx).settings().await?)
}
