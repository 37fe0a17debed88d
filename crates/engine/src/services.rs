//! Service context and operation results
//!
//! `ServiceContext` carries the injected store handle and configuration
//! that every service borrows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use speedy_core::{AppConfig, JoinBonusPolicy, Milestone, StreakTransition, TelegramId};
use speedy_persistence::Database;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Context for business operations - contains database access
#[derive(Clone)]
pub struct ServiceContext {
    db: Arc<Database>,
    config: Arc<AppConfig>,
}

impl ServiceContext {
    pub fn new(db: Arc<Database>, config: AppConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Get database pool
    pub fn pool(&self) -> &SqlitePool {
        self.db.pool()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn join_bonus_policy(&self) -> &JoinBonusPolicy {
        &self.config.rewards.join_bonus
    }
}

/// Points credited (or debited) by an operation and the resulting balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Credit {
    pub telegram_id: TelegramId,
    pub delta: i64,
    pub balance: i64,
}

impl Credit {
    pub fn new(telegram_id: TelegramId, delta: i64, balance: i64) -> Self {
        Self {
            telegram_id,
            delta,
            balance,
        }
    }
}

/// Result of a daily check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckInResult {
    pub award: i64,
    pub streak_day: u32,
    pub transition: StreakTransition,
    pub balance: i64,
    /// Earliest time of the next check-in
    pub next_available_at: Option<DateTime<Utc>>,
}

/// Result of a referral milestone claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MilestoneResult {
    pub milestone: Milestone,
    pub reward: i64,
    pub balance: i64,
}
