//! # User Module
//!
//! User account keyed by the Telegram user id.

use crate::streak::StreakState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Telegram user id
pub type TelegramId = i64;

/// Points account of one Telegram user.
///
/// Invariants kept by the engine:
/// - `points` only goes below zero through an admin adjustment
/// - `join_bonus_claimed` never flips back to false
/// - `streak_day` advances by exactly 1 or resets to 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub telegram_id: TelegramId,
    pub username: String,
    pub points: i64,
    pub join_date: DateTime<Utc>,
    pub referral_count: i64,
    pub streak_day: u32,
    pub last_checkin: Option<DateTime<Utc>>,
    pub referred_by: Option<TelegramId>,
    pub join_bonus_claimed: bool,
}

impl User {
    /// Fresh account with default balances
    pub fn new(
        telegram_id: TelegramId,
        username: &str,
        referred_by: Option<TelegramId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            telegram_id,
            username: username.to_string(),
            points: 0,
            join_date: now,
            referral_count: 0,
            streak_day: 0,
            last_checkin: None,
            // self-referral is never recorded
            referred_by: referred_by.filter(|r| *r != telegram_id),
            join_bonus_claimed: false,
        }
    }

    pub fn streak(&self) -> StreakState {
        StreakState::new(self.last_checkin, self.streak_day)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{} ({}) - {} pts, streak {}, referrals {}",
            self.username, self.telegram_id, self.points, self.streak_day, self.referral_count
        )
    }
}
