//! Database schema definitions
//!
//! Row types for sqlx mapping from SQLite tables, plus the DDL applied on
//! startup. Idempotency facts carry composite primary keys; the engine
//! relies on them for at-most-once rewards.

use crate::error::{PersistenceError, PersistenceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use speedy_core::{DisplaySettings, Milestone, Task, User, Withdrawal, WithdrawalStatus};

/// DDL for every collection
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    telegram_id INTEGER PRIMARY KEY,
    username TEXT NOT NULL,
    points INTEGER NOT NULL DEFAULT 0,
    join_date DATETIME NOT NULL,
    referral_count INTEGER NOT NULL DEFAULT 0,
    streak_day INTEGER NOT NULL DEFAULT 0,
    last_checkin DATETIME,
    referred_by INTEGER,
    join_bonus_claimed BOOLEAN NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_users_points ON users(points DESC);

CREATE TABLE IF NOT EXISTS tasks (
    task_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    task_type TEXT NOT NULL,
    url TEXT,
    reward_points INTEGER NOT NULL CHECK (reward_points > 0),
    active BOOLEAN NOT NULL DEFAULT 1,
    created_at DATETIME NOT NULL
);

CREATE TABLE IF NOT EXISTS task_completions (
    user_id INTEGER NOT NULL,
    task_id TEXT NOT NULL,
    completed_at DATETIME NOT NULL,
    PRIMARY KEY (user_id, task_id),
    FOREIGN KEY (task_id) REFERENCES tasks(task_id)
);

CREATE TABLE IF NOT EXISTS referral_milestones (
    user_id INTEGER NOT NULL,
    milestone INTEGER NOT NULL CHECK (milestone IN (1, 3, 5)),
    claimed_at DATETIME NOT NULL,
    PRIMARY KEY (user_id, milestone)
);

CREATE TABLE IF NOT EXISTS withdrawals (
    withdrawal_id TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL,
    username TEXT NOT NULL,
    amount INTEGER NOT NULL CHECK (amount > 0),
    status TEXT NOT NULL DEFAULT 'pending',
    admin_note TEXT,
    created_at DATETIME NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_withdrawals_user ON withdrawals(user_id);
CREATE INDEX IF NOT EXISTS idx_withdrawals_status ON withdrawals(status);

CREATE TABLE IF NOT EXISTS admin_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    background_image_url TEXT NOT NULL,
    tap_image_url TEXT NOT NULL,
    tap_video_url TEXT NOT NULL
);
"#;

/// Row type for table `users`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub telegram_id: i64,
    pub username: String,
    pub points: i64,
    pub join_date: DateTime<Utc>,
    pub referral_count: i64,
    pub streak_day: i64,
    pub last_checkin: Option<DateTime<Utc>>,
    pub referred_by: Option<i64>,
    pub join_bonus_claimed: bool,
}

/// Row type for table `tasks`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TaskRow {
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub url: Option<String>,
    pub reward_points: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Row type for table `withdrawals`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct WithdrawalRow {
    pub withdrawal_id: String,
    pub user_id: i64,
    pub username: String,
    pub amount: i64,
    pub status: String,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row type for table `admin_settings`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct SettingsRow {
    pub background_image_url: String,
    pub tap_image_url: String,
    pub tap_video_url: String,
}

// === Conversion implementations ===

impl TryFrom<UserRow> for User {
    type Error = PersistenceError;

    fn try_from(row: UserRow) -> PersistenceResult<Self> {
        let streak_day = u32::try_from(row.streak_day).map_err(|_| PersistenceError::OutOfRange {
            field: "streak_day".to_string(),
            value: row.streak_day,
        })?;

        Ok(User {
            telegram_id: row.telegram_id,
            username: row.username,
            points: row.points,
            join_date: row.join_date,
            referral_count: row.referral_count,
            streak_day,
            last_checkin: row.last_checkin,
            referred_by: row.referred_by,
            join_bonus_claimed: row.join_bonus_claimed,
        })
    }
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            task_id: row.task_id,
            title: row.title,
            description: row.description,
            task_type: row.task_type,
            url: row.url,
            reward_points: row.reward_points,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<WithdrawalRow> for Withdrawal {
    type Error = PersistenceError;

    fn try_from(row: WithdrawalRow) -> PersistenceResult<Self> {
        let status = WithdrawalStatus::from_str(&row.status)
            .ok_or_else(|| PersistenceError::invalid_enum("status", &row.status))?;

        Ok(Withdrawal {
            withdrawal_id: row.withdrawal_id,
            user_id: row.user_id,
            username: row.username,
            amount: row.amount,
            status,
            admin_note: row.admin_note,
            created_at: row.created_at,
        })
    }
}

impl From<SettingsRow> for DisplaySettings {
    fn from(row: SettingsRow) -> Self {
        DisplaySettings {
            background_image_url: row.background_image_url,
            tap_image_url: row.tap_image_url,
            tap_video_url: row.tap_video_url,
        }
    }
}

/// Decode a stored milestone value
pub fn milestone_from_db(value: i64) -> PersistenceResult<Milestone> {
    Milestone::try_from(value)
        .map_err(|_| PersistenceError::invalid_enum("milestone", &value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_row(streak_day: i64) -> UserRow {
        UserRow {
            telegram_id: 42,
            username: "alice".to_string(),
            points: 1300,
            join_date: Utc::now(),
            referral_count: 2,
            streak_day,
            last_checkin: None,
            referred_by: None,
            join_bonus_claimed: true,
        }
    }

    #[test]
    fn test_user_row_conversion() {
        let user = User::try_from(user_row(3)).unwrap();
        assert_eq!(user.streak_day, 3);
        assert_eq!(user.points, 1300);

        assert!(matches!(
            User::try_from(user_row(-1)),
            Err(PersistenceError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_withdrawal_row_conversion() {
        let row = WithdrawalRow {
            withdrawal_id: "w-1".to_string(),
            user_id: 42,
            username: "alice".to_string(),
            amount: 100,
            status: "approved".to_string(),
            admin_note: Some("Approved".to_string()),
            created_at: Utc::now(),
        };
        let w = Withdrawal::try_from(row.clone()).unwrap();
        assert_eq!(w.status, WithdrawalStatus::Approved);

        let bad = WithdrawalRow {
            status: "lost".to_string(),
            ..row
        };
        assert!(Withdrawal::try_from(bad).is_err());
    }

    #[test]
    fn test_milestone_from_db() {
        assert_eq!(milestone_from_db(3).unwrap(), Milestone::Three);
        assert!(milestone_from_db(4).is_err());
    }
}
