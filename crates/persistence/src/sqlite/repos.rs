//! Repository implementations for SQLite
//!
//! Every balance mutation is a single statement whose `WHERE` clause
//! carries the guard, so the check and the write cannot be split by a
//! concurrent request. Methods that return `bool` report whether the
//! guarded write hit a row; balance updates return the new balance via
//! `RETURNING`, or `None` when the guard rejected the write.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::*;
use chrono::{DateTime, Utc};
use speedy_core::{
    CheckIn, DisplaySettings, Milestone, StreakState, Task, TelegramId, User, Withdrawal,
    WithdrawalStatus,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{SqliteExecutor, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// User Repository
// ============================================================================

/// Repository for users table
pub struct UserRepo;

impl UserRepo {
    /// Get user by telegram id
    pub async fn find<'e, E: SqliteExecutor<'e>>(
        executor: E,
        telegram_id: TelegramId,
    ) -> PersistenceResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE telegram_id = ?")
            .bind(telegram_id)
            .fetch_optional(executor)
            .await?;
        row.map(User::try_from).transpose()
    }

    /// Get user by telegram id, NotFound when absent
    pub async fn get_by_id<'e, E: SqliteExecutor<'e>>(
        executor: E,
        telegram_id: TelegramId,
    ) -> PersistenceResult<User> {
        Self::find(executor, telegram_id)
            .await?
            .ok_or_else(|| PersistenceError::not_found("User", &telegram_id.to_string()))
    }

    /// Insert a new user; returns false if the id already exists
    pub async fn insert_if_absent(pool: &SqlitePool, user: &User) -> PersistenceResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (telegram_id, username, points, join_date, referral_count,
                               streak_day, last_checkin, referred_by, join_bonus_claimed)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(telegram_id) DO NOTHING
            "#,
        )
        .bind(user.telegram_id)
        .bind(&user.username)
        .bind(user.points)
        .bind(user.join_date)
        .bind(user.referral_count)
        .bind(user.streak_day as i64)
        .bind(user.last_checkin)
        .bind(user.referred_by)
        .bind(user.join_bonus_claimed)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Increment referral_count of the referrer
    pub async fn increment_referrals(
        pool: &SqlitePool,
        telegram_id: TelegramId,
    ) -> PersistenceResult<bool> {
        let result =
            sqlx::query("UPDATE users SET referral_count = referral_count + 1 WHERE telegram_id = ?")
                .bind(telegram_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Set join_bonus_claimed and credit the bonus, only if not yet
    /// claimed. Returns the new balance when the update applied.
    pub async fn claim_join_bonus(
        pool: &SqlitePool,
        telegram_id: TelegramId,
        bonus: i64,
    ) -> PersistenceResult<Option<i64>> {
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users SET join_bonus_claimed = 1, points = points + ?
            WHERE telegram_id = ? AND join_bonus_claimed = 0
            RETURNING points
            "#,
        )
        .bind(bonus)
        .bind(telegram_id)
        .fetch_optional(pool)
        .await?;
        Ok(balance)
    }

    /// Compare-and-set the streak: applies `checkin` only if the stored
    /// streak still equals `expected`. Returns the new balance.
    ///
    /// `last_checkin` is compared as an instant, not as text, so rows
    /// written with another timestamp layout (`Z` suffix, `datetime()`
    /// output) still match.
    pub async fn record_checkin(
        pool: &SqlitePool,
        telegram_id: TelegramId,
        expected: &StreakState,
        checkin: &CheckIn,
    ) -> PersistenceResult<Option<i64>> {
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users SET last_checkin = ?, streak_day = ?, points = points + ?
            WHERE telegram_id = ? AND streak_day = ?
              AND julianday(last_checkin) IS julianday(?)
            RETURNING points
            "#,
        )
        .bind(checkin.at)
        .bind(checkin.streak_day as i64)
        .bind(checkin.award)
        .bind(telegram_id)
        .bind(expected.streak_day as i64)
        .bind(expected.last_checkin)
        .fetch_optional(pool)
        .await?;
        Ok(balance)
    }

    /// Unconditional signed credit. Returns the new balance, `None` if
    /// the user does not exist.
    pub async fn add_points<'e, E: SqliteExecutor<'e>>(
        executor: E,
        telegram_id: TelegramId,
        delta: i64,
    ) -> PersistenceResult<Option<i64>> {
        let balance = sqlx::query_scalar::<_, i64>(
            "UPDATE users SET points = points + ? WHERE telegram_id = ? RETURNING points",
        )
        .bind(delta)
        .bind(telegram_id)
        .fetch_optional(executor)
        .await?;
        Ok(balance)
    }

    /// Debit only when the balance covers `amount`. Returns the new
    /// balance, `None` if the user is missing or short.
    pub async fn debit_if_covered<'e, E: SqliteExecutor<'e>>(
        executor: E,
        telegram_id: TelegramId,
        amount: i64,
    ) -> PersistenceResult<Option<i64>> {
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users SET points = points - ?
            WHERE telegram_id = ? AND points >= ?
            RETURNING points
            "#,
        )
        .bind(amount)
        .bind(telegram_id)
        .bind(amount)
        .fetch_optional(executor)
        .await?;
        Ok(balance)
    }

    /// Users ordered by points, highest first
    pub async fn top_by_points(pool: &SqlitePool, limit: i64) -> PersistenceResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users ORDER BY points DESC, telegram_id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    /// All users ordered by points
    pub async fn get_all(pool: &SqlitePool) -> PersistenceResult<Vec<User>> {
        Self::top_by_points(pool, -1).await
    }

    /// All telegram ids (broadcast recipients)
    pub async fn all_ids(pool: &SqlitePool) -> PersistenceResult<Vec<TelegramId>> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT telegram_id FROM users ORDER BY telegram_id")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// (user count, sum of points)
    pub async fn totals(pool: &SqlitePool) -> PersistenceResult<(i64, i64)> {
        let row: (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(points), 0) FROM users")
                .fetch_one(pool)
                .await?;
        Ok(row)
    }
}

// ============================================================================
// Task Repository
// ============================================================================

/// Repository for tasks table
pub struct TaskRepo;

impl TaskRepo {
    pub async fn insert(pool: &SqlitePool, task: &Task) -> PersistenceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (task_id, title, description, task_type, url, reward_points, active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.task_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.task_type)
        .bind(&task.url)
        .bind(task.reward_points)
        .bind(task.active)
        .bind(task.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Active task by id; inactive tasks are treated as absent
    pub async fn find_active(pool: &SqlitePool, task_id: &str) -> PersistenceResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            "SELECT * FROM tasks WHERE task_id = ? AND active = 1",
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(Task::from))
    }

    pub async fn list_active(pool: &SqlitePool) -> PersistenceResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            "SELECT * FROM tasks WHERE active = 1 ORDER BY created_at ASC",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    pub async fn list_all(pool: &SqlitePool) -> PersistenceResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks ORDER BY created_at ASC")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    /// Soft delete. Returns false if the task does not exist.
    pub async fn deactivate(pool: &SqlitePool, task_id: &str) -> PersistenceResult<bool> {
        let result = sqlx::query("UPDATE tasks SET active = 0 WHERE task_id = ?")
            .bind(task_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn count_active(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE active = 1")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Fact Repositories
// ============================================================================

/// Repository for task_completions (unique on user, task)
pub struct CompletionRepo;

impl CompletionRepo {
    /// Insert the completion fact; false if it already exists
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        user_id: TelegramId,
        task_id: &str,
        completed_at: DateTime<Utc>,
    ) -> PersistenceResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO task_completions (user_id, task_id, completed_at) VALUES (?, ?, ?)
            ON CONFLICT(user_id, task_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .bind(completed_at)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn task_ids_for_user(
        pool: &SqlitePool,
        user_id: TelegramId,
    ) -> PersistenceResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT task_id FROM task_completions WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}

/// Repository for referral_milestones (unique on user, milestone)
pub struct MilestoneRepo;

impl MilestoneRepo {
    /// Insert the claim fact; false if it already exists
    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        user_id: TelegramId,
        milestone: Milestone,
        claimed_at: DateTime<Utc>,
    ) -> PersistenceResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO referral_milestones (user_id, milestone, claimed_at) VALUES (?, ?, ?)
            ON CONFLICT(user_id, milestone) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(i64::from(milestone))
        .bind(claimed_at)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn claimed_by<'e, E: SqliteExecutor<'e>>(
        executor: E,
        user_id: TelegramId,
    ) -> PersistenceResult<Vec<Milestone>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT milestone FROM referral_milestones WHERE user_id = ? ORDER BY milestone",
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        rows.into_iter().map(|r| milestone_from_db(r.0)).collect()
    }
}

// ============================================================================
// Withdrawal Repository
// ============================================================================

/// Repository for withdrawals table
pub struct WithdrawalRepo;

impl WithdrawalRepo {
    /// Insert a pending request only if the owner's balance covers it.
    /// Returns false when the owner is missing or the balance is short.
    pub async fn insert_if_covered(
        pool: &SqlitePool,
        withdrawal: &Withdrawal,
    ) -> PersistenceResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO withdrawals (withdrawal_id, user_id, username, amount, status, admin_note, created_at)
            SELECT ?, telegram_id, ?, ?, ?, NULL, ?
            FROM users WHERE telegram_id = ? AND points >= ?
            "#,
        )
        .bind(&withdrawal.withdrawal_id)
        .bind(&withdrawal.username)
        .bind(withdrawal.amount)
        .bind(withdrawal.status.as_str())
        .bind(withdrawal.created_at)
        .bind(withdrawal.user_id)
        .bind(withdrawal.amount)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn find<'e, E: SqliteExecutor<'e>>(
        executor: E,
        withdrawal_id: &str,
    ) -> PersistenceResult<Option<Withdrawal>> {
        let row = sqlx::query_as::<_, WithdrawalRow>(
            "SELECT * FROM withdrawals WHERE withdrawal_id = ?",
        )
        .bind(withdrawal_id)
        .fetch_optional(executor)
        .await?;
        row.map(Withdrawal::try_from).transpose()
    }

    /// Move a pending request to `status`; false if it is not pending
    pub async fn resolve<'e, E: SqliteExecutor<'e>>(
        executor: E,
        withdrawal_id: &str,
        status: WithdrawalStatus,
        note: &str,
    ) -> PersistenceResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE withdrawals SET status = ?, admin_note = ?
            WHERE withdrawal_id = ? AND status = 'pending'
            "#,
        )
        .bind(status.as_str())
        .bind(note)
        .bind(withdrawal_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Requests of one user, newest first
    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: TelegramId,
    ) -> PersistenceResult<Vec<Withdrawal>> {
        let rows = sqlx::query_as::<_, WithdrawalRow>(
            "SELECT * FROM withdrawals WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        rows.into_iter().map(Withdrawal::try_from).collect()
    }

    /// All requests, newest first
    pub async fn list_all(pool: &SqlitePool) -> PersistenceResult<Vec<Withdrawal>> {
        let rows = sqlx::query_as::<_, WithdrawalRow>(
            "SELECT * FROM withdrawals ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await?;
        rows.into_iter().map(Withdrawal::try_from).collect()
    }

    pub async fn count_by_status(
        pool: &SqlitePool,
        status: WithdrawalStatus,
    ) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM withdrawals WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Settings Repository
// ============================================================================

/// Repository for the admin_settings singleton
pub struct SettingsRepo;

impl SettingsRepo {
    /// Read the settings document, seeding it with `defaults` on first use
    pub async fn get_or_seed(
        pool: &SqlitePool,
        defaults: &DisplaySettings,
    ) -> PersistenceResult<DisplaySettings> {
        sqlx::query(
            r#"
            INSERT INTO admin_settings (id, background_image_url, tap_image_url, tap_video_url)
            VALUES (1, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&defaults.background_image_url)
        .bind(&defaults.tap_image_url)
        .bind(&defaults.tap_video_url)
        .execute(pool)
        .await?;

        let row = sqlx::query_as::<_, SettingsRow>(
            "SELECT background_image_url, tap_image_url, tap_video_url FROM admin_settings WHERE id = 1",
        )
        .fetch_one(pool)
        .await?;
        Ok(row.into())
    }

    pub async fn save(pool: &SqlitePool, settings: &DisplaySettings) -> PersistenceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO admin_settings (id, background_image_url, tap_image_url, tap_video_url)
            VALUES (1, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                background_image_url = excluded.background_image_url,
                tap_image_url = excluded.tap_image_url,
                tap_video_url = excluded.tap_video_url
            "#,
        )
        .bind(&settings.background_image_url)
        .bind(&settings.tap_image_url)
        .bind(&settings.tap_video_url)
        .execute(pool)
        .await?;
        Ok(())
    }
}

// ============================================================================
// Database initialization
// ============================================================================

/// Open a pool on `database_url`, creating the file if needed
pub async fn create_pool(database_url: &str, max_connections: u32) -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Single-connection in-memory pool. The connection never expires, since
/// the database lives only as long as it does.
pub async fn create_memory_pool() -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Apply the schema (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
