//! # Speedy Persistence
//!
//! Document store for the points engine, backed by SQLite.
//!
//! ## Collections
//!
//! ```text
//! users                keyed by telegram_id
//! tasks                keyed by task_id
//! task_completions     unique (user_id, task_id)
//! referral_milestones  unique (user_id, milestone)
//! withdrawals          keyed by withdrawal_id
//! admin_settings       singleton
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use speedy_persistence::{Database, UserRepo};
//!
//! // Startup
//! let db = Database::connect(&config.database).await?;
//!
//! // Query via repos
//! let user = UserRepo::get_by_id(db.pool(), 42).await?;
//!
//! // Shutdown
//! db.close().await;
//! ```

pub mod error;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::schema::{SettingsRow, TaskRow, UserRow, WithdrawalRow};
pub use sqlite::{CompletionRepo, MilestoneRepo, SettingsRepo, TaskRepo, UserRepo, WithdrawalRepo};

use speedy_core::DatabaseConfig;
use sqlx::SqlitePool;

/// Process-wide store handle.
///
/// Created once at startup, shared (usually behind an `Arc`) by every
/// service, and closed on shutdown.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and apply the schema
    pub async fn connect(config: &DatabaseConfig) -> PersistenceResult<Self> {
        if config.max_connections == 0 {
            return Err(PersistenceError::Configuration(
                "max_connections must be at least 1".to_string(),
            ));
        }
        let pool = sqlite::create_pool(&config.url, config.max_connections).await?;
        sqlite::create_schema(&pool).await?;
        tracing::info!(url = %config.url, "database ready");
        Ok(Self { pool })
    }

    /// Private in-memory database with the schema applied
    pub async fn in_memory() -> PersistenceResult<Self> {
        let pool = sqlite::create_memory_pool().await?;
        sqlite::create_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Get SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every connection; the handle is unusable afterwards
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("database closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use speedy_core::{StreakState, User, Withdrawal};

    #[tokio::test]
    async fn test_insert_if_absent_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        let user = User::new(1, "alice", None, Utc::now());

        assert!(UserRepo::insert_if_absent(db.pool(), &user).await.unwrap());
        assert!(!UserRepo::insert_if_absent(db.pool(), &user).await.unwrap());

        let stored = UserRepo::get_by_id(db.pool(), 1).await.unwrap();
        assert_eq!(stored, user);
        assert!(UserRepo::get_by_id(db.pool(), 2).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_guarded_writes() {
        let db = Database::in_memory().await.unwrap();
        let user = User::new(1, "alice", None, Utc::now());
        UserRepo::insert_if_absent(db.pool(), &user).await.unwrap();

        assert_eq!(
            UserRepo::claim_join_bonus(db.pool(), 1, 1200).await.unwrap(),
            Some(1200)
        );
        assert_eq!(UserRepo::claim_join_bonus(db.pool(), 1, 1200).await.unwrap(), None);

        assert_eq!(UserRepo::debit_if_covered(db.pool(), 1, 1201).await.unwrap(), None);
        assert_eq!(
            UserRepo::debit_if_covered(db.pool(), 1, 200).await.unwrap(),
            Some(1000)
        );
        assert_eq!(UserRepo::get_by_id(db.pool(), 1).await.unwrap().points, 1000);
        assert_eq!(UserRepo::add_points(db.pool(), 99, 10).await.unwrap(), None);

        let too_big = Withdrawal::request(1, "alice", 1001, Utc::now()).unwrap();
        assert!(!WithdrawalRepo::insert_if_covered(db.pool(), &too_big).await.unwrap());
        let ok = Withdrawal::request(1, "alice", 1000, Utc::now()).unwrap();
        assert!(WithdrawalRepo::insert_if_covered(db.pool(), &ok).await.unwrap());
    }

    #[tokio::test]
    async fn test_record_checkin_matches_any_timestamp_layout() {
        let db = Database::in_memory().await.unwrap();
        let user = User::new(1, "alice", None, Utc::now());
        UserRepo::insert_if_absent(db.pool(), &user).await.unwrap();

        let last = Utc.with_ymd_and_hms(2025, 12, 1, 9, 0, 0).unwrap();
        let now = last + Duration::hours(25);

        for stored in ["2025-12-01T09:00:00Z", "2025-12-01 09:00:00", "2025-12-01T09:00:00.000+00:00"] {
            sqlx::query("UPDATE users SET last_checkin = ?, streak_day = 1 WHERE telegram_id = 1")
                .bind(stored)
                .execute(db.pool())
                .await
                .unwrap();

            let expected = UserRepo::get_by_id(db.pool(), 1).await.unwrap().streak();
            assert_eq!(expected, StreakState::new(Some(last), 1));
            let checkin = expected.check_in(now).unwrap();

            let balance = UserRepo::record_checkin(db.pool(), 1, &expected, &checkin).await.unwrap();
            assert!(balance.is_some(), "stored {stored:?} did not match");
            sqlx::query("UPDATE users SET points = 0").execute(db.pool()).await.unwrap();
        }

        // a different instant still loses the compare-and-set
        let stale = StreakState::new(Some(last - Duration::seconds(1)), 1);
        let checkin = stale.check_in(now).unwrap();
        assert_eq!(UserRepo::record_checkin(db.pool(), 1, &stale, &checkin).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_connect_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite:{}", dir.path().join("speedy.db").display()),
            max_connections: 2,
        };

        let db = Database::connect(&config).await.unwrap();
        let (users, points) = UserRepo::totals(db.pool()).await.unwrap();
        assert_eq!((users, points), (0, 0));
        db.close().await;

        // schema creation is idempotent
        let db = Database::connect(&config).await.unwrap();
        db.close().await;
    }
}
