//! # Speedy Core
//!
//! Domain types for the event points backend: users, tasks, withdrawals,
//! the check-in streak machine, reward tables and request principals.
//!
//! Nothing here touches the store; the persistence and engine crates
//! build on these types.

pub mod config;
pub mod countdown;
pub mod error;
pub mod principal;
pub mod rewards;
pub mod settings;
pub mod streak;
pub mod task;
pub mod user;
pub mod withdrawal;

pub use config::{AppConfig, ConfigError, DatabaseConfig, EventConfig, RewardsConfig};
pub use countdown::Countdown;
pub use error::{CoreError, CoreResult};
pub use principal::Principal;
pub use rewards::{JoinBonusPolicy, Milestone, JOIN_BONUS_FLAT};
pub use settings::{DisplaySettings, SettingsUpdate};
pub use streak::{checkin_reward, CheckIn, StreakState, StreakTransition};
pub use task::{NewTask, Task, UserTask};
pub use user::{TelegramId, User};
pub use withdrawal::{Withdrawal, WithdrawalStatus};
