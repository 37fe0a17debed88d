//! # Speedy Engine
//!
//! Point accounting and eligibility rules on top of the store.
//!
//! - [`LedgerEngine`]: join bonus, check-in, referral milestones, tasks,
//!   withdrawals and admin adjustments
//! - [`QueryService`]: profile, referral stats, tasks, leaderboard, settings
//! - [`AdminService`]: dashboard and catalogue management
//! - [`OnboardingService`]: first contact and referral attribution
//! - [`broadcast`]: fan-out through a [`Notifier`]
//!
//! ```rust,ignore
//! let db = Arc::new(Database::connect(&config.database).await?);
//! let ctx = ServiceContext::new(db, config);
//!
//! let principal = Principal::user(42, "alice");
//! let credit = LedgerEngine::new(&ctx).claim_join_bonus(&principal, Utc::now()).await?;
//! ```

pub mod admin;
pub mod broadcast;
pub mod error;
pub mod ledger;
pub mod onboarding;
pub mod queries;
pub mod services;

pub use admin::{AdminService, AdminStats};
pub use broadcast::{broadcast, broadcast_text, notify, BroadcastReport, Notifier, NotifyError};
pub use error::{EngineError, EngineResult};
pub use ledger::LedgerEngine;
pub use onboarding::{OnboardingService, Registration};
pub use queries::{MilestoneReward, QueryService, RankedUser, ReferralStats};
pub use services::{CheckInResult, Credit, MilestoneResult, ServiceContext};
