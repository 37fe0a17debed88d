//! # Error Module
//!
//! Domain errors for the points engine, defined with thiserror.

use thiserror::Error;

/// Core domain errors.
///
/// Every variant is an expected, caller-recoverable condition. Store
/// connectivity faults live in the persistence layer, not here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // === Not found errors ===
    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Withdrawal not found: {0}")]
    WithdrawalNotFound(String),

    // === Idempotency guards ===
    #[error("Already claimed: {0}")]
    AlreadyClaimed(String),

    #[error("Task already completed: {0}")]
    AlreadyCompleted(String),

    // === Eligibility errors ===
    #[error("Check-in too soon: wait {remaining_secs}s")]
    TooSoon { remaining_secs: i64 },

    #[error("Milestone {milestone} not reached: {referral_count} referrals")]
    MilestoneNotReached { milestone: u32, referral_count: i64 },

    #[error("Invalid milestone: {0}")]
    InvalidMilestone(i64),

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    // === State errors ===
    #[error("Invalid state: withdrawal {id} is already {status}")]
    InvalidState { id: String, status: String },

    /// A guarded write kept losing to concurrent updates
    #[error("Concurrent update on {0}, retry")]
    Contention(String),

    // === Permission errors ===
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // === Validation errors ===
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn insufficient_balance(requested: i64, available: i64) -> Self {
        Self::InsufficientBalance {
            requested,
            available,
        }
    }

    pub fn invalid_state(id: &str, status: &str) -> Self {
        Self::InvalidState {
            id: id.to_string(),
            status: status.to_string(),
        }
    }

    /// Missing user, task or withdrawal
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::UserNotFound(_)
                | CoreError::TaskNotFound(_)
                | CoreError::WithdrawalNotFound(_)
        )
    }

    /// An idempotency guard tripped
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            CoreError::AlreadyClaimed(_) | CoreError::AlreadyCompleted(_)
        )
    }

    /// Transient conflict; the same request may succeed when repeated
    pub fn is_contention(&self) -> bool {
        matches!(self, CoreError::Contention(_))
    }

    pub fn is_permission_error(&self) -> bool {
        matches!(self, CoreError::Unauthorized(_))
    }
}
