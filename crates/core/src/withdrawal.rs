//! # Withdrawal Module
//!
//! Withdrawal requests and their one-way status machine:
//! `pending -> approved` or `pending -> rejected`.

use crate::error::{CoreError, CoreResult};
use crate::user::TelegramId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Note recorded on approval
pub const APPROVED_NOTE: &str = "Approved";

/// Note recorded on rejection when the admin gives none
pub const DEFAULT_REJECT_NOTE: &str = "Rejected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(WithdrawalStatus::Pending),
            "approved" => Some(WithdrawalStatus::Approved),
            "rejected" => Some(WithdrawalStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, WithdrawalStatus::Pending)
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's request to cash out points.
///
/// The balance is debited on approval, never on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub withdrawal_id: String,
    pub user_id: TelegramId,
    pub username: String,
    pub amount: i64,
    pub status: WithdrawalStatus,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Withdrawal {
    /// New pending request. `amount` must be positive.
    pub fn request(
        user_id: TelegramId,
        username: &str,
        amount: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if amount <= 0 {
            return Err(CoreError::InvalidAmount(amount));
        }
        Ok(Self {
            withdrawal_id: Uuid::new_v4().to_string(),
            user_id,
            username: username.to_string(),
            amount,
            status: WithdrawalStatus::Pending,
            admin_note: None,
            created_at: now,
        })
    }

    /// Check that the request can still be resolved
    pub fn ensure_pending(&self) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(CoreError::invalid_state(
                &self.withdrawal_id,
                self.status.as_str(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_requires_positive_amount() {
        assert_eq!(
            Withdrawal::request(1, "alice", 0, Utc::now()),
            Err(CoreError::InvalidAmount(0))
        );
        assert!(Withdrawal::request(1, "alice", -5, Utc::now()).is_err());

        let w = Withdrawal::request(1, "alice", 100, Utc::now()).unwrap();
        assert_eq!(w.status, WithdrawalStatus::Pending);
        assert_eq!(w.admin_note, None);
    }

    #[test]
    fn test_ensure_pending() {
        let mut w = Withdrawal::request(1, "alice", 100, Utc::now()).unwrap();
        assert!(w.ensure_pending().is_ok());

        w.status = WithdrawalStatus::Approved;
        assert_eq!(
            w.ensure_pending(),
            Err(CoreError::invalid_state(&w.withdrawal_id, "approved"))
        );
    }

    #[test]
    fn test_status_strings() {
        for status in [
            WithdrawalStatus::Pending,
            WithdrawalStatus::Approved,
            WithdrawalStatus::Rejected,
        ] {
            assert_eq!(WithdrawalStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(WithdrawalStatus::from_str("expired"), None);
        assert!(!WithdrawalStatus::Pending.is_terminal());
    }
}
