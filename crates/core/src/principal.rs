//! # Principal Module
//!
//! The verified identity attached to a request. Signature and expiry
//! checks happen before a `Principal` is built; the engine only branches
//! on which kind it got.

use crate::error::{CoreError, CoreResult};
use crate::user::TelegramId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Principal {
    /// Ordinary Telegram user
    User {
        telegram_id: TelegramId,
        username: String,
    },
    /// Panel administrator
    Admin { username: String },
}

impl Principal {
    pub fn user(telegram_id: TelegramId, username: &str) -> Self {
        Principal::User {
            telegram_id,
            username: username.to_string(),
        }
    }

    pub fn admin(username: &str) -> Self {
        Principal::Admin {
            username: username.to_string(),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Principal::Admin { .. })
    }

    /// Telegram id of a user principal; admins are refused
    pub fn require_user(&self) -> CoreResult<TelegramId> {
        match self {
            Principal::User { telegram_id, .. } => Ok(*telegram_id),
            Principal::Admin { .. } => Err(CoreError::Unauthorized(
                "user operation attempted by admin".to_string(),
            )),
        }
    }

    /// Admin name of an admin principal; users are refused
    pub fn require_admin(&self) -> CoreResult<&str> {
        match self {
            Principal::Admin { username } => Ok(username),
            Principal::User { .. } => Err(CoreError::Unauthorized(
                "admin access required".to_string(),
            )),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::User {
                telegram_id,
                username,
            } => write!(f, "user @{} ({})", username, telegram_id),
            Principal::Admin { username } => write!(f, "admin @{}", username),
        }
    }
}
