//! Chat notifications
//!
//! Delivery is best-effort: every recipient is attempted independently,
//! failures are counted and logged, nothing is retried.

use crate::error::EngineResult;
use crate::services::ServiceContext;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use speedy_core::{CoreError, Countdown, Principal, TelegramId};
use speedy_persistence::UserRepo;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// The recipient blocked the bot or never started a chat
    #[error("Recipient {0} is unreachable")]
    Unreachable(TelegramId),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Outbound message channel (the chat bot in production)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name (for logging)
    fn name(&self) -> &str;

    async fn send(&self, recipient: TelegramId, message: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Announcement body: event countdown header, banner, then the admin's text
pub fn broadcast_text(countdown: &Countdown, message: &str) -> String {
    format!("{}\n\n📢 BROADCAST\n\n{}", countdown.message, message)
}

/// Send `message` to every registered user, framed by the event countdown
/// as of `now`
pub async fn broadcast(
    ctx: &ServiceContext,
    principal: &Principal,
    notifier: &dyn Notifier,
    message: &str,
    now: DateTime<Utc>,
) -> EngineResult<BroadcastReport> {
    let admin = principal.require_admin()?;
    if message.trim().is_empty() {
        return Err(CoreError::Validation("broadcast message is empty".to_string()).into());
    }

    let event = &ctx.config().event;
    let text = broadcast_text(&Countdown::until(&event.name, event.target, now), message);

    let recipients = UserRepo::all_ids(ctx.pool()).await?;
    let mut report = BroadcastReport::default();

    for recipient in recipients {
        match notifier.send(recipient, &text).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                tracing::debug!(channel = notifier.name(), recipient, error = %e, "broadcast delivery failed");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        admin,
        channel = notifier.name(),
        delivered = report.delivered,
        failed = report.failed,
        "broadcast finished"
    );
    Ok(report)
}

/// Single best-effort message; failures are logged and swallowed
pub async fn notify(notifier: &dyn Notifier, recipient: TelegramId, message: &str) -> bool {
    match notifier.send(recipient, message).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(channel = notifier.name(), recipient, error = %e, "notification dropped");
            false
        }
    }
}
