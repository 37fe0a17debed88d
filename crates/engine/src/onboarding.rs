//! First contact: account creation and referral attribution

use crate::broadcast::{notify, Notifier};
use crate::error::EngineResult;
use crate::services::ServiceContext;
use chrono::{DateTime, Utc};
use serde::Serialize;
use speedy_core::{CoreError, TelegramId, User};
use speedy_persistence::UserRepo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub user: User,
    /// False when the account already existed
    pub created: bool,
}

pub struct OnboardingService<'a> {
    ctx: &'a ServiceContext,
    notifier: &'a dyn Notifier,
}

impl<'a> OnboardingService<'a> {
    pub fn new(ctx: &'a ServiceContext, notifier: &'a dyn Notifier) -> Self {
        Self { ctx, notifier }
    }

    /// Create the account on first contact; later calls return it unchanged.
    ///
    /// A new account referred by another existing user bumps that user's
    /// referral count and sends them a message. Self-referrals and unknown
    /// referrers are ignored.
    pub async fn register(
        &self,
        telegram_id: TelegramId,
        username: &str,
        referrer: Option<TelegramId>,
        now: DateTime<Utc>,
    ) -> EngineResult<Registration> {
        if username.trim().is_empty() {
            return Err(CoreError::Validation("username is empty".to_string()).into());
        }
        let pool = self.ctx.pool();

        if let Some(user) = UserRepo::find(pool, telegram_id).await? {
            return Ok(Registration {
                user,
                created: false,
            });
        }

        let referrer = match referrer.filter(|r| *r != telegram_id) {
            Some(r) if UserRepo::find(pool, r).await?.is_some() => Some(r),
            Some(r) => {
                tracing::debug!(telegram_id, referrer = r, "unknown referrer ignored");
                None
            }
            None => None,
        };

        let user = User::new(telegram_id, username, referrer, now);
        if !UserRepo::insert_if_absent(pool, &user).await? {
            // lost a race with a concurrent first contact
            let user = UserRepo::get_by_id(pool, telegram_id).await?;
            return Ok(Registration {
                user,
                created: false,
            });
        }
        tracing::info!(telegram_id, username, referred_by = ?referrer, "user registered");

        if let Some(referrer) = referrer {
            if UserRepo::increment_referrals(pool, referrer).await? {
                let message = format!("New referral: {} joined with your link", username);
                notify(self.notifier, referrer, &message).await;
            }
        }

        Ok(Registration {
            user,
            created: true,
        })
    }
}
