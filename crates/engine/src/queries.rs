//! Read-side queries for the app and the bot

use crate::error::EngineResult;
use crate::services::ServiceContext;
use chrono::{DateTime, Utc};
use serde::Serialize;
use speedy_core::{
    CoreError, Countdown, DisplaySettings, Milestone, Principal, TelegramId, User, UserTask,
    Withdrawal,
};
use speedy_persistence::{
    CompletionRepo, MilestoneRepo, SettingsRepo, TaskRepo, UserRepo, WithdrawalRepo,
};
use std::collections::HashSet;

/// Default leaderboard size for the app
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 100;

/// Milestone with its reward, as listed to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MilestoneReward {
    pub milestone: Milestone,
    pub reward: i64,
}

impl From<Milestone> for MilestoneReward {
    fn from(milestone: Milestone) -> Self {
        Self {
            milestone,
            reward: milestone.reward(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferralStats {
    pub telegram_id: TelegramId,
    pub referral_count: i64,
    pub claimed: Vec<Milestone>,
    pub claimable: Vec<MilestoneReward>,
}

/// Leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedUser {
    pub rank: usize,
    pub telegram_id: TelegramId,
    pub username: String,
    pub points: i64,
}

pub struct QueryService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> QueryService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// The caller's own user document
    pub async fn profile(&self, principal: &Principal) -> EngineResult<User> {
        let telegram_id = principal.require_user()?;
        self.user(telegram_id).await
    }

    pub async fn referral_stats(&self, principal: &Principal) -> EngineResult<ReferralStats> {
        let telegram_id = principal.require_user()?;
        let user = self.user(telegram_id).await?;
        let claimed = MilestoneRepo::claimed_by(self.ctx.pool(), telegram_id).await?;
        let claimable = Milestone::claimable(user.referral_count, &claimed)
            .into_iter()
            .map(MilestoneReward::from)
            .collect();

        Ok(ReferralStats {
            telegram_id,
            referral_count: user.referral_count,
            claimed,
            claimable,
        })
    }

    /// Active tasks, each flagged with whether the caller completed it
    pub async fn list_tasks(&self, principal: &Principal) -> EngineResult<Vec<UserTask>> {
        let telegram_id = principal.require_user()?;
        let tasks = TaskRepo::list_active(self.ctx.pool()).await?;
        let done: HashSet<String> = CompletionRepo::task_ids_for_user(self.ctx.pool(), telegram_id)
            .await?
            .into_iter()
            .collect();

        Ok(tasks
            .into_iter()
            .map(|task| {
                let completed = done.contains(&task.task_id);
                UserTask { task, completed }
            })
            .collect())
    }

    pub async fn my_withdrawals(&self, principal: &Principal) -> EngineResult<Vec<Withdrawal>> {
        let telegram_id = principal.require_user()?;
        Ok(WithdrawalRepo::list_for_user(self.ctx.pool(), telegram_id).await?)
    }

    /// Public ranking by points
    pub async fn leaderboard(&self, limit: i64) -> EngineResult<Vec<RankedUser>> {
        let limit = if limit > 0 { limit } else { DEFAULT_LEADERBOARD_LIMIT };
        let users = UserRepo::top_by_points(self.ctx.pool(), limit).await?;

        Ok(users
            .into_iter()
            .enumerate()
            .map(|(i, user)| RankedUser {
                rank: i + 1,
                telegram_id: user.telegram_id,
                username: user.username,
                points: user.points,
            })
            .collect())
    }

    pub async fn settings(&self) -> EngineResult<DisplaySettings> {
        Ok(SettingsRepo::get_or_seed(self.ctx.pool(), &self.ctx.config().settings).await?)
    }

    pub fn countdown(&self, now: DateTime<Utc>) -> Countdown {
        let event = &self.ctx.config().event;
        Countdown::until(&event.name, event.target, now)
    }

    async fn user(&self, telegram_id: TelegramId) -> EngineResult<User> {
        Ok(UserRepo::find(self.ctx.pool(), telegram_id)
            .await?
            .ok_or(CoreError::UserNotFound(telegram_id))?)
    }
}
