//! Ledger & eligibility engine
//!
//! One method per intent. Each method checks the principal, evaluates the
//! eligibility rule and applies the balance change as a single guarded
//! write (or a short write-first transaction when an idempotency fact is
//! inserted alongside the credit). Nothing is held between calls.

use crate::error::{EngineError, EngineResult};
use crate::services::{CheckInResult, Credit, MilestoneResult, ServiceContext};
use chrono::{DateTime, Utc};
use speedy_core::withdrawal::{APPROVED_NOTE, DEFAULT_REJECT_NOTE};
use speedy_core::{
    CoreError, Milestone, Principal, StreakState, TelegramId, Withdrawal, WithdrawalStatus,
};
use speedy_persistence::{CompletionRepo, MilestoneRepo, TaskRepo, UserRepo, WithdrawalRepo};
use sqlx::SqliteExecutor;

/// Compare-and-set rounds before a check-in gives up
pub const CHECKIN_ATTEMPTS: u32 = 3;

/// Ledger engine - every operation that changes a balance
pub struct LedgerEngine<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> LedgerEngine<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Credit the one-time join bonus
    pub async fn claim_join_bonus(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> EngineResult<Credit> {
        let telegram_id = principal.require_user()?;
        let bonus = self.ctx.join_bonus_policy().bonus_at(now);

        match UserRepo::claim_join_bonus(self.ctx.pool(), telegram_id, bonus).await? {
            Some(balance) => {
                tracing::info!(telegram_id, bonus, balance, "join bonus claimed");
                Ok(Credit::new(telegram_id, bonus, balance))
            }
            None => Err(self
                .user_or(
                    self.ctx.pool(),
                    telegram_id,
                    CoreError::AlreadyClaimed("join bonus".to_string()),
                )
                .await),
        }
    }

    /// Daily check-in.
    ///
    /// The streak update is a compare-and-set on the state read here. If a
    /// concurrent check-in lands first the state is re-read, which then
    /// fails the cooldown rule. After `CHECKIN_ATTEMPTS` lost rounds the
    /// call fails with `Contention`.
    pub async fn check_in(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> EngineResult<CheckInResult> {
        let telegram_id = principal.require_user()?;

        for attempt in 1..=CHECKIN_ATTEMPTS {
            let user = UserRepo::find(self.ctx.pool(), telegram_id)
                .await?
                .ok_or(CoreError::UserNotFound(telegram_id))?;

            let expected = user.streak();
            let checkin = expected.check_in(now)?;

            if let Some(balance) =
                UserRepo::record_checkin(self.ctx.pool(), telegram_id, &expected, &checkin).await?
            {
                tracing::info!(
                    telegram_id,
                    award = checkin.award,
                    streak_day = checkin.streak_day,
                    "check-in credited"
                );
                return Ok(CheckInResult {
                    award: checkin.award,
                    streak_day: checkin.streak_day,
                    transition: checkin.transition,
                    balance,
                    next_available_at: StreakState::new(Some(checkin.at), checkin.streak_day)
                        .next_available_at(),
                });
            }

            tracing::debug!(telegram_id, attempt, "streak changed concurrently, re-evaluating");
        }

        tracing::warn!(telegram_id, attempts = CHECKIN_ATTEMPTS, "check-in gave up on contention");
        Err(CoreError::Contention(format!("check-in of user {}", telegram_id)).into())
    }

    /// Claim the reward of a referral milestone (1, 3 or 5)
    pub async fn claim_referral_milestone(
        &self,
        principal: &Principal,
        milestone: i64,
        now: DateTime<Utc>,
    ) -> EngineResult<MilestoneResult> {
        let telegram_id = principal.require_user()?;
        let milestone = Milestone::try_from(milestone)?;

        let user = UserRepo::find(self.ctx.pool(), telegram_id)
            .await?
            .ok_or(CoreError::UserNotFound(telegram_id))?;

        if !milestone.is_reached(user.referral_count) {
            return Err(CoreError::MilestoneNotReached {
                milestone: milestone.threshold(),
                referral_count: user.referral_count,
            }
            .into());
        }

        let reward = milestone.reward();
        let mut tx = self.ctx.pool().begin().await?;

        if !MilestoneRepo::insert(&mut *tx, telegram_id, milestone, now).await? {
            return Err(
                CoreError::AlreadyClaimed(format!("referral milestone {}", milestone)).into(),
            );
        }

        let balance = UserRepo::add_points(&mut *tx, telegram_id, reward)
            .await?
            .ok_or(CoreError::UserNotFound(telegram_id))?;
        tx.commit().await?;

        tracing::info!(telegram_id, %milestone, reward, balance, "referral milestone claimed");
        Ok(MilestoneResult {
            milestone,
            reward,
            balance,
        })
    }

    /// Complete an active task once
    pub async fn complete_task(
        &self,
        principal: &Principal,
        task_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Credit> {
        let telegram_id = principal.require_user()?;

        let task = TaskRepo::find_active(self.ctx.pool(), task_id)
            .await?
            .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))?;

        let mut tx = self.ctx.pool().begin().await?;

        if !CompletionRepo::insert(&mut *tx, telegram_id, &task.task_id, now).await? {
            return Err(CoreError::AlreadyCompleted(task.task_id).into());
        }

        let balance = UserRepo::add_points(&mut *tx, telegram_id, task.reward_points)
            .await?
            .ok_or(CoreError::UserNotFound(telegram_id))?;
        tx.commit().await?;

        tracing::info!(telegram_id, task_id, reward = task.reward_points, balance, "task completed");
        Ok(Credit::new(telegram_id, task.reward_points, balance))
    }

    /// Create a pending withdrawal; the balance is not touched yet
    pub async fn request_withdrawal(
        &self,
        principal: &Principal,
        amount: i64,
        now: DateTime<Utc>,
    ) -> EngineResult<Withdrawal> {
        let telegram_id = principal.require_user()?;
        if amount <= 0 {
            return Err(CoreError::InvalidAmount(amount).into());
        }

        let user = UserRepo::find(self.ctx.pool(), telegram_id)
            .await?
            .ok_or(CoreError::UserNotFound(telegram_id))?;

        let withdrawal = Withdrawal::request(telegram_id, &user.username, amount, now)?;

        if !WithdrawalRepo::insert_if_covered(self.ctx.pool(), &withdrawal).await? {
            return Err(self.shortfall(self.ctx.pool(), telegram_id, amount).await);
        }

        tracing::info!(
            telegram_id,
            amount,
            withdrawal_id = %withdrawal.withdrawal_id,
            "withdrawal requested"
        );
        Ok(withdrawal)
    }

    /// Approve a pending withdrawal and debit the owner.
    ///
    /// The owner's current balance must still cover the amount; otherwise
    /// the request stays pending and `InsufficientBalance` is returned.
    pub async fn approve_withdrawal(
        &self,
        principal: &Principal,
        withdrawal_id: &str,
    ) -> EngineResult<(Withdrawal, Credit)> {
        let admin = principal.require_admin()?;
        let mut tx = self.ctx.pool().begin().await?;

        if !WithdrawalRepo::resolve(&mut *tx, withdrawal_id, WithdrawalStatus::Approved, APPROVED_NOTE)
            .await?
        {
            return Err(self.unresolvable(&mut *tx, withdrawal_id).await);
        }

        let withdrawal = WithdrawalRepo::find(&mut *tx, withdrawal_id)
            .await?
            .ok_or_else(|| CoreError::WithdrawalNotFound(withdrawal_id.to_string()))?;

        let Some(balance) =
            UserRepo::debit_if_covered(&mut *tx, withdrawal.user_id, withdrawal.amount).await?
        else {
            let err = self
                .shortfall(&mut *tx, withdrawal.user_id, withdrawal.amount)
                .await;
            tracing::warn!(admin, withdrawal_id, error = %err, "approval rejected");
            return Err(err);
        };
        tx.commit().await?;

        tracing::info!(
            admin,
            withdrawal_id,
            telegram_id = withdrawal.user_id,
            amount = withdrawal.amount,
            balance,
            "withdrawal approved"
        );
        let debit = Credit::new(withdrawal.user_id, -withdrawal.amount, balance);
        Ok((withdrawal, debit))
    }

    /// Reject a pending withdrawal; no balance change
    pub async fn reject_withdrawal(
        &self,
        principal: &Principal,
        withdrawal_id: &str,
        note: Option<&str>,
    ) -> EngineResult<Withdrawal> {
        let admin = principal.require_admin()?;
        let note = note.unwrap_or(DEFAULT_REJECT_NOTE);
        let pool = self.ctx.pool();

        if !WithdrawalRepo::resolve(pool, withdrawal_id, WithdrawalStatus::Rejected, note).await? {
            return Err(self.unresolvable(pool, withdrawal_id).await);
        }

        tracing::info!(admin, withdrawal_id, note, "withdrawal rejected");
        WithdrawalRepo::find(pool, withdrawal_id)
            .await?
            .ok_or_else(|| CoreError::WithdrawalNotFound(withdrawal_id.to_string()).into())
    }

    /// Unconditional signed adjustment by an admin
    pub async fn adjust_points(
        &self,
        principal: &Principal,
        telegram_id: TelegramId,
        delta: i64,
    ) -> EngineResult<Credit> {
        let admin = principal.require_admin()?;

        let balance = UserRepo::add_points(self.ctx.pool(), telegram_id, delta)
            .await?
            .ok_or(CoreError::UserNotFound(telegram_id))?;

        if balance < 0 {
            tracing::warn!(admin, telegram_id, delta, balance, "adjustment left a negative balance");
        } else {
            tracing::info!(admin, telegram_id, delta, balance, "points adjusted");
        }
        Ok(Credit::new(telegram_id, delta, balance))
    }

    // === Rejection helpers ===

    /// `err` if the user exists, `UserNotFound` otherwise
    async fn user_or<'e, E: SqliteExecutor<'e>>(
        &self,
        executor: E,
        telegram_id: TelegramId,
        err: CoreError,
    ) -> EngineError {
        match UserRepo::find(executor, telegram_id).await {
            Ok(Some(_)) => err.into(),
            Ok(None) => CoreError::UserNotFound(telegram_id).into(),
            Err(e) => e.into(),
        }
    }

    /// Error for a balance that does not cover `requested`
    async fn shortfall<'e, E: SqliteExecutor<'e>>(
        &self,
        executor: E,
        telegram_id: TelegramId,
        requested: i64,
    ) -> EngineError {
        match UserRepo::find(executor, telegram_id).await {
            Ok(Some(user)) => CoreError::insufficient_balance(requested, user.points).into(),
            Ok(None) => CoreError::UserNotFound(telegram_id).into(),
            Err(e) => e.into(),
        }
    }

    /// Error for a withdrawal that could not leave `pending`
    async fn unresolvable<'e, E: SqliteExecutor<'e>>(
        &self,
        executor: E,
        withdrawal_id: &str,
    ) -> EngineError {
        match WithdrawalRepo::find(executor, withdrawal_id).await {
            // still pending only if a concurrent resolution was rolled back
            Ok(Some(w)) => w
                .ensure_pending()
                .err()
                .unwrap_or_else(|| CoreError::Contention(format!("withdrawal {}", withdrawal_id)))
                .into(),
            Ok(None) => CoreError::WithdrawalNotFound(withdrawal_id.to_string()).into(),
            Err(e) => e.into(),
        }
    }
}
