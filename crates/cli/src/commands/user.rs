//! User commands

use anyhow::Result;
use chrono::Utc;
use speedy_core::Principal;
use speedy_engine::{LedgerEngine, OnboardingService, QueryService, ServiceContext};

use super::emit;
use crate::notifier::ConsoleNotifier;
use crate::UserAction;

pub async fn register(
    ctx: &ServiceContext,
    telegram_id: i64,
    username: &str,
    referrer: Option<i64>,
) -> Result<()> {
    let notifier = ConsoleNotifier;
    let registration = OnboardingService::new(ctx, &notifier)
        .register(telegram_id, username, referrer, Utc::now())
        .await?;

    if registration.created {
        println!("✅ Registered {}", registration.user);
    } else {
        println!("ℹ️  Already registered: {}", registration.user);
    }
    Ok(())
}

/// Handle user subcommands
pub async fn handle(
    ctx: &ServiceContext,
    telegram_id: i64,
    username: &str,
    action: UserAction,
) -> Result<()> {
    let principal = Principal::user(telegram_id, username);
    let ledger = LedgerEngine::new(ctx);
    let queries = QueryService::new(ctx);
    let now = Utc::now();

    match action {
        UserAction::Profile => emit(&queries.profile(&principal).await?)?,
        UserAction::Bonus => {
            let credit = ledger.claim_join_bonus(&principal, now).await?;
            println!("🎁 Join bonus +{} (balance {})", credit.delta, credit.balance);
        }
        UserAction::Checkin => {
            let result = ledger.check_in(&principal, now).await?;
            println!(
                "🔥 Day {} check-in +{} (balance {})",
                result.streak_day, result.award, result.balance
            );
            if let Some(next) = result.next_available_at {
                println!("   Next check-in from {}", next.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        UserAction::Referrals => emit(&queries.referral_stats(&principal).await?)?,
        UserAction::Claim { milestone } => {
            let result = ledger
                .claim_referral_milestone(&principal, milestone, now)
                .await?;
            println!(
                "🏆 Milestone {} +{} (balance {})",
                result.milestone, result.reward, result.balance
            );
        }
        UserAction::Tasks => emit(&queries.list_tasks(&principal).await?)?,
        UserAction::Complete { task_id } => {
            let credit = ledger.complete_task(&principal, &task_id, now).await?;
            println!("✅ Task done +{} (balance {})", credit.delta, credit.balance);
        }
        UserAction::Withdraw { amount } => {
            let withdrawal = ledger.request_withdrawal(&principal, amount, now).await?;
            println!(
                "📤 Withdrawal {} of {} is {}",
                withdrawal.withdrawal_id, withdrawal.amount, withdrawal.status
            );
        }
        UserAction::Withdrawals => emit(&queries.my_withdrawals(&principal).await?)?,
    }

    Ok(())
}
