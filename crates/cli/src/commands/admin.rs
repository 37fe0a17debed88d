//! Admin commands

use anyhow::Result;
use chrono::Utc;
use speedy_core::{NewTask, Principal, SettingsUpdate};
use speedy_engine::{broadcast, AdminService, LedgerEngine, ServiceContext};

use super::emit;
use crate::notifier::ConsoleNotifier;
use crate::AdminAction;

/// Handle admin subcommands
pub async fn handle(ctx: &ServiceContext, name: &str, action: AdminAction) -> Result<()> {
    let principal = Principal::admin(name);
    let service = AdminService::new(ctx);
    let ledger = LedgerEngine::new(ctx);

    match action {
        AdminAction::Stats => emit(&service.stats(&principal).await?)?,
        AdminAction::Users => emit(&service.list_users(&principal).await?)?,
        AdminAction::Withdrawals => emit(&service.list_withdrawals(&principal).await?)?,
        AdminAction::Approve { withdrawal_id } => {
            let (withdrawal, debit) = ledger.approve_withdrawal(&principal, &withdrawal_id).await?;
            println!(
                "✅ Approved {} for user {} (balance {})",
                withdrawal.withdrawal_id, withdrawal.user_id, debit.balance
            );
        }
        AdminAction::Reject {
            withdrawal_id,
            note,
        } => {
            let withdrawal = ledger
                .reject_withdrawal(&principal, &withdrawal_id, note.as_deref())
                .await?;
            println!(
                "❌ Rejected {}: {}",
                withdrawal.withdrawal_id,
                withdrawal.admin_note.unwrap_or_default()
            );
        }
        AdminAction::Adjust { telegram_id, delta } => {
            let credit = ledger.adjust_points(&principal, telegram_id, delta).await?;
            println!("🔧 {} {:+} (balance {})", telegram_id, credit.delta, credit.balance);
        }
        AdminAction::Tasks => emit(&service.list_tasks(&principal).await?)?,
        AdminAction::CreateTask {
            title,
            description,
            task_type,
            url,
            reward,
        } => {
            let req = NewTask {
                title,
                description,
                task_type,
                url,
                reward_points: reward,
            };
            emit(&service.create_task(&principal, req, Utc::now()).await?)?;
        }
        AdminAction::DeactivateTask { task_id } => {
            service.deactivate_task(&principal, &task_id).await?;
            println!("🗑️  Task {} deactivated", task_id);
        }
        AdminAction::Settings {
            background_image_url,
            tap_image_url,
            tap_video_url,
        } => {
            let update = SettingsUpdate {
                background_image_url,
                tap_image_url,
                tap_video_url,
            };
            emit(&service.update_settings(&principal, update).await?)?;
        }
        AdminAction::Broadcast { message } => {
            let report = broadcast(ctx, &principal, &ConsoleNotifier, &message, Utc::now()).await?;
            println!(
                "📣 Broadcast sent to {}/{} users",
                report.delivered,
                report.total()
            );
        }
    }

    Ok(())
}
