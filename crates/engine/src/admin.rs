//! Admin catalogue: dashboard stats, listings, task and settings management.
//!
//! Every method requires an admin principal.

use crate::error::EngineResult;
use crate::services::ServiceContext;
use chrono::{DateTime, Utc};
use serde::Serialize;
use speedy_core::{
    CoreError, DisplaySettings, NewTask, Principal, SettingsUpdate, Task, User, Withdrawal,
    WithdrawalStatus,
};
use speedy_persistence::{SettingsRepo, TaskRepo, UserRepo, WithdrawalRepo};

/// Dashboard counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_points: i64,
    pub pending_withdrawals: i64,
    pub active_tasks: i64,
}

pub struct AdminService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AdminService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn stats(&self, principal: &Principal) -> EngineResult<AdminStats> {
        principal.require_admin()?;
        let pool = self.ctx.pool();

        let (total_users, total_points) = UserRepo::totals(pool).await?;
        let pending_withdrawals =
            WithdrawalRepo::count_by_status(pool, WithdrawalStatus::Pending).await?;
        let active_tasks = TaskRepo::count_active(pool).await?;

        Ok(AdminStats {
            total_users,
            total_points,
            pending_withdrawals,
            active_tasks,
        })
    }

    pub async fn list_users(&self, principal: &Principal) -> EngineResult<Vec<User>> {
        principal.require_admin()?;
        Ok(UserRepo::get_all(self.ctx.pool()).await?)
    }

    pub async fn list_withdrawals(&self, principal: &Principal) -> EngineResult<Vec<Withdrawal>> {
        principal.require_admin()?;
        Ok(WithdrawalRepo::list_all(self.ctx.pool()).await?)
    }

    /// All tasks, inactive included
    pub async fn list_tasks(&self, principal: &Principal) -> EngineResult<Vec<Task>> {
        principal.require_admin()?;
        Ok(TaskRepo::list_all(self.ctx.pool()).await?)
    }

    pub async fn create_task(
        &self,
        principal: &Principal,
        req: NewTask,
        now: DateTime<Utc>,
    ) -> EngineResult<Task> {
        let admin = principal.require_admin()?;
        let task = Task::create(req, now)?;
        TaskRepo::insert(self.ctx.pool(), &task).await?;

        tracing::info!(admin, task_id = %task.task_id, reward = task.reward_points, "task created");
        Ok(task)
    }

    /// Soft delete
    pub async fn deactivate_task(&self, principal: &Principal, task_id: &str) -> EngineResult<()> {
        let admin = principal.require_admin()?;
        if !TaskRepo::deactivate(self.ctx.pool(), task_id).await? {
            return Err(CoreError::TaskNotFound(task_id.to_string()).into());
        }

        tracing::info!(admin, task_id, "task deactivated");
        Ok(())
    }

    /// Apply the non-empty fields of `update` and return the stored document
    pub async fn update_settings(
        &self,
        principal: &Principal,
        update: SettingsUpdate,
    ) -> EngineResult<DisplaySettings> {
        let admin = principal.require_admin()?;
        let pool = self.ctx.pool();

        let mut settings = SettingsRepo::get_or_seed(pool, &self.ctx.config().settings).await?;
        if update.is_empty() {
            return Ok(settings);
        }
        update.apply(&mut settings);
        SettingsRepo::save(pool, &settings).await?;

        tracing::info!(admin, "display settings updated");
        Ok(settings)
    }
}
