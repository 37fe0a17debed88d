//! # Task Module
//!
//! Completable tasks. A task is created by an admin and can only be
//! soft-deleted (`active = false`), never reactivated.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub title: String,
    pub description: String,
    /// Channel label, e.g. `telegram`, `youtube`, `twitter`
    pub task_type: String,
    pub url: Option<String>,
    pub reward_points: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Admin request to create a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub url: Option<String>,
    pub reward_points: i64,
}

impl NewTask {
    pub fn validate(&self) -> CoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("task title is empty".to_string()));
        }
        if self.reward_points <= 0 {
            return Err(CoreError::Validation(format!(
                "task reward must be positive: {}",
                self.reward_points
            )));
        }
        Ok(())
    }
}

impl Task {
    /// Build an active task with a fresh uuid
    pub fn create(req: NewTask, now: DateTime<Utc>) -> CoreResult<Self> {
        req.validate()?;
        Ok(Self {
            task_id: Uuid::new_v4().to_string(),
            title: req.title,
            description: req.description,
            task_type: req.task_type,
            url: req.url,
            reward_points: req.reward_points,
            active: true,
            created_at: now,
        })
    }
}

/// Task as shown to one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTask {
    #[serde(flatten)]
    pub task: Task,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follow_channel(reward: i64) -> NewTask {
        NewTask {
            title: "Follow the channel".to_string(),
            description: "Join the announcement channel".to_string(),
            task_type: "telegram".to_string(),
            url: Some("https://t.me/example".to_string()),
            reward_points: reward,
        }
    }

    #[test]
    fn test_create_task() {
        let task = Task::create(follow_channel(500), Utc::now()).unwrap();
        assert!(task.active);
        assert_eq!(task.reward_points, 500);
        assert!(Uuid::parse_str(&task.task_id).is_ok());
    }

    #[test]
    fn test_reject_invalid_task() {
        assert!(matches!(
            Task::create(follow_channel(0), Utc::now()),
            Err(CoreError::Validation(_))
        ));

        let mut req = follow_channel(100);
        req.title = "   ".to_string();
        assert!(req.validate().is_err());
    }
}
