//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use speedy_core::{AppConfig, CoreError, NewTask, Principal, TelegramId};
use speedy_engine::{
    AdminService, EngineError, Notifier, NotifyError, OnboardingService, ServiceContext,
};
use speedy_persistence::Database;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Notifier that records every message and fails for chosen recipients
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(TelegramId, String)>>,
    pub unreachable: HashSet<TelegramId>,
}

impl RecordingNotifier {
    pub fn failing_for(ids: &[TelegramId]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            unreachable: ids.iter().copied().collect(),
        }
    }

    pub fn messages(&self) -> Vec<(TelegramId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, recipient: TelegramId, message: &str) -> Result<(), NotifyError> {
        if self.unreachable.contains(&recipient) {
            return Err(NotifyError::Unreachable(recipient));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient, message.to_string()));
        Ok(())
    }
}

pub async fn setup() -> ServiceContext {
    let db = Database::in_memory().await.unwrap();
    ServiceContext::new(Arc::new(db), AppConfig::default())
}

/// File-backed store with a multi-connection pool, for racing writers.
/// Keep the directory alive for the length of the test.
pub async fn setup_file() -> (TempDir, ServiceContext) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.database.url = format!("sqlite:{}", dir.path().join("speedy.db").display());
    config.database.max_connections = 4;

    let db = Database::connect(&config.database).await.unwrap();
    (dir, ServiceContext::new(Arc::new(db), config))
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 1, 9, 0, 0).unwrap()
}

pub fn admin() -> Principal {
    Principal::admin("ops")
}

/// Register a user without a referrer and return its principal
pub async fn register(ctx: &ServiceContext, telegram_id: TelegramId, username: &str) -> Principal {
    let notifier = RecordingNotifier::default();
    OnboardingService::new(ctx, &notifier)
        .register(telegram_id, username, None, t0())
        .await
        .unwrap();
    Principal::user(telegram_id, username)
}

pub async fn create_task(ctx: &ServiceContext, title: &str, reward: i64) -> String {
    let req = NewTask {
        title: title.to_string(),
        description: format!("{} to earn points", title),
        task_type: "telegram".to_string(),
        url: Some("https://t.me/speedy".to_string()),
        reward_points: reward,
    };
    AdminService::new(ctx)
        .create_task(&admin(), req, t0())
        .await
        .unwrap()
        .task_id
}

/// Unwrap the domain error of an engine failure
pub fn core(err: EngineError) -> CoreError {
    match err {
        EngineError::Core(e) => e,
        other => panic!("expected a domain error, got {other:?}"),
    }
}
