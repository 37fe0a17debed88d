//! Integration tests for queries, admin catalogue, onboarding and broadcast

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{admin, core, create_task, register, setup, t0, RecordingNotifier};
use speedy_core::{CoreError, Milestone, NewTask, Principal, SettingsUpdate};
use speedy_engine::{
    broadcast, broadcast_text, AdminService, LedgerEngine, MilestoneReward, OnboardingService, QueryService,
};

#[tokio::test]
async fn test_register_is_idempotent() {
    let ctx = setup().await;
    let notifier = RecordingNotifier::default();
    let onboarding = OnboardingService::new(&ctx, &notifier);

    let first = onboarding.register(1, "alice", None, t0()).await.unwrap();
    assert!(first.created);
    assert_eq!(first.user.points, 0);
    assert_eq!(first.user.streak_day, 0);
    assert!(!first.user.join_bonus_claimed);

    // a later contact keeps the original join date
    let again = onboarding
        .register(1, "alice", None, t0() + Duration::days(2))
        .await
        .unwrap();
    assert!(!again.created);
    assert_eq!(again.user.join_date, t0());
}

#[tokio::test]
async fn test_register_with_referrer() {
    let ctx = setup().await;
    let notifier = RecordingNotifier::default();
    let onboarding = OnboardingService::new(&ctx, &notifier);
    let alice = register(&ctx, 1, "alice").await;

    let bob = onboarding.register(2, "bob", Some(1), t0()).await.unwrap();
    assert_eq!(bob.user.referred_by, Some(1));

    // repeat contact does not count twice
    onboarding.register(2, "bob", Some(1), t0()).await.unwrap();

    // self-referral and unknown referrers are ignored
    let carol = onboarding.register(3, "carol", Some(3), t0()).await.unwrap();
    assert_eq!(carol.user.referred_by, None);
    let dave = onboarding.register(4, "dave", Some(404), t0()).await.unwrap();
    assert_eq!(dave.user.referred_by, None);

    let profile = QueryService::new(&ctx).profile(&alice).await.unwrap();
    assert_eq!(profile.referral_count, 1);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, 1);
    assert!(messages[0].1.contains("bob"));
}

#[tokio::test]
async fn test_referral_notification_failure_is_swallowed() {
    let ctx = setup().await;
    let notifier = RecordingNotifier::failing_for(&[1]);
    let onboarding = OnboardingService::new(&ctx, &notifier);
    let alice = register(&ctx, 1, "alice").await;

    let bob = onboarding.register(2, "bob", Some(1), t0()).await.unwrap();
    assert!(bob.created);

    let profile = QueryService::new(&ctx).profile(&alice).await.unwrap();
    assert_eq!(profile.referral_count, 1);
}

#[tokio::test]
async fn test_referral_stats_lists_claimable() {
    let ctx = setup().await;
    let notifier = RecordingNotifier::default();
    let onboarding = OnboardingService::new(&ctx, &notifier);
    let alice = register(&ctx, 1, "alice").await;
    for (id, name) in [(2, "bob"), (3, "carol"), (4, "dave")] {
        onboarding.register(id, name, Some(1), t0()).await.unwrap();
    }

    LedgerEngine::new(&ctx)
        .claim_referral_milestone(&alice, 1, t0())
        .await
        .unwrap();

    let stats = QueryService::new(&ctx).referral_stats(&alice).await.unwrap();
    assert_eq!(stats.referral_count, 3);
    assert_eq!(stats.claimed, vec![Milestone::One]);
    assert_eq!(
        stats.claimable,
        vec![MilestoneReward {
            milestone: Milestone::Three,
            reward: 5000
        }]
    );
}

#[tokio::test]
async fn test_list_tasks_flags_completed() {
    let ctx = setup().await;
    let alice = register(&ctx, 1, "alice").await;
    let join = create_task(&ctx, "Join the channel", 500).await;
    let watch = create_task(&ctx, "Watch the video", 300).await;
    let gone = create_task(&ctx, "Old promo", 100).await;
    AdminService::new(&ctx)
        .deactivate_task(&admin(), &gone)
        .await
        .unwrap();

    LedgerEngine::new(&ctx)
        .complete_task(&alice, &join, t0())
        .await
        .unwrap();

    let tasks = QueryService::new(&ctx).list_tasks(&alice).await.unwrap();
    assert_eq!(tasks.len(), 2);
    for item in &tasks {
        assert_eq!(item.completed, item.task.task_id == join);
    }
    assert!(tasks.iter().any(|t| t.task.task_id == watch && !t.completed));

    // admins see inactive tasks too
    let all = AdminService::new(&ctx).list_tasks(&admin()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().any(|t| t.task_id == gone && !t.active));
}

#[tokio::test]
async fn test_leaderboard_orders_by_points() {
    let ctx = setup().await;
    let ledger = LedgerEngine::new(&ctx);
    for (id, name) in [(1, "alice"), (2, "bob"), (3, "carol")] {
        register(&ctx, id, name).await;
    }
    ledger.adjust_points(&admin(), 2, 900).await.unwrap();
    ledger.adjust_points(&admin(), 3, 400).await.unwrap();

    let board = QueryService::new(&ctx).leaderboard(2).await.unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!((board[0].rank, board[0].username.as_str()), (1, "bob"));
    assert_eq!((board[1].rank, board[1].points), (2, 400));

    // non-positive limits fall back to the default
    let board = QueryService::new(&ctx).leaderboard(0).await.unwrap();
    assert_eq!(board.len(), 3);
}

#[tokio::test]
async fn test_countdown() {
    let ctx = setup().await;
    let queries = QueryService::new(&ctx);
    let target = ctx.config().event.target;

    let before = queries.countdown(target - Duration::days(2) - Duration::hours(3));
    assert!(before.is_active);
    assert_eq!((before.days, before.hours, before.minutes), (2, 3, 0));

    let after = queries.countdown(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
    assert!(!after.is_active);
    assert!(after.message.starts_with("It's"));
}

#[tokio::test]
async fn test_admin_stats_and_listings() {
    let ctx = setup().await;
    let ledger = LedgerEngine::new(&ctx);
    let service = AdminService::new(&ctx);
    let alice = register(&ctx, 1, "alice").await;
    register(&ctx, 2, "bob").await;
    ledger.claim_join_bonus(&alice, t0()).await.unwrap();
    ledger.request_withdrawal(&alice, 200, t0()).await.unwrap();
    create_task(&ctx, "Join the channel", 500).await;

    let stats = service.stats(&admin()).await.unwrap();
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_points, 1200);
    assert_eq!(stats.pending_withdrawals, 1);
    assert_eq!(stats.active_tasks, 1);

    let users = service.list_users(&admin()).await.unwrap();
    assert_eq!(users[0].username, "alice");
    let withdrawals = service.list_withdrawals(&admin()).await.unwrap();
    assert_eq!(withdrawals.len(), 1);

    let err = core(service.stats(&alice).await.unwrap_err());
    assert!(err.is_permission_error());
}

#[tokio::test]
async fn test_create_task_validation() {
    let ctx = setup().await;
    let service = AdminService::new(&ctx);
    let req = NewTask {
        title: "Free points".to_string(),
        description: String::new(),
        task_type: "twitter".to_string(),
        url: None,
        reward_points: 0,
    };

    let err = core(service.create_task(&admin(), req, t0()).await.unwrap_err());
    assert!(matches!(err, CoreError::Validation(_)));

    let err = core(service.deactivate_task(&admin(), "missing").await.unwrap_err());
    assert_eq!(err, CoreError::TaskNotFound("missing".to_string()));
}

#[tokio::test]
async fn test_settings_seed_and_update() {
    let ctx = setup().await;
    let queries = QueryService::new(&ctx);

    let seeded = queries.settings().await.unwrap();
    assert_eq!(seeded, ctx.config().settings);

    let update = SettingsUpdate {
        tap_image_url: Some("https://cdn.example/tap.png".to_string()),
        ..Default::default()
    };
    let saved = AdminService::new(&ctx)
        .update_settings(&admin(), update)
        .await
        .unwrap();
    assert_eq!(saved.tap_image_url, "https://cdn.example/tap.png");
    assert_eq!(saved.background_image_url, seeded.background_image_url);

    assert_eq!(queries.settings().await.unwrap(), saved);
}

#[tokio::test]
async fn test_broadcast_counts_failures() {
    let ctx = setup().await;
    for (id, name) in [(1, "alice"), (2, "bob"), (3, "carol")] {
        register(&ctx, id, name).await;
    }
    let notifier = RecordingNotifier::failing_for(&[2]);

    let report = broadcast(&ctx, &admin(), &notifier, "Event starts tomorrow", t0())
        .await
        .unwrap();
    assert_eq!((report.delivered, report.failed), (2, 1));
    assert_eq!(report.total(), 3);
    assert_eq!(notifier.messages().len(), 2);

    let user = Principal::user(1, "alice");
    let err = core(broadcast(&ctx, &user, &notifier, "spam", t0()).await.unwrap_err());
    assert!(err.is_permission_error());

    let err = core(broadcast(&ctx, &admin(), &notifier, "  ", t0()).await.unwrap_err());
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_broadcast_is_framed_by_countdown() {
    let ctx = setup().await;
    register(&ctx, 1, "alice").await;
    let notifier = RecordingNotifier::default();

    broadcast(&ctx, &admin(), &notifier, "Event starts tomorrow", t0())
        .await
        .unwrap();

    let countdown = QueryService::new(&ctx).countdown(t0());
    let sent = notifier.messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 1);
    assert_eq!(
        sent[0].1,
        format!("{}\n\n📢 BROADCAST\n\nEvent starts tomorrow", countdown.message)
    );
    assert_eq!(sent[0].1, broadcast_text(&countdown, "Event starts tomorrow"));
    assert!(sent[0].1.starts_with(&countdown.message));
}
