mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::*;
use privchat_antispam::{
    Clock, EmptyTextPolicy, EventRouter, EventRouterConfig, InboundEvent, ManualClock, MembershipStore,
    MessageEvent, RouteOutcome, SpamClassifier, SpamCounter,
};

const TTL: Duration = Duration::from_secs(300);

struct Harness {
    router: EventRouter,
    store: Arc<MembershipStore>,
    counter: Arc<SpamCounter>,
    sender: Arc<RecordingSender>,
    clock: Arc<ManualClock>,
}

/// 创建测试用的事件路由器
fn create_test_router(watch_only: bool, sender: RecordingSender, policy: EmptyTextPolicy) -> Harness {
    let store = Arc::new(MembershipStore::new());
    let counter = Arc::new(SpamCounter::new());
    let sender = Arc::new(sender);
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let router = EventRouter::new(
        EventRouterConfig {
            watch_only,
            ..EventRouterConfig::default()
        },
        store.clone(),
        counter.clone(),
        SpamClassifier::new(TTL, policy),
        sender.clone(),
        clock.clone(),
    );

    Harness {
        router,
        store,
        counter,
        sender,
        clock,
    }
}

fn enforcing() -> Harness {
    create_test_router(false, RecordingSender::new(), EmptyTextPolicy::Eligible)
}

#[tokio::test]
async fn test_forward_from_new_member_is_spam() {
    let h = enforcing();

    assert_eq!(h.router.handle_update(join_update(1, 42)).await, vec![RouteOutcome::Joined(42)]);

    h.clock.advance(Duration::from_secs(60));
    let outcomes = h.router.handle_update(forward_update(2, 42, "cheap crypto")).await;
    assert_eq!(
        outcomes,
        vec![RouteOutcome::Spam {
            user_id: 42,
            chat_id: CHAT,
            count: 1,
            warned: true,
        }]
    );
    assert_eq!(h.counter.get(42), 1);
    assert_eq!(h.sender.sent(), vec![(CHAT, "Is it spam?".to_string())]);
}

#[tokio::test]
async fn test_forward_after_ttl_is_clean() {
    let h = enforcing();
    h.router.handle_update(join_update(1, 42)).await;

    h.clock.advance(Duration::from_secs(6 * 60));
    let outcomes = h.router.handle_update(forward_update(2, 42, "link")).await;

    assert_eq!(outcomes, vec![RouteOutcome::Clean]);
    assert_eq!(h.counter.get(42), 0);
    assert!(h.sender.sent().is_empty());
    // 被动判断不删除记录，留给清理任务
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_plain_message_from_new_member_is_clean() {
    let h = enforcing();
    h.router.handle_update(join_update(1, 42)).await;

    let outcomes = h.router.handle_update(text_update(2, 42, "hello everyone")).await;
    assert_eq!(outcomes, vec![RouteOutcome::Clean]);
    assert!(h.counter.is_empty());
}

#[tokio::test]
async fn test_forward_from_unknown_member_is_clean() {
    let h = enforcing();
    let outcomes = h.router.handle_update(forward_update(1, 7, "news")).await;
    assert_eq!(outcomes, vec![RouteOutcome::Clean]);
}

#[tokio::test]
async fn test_leave_removes_member() {
    let h = enforcing();
    h.router.handle_update(join_update(1, 42)).await;
    assert_eq!(h.router.handle_update(leave_update(2, 42)).await, vec![RouteOutcome::Left(42)]);
    assert!(h.store.is_empty());

    let outcomes = h.router.handle_update(forward_update(3, 42, "link")).await;
    assert_eq!(outcomes, vec![RouteOutcome::Clean]);
}

#[tokio::test]
async fn test_watch_only_counts_without_warning() {
    let h = create_test_router(true, RecordingSender::new(), EmptyTextPolicy::Eligible);
    assert!(h.router.is_watch_only());
    h.router.handle_update(join_update(1, 42)).await;

    for (i, expected) in (2..5).zip(1u64..) {
        let outcomes = h.router.handle_update(forward_update(i, 42, "link")).await;
        assert_eq!(
            outcomes,
            vec![RouteOutcome::Spam {
                user_id: 42,
                chat_id: CHAT,
                count: expected,
                warned: false,
            }]
        );
    }
    assert_eq!(h.counter.get(42), 3);
    assert!(h.sender.sent().is_empty());
}

#[tokio::test]
async fn test_send_failure_keeps_counter() {
    let h = create_test_router(false, RecordingSender::failing(), EmptyTextPolicy::Eligible);
    h.router.handle_update(join_update(1, 42)).await;

    let outcomes = h.router.handle_update(forward_update(2, 42, "link")).await;
    assert_eq!(
        outcomes,
        vec![RouteOutcome::Spam {
            user_id: 42,
            chat_id: CHAT,
            count: 1,
            warned: false,
        }]
    );
    assert_eq!(h.counter.get(42), 1);
}

#[tokio::test]
async fn test_senderless_update_dropped() {
    let h = enforcing();
    let outcomes = h.router.handle_update(senderless_update(1)).await;

    assert_eq!(outcomes, vec![RouteOutcome::Dropped]);
    assert!(h.store.is_empty());
    assert!(h.counter.is_empty());
    assert!(h.sender.sent().is_empty());
}

#[tokio::test]
async fn test_update_without_message_skipped() {
    let h = enforcing();
    h.router.handle_update(join_update(1, 42)).await;

    let outcomes = h.router.handle_update(edited_update(2, 42)).await;
    assert_eq!(outcomes, vec![RouteOutcome::Dropped]);
    assert!(h.counter.is_empty());
    assert!(h.sender.sent().is_empty());
}

#[tokio::test]
async fn test_rejoin_resets_window() {
    let h = enforcing();
    h.router.handle_update(join_update(1, 42)).await;
    h.clock.advance(Duration::from_secs(10 * 60));
    h.router.handle_update(join_update(2, 42)).await;
    h.clock.advance(Duration::from_secs(60));

    let outcomes = h.router.handle_update(forward_update(3, 42, "link")).await;
    assert!(matches!(outcomes[0], RouteOutcome::Spam { count: 1, .. }));
}

#[tokio::test]
async fn test_empty_text_policy_applied() {
    let strict = create_test_router(false, RecordingSender::new(), EmptyTextPolicy::Ignored);
    strict.router.handle_update(join_update(1, 42)).await;
    assert_eq!(
        strict.router.handle_update(forward_update(2, 42, "")).await,
        vec![RouteOutcome::Clean]
    );

    let permissive = enforcing();
    permissive.router.handle_update(join_update(1, 42)).await;
    assert!(matches!(
        permissive.router.handle_update(forward_update(2, 42, "")).await[0],
        RouteOutcome::Spam { .. }
    ));
}

#[tokio::test]
async fn test_dispatch_inbound_events_directly() {
    let h = enforcing();
    let now = h.clock.now();

    h.router
        .dispatch(InboundEvent::Joined { user_id: 5, chat_id: CHAT })
        .await;
    let outcome = h
        .router
        .dispatch(InboundEvent::Message(MessageEvent::new(5, CHAT, "promo").forwarded(now)))
        .await;
    assert!(matches!(outcome, RouteOutcome::Spam { user_id: 5, .. }));

    let outcome = h
        .router
        .dispatch(InboundEvent::Left { user_id: 5, chat_id: CHAT })
        .await;
    assert_eq!(outcome, RouteOutcome::Left(5));
}
